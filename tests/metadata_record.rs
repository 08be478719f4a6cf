use chrono::NaiveDate;
use metamatrix::models::metadata::{Author, Feed, JsonListInput, Metadata, RecordError};

#[test]
fn publication_date_text_is_parsed_as_local_date_time() {
    let mut record = Metadata::new();
    record
        .set_publication_date_text(Some("2024-01-15T10:30:00"))
        .unwrap();

    assert_eq!(
        record.publication_date,
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
    );
}

#[test]
fn empty_or_missing_date_text_is_a_no_op() {
    let mut record = Metadata::new();
    record
        .set_publication_date_text(Some("2024-01-15T10:30:00"))
        .unwrap();
    let before = record.publication_date;

    record.set_publication_date_text(Some("")).unwrap();
    record.set_publication_date_text(None).unwrap();

    assert_eq!(record.publication_date, before);
}

#[test]
fn malformed_date_text_fails_and_leaves_field_alone() {
    let mut record = Metadata::new();
    let err = record
        .set_publication_date_text(Some("2024-13-45T99:00:00"))
        .unwrap_err();

    assert!(matches!(err, RecordError::MalformedDate { ref value, .. } if value == "2024-13-45T99:00:00"));
    assert_eq!(record.publication_date, None);
}

#[test]
fn structured_lists_round_trip_through_stored_text() {
    let feeds = vec![
        Feed {
            link: "http://a/rss".into(),
        },
        Feed {
            link: "http://b/atom".into(),
        },
    ];
    let authors = vec![Author {
        name: "Ada Lovelace".into(),
    }];

    let mut record = Metadata::new();
    record.set_feeds(&feeds).unwrap();
    record.set_authors(&authors).unwrap();

    let stored: Vec<Feed> = serde_json::from_str(record.feeds.as_deref().unwrap()).unwrap();
    assert_eq!(stored, feeds);
    assert_eq!(record.author_list().unwrap(), authors);
}

#[test]
fn empty_lists_serialize_as_empty_arrays() {
    let mut record = Metadata::new();
    record.set_feeds(&[]).unwrap();
    record.set_authors(&[]).unwrap();
    assert_eq!(record.feeds.as_deref(), Some("[]"));
    assert_eq!(record.authors.as_deref(), Some("[]"));
}

#[test]
fn unset_lists_decode_as_empty() {
    let record = Metadata::new();
    assert!(record.feed_list().unwrap().is_empty());
    assert!(record.author_list().unwrap().is_empty());
}

#[test]
fn pre_serialized_list_input_must_be_an_array() {
    let ok: JsonListInput<Author> = JsonListInput::Serialized(r#"[{"name":"x"}]"#.into());
    assert_eq!(ok.into_serialized("authors").unwrap(), r#"[{"name":"x"}]"#);

    let bad: JsonListInput<Author> = JsonListInput::Serialized("not json".into());
    assert!(matches!(
        bad.into_serialized("authors"),
        Err(RecordError::MalformedJsonList {
            field: "authors",
            ..
        })
    ));
}

#[test]
fn record_json_uses_camel_case_and_single_char_status() {
    let mut record = Metadata::new();
    record.update_image_url(Some("http://x/y.png".into()));
    record
        .set_publication_date_text(Some("2024-01-15T10:30:00"))
        .unwrap();

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["imageUrl"], "http://x/y.png");
    assert_eq!(json["publicationDate"], "2024-01-15T10:30:00");
    assert_eq!(json["active"], "A");
}
