//! Represents one metadata record extracted from analyzed text.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sqlx::FromRow;
use thiserror::Error;

/// ISO-8601 local date-time with seconds and optional fractional seconds.
const ISO_LOCAL_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S%.f";
/// ISO-8601 local date-time with the seconds omitted.
const ISO_LOCAL_DATE_TIME_MINUTES: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("publication date `{value}` is not an ISO local date-time")]
    MalformedDate {
        value: String,
        /// Set when the layout was right but chrono rejected a field value.
        #[source]
        source: Option<chrono::ParseError>,
    },
    #[error("`{field}` must be a JSON array")]
    MalformedJsonList {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize `{field}`")]
    Serialization {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type RecordResult<T> = Result<T, RecordError>;

/// Two-state visibility flag, stored as a single character.
#[derive(Serialize, Deserialize, sqlx::Type, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActiveStatus {
    #[default]
    #[serde(rename = "A")]
    #[sqlx(rename = "A")]
    Active,
    #[serde(rename = "I")]
    #[sqlx(rename = "I")]
    Inactive,
}

impl ActiveStatus {
    pub fn as_char(self) -> char {
        match self {
            ActiveStatus::Active => 'A',
            ActiveStatus::Inactive => 'I',
        }
    }
}

/// A syndication feed discovered in the analyzed source.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Feed {
    #[serde(default)]
    pub link: String,
}

/// An author credited by the analyzed source.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Author {
    #[serde(default)]
    pub name: String,
}

/// A list field that arrives either pre-serialized or as structured items.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum JsonListInput<T> {
    Serialized(String),
    Items(Vec<T>),
}

impl<T: Serialize> JsonListInput<T> {
    /// Produce the stored text, checking that pre-serialized input is a JSON array.
    pub fn into_serialized(self, field: &'static str) -> RecordResult<String> {
        match self {
            JsonListInput::Serialized(text) => {
                serde_json::from_str::<Vec<serde_json::Value>>(&text)
                    .map_err(|source| RecordError::MalformedJsonList { field, source })?;
                Ok(text)
            }
            JsonListInput::Items(items) => serialize_list(field, &items),
        }
    }
}

/// A row of the `metadata` table.
///
/// `feeds` and `authors` hold JSON array text; use [`Metadata::set_feeds`] and
/// [`Metadata::set_authors`] to assign structured lists.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Store-assigned key. `None` until the record is first saved.
    pub id: Option<i64>,

    pub title: Option<String>,

    /// Local date-time with no zone attached.
    pub publication_date: Option<NaiveDateTime>,

    pub image_url: Option<String>,

    /// JSON array of [`Feed`] objects.
    pub feeds: Option<String>,

    /// JSON array of [`Author`] objects.
    pub authors: Option<String>,

    pub active: ActiveStatus,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and assign the publication date. Absent or empty text leaves the field untouched.
    pub fn set_publication_date_text(&mut self, value: Option<&str>) -> RecordResult<()> {
        match value {
            Some(text) if !text.is_empty() => {
                self.publication_date = Some(parse_iso_local_date_time(text)?);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn set_feeds(&mut self, feeds: &[Feed]) -> RecordResult<()> {
        self.feeds = Some(serialize_list("feeds", feeds)?);
        Ok(())
    }

    pub fn set_authors(&mut self, authors: &[Author]) -> RecordResult<()> {
        self.authors = Some(serialize_list("authors", authors)?);
        Ok(())
    }

    pub fn update_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub fn update_publication_date(&mut self, publication_date: Option<NaiveDateTime>) {
        self.publication_date = publication_date;
    }

    pub fn update_image_url(&mut self, image_url: Option<String>) {
        self.image_url = image_url;
    }

    pub fn update_feeds(&mut self, feeds: Option<String>) {
        self.feeds = feeds;
    }

    pub fn update_authors(&mut self, authors: Option<String>) {
        self.authors = authors;
    }

    /// Decode the stored feeds. An unset column yields an empty list.
    pub fn feed_list(&self) -> RecordResult<Vec<Feed>> {
        deserialize_list("feeds", self.feeds.as_deref())
    }

    /// Decode the stored authors. An unset column yields an empty list.
    pub fn author_list(&self) -> RecordResult<Vec<Author>> {
        deserialize_list("authors", self.authors.as_deref())
    }
}

/// Parse text in ISO-8601 local date-time form (`2024-01-15T10:30:00`).
///
/// Fields are fixed width with no sign, padding or leap second; seconds and a
/// 1-9 digit fraction are optional.
pub fn parse_iso_local_date_time(value: &str) -> RecordResult<NaiveDateTime> {
    let malformed = |source| RecordError::MalformedDate {
        value: value.to_string(),
        source,
    };

    if !has_iso_local_layout(value.as_bytes()) {
        return Err(malformed(None));
    }
    let format = if value.len() == MINUTES_LAYOUT_LEN {
        ISO_LOCAL_DATE_TIME_MINUTES
    } else {
        ISO_LOCAL_DATE_TIME
    };
    NaiveDateTime::parse_from_str(value, format).map_err(|err| malformed(Some(err)))
}

/// Length of `YYYY-MM-DDTHH:MM`.
const MINUTES_LAYOUT_LEN: usize = 16;

fn has_iso_local_layout(bytes: &[u8]) -> bool {
    let digits = |range: std::ops::Range<usize>| {
        bytes
            .get(range)
            .is_some_and(|field| field.iter().all(u8::is_ascii_digit))
    };
    let head_ok = bytes.len() >= MINUTES_LAYOUT_LEN
        && digits(0..4)
        && bytes[4] == b'-'
        && digits(5..7)
        && bytes[7] == b'-'
        && digits(8..10)
        && bytes[10] == b'T'
        && digits(11..13)
        && bytes[13] == b':'
        && digits(14..16);
    if !head_ok {
        return false;
    }

    match &bytes[MINUTES_LAYOUT_LEN..] {
        [] => true,
        // second 60 would be accepted by chrono as a leap second
        [b':', b'0'..=b'5', units, rest @ ..] if units.is_ascii_digit() => match rest {
            [] => true,
            [b'.', fraction @ ..] => {
                (1..=9).contains(&fraction.len()) && fraction.iter().all(u8::is_ascii_digit)
            }
            _ => false,
        },
        _ => false,
    }
}

fn serialize_list<T: Serialize>(field: &'static str, items: &[T]) -> RecordResult<String> {
    serde_json::to_string(items).map_err(|source| RecordError::Serialization { field, source })
}

fn deserialize_list<T: DeserializeOwned>(
    field: &'static str,
    text: Option<&str>,
) -> RecordResult<Vec<T>> {
    match text {
        Some(text) => serde_json::from_str(text)
            .map_err(|source| RecordError::MalformedJsonList { field, source }),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn parses_full_and_short_local_date_times() {
        let full = parse_iso_local_date_time("2024-01-15T10:30:00").unwrap();
        assert_eq!(
            full,
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap()
        );

        let short = parse_iso_local_date_time("2024-01-15T10:30").unwrap();
        assert_eq!(short, full);

        let fractional = parse_iso_local_date_time("2024-01-15T10:30:00.250").unwrap();
        assert_eq!(fractional.nanosecond(), 250_000_000);
    }

    #[test]
    fn rejects_zoned_and_date_only_text() {
        for bad in [
            "2024-01-15",
            "2024-01-15T10:30:00Z",
            "15/01/2024 10:30",
            "tomorrow",
            " 2024-01-15T10:30:00",
            "2024-01-15T 10:30:00",
            "2024-01-15T10:30:00 ",
            "2024-1-5T1:3:0",
            "+2024-01-15T10:30:00",
            "2024-01-15T10:30:60",
            "2024-01-15T10:30:00.",
            "2024-01-15T10:30:00.1234567890",
            "2024-01-15T10:30.5",
        ] {
            assert!(
                matches!(
                    parse_iso_local_date_time(bad),
                    Err(RecordError::MalformedDate { .. })
                ),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn out_of_range_fields_keep_the_chrono_cause() {
        match parse_iso_local_date_time("2024-02-30T10:30:00") {
            Err(RecordError::MalformedDate { source, .. }) => assert!(source.is_some()),
            other => panic!("expected malformed date, got {other:?}"),
        }
    }

    #[test]
    fn status_maps_to_single_characters() {
        assert_eq!(ActiveStatus::Active.as_char(), 'A');
        assert_eq!(ActiveStatus::Inactive.as_char(), 'I');
        assert_eq!(serde_json::to_string(&ActiveStatus::Inactive).unwrap(), "\"I\"");
        assert_eq!(ActiveStatus::default(), ActiveStatus::Active);
    }
}
