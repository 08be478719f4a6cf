pub mod metadata_service;
pub mod metadata_store;
pub mod nlu_client;
