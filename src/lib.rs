//! metamatrix: CRUD API over text-derived metadata records.
//!
//! Records are stored in SQLite and created by sending text to an external
//! natural-language-understanding service.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
