// src/core/mod.rs
//! Storage and outbound service clients shared by the server and the CLI

pub mod database;
pub mod service_client;

pub use database::Database;
pub use service_client::ServiceClient;
