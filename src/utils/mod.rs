// src/utils/mod.rs

//! Shared utilities.

pub mod http;

pub use http::{create_client, fetch_page};
