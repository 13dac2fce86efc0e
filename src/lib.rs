//! Content backend for a musician portfolio: localized JSON collections
//! served through a TTL-cached query layer and a small read-only HTTP API.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
