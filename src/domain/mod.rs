//! Domain types: collections, record schemas, language codes.

pub mod collections;
pub mod error;
pub mod language;
