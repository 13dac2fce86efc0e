//! Application services: the content store and its query model.

pub mod content;
pub mod error;
pub mod query;
pub mod repos;
