//! Outbound adapters: persistence and page inspection.

pub mod executor;
pub mod inspector;
pub mod sqlite;
