//! Append-only fact log backed by SQLite

mod store;

pub use store::{Fact, FactStore};
