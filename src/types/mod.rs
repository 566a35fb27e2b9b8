//! Shared error types

mod errors;

pub use errors::{EngramError, Result};
