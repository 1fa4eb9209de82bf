//! # drive-etl-core
//!
//! Core data structures for the drive-etl pipeline: the [`Value`] scalar,
//! the [`Table`] exchange type, and the shared error enum.

mod error;
mod table;
mod value;

pub use error::{Error, Result};
pub use table::Table;
pub use value::Value;
