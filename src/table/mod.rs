//! In-memory record collections
//!
//! [`Table`] is the collection format every matcher reads and writes. It
//! is format agnostic: loading CSV or spreadsheet exports into a table is
//! the caller's job.

pub mod storage;
pub mod value;

pub use storage::{Table, TableError};
pub use value::{DType, Value};
