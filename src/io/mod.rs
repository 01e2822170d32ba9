//! File output for solver runs.
//!
//! Results are appended as JSON lines; grid snapshots as plain text.

pub mod dump;
pub mod results;

pub use dump::{append_interior, write_interior};
pub use results::{RunRecord, append_record, read_records};
