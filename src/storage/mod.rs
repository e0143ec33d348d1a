//! File system storage operations
//!
//! NDJSON snapshots of fetched tickers, one record per line.

mod ndjson;

pub use ndjson::{NdjsonReader, NdjsonWriter};
