//! Ticker Loader
//!
//! A batch ETL job that pulls the Polygon.io stock ticker universe and
//! loads it into a Snowflake table, stamped with the run date.

pub mod cli;
pub mod client;
pub mod etl;
pub mod polygon;
pub mod schema;
pub mod storage;
pub mod ticker;
pub mod transform;
pub mod warehouse;

// Re-exports for convenience
pub use client::{PolygonClient, PolygonConfig, SnowflakeClient, SnowflakeConfig};
pub use etl::{Extractor, IdentityTransformer, Loader, Pipeline, Transformer};
pub use polygon::{PageSource, TickerBatch, TickersExtractor, TickersQuery};
pub use storage::{NdjsonReader, NdjsonWriter};
pub use ticker::{TickerPage, TickerRecord};
pub use warehouse::{TickersLoader, Warehouse, WarehouseSession};
