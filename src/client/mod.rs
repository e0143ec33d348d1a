//! HTTP clients for the ticker provider and the warehouse.
//!
//! [`PolygonClient`] fetches reference API pages; [`SnowflakeClient`] opens
//! warehouse sessions over Snowflake's REST endpoints.

mod polygon;
mod snowflake;

pub use polygon::{DEFAULT_BASE_URL, PolygonClient, PolygonConfig};
pub use snowflake::{SnowflakeClient, SnowflakeConfig, SnowflakeSession};
