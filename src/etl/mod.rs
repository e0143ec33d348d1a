//! Core ETL (Extract, Transform, Load) abstractions
//!
//! A run is one pass of extract → transform → load. Extractors pull tickers
//! from the provider or a file, transformers project them into rows, and
//! loaders persist them to the warehouse or disk.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::Pipeline;
pub use transform::{IdentityTransformer, Transformer};
