//! Pipeline orchestration for ETL operations

use super::{Extractor, Loader, Transformer};
use eyre::Result;

/// ETL Pipeline that orchestrates Extract, Transform, and Load operations
///
/// Stages run strictly in sequence: nothing is loaded until extraction has
/// finished, so an extraction failure never reaches the destination.
///
/// # Type Parameters
/// - `E`: Extractor type
/// - `T`: Transformer type (must transform from E::Item)
/// - `L`: Loader type (must load T::Output)
///
/// # Example
/// ```no_run
/// use tickerload::etl::{IdentityTransformer, Pipeline};
/// use tickerload::storage::{NdjsonReader, NdjsonWriter};
///
/// # async fn example() -> eyre::Result<()> {
/// let pipeline = Pipeline::new(
///     NdjsonReader::new("tickers.ndjson"),
///     IdentityTransformer::new(),
///     NdjsonWriter::new("copy.ndjson"),
/// );
///
/// let count = pipeline.run().await?;
/// println!("Copied {} tickers", count);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
    always_load: bool,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer<Input = E::Item>,
    L: Loader<Item = T::Output>,
{
    /// Create a new pipeline
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
            always_load: false,
        }
    }

    /// Call the loader even when nothing was extracted
    ///
    /// Loaders with setup work of their own (such as creating the
    /// destination table) then run on every pass.
    pub fn always_load(mut self) -> Self {
        self.always_load = true;
        self
    }

    /// Run the complete ETL pipeline
    ///
    /// Steps:
    /// 1. Extract items from source
    /// 2. Transform each item
    /// 3. Load items to destination
    ///
    /// Returns the number of items successfully loaded
    ///
    /// # Errors
    /// Returns an error if any stage fails
    pub async fn run(&self) -> Result<usize> {
        log::info!("Starting ETL pipeline");

        // Extract
        log::debug!("Extracting from source...");
        let items = self.extractor.extract().await?;
        log::info!("Extracted {} items", items.len());

        if items.is_empty() && !self.always_load {
            log::warn!("No items extracted, pipeline complete");
            return Ok(0);
        }

        // Transform
        log::debug!("Transforming items...");
        let transformed = self.transformer.transform_many(items)?;
        log::info!("Transformed {} items", transformed.len());

        // Load
        log::debug!("Loading to destination...");
        let count = self.loader.load(transformed).await?;
        log::info!("Loaded {} items", count);

        Ok(count)
    }
}
