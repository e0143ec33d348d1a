//! Extractor trait for data extraction from various sources

use eyre::Result;

/// Extractor trait for extracting data from a source
///
/// Implementors define how to extract items from sources like:
/// - The Polygon.io reference API
/// - NDJSON files written by an earlier `fetch`
///
/// # Example
/// ```no_run
/// use tickerload::etl::Extractor;
/// use eyre::Result;
///
/// struct StaticTickers(Vec<String>);
///
/// impl Extractor for StaticTickers {
///     type Item = String;
///
///     async fn extract(&self) -> Result<Vec<Self::Item>> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// The type of items extracted
    type Item: Send;

    /// Extract items from the source
    ///
    /// # Errors
    /// Returns an error if extraction fails (network, I/O, parsing, etc.)
    fn extract(&self) -> impl std::future::Future<Output = Result<Vec<Self::Item>>> + Send;
}
