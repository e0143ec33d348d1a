//! Loader trait for loading data to destinations

use eyre::Result;

/// Loader trait for loading data to a destination
///
/// Implementors define how to load items to destinations:
/// - Warehouse tables
/// - NDJSON files
///
/// # Example
/// ```no_run
/// use tickerload::etl::Loader;
/// use eyre::Result;
/// use std::path::PathBuf;
///
/// struct FileLoader {
///     output: PathBuf,
/// }
///
/// impl Loader for FileLoader {
///     type Item = String;
///
///     async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
///         std::fs::write(&self.output, items.join("\n"))?;
///         Ok(items.len())
///     }
/// }
/// ```
pub trait Loader: Send + Sync {
    /// The type of items to load
    type Item: Send;

    /// Load items to the destination
    ///
    /// Returns the number of items successfully loaded
    ///
    /// # Errors
    /// Returns an error if loading fails (network, I/O, SQL, etc.)
    fn load(
        &self,
        items: Vec<Self::Item>,
    ) -> impl std::future::Future<Output = Result<usize>> + Send;
}
