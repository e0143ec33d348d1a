//! Transformer trait for data transformation

use eyre::Result;

/// Transformer trait for transforming data items
///
/// Implementors define how to transform items, for example projecting
/// ticker records onto the warehouse column order.
///
/// # Example
/// ```no_run
/// use tickerload::etl::Transformer;
/// use tickerload::ticker::TickerRecord;
/// use eyre::Result;
///
/// struct SymbolOnly;
///
/// impl Transformer for SymbolOnly {
///     type Input = TickerRecord;
///     type Output = String;
///
///     fn transform(&self, input: Self::Input) -> Result<Self::Output> {
///         Ok(input.ticker)
///     }
/// }
/// ```
pub trait Transformer: Send + Sync {
    /// Input item type
    type Input: Send;

    /// Output item type after transformation
    type Output: Send;

    /// Transform a single item
    ///
    /// # Errors
    /// Returns an error if transformation fails (validation, conversion, etc.)
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;

    /// Transform multiple items (default batch implementation)
    ///
    /// Override this for optimized batch processing
    fn transform_many(&self, inputs: Vec<Self::Input>) -> Result<Vec<Self::Output>> {
        inputs.into_iter().map(|i| self.transform(i)).collect()
    }
}

/// Identity transformer that passes items through unchanged
///
/// Used when tickers are written to disk as-is, without row projection.
pub struct IdentityTransformer<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for IdentityTransformer<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> IdentityTransformer<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Send + Sync> Transformer for IdentityTransformer<T> {
    type Input = T;
    type Output = T;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        Ok(input)
    }
}
