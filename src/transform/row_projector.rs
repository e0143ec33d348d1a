//! Row projector transformer
//!
//! Turns ticker records into insert rows ordered by the warehouse schema.

use crate::etl::Transformer;
use crate::schema::{self, Row};
use crate::ticker::TickerRecord;
use eyre::Result;

/// Transformer that projects a [`TickerRecord`] onto a fixed column list
///
/// Every column yields a value: fields the record lacks become `""`.
/// Fields outside the column list are never emitted.
///
/// # Example
/// ```
/// use tickerload::transform::RowProjector;
/// use tickerload::etl::Transformer;
/// use tickerload::ticker::TickerRecord;
///
/// let projector = RowProjector::new(vec!["ticker", "name", "ds"]);
/// let record = TickerRecord::new("AAPL").with_run_date("2025-10-14");
///
/// let row = projector.transform(record).unwrap();
/// assert_eq!(row, vec!["AAPL", "", "2025-10-14"]);
/// ```
pub struct RowProjector {
    columns: Vec<&'static str>,
}

impl RowProjector {
    /// Create a projector for the given columns
    pub fn new(columns: Vec<&'static str>) -> Self {
        Self { columns }
    }

    /// Columns emitted by this projector, in order
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }
}

impl Default for RowProjector {
    /// Project onto the full ticker table schema
    fn default() -> Self {
        Self::new(schema::column_names())
    }
}

impl Transformer for RowProjector {
    type Input = TickerRecord;
    type Output = Row;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        Ok(input.to_row(&self.columns))
    }
}
