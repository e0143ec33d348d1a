//! Polygon.io reference tickers API
//!
//! Provides the paginating extractor for `GET /v3/reference/tickers` and the
//! [`PageSource`] seam it fetches pages through.

mod extractor;
mod query;

pub use extractor::{TickerBatch, TickersExtractor};
pub use query::{DEFAULT_LIMIT, TickersQuery};

use eyre::Result;
use url::Url;

/// Something that can fetch one page of the tickers API as raw text
///
/// [`PolygonClient`](crate::client::PolygonClient) implements this over HTTP.
pub trait PageSource: Send + Sync {
    /// GET the given URL and return the response body
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status
    fn get_page(&self, url: &Url) -> impl std::future::Future<Output = Result<String>> + Send;
}
