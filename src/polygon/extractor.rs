//! Reference tickers extractor
//!
//! Walks every page of GET /v3/reference/tickers, stamping each record with
//! the run date.

use super::{PageSource, TickersQuery};
use crate::etl::Extractor;
use crate::schema;
use crate::ticker::{TickerPage, TickerRecord};

use eyre::{Context, Result};
use std::time::Duration;

/// Every this many continuation requests, the extractor pauses
pub const RATE_LIMIT_EVERY: usize = 5;

/// Length of each rate-limit pause
pub const RATE_LIMIT_PAUSE: Duration = Duration::from_secs(70);

/// Everything collected by one extraction run
#[derive(Debug)]
pub struct TickerBatch {
    /// Run date stamped on every record
    pub run_date: String,
    /// Records in arrival order
    pub records: Vec<TickerRecord>,
    /// Destination column names, in insert order
    pub columns: Vec<&'static str>,
    /// Pages fetched, including the first
    pub pages: usize,
    /// Rate-limit pauses taken
    pub pauses: usize,
}

/// Extractor for Polygon.io reference tickers
///
/// Follows `next_url` until a page omits it. Pagination state lives in each
/// [`fetch`](Self::fetch) call, so an extractor can be run repeatedly.
///
/// # Example
/// ```no_run
/// use tickerload::client::{PolygonClient, PolygonConfig};
/// use tickerload::polygon::{TickersExtractor, TickersQuery};
///
/// # async fn example() -> eyre::Result<()> {
/// let config = PolygonConfig::from_env()?;
/// let query = TickersQuery::from_config(&config);
/// let extractor = TickersExtractor::new(PolygonClient::try_new(config)?, query);
///
/// let batch = extractor.fetch().await?;
/// println!("{} tickers for {}", batch.records.len(), batch.run_date);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TickersExtractor<S> {
    source: S,
    query: TickersQuery,
    run_date: Option<String>,
    pause_every: usize,
    pause: Duration,
}

impl<S: PageSource> TickersExtractor<S> {
    /// Create a new tickers extractor
    ///
    /// # Arguments
    /// * `source` - Where pages are fetched from
    /// * `query` - Builds the first-page and continuation URLs
    pub fn new(source: S, query: TickersQuery) -> Self {
        Self {
            source,
            query,
            run_date: None,
            pause_every: RATE_LIMIT_EVERY,
            pause: RATE_LIMIT_PAUSE,
        }
    }

    /// Use a fixed run date instead of today's date
    pub fn with_run_date(mut self, run_date: impl Into<String>) -> Self {
        self.run_date = Some(run_date.into());
        self
    }

    /// Pause for `pause` after every `every` continuation requests (default: 5, 70s)
    pub fn with_rate_limit(mut self, every: usize, pause: Duration) -> Self {
        self.pause_every = every.max(1);
        self.pause = pause;
        self
    }

    /// Fetch and parse one page
    async fn fetch_page(&self, url: &url::Url) -> Result<TickerPage> {
        let body = self.source.get_page(url).await?;
        TickerPage::parse(&body)
    }

    /// Fetch every page and return the stamped records
    ///
    /// # Errors
    /// Fails on the first transport error, malformed page, or invalid
    /// `next_url`. Nothing is returned for the pages already fetched.
    pub async fn fetch(&self) -> Result<TickerBatch> {
        let run_date = self
            .run_date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());

        log::info!(
            "Fetching stock tickers for {} ({} per page)",
            run_date,
            self.query.limit()
        );

        let mut records = Vec::new();
        let mut page = self
            .fetch_page(&self.query.first_page()?)
            .await
            .with_context(|| "Failed to fetch first tickers page")?;
        let mut pages = 1;
        let mut pauses = 0;
        let mut continuations = 0;

        loop {
            let count = page.results.len();
            records.extend(page.results.into_iter().map(|r| r.with_run_date(&run_date)));
            log::info!(
                "Page {}: {} ticker(s), {} total",
                pages,
                count,
                records.len()
            );

            let Some(next_url) = page.next_url else {
                break;
            };

            log::info!("Requesting next page {}", next_url);
            let url = self.query.continuation(&next_url)?;
            page = self
                .fetch_page(&url)
                .await
                .with_context(|| format!("Failed to fetch tickers page {}", pages + 1))?;
            pages += 1;
            continuations += 1;

            if continuations % self.pause_every == 0 {
                log::info!(
                    "Pausing for {}s after {} continuation request(s)...",
                    self.pause.as_secs(),
                    continuations
                );
                tokio::time::sleep(self.pause).await;
                pauses += 1;
            }
        }

        log::info!(
            "Fetched {} ticker(s) across {} page(s)",
            records.len(),
            pages
        );

        Ok(TickerBatch {
            run_date,
            records,
            columns: schema::column_names(),
            pages,
            pauses,
        })
    }
}

impl<S: PageSource> Extractor for TickersExtractor<S> {
    type Item = TickerRecord;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        let batch = self.fetch().await?;

        log::info!(
            "Extracted {} ticker(s) stamped {}",
            batch.records.len(),
            batch.run_date
        );

        Ok(batch.records)
    }
}
