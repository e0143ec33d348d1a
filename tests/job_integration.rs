//! Integration tests for the fetch → load job
//!
//! Pages come from an in-memory source and statements go to a recording
//! warehouse, so the whole pipeline runs without network access.

use eyre::Result;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tickerload::cli::tickers_pipeline;
use tickerload::polygon::{PageSource, TickersExtractor, TickersQuery};
use tickerload::schema::Row;
use tickerload::warehouse::{TickersLoader, Warehouse, WarehouseSession};
use url::Url;

const RUN_DATE: &str = "2025-10-14";

/// Serves queued page bodies in order
struct QueuedPages {
    bodies: Mutex<VecDeque<String>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl QueuedPages {
    fn new(bodies: Vec<String>) -> Self {
        Self {
            bodies: Mutex::new(bodies.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl PageSource for QueuedPages {
    async fn get_page(&self, url: &Url) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.bodies.lock().unwrap().pop_front() {
            Some(body) => Ok(body),
            None => eyre::bail!("unexpected request: {}", url),
        }
    }
}

#[derive(Debug, Default)]
struct WarehouseLog {
    connects: usize,
    closes: usize,
    statements: Vec<String>,
    batches: Vec<(String, Vec<Row>)>,
}

/// Warehouse that records every session and statement
#[derive(Clone, Default)]
struct MemoryWarehouse {
    log: Arc<Mutex<WarehouseLog>>,
}

struct MemorySession {
    log: Arc<Mutex<WarehouseLog>>,
}

impl Warehouse for MemoryWarehouse {
    type Session = MemorySession;

    async fn connect(&self) -> Result<Self::Session> {
        self.log.lock().unwrap().connects += 1;
        Ok(MemorySession {
            log: self.log.clone(),
        })
    }
}

impl WarehouseSession for MemorySession {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.log.lock().unwrap().statements.push(sql.to_string());
        Ok(())
    }

    async fn execute_batch(&mut self, sql: &str, rows: &[Row]) -> Result<usize> {
        self.log
            .lock()
            .unwrap()
            .batches
            .push((sql.to_string(), rows.to_vec()));
        Ok(rows.len())
    }

    async fn close(self) -> Result<()> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// A page of `count` tickers named `{prefix}{n}`
fn page(prefix: &str, count: usize, next: Option<&str>) -> String {
    let results: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "ticker": format!("{}{:04}", prefix, i),
                "name": format!("{} Corp {}", prefix, i),
                "market": "stocks",
                "locale": "us",
                "primary_exchange": "XNYS",
                "type": "CS",
                "active": true,
                "currency_name": "usd",
                "composite_figi": "BBG000000000",
                "last_updated_utc": "2025-10-13T00:00:00Z",
                "delisted_utc": null
            })
        })
        .collect();
    let mut body = json!({"results": results, "status": "OK", "count": count});
    if let Some(cursor) = next {
        body["next_url"] = json!(format!(
            "https://api.polygon.io/v3/reference/tickers?cursor={}",
            cursor
        ));
    }
    body.to_string()
}

fn extractor(bodies: Vec<String>) -> TickersExtractor<QueuedPages> {
    let query = TickersQuery::new(Url::parse("https://api.polygon.io").unwrap(), "test-key");
    TickersExtractor::new(QueuedPages::new(bodies), query)
        .with_run_date(RUN_DATE)
        .with_rate_limit(5, Duration::ZERO)
}

#[tokio::test]
async fn test_two_pages_load_in_one_insert() -> Result<()> {
    let warehouse = MemoryWarehouse::default();
    let log = warehouse.log.clone();

    let pipeline = tickers_pipeline(
        extractor(vec![page("A", 1000, Some("page2")), page("B", 37, None)]),
        TickersLoader::new(warehouse, "stock_tickers"),
    );

    let count = pipeline.run().await?;
    assert_eq!(count, 1037);

    let log = log.lock().unwrap();
    assert_eq!(log.connects, 1);
    assert_eq!(log.closes, 1);
    assert_eq!(log.statements.len(), 1);
    assert!(log.statements[0].starts_with("CREATE TABLE IF NOT EXISTS stock_tickers"));

    assert_eq!(log.batches.len(), 1);
    let (sql, rows) = &log.batches[0];
    assert!(sql.starts_with("INSERT INTO stock_tickers (ticker, name, market"));
    assert_eq!(rows.len(), 1037);

    // Arrival order is kept and every row carries the run date
    assert_eq!(rows[0][0], "A0000");
    assert_eq!(rows[999][0], "A0999");
    assert_eq!(rows[1000][0], "B0000");
    assert_eq!(rows[1036][0], "B0036");
    assert!(rows.iter().all(|r| r.len() == 13 && r[12] == RUN_DATE));

    // Missing cik/share_class_figi are empty strings
    assert_eq!(rows[0][8], "");
    assert_eq!(rows[0][10], "");
    assert_eq!(rows[0][6], "true");
    assert_eq!(rows[0][11], "2025-10-13 00:00:00");

    Ok(())
}

#[tokio::test]
async fn test_single_page_makes_one_request() -> Result<()> {
    let extractor = extractor(vec![page("A", 12, None)]);

    let batch = extractor.fetch().await?;

    assert_eq!(batch.records.len(), 12);
    assert_eq!(batch.pages, 1);
    assert_eq!(batch.pauses, 0);
    assert_eq!(batch.run_date, RUN_DATE);
    Ok(())
}

#[tokio::test]
async fn test_empty_result_still_creates_table() -> Result<()> {
    let warehouse = MemoryWarehouse::default();
    let log = warehouse.log.clone();

    let pipeline = tickers_pipeline(
        extractor(vec![page("A", 0, None)]),
        TickersLoader::new(warehouse, "stock_tickers"),
    );

    assert_eq!(pipeline.run().await?, 0);

    let log = log.lock().unwrap();
    assert_eq!(log.connects, 1);
    assert_eq!(log.statements.len(), 1);
    assert!(log.statements[0].starts_with("CREATE TABLE IF NOT EXISTS stock_tickers"));
    assert!(log.batches.is_empty());
    assert_eq!(log.closes, 1);
    Ok(())
}

#[tokio::test]
async fn test_malformed_first_page_never_connects() {
    let warehouse = MemoryWarehouse::default();
    let log = warehouse.log.clone();

    let pipeline = tickers_pipeline(
        extractor(vec!["<html>Service Unavailable</html>".to_string()]),
        TickersLoader::new(warehouse, "stock_tickers"),
    );

    assert!(pipeline.run().await.is_err());

    let log = log.lock().unwrap();
    assert_eq!(log.connects, 0);
    assert!(log.batches.is_empty());
}

#[tokio::test]
async fn test_failure_on_later_page_loads_nothing() {
    let warehouse = MemoryWarehouse::default();
    let log = warehouse.log.clone();

    let pipeline = tickers_pipeline(
        extractor(vec![
            page("A", 1000, Some("page2")),
            r#"{"status": "ERROR", "error": "exceeded the maximum requests per minute"}"#
                .to_string(),
        ]),
        TickersLoader::new(warehouse, "stock_tickers"),
    );

    assert!(pipeline.run().await.is_err());
    assert_eq!(log.lock().unwrap().connects, 0);
}

#[tokio::test]
async fn test_repeated_fetch_resets_pagination() -> Result<()> {
    // Each fetch counts its own continuation requests from one
    let mut bodies = Vec::new();
    for _ in 0..2 {
        for i in 0..4 {
            bodies.push(page("X", 1, Some(&format!("c{}", i))));
        }
        bodies.push(page("Z", 1, None));
    }
    let extractor = extractor(bodies);

    let first = extractor.fetch().await?;
    let second = extractor.fetch().await?;

    assert_eq!(first.pages, 5);
    assert_eq!(first.pauses, 0);
    assert_eq!(second.pages, 5);
    assert_eq!(second.pauses, 0);
    Ok(())
}
