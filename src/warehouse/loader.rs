//! Ticker table loader
//!
//! Creates the destination table if needed and inserts every row in a single
//! batch statement.

use super::{Warehouse, WarehouseSession};
use crate::etl::Loader;
use crate::schema::{self, Row};

use eyre::{Context, Result};

/// Loader for the ticker table
///
/// One session is opened per [`load`](Loader::load) call and is closed on
/// every exit path before `load` returns.
///
/// # Example
/// ```no_run
/// use tickerload::client::{SnowflakeClient, SnowflakeConfig};
/// use tickerload::etl::Loader;
/// use tickerload::warehouse::TickersLoader;
///
/// # async fn example() -> eyre::Result<()> {
/// let config = SnowflakeConfig::from_env();
/// let table = config.table.clone();
/// let loader = TickersLoader::new(SnowflakeClient::try_new(config)?, table);
///
/// let rows = vec![vec!["AAPL".to_string(); 13]];
/// let count = loader.load(rows).await?;
/// # Ok(())
/// # }
/// ```
pub struct TickersLoader<W> {
    warehouse: W,
    table: String,
    columns: Vec<&'static str>,
}

impl<W> TickersLoader<W> {
    /// Create a new tickers loader
    ///
    /// # Arguments
    /// * `warehouse` - Warehouse to open sessions against
    /// * `table` - Destination table name
    pub fn new(warehouse: W, table: impl Into<String>) -> Self {
        Self {
            warehouse,
            table: table.into(),
            columns: schema::column_names(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The CREATE TABLE statement this loader issues
    pub fn create_table_sql(&self) -> String {
        schema::create_table_sql(&self.table, &self.columns)
    }

    /// The INSERT statement this loader issues
    pub fn insert_sql(&self) -> String {
        schema::insert_sql(&self.table, &self.columns)
    }
}

impl<W: Warehouse> TickersLoader<W> {
    /// Create the table and insert all rows on an open session
    async fn write_rows(&self, session: &mut W::Session, rows: &[Row]) -> Result<usize> {
        log::debug!("Ensuring table {} exists", self.table);
        session
            .execute(&self.create_table_sql())
            .await
            .with_context(|| format!("Failed to create table {}", self.table))?;

        if rows.is_empty() {
            log::info!("No ticker rows to insert into {}", self.table);
            return Ok(0);
        }

        log::debug!("Inserting {} row(s) into {}", rows.len(), self.table);
        session
            .execute_batch(&self.insert_sql(), rows)
            .await
            .with_context(|| format!("Failed to insert tickers into {}", self.table))
    }
}

impl<W: Warehouse> Loader for TickersLoader<W> {
    type Item = Row;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        let mut session = self
            .warehouse
            .connect()
            .await
            .with_context(|| "Failed to open warehouse session")?;

        let outcome = self.write_rows(&mut session, &items).await;

        match (session.close().await, &outcome) {
            (Ok(()), _) => log::debug!("Warehouse session closed"),
            (Err(e), Err(_)) => log::warn!("Failed to close warehouse session: {}", e),
            (Err(e), Ok(_)) => return Err(e.wrap_err("Failed to close warehouse session")),
        }

        let count = outcome?;
        log::info!("Total tickers loaded into {}: {}", self.table, count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Connect,
        Execute(String),
        Batch(String, usize),
        Close,
    }

    /// Records every call; optionally fails statements containing `fail_on`
    /// and the close when `fail_close` is set
    #[derive(Clone, Default)]
    struct RecordingWarehouse {
        calls: Arc<Mutex<Vec<Call>>>,
        fail_on: Option<&'static str>,
        fail_close: bool,
    }

    struct RecordingSession {
        calls: Arc<Mutex<Vec<Call>>>,
        fail_on: Option<&'static str>,
        fail_close: bool,
    }

    impl RecordingSession {
        fn check(&self, sql: &str) -> Result<()> {
            match self.fail_on {
                Some(pattern) if sql.contains(pattern) => eyre::bail!("SQL compilation error"),
                _ => Ok(()),
            }
        }
    }

    impl Warehouse for RecordingWarehouse {
        type Session = RecordingSession;

        async fn connect(&self) -> Result<Self::Session> {
            self.calls.lock().unwrap().push(Call::Connect);
            Ok(RecordingSession {
                calls: self.calls.clone(),
                fail_on: self.fail_on,
                fail_close: self.fail_close,
            })
        }
    }

    impl WarehouseSession for RecordingSession {
        async fn execute(&mut self, sql: &str) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Execute(sql.to_string()));
            self.check(sql)
        }

        async fn execute_batch(&mut self, sql: &str, rows: &[Row]) -> Result<usize> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Batch(sql.to_string(), rows.len()));
            self.check(sql)?;
            Ok(rows.len())
        }

        async fn close(self) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Close);
            if self.fail_close {
                eyre::bail!("session already expired");
            }
            Ok(())
        }
    }

    fn rows(n: usize) -> Vec<Row> {
        (0..n).map(|i| vec![format!("T{}", i); 13]).collect()
    }

    #[tokio::test]
    async fn test_load_creates_then_inserts() {
        let warehouse = RecordingWarehouse::default();
        let calls = warehouse.calls.clone();
        let loader = TickersLoader::new(warehouse, "stock_tickers");

        let count = loader.load(rows(3)).await.unwrap();

        assert_eq!(count, 3);
        let calls = calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], Call::Connect);
        assert!(matches!(&calls[1], Call::Execute(sql) if sql.starts_with("CREATE TABLE IF NOT EXISTS stock_tickers")));
        assert!(matches!(&calls[2], Call::Batch(sql, 3) if sql.starts_with("INSERT INTO stock_tickers")));
        assert_eq!(calls[3], Call::Close);
    }

    #[tokio::test]
    async fn test_empty_load_skips_insert() {
        let warehouse = RecordingWarehouse::default();
        let calls = warehouse.calls.clone();
        let loader = TickersLoader::new(warehouse, "stock_tickers");

        assert_eq!(loader.load(vec![]).await.unwrap(), 0);

        let calls = calls.lock().unwrap().clone();
        assert!(!calls.iter().any(|c| matches!(c, Call::Batch(..))));
        assert_eq!(calls.last(), Some(&Call::Close));
    }

    #[tokio::test]
    async fn test_session_closed_when_create_fails() {
        let warehouse = RecordingWarehouse {
            fail_on: Some("CREATE TABLE"),
            ..Default::default()
        };
        let calls = warehouse.calls.clone();
        let loader = TickersLoader::new(warehouse, "stock_tickers");

        let err = loader.load(rows(2)).await.unwrap_err();

        assert!(err.to_string().contains("Failed to create table stock_tickers"));
        let calls = calls.lock().unwrap().clone();
        assert!(!calls.iter().any(|c| matches!(c, Call::Batch(..))));
        assert_eq!(calls.last(), Some(&Call::Close));
    }

    #[tokio::test]
    async fn test_session_closed_when_insert_fails() {
        let warehouse = RecordingWarehouse {
            fail_on: Some("INSERT"),
            ..Default::default()
        };
        let calls = warehouse.calls.clone();
        let loader = TickersLoader::new(warehouse, "stock_tickers");

        assert!(loader.load(rows(2)).await.is_err());
        assert_eq!(calls.lock().unwrap().last(), Some(&Call::Close));
    }

    #[tokio::test]
    async fn test_close_failure_after_load_is_an_error() {
        let warehouse = RecordingWarehouse {
            fail_close: true,
            ..Default::default()
        };
        let calls = warehouse.calls.clone();
        let loader = TickersLoader::new(warehouse, "stock_tickers");

        let err = loader.load(rows(2)).await.unwrap_err();

        assert!(err.to_string().contains("Failed to close warehouse session"));
        let calls = calls.lock().unwrap().clone();
        assert!(calls.iter().any(|c| matches!(c, Call::Batch(_, 2))));
        assert_eq!(calls.last(), Some(&Call::Close));
    }

    #[tokio::test]
    async fn test_statement_error_wins_over_close_error() {
        let warehouse = RecordingWarehouse {
            fail_on: Some("INSERT"),
            fail_close: true,
            ..Default::default()
        };
        let calls = warehouse.calls.clone();
        let loader = TickersLoader::new(warehouse, "stock_tickers");

        let err = loader.load(rows(2)).await.unwrap_err();

        assert!(err.to_string().contains("Failed to insert tickers into stock_tickers"));
        assert!(!format!("{:?}", err).contains("session already expired"));
        assert_eq!(calls.lock().unwrap().last(), Some(&Call::Close));
    }

    #[test]
    fn test_statements() {
        let loader = TickersLoader::new(RecordingWarehouse::default(), crate::schema::DEFAULT_TABLE);
        assert_eq!(loader.table(), "stock_tickers");
        assert!(loader.create_table_sql().contains("\"ACTIVE\" BOOLEAN"));
        assert!(loader.insert_sql().ends_with(&format!("({})", vec!["?"; 13].join(", "))));
    }
}
