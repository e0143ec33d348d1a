//! Warehouse destination for ticker rows
//!
//! [`Warehouse`] opens sessions; a [`WarehouseSession`] runs statements and
//! must be closed explicitly. [`TickersLoader`] drives both to create the
//! ticker table and batch-insert every row.

mod loader;

pub use loader::TickersLoader;

use crate::schema::Row;
use eyre::Result;
use std::future::Future;

/// A SQL warehouse that sessions can be opened against
pub trait Warehouse: Send + Sync {
    /// Session type returned by [`connect`](Self::connect)
    type Session: WarehouseSession;

    /// Open (authenticate) a new session
    ///
    /// # Errors
    /// Returns an error on missing credentials, network failure, or rejected login
    fn connect(&self) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// An open warehouse session
pub trait WarehouseSession: Send {
    /// Execute a statement without bind parameters
    fn execute(&mut self, sql: &str) -> impl Future<Output = Result<()>> + Send;

    /// Execute a positional-parameter statement once per row, as one batch
    ///
    /// Returns the number of rows submitted
    fn execute_batch(
        &mut self,
        sql: &str,
        rows: &[Row],
    ) -> impl Future<Output = Result<usize>> + Send;

    /// Release the session
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}
