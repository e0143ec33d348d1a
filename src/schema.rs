//! Destination table schema for ticker reference rows
//!
//! A single ordered column list drives both the `CREATE TABLE` statement and
//! the order in which values are pulled out of each [`TickerRecord`].
//!
//! [`TickerRecord`]: crate::ticker::TickerRecord

use std::fmt;

/// One row of insert values, in column order
pub type Row = Vec<String>;

/// Default destination table when `SNOWFLAKE_TABLE` is not set
pub const DEFAULT_TABLE: &str = "stock_tickers";

/// Warehouse column types used by the ticker table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Varchar,
    Boolean,
    TimestampNtz,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Varchar => "VARCHAR",
            Self::Boolean => "BOOLEAN",
            Self::TimestampNtz => "TIMESTAMP_NTZ",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// A named, typed column of the ticker table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
}

impl Column {
    const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self { name, column_type }
    }
}

/// Ticker table columns, in insert order
pub const TICKER_COLUMNS: [Column; 13] = [
    Column::new("ticker", ColumnType::Varchar),
    Column::new("name", ColumnType::Varchar),
    Column::new("market", ColumnType::Varchar),
    Column::new("locale", ColumnType::Varchar),
    Column::new("primary_exchange", ColumnType::Varchar),
    Column::new("type", ColumnType::Varchar),
    Column::new("active", ColumnType::Boolean),
    Column::new("currency_name", ColumnType::Varchar),
    Column::new("cik", ColumnType::Varchar),
    Column::new("composite_figi", ColumnType::Varchar),
    Column::new("share_class_figi", ColumnType::Varchar),
    Column::new("last_updated_utc", ColumnType::TimestampNtz),
    Column::new("ds", ColumnType::Varchar),
];

/// Column names of the ticker table, in insert order
pub fn column_names() -> Vec<&'static str> {
    TICKER_COLUMNS.iter().map(|c| c.name).collect()
}

/// Warehouse type for a column name; unknown columns are `VARCHAR`
pub fn column_type(name: &str) -> ColumnType {
    TICKER_COLUMNS
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.column_type)
        .unwrap_or(ColumnType::Varchar)
}

/// Build the `CREATE TABLE IF NOT EXISTS` statement for the given columns
///
/// Column identifiers are upper-cased and double-quoted.
pub fn create_table_sql(table: &str, columns: &[&str]) -> String {
    let definitions = columns
        .iter()
        .map(|col| format!("\"{}\" {}", col.to_uppercase(), column_type(col)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {} ( {} )", table, definitions)
}

/// Build the positional-parameter `INSERT` statement for the given columns
pub fn insert_sql(table: &str, columns: &[&str]) -> String {
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    )
}
