//! Ticker reference records as returned by the Polygon.io reference API

use crate::schema::Row;

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

/// One reference entry for a tradable security
///
/// Provider fields outside this struct are ignored when a page is parsed.
/// `ds` is the run date stamped on the record by the extractor.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TickerRecord {
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub primary_exchange: Option<String>,
    #[serde(default, rename = "type")] // type is a Rust keyword
    pub instrument_type: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub currency_name: Option<String>,
    #[serde(default)]
    pub cik: Option<String>,
    #[serde(default)]
    pub composite_figi: Option<String>,
    #[serde(default)]
    pub share_class_figi: Option<String>,
    #[serde(default)]
    pub last_updated_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ds: Option<String>,
}

impl TickerRecord {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: None,
            market: None,
            locale: None,
            primary_exchange: None,
            instrument_type: None,
            active: None,
            currency_name: None,
            cik: None,
            composite_figi: None,
            share_class_figi: None,
            last_updated_utc: None,
            ds: None,
        }
    }

    /// Return the record stamped with the given run date
    pub fn with_run_date(mut self, ds: &str) -> Self {
        self.ds = Some(ds.to_string());
        self
    }

    /// Text value of a column, or `None` if the record has no value for it
    ///
    /// Booleans render as `true`/`false`, timestamps as naive UTC
    /// `YYYY-MM-DD HH:MM:SS.f`. Unknown columns have no value.
    pub fn value_of(&self, column: &str) -> Option<String> {
        match column {
            "ticker" => Some(self.ticker.clone()),
            "name" => self.name.clone(),
            "market" => self.market.clone(),
            "locale" => self.locale.clone(),
            "primary_exchange" => self.primary_exchange.clone(),
            "type" => self.instrument_type.clone(),
            "active" => self.active.map(|a| a.to_string()),
            "currency_name" => self.currency_name.clone(),
            "cik" => self.cik.clone(),
            "composite_figi" => self.composite_figi.clone(),
            "share_class_figi" => self.share_class_figi.clone(),
            "last_updated_utc" => self
                .last_updated_utc
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            "ds" => self.ds.clone(),
            _ => None,
        }
    }

    /// Extract insert values in column order, substituting `""` for missing values
    pub fn to_row(&self, columns: &[&str]) -> Row {
        columns
            .iter()
            .map(|col| self.value_of(col).unwrap_or_default())
            .collect()
    }
}

/// One page of the reference tickers response
#[derive(Debug, Deserialize)]
pub struct TickerPage {
    pub results: Vec<TickerRecord>,
    #[serde(default)]
    pub next_url: Option<String>,
}

impl TickerPage {
    /// Parse a response body; fails on invalid JSON or a missing `results` array
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).with_context(|| "Failed to parse tickers page")
    }
}
