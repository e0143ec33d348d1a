//! CLI helper functions

use crate::{
    client::{PolygonClient, PolygonConfig, SnowflakeClient, SnowflakeConfig},
    etl::{Extractor, IdentityTransformer, Pipeline},
    polygon::{TickersExtractor, TickersQuery},
    schema,
    storage::{NdjsonReader, NdjsonWriter},
    ticker::TickerRecord,
    transform::RowProjector,
    warehouse::{TickersLoader, Warehouse},
};
use chrono::NaiveDate;
use eyre::{Context, Result};
use std::path::Path;

/// Source a dotenv file into the process environment
///
/// Returns `false` when the file does not exist. A file that exists but
/// cannot be read or parsed is an error.
pub fn load_dotenv(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match dotenvy::from_filename(path) {
        Ok(_) => Ok(true),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to load env file {}", path.display())),
    }
}

/// Options for commands that fetch from Polygon.io
#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
    /// Page size (defaults to 1000)
    pub limit: Option<u32>,
    /// Run date to stamp instead of today, as YYYY-MM-DD
    pub run_date: Option<String>,
}

/// Build the tickers extractor from environment variables
///
/// Expected environment variables:
/// - POLYGON_API_KEY: API key (required once fetching starts)
/// - POLYGON_BASE_URL: API base URL (optional)
pub fn load_tickers_extractor(options: &FetchOptions) -> Result<TickersExtractor<PolygonClient>> {
    let config = PolygonConfig::from_env()?;
    let mut query = TickersQuery::from_config(&config);
    if let Some(limit) = options.limit {
        query = query.with_limit(limit);
    }

    let client = PolygonClient::try_new(config).context("Failed to create Polygon client")?;
    let mut extractor = TickersExtractor::new(client, query);

    if let Some(run_date) = &options.run_date {
        NaiveDate::parse_from_str(run_date, "%Y-%m-%d")
            .with_context(|| format!("Invalid run date '{}', expected YYYY-MM-DD", run_date))?;
        extractor = extractor.with_run_date(run_date);
    }

    Ok(extractor)
}

/// Build the Snowflake tickers loader from environment variables
///
/// Credentials are not checked here; they are required when the loader
/// opens its session.
pub fn load_tickers_loader() -> Result<TickersLoader<SnowflakeClient>> {
    let config = SnowflakeConfig::from_env();
    let table = config.table.clone();
    let client = SnowflakeClient::try_new(config).context("Failed to create Snowflake client")?;
    log::debug!("Warehouse: {}", client);
    Ok(TickersLoader::new(client, table))
}

/// Pipeline from ticker records into the ticker table
///
/// The loader runs even when no tickers were extracted, so the table is
/// created on every successful run.
pub fn tickers_pipeline<E, W>(
    extractor: E,
    loader: TickersLoader<W>,
) -> Pipeline<E, RowProjector, TickersLoader<W>>
where
    E: Extractor<Item = TickerRecord>,
    W: Warehouse,
{
    Pipeline::new(extractor, RowProjector::default(), loader).always_load()
}

/// Fetch every ticker from Polygon.io and load it into Snowflake
///
/// Pipeline: TickersExtractor → RowProjector → TickersLoader
pub async fn run_job(options: &FetchOptions) -> Result<usize> {
    let extractor = load_tickers_extractor(options)?;
    let loader = load_tickers_loader()?;

    log::info!("Loading tickers into table {}", loader.table());
    let count = tickers_pipeline(extractor, loader).run().await?;

    log::info!("✓ Loaded {} ticker(s)", count);
    Ok(count)
}

/// Fetch every ticker and write an NDJSON snapshot, without touching the warehouse
///
/// Pipeline: TickersExtractor → IdentityTransformer → NdjsonWriter
pub async fn fetch_to_ndjson(output: impl AsRef<Path>, options: &FetchOptions) -> Result<usize> {
    let output = output.as_ref();
    let extractor = load_tickers_extractor(options)?;

    let pipeline = Pipeline::new(
        extractor,
        IdentityTransformer::<TickerRecord>::new(),
        NdjsonWriter::new(output),
    );
    let count = pipeline.run().await?;

    log::info!("✓ Fetched {} ticker(s) to {}", count, output.display());
    Ok(count)
}

/// Load an NDJSON snapshot written by `fetch` into Snowflake
///
/// Pipeline: NdjsonReader → RowProjector → TickersLoader
pub async fn load_from_ndjson(input: impl AsRef<Path>) -> Result<usize> {
    let input = input.as_ref();
    if !input.exists() {
        eyre::bail!("Snapshot file not found: {}", input.display());
    }

    let loader = load_tickers_loader()?;
    log::info!(
        "Loading {} into table {}",
        input.display(),
        loader.table()
    );

    let count = tickers_pipeline(NdjsonReader::new(input), loader)
        .run()
        .await?;

    log::info!("✓ Loaded {} ticker(s)", count);
    Ok(count)
}

/// The CREATE TABLE statement for the configured destination table
pub fn create_table_statement() -> String {
    let table = SnowflakeConfig::from_env().table;
    schema::create_table_sql(&table, &schema::column_names())
}
