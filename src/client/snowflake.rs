//! Snowflake client module
//!
//! Provides `SnowflakeClient`, which opens password-authenticated sessions
//! over Snowflake's session REST endpoints, and `SnowflakeSession`, which
//! runs statements with positional `TEXT` bindings.

use crate::schema::{DEFAULT_TABLE, Row};
use crate::warehouse::{Warehouse, WarehouseSession};

use eyre::{Context, Result, eyre};
use reqwest::{Client, RequestBuilder, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

const CLIENT_APP_ID: &str = "tickerload";

// Statement accepted but still running; poll getResultUrl
const QUERY_IN_PROGRESS: &str = "333333";
const QUERY_IN_PROGRESS_ASYNC: &str = "333334";

const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Snowflake connection settings
///
/// Every field is optional at load time. Missing credentials are reported
/// when a session is opened.
#[derive(Clone, Debug, Default)]
pub struct SnowflakeConfig {
    pub account: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub role: Option<String>,
    /// Explicit base URL, instead of `https://{account}.snowflakecomputing.com`
    pub url: Option<String>,
    /// Destination table for ticker rows
    pub table: String,
}

impl SnowflakeConfig {
    /// Load settings from environment variables
    ///
    /// Expected environment variables:
    /// - SNOWFLAKE_ACCOUNT, SNOWFLAKE_USER, SNOWFLAKE_PASSWORD: required to log in
    /// - SNOWFLAKE_WAREHOUSE, SNOWFLAKE_DATABASE, SNOWFLAKE_SCHEMA, SNOWFLAKE_ROLE: session context
    /// - SNOWFLAKE_TABLE: destination table (optional, defaults to stock_tickers)
    /// - SNOWFLAKE_URL: base URL override (optional)
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            account: var("SNOWFLAKE_ACCOUNT"),
            user: var("SNOWFLAKE_USER"),
            password: var("SNOWFLAKE_PASSWORD"),
            warehouse: var("SNOWFLAKE_WAREHOUSE"),
            database: var("SNOWFLAKE_DATABASE"),
            schema: var("SNOWFLAKE_SCHEMA"),
            role: var("SNOWFLAKE_ROLE"),
            url: var("SNOWFLAKE_URL"),
            table: var("SNOWFLAKE_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        }
    }

    /// Base URL of the account
    pub fn base_url(&self) -> Result<Url> {
        match (&self.url, &self.account) {
            (Some(url), _) => {
                Url::parse(url).with_context(|| format!("Invalid SNOWFLAKE_URL: {}", url))
            }
            (None, Some(account)) => {
                let url = format!("https://{}.snowflakecomputing.com", account);
                Url::parse(&url).with_context(|| format!("Invalid SNOWFLAKE_ACCOUNT: {}", account))
            }
            (None, None) => eyre::bail!("SNOWFLAKE_ACCOUNT environment variable not set"),
        }
    }

    fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
        value
            .as_deref()
            .ok_or_else(|| eyre!("{} environment variable not set", name))
    }

    /// Account name sent at login: the identifier before any region suffix
    fn account_name(&self) -> Result<&str> {
        let account = Self::required(&self.account, "SNOWFLAKE_ACCOUNT")?;
        Ok(account.split('.').next().unwrap_or(account))
    }

    fn login_body(&self) -> Result<Value> {
        Ok(json!({
            "data": {
                "CLIENT_APP_ID": CLIENT_APP_ID,
                "CLIENT_APP_VERSION": env!("CARGO_PKG_VERSION"),
                "ACCOUNT_NAME": self.account_name()?,
                "LOGIN_NAME": Self::required(&self.user, "SNOWFLAKE_USER")?,
                "PASSWORD": Self::required(&self.password, "SNOWFLAKE_PASSWORD")?,
                "SESSION_PARAMETERS": {
                    "CLIENT_TELEMETRY_ENABLED": false
                }
            }
        }))
    }

    fn login_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("requestId", Uuid::new_v4().to_string())];
        let context = [
            ("warehouse", &self.warehouse),
            ("databaseName", &self.database),
            ("schemaName", &self.schema),
            ("roleName", &self.role),
        ];
        for (key, value) in context {
            if let Some(value) = value {
                params.push((key, value.clone()));
            }
        }
        params
    }
}

/// Envelope shared by every Snowflake session endpoint
#[derive(Debug, Deserialize)]
struct SnowflakeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl SnowflakeResponse {
    fn in_progress(&self) -> bool {
        matches!(
            self.code.as_deref(),
            Some(QUERY_IN_PROGRESS) | Some(QUERY_IN_PROGRESS_ASYNC)
        )
    }

    fn result_url(&self) -> Option<&str> {
        self.data.as_ref()?.get("getResultUrl")?.as_str()
    }

    fn into_data<T: DeserializeOwned>(self, action: &str) -> Result<T> {
        if !self.success {
            eyre::bail!(
                "Snowflake {} failed ({}): {}",
                action,
                self.code.unwrap_or_default(),
                self.message.unwrap_or_default()
            );
        }
        let data = self.data.unwrap_or_else(|| json!({}));
        serde_json::from_value(data)
            .with_context(|| format!("Unexpected Snowflake {} response", action))
    }
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    #[serde(default)]
    query_id: Option<String>,
}

/// Send a request and parse the Snowflake response envelope
async fn send(request: RequestBuilder) -> Result<SnowflakeResponse> {
    let response = request
        .send()
        .await
        .map_err(|e| eyre!("Failed to send request: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        eyre::bail!("Snowflake request failed ({}): {}", status, body);
    }

    response
        .json()
        .await
        .with_context(|| "Failed to parse Snowflake response")
}

/// Build positional array bindings, one `TEXT` array per column
fn batch_bindings(rows: &[Row]) -> Result<Value> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    let mut bindings = Map::new();
    for col in 0..width {
        let values = rows
            .iter()
            .map(|row| {
                row.get(col)
                    .cloned()
                    .ok_or_else(|| eyre!("Row has {} values, expected {}", row.len(), width))
            })
            .collect::<Result<Vec<_>>>()?;
        bindings.insert(
            (col + 1).to_string(),
            json!({"type": "TEXT", "value": values}),
        );
    }
    Ok(Value::Object(bindings))
}

/// Snowflake client for opening sessions
///
/// # Example
/// ```no_run
/// use tickerload::client::{SnowflakeClient, SnowflakeConfig};
/// use tickerload::warehouse::{Warehouse, WarehouseSession};
///
/// # async fn example() -> eyre::Result<()> {
/// let client = SnowflakeClient::try_new(SnowflakeConfig::from_env())?;
/// let mut session = client.connect().await?;
/// session.execute("SELECT 1").await?;
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SnowflakeClient {
    client: Client,
    config: SnowflakeConfig,
}

impl SnowflakeClient {
    /// Create a new client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn try_new(config: SnowflakeConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, "application/snowflake".parse()?);
        headers.insert(
            header::USER_AGENT,
            format!("{}/{}", CLIENT_APP_ID, env!("CARGO_PKG_VERSION")).parse()?,
        );
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SnowflakeConfig {
        &self.config
    }

    /// Log in and return an open session
    async fn login(&self) -> Result<SnowflakeSession> {
        let base_url = self.config.base_url()?;
        let body = self.config.login_body()?;

        log::info!(
            "Connecting to Snowflake as {} at {}",
            self.config.user.as_deref().unwrap_or_default(),
            base_url
        );

        let request = self
            .client
            .post(base_url.join("session/v1/login-request")?)
            .query(&self.config.login_params())
            .json(&body);
        let login: LoginData = send(request).await?.into_data("login")?;

        Ok(SnowflakeSession {
            client: self.client.clone(),
            base_url,
            token: login.token,
            sequence_id: 0,
        })
    }
}

impl Warehouse for SnowflakeClient {
    type Session = SnowflakeSession;

    async fn connect(&self) -> Result<Self::Session> {
        self.login().await
    }
}

impl std::fmt::Display for SnowflakeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.config.base_url() {
            Ok(url) => write!(f, "{} (table: {})", url, self.config.table),
            Err(_) => write!(f, "<unconfigured> (table: {})", self.config.table),
        }
    }
}

/// An authenticated Snowflake session
pub struct SnowflakeSession {
    client: Client,
    base_url: Url,
    token: String,
    sequence_id: u64,
}

impl SnowflakeSession {
    fn authorization(&self) -> String {
        format!("Snowflake Token=\"{}\"", self.token)
    }

    /// Submit a statement and wait for it to finish
    async fn query(&mut self, sql: &str, bindings: Option<Value>) -> Result<QueryData> {
        self.sequence_id += 1;
        let mut body = json!({
            "sqlText": sql,
            "asyncExec": false,
            "sequenceId": self.sequence_id,
            "querySubmissionTime": chrono::Utc::now().timestamp_millis(),
        });
        if let Some(bindings) = bindings {
            body["bindings"] = bindings;
        }

        log::debug!("Executing: {}", sql);
        let request_id = Uuid::new_v4().to_string();
        let request = self
            .client
            .post(self.base_url.join("queries/v1/query-request")?)
            .query(&[("requestId", request_id.as_str())])
            .header(header::AUTHORIZATION, self.authorization())
            .json(&body);
        let mut response = send(request).await?;

        while response.in_progress() {
            let result_url = response
                .result_url()
                .ok_or_else(|| eyre!("Snowflake query still running without a result URL"))?;
            let url = self.base_url.join(result_url)?;
            log::trace!("Query in progress, polling {}", url.path());
            tokio::time::sleep(RESULT_POLL_INTERVAL).await;
            let request = self
                .client
                .get(url)
                .header(header::AUTHORIZATION, self.authorization());
            response = send(request).await?;
        }

        let data: QueryData = response.into_data("query")?;
        if let Some(query_id) = &data.query_id {
            log::debug!("Query {} complete", query_id);
        }
        Ok(data)
    }
}

impl WarehouseSession for SnowflakeSession {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.query(sql, None).await?;
        Ok(())
    }

    async fn execute_batch(&mut self, sql: &str, rows: &[Row]) -> Result<usize> {
        let bindings = batch_bindings(rows)?;
        self.query(sql, Some(bindings)).await?;
        Ok(rows.len())
    }

    async fn close(self) -> Result<()> {
        let request_id = Uuid::new_v4().to_string();
        let request = self
            .client
            .post(self.base_url.join("session")?)
            .query(&[("delete", "true"), ("requestId", request_id.as_str())])
            .header(header::AUTHORIZATION, self.authorization());
        let _: Value = send(request).await?.into_data("logout")?;
        Ok(())
    }
}
