//! Google Sheets sink.
//!
//! Authenticates with a service-account key (signed JWT exchanged for a
//! bearer token), resolves the first worksheet of the spreadsheet, and
//! appends one 14-cell row. The append API has no dedup key, so a retried
//! call after an ambiguous failure can produce a duplicate row.

use super::MetricsSink;
use crate::error::SinkError;
use crate::row::{Cell, DateFormat, MetricsRow};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

// ---------------------------------------------------------------------------
// Service account credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn load(path: &Path) -> Result<Self, SinkError> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            SinkError::Config(format!("cannot read credentials '{}': {e}", path.display()))
        })?;
        serde_json::from_str(&data).map_err(|e| {
            SinkError::Config(format!("malformed credentials '{}': {e}", path.display()))
        })
    }

    /// Signed RS256 assertion for the OAuth2 JWT-bearer grant.
    fn assertion(&self, now: i64) -> Result<String, SinkError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| SinkError::Config(format!("invalid private key: {e}")))?;
        jsonwebtoken::encode(&header, &claims, &key)
            .map_err(|e| SinkError::Config(format!("cannot sign assertion: {e}")))
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

// ---------------------------------------------------------------------------
// API payloads
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
    #[serde(default)]
    index: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    major_dimension: &'static str,
    values: [&'a [Cell]; 1],
}

// ---------------------------------------------------------------------------
// RemoteSheetSink
// ---------------------------------------------------------------------------

/// Appends rows to the first worksheet of one spreadsheet. Appends carry no
/// dedup key: a request that times out after Sheets stored the row is still
/// reported as a failure, and a retry or fallback then writes it again.
#[derive(Debug, Clone)]
pub struct RemoteSheetSink {
    credentials_path: PathBuf,
    spreadsheet_id: String,
    api_base: String,
    timeout: Duration,
    date_format: DateFormat,
}

impl RemoteSheetSink {
    pub fn new(credentials_path: impl Into<PathBuf>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            spreadsheet_id: spreadsheet_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            date_format: DateFormat::default(),
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }

    fn client(&self) -> Result<Client, SinkError> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| SinkError::Config(format!("cannot build http client: {e}")))
    }

    fn spreadsheet_url(&self, tail: &[&str]) -> Result<Url, SinkError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| SinkError::Config(format!("invalid api base '{}': {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| SinkError::Config(format!("invalid api base '{}'", self.api_base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str()])
            .extend(tail);
        Ok(url)
    }

    fn access_token(&self, client: &Client, key: &ServiceAccountKey) -> Result<String, SinkError> {
        let assertion = key.assertion(chrono::Utc::now().timestamp())?;
        let resp = client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    SinkError::Auth {
                        status: status.as_u16(),
                        message: body,
                    }
                }
                s if s.is_server_error() => {
                    SinkError::Transport(format!("token endpoint returned {status}: {body}"))
                }
                _ => SinkError::Destination(format!("token endpoint returned {status}: {body}")),
            });
        }
        let token: TokenResponse = resp
            .json()
            .map_err(|e| SinkError::Auth {
                status: status.as_u16(),
                message: format!("unreadable token response: {e}"),
            })?;
        Ok(token.access_token)
    }

    fn first_worksheet(&self, client: &Client, token: &str) -> Result<String, SinkError> {
        let url = self.spreadsheet_url(&[])?;
        let resp = client
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties(title,index)")])
            .send()?;
        let resp = self.check(resp)?;
        let meta: SpreadsheetMeta = resp
            .json()
            .map_err(|e| SinkError::Destination(format!("unreadable spreadsheet metadata: {e}")))?;
        meta.sheets
            .into_iter()
            .map(|s| s.properties)
            .min_by_key(|p| p.index)
            .map(|p| p.title)
            .ok_or_else(|| {
                SinkError::Destination(format!("spreadsheet {} has no worksheets", self.spreadsheet_id))
            })
    }

    fn append_values(
        &self,
        client: &Client,
        token: &str,
        worksheet: &str,
        cells: &[Cell],
    ) -> Result<(), SinkError> {
        let range = format!("'{}'!A1:append", worksheet.replace('\'', "''"));
        let url = self.spreadsheet_url(&["values", &range])?;
        let body = ValueRange {
            major_dimension: "ROWS",
            values: [cells],
        };
        let resp = client
            .post(url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&body)
            .send()?;
        self.check(resp)?;
        Ok(())
    }

    fn check(
        &self,
        resp: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, SinkError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => {
                SinkError::Destination(format!("spreadsheet {} not found", self.spreadsheet_id))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SinkError::Auth {
                status: status.as_u16(),
                message: body,
            },
            _ => SinkError::Destination(format!("sheets api returned {status}: {body}")),
        })
    }
}

impl MetricsSink for RemoteSheetSink {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn date_format(&self) -> DateFormat {
        self.date_format
    }

    fn try_append(&self, row: &MetricsRow) -> Result<(), SinkError> {
        let key = ServiceAccountKey::load(&self.credentials_path)?;
        let client = self.client()?;
        let token = self.access_token(&client, &key)?;
        let worksheet = self.first_worksheet(&client, &token)?;
        tracing::debug!(spreadsheet = %self.spreadsheet_id, worksheet = %worksheet, "appending row");
        self.append_values(&client, &token, &worksheet, &row.to_fields(self.date_format))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
