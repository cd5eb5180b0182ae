//! # Resource Models
//!
//! Typed public shapes for the security code resources.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::Document;

use super::errors::{RestError, RestResult};
use super::translation::MARKET_FIELD;

/// Base path of the code collection resource
pub const CODES_URI: &str = "/codes";

/// Market classification filter for code listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Market {
    /// Every market (`"0"`)
    #[default]
    All,
    /// KOSPI (`"1"`)
    Kospi,
    /// KOSDAQ (`"2"`)
    Kosdaq,
}

impl Market {
    /// Parse the `market` query value; anything but `0`, `1`, `2` is rejected
    pub fn parse(raw: &str) -> RestResult<Self> {
        match raw {
            "0" => Ok(Market::All),
            "1" => Ok(Market::Kospi),
            "2" => Ok(Market::Kosdaq),
            other => Err(RestError::InvalidQueryParam(format!(
                "market must be one of 0, 1, 2 (got '{}')",
                other
            ))),
        }
    }

    /// Stored market code
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::All => "0",
            Market::Kospi => "1",
            Market::Kosdaq => "2",
        }
    }

    /// Store filter selecting this market's records
    pub fn filter(&self) -> Value {
        match self {
            Market::All => json!({}),
            market => json!({ MARKET_FIELD: market.as_str() }),
        }
    }
}

/// Query string of `GET /codes`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeListQuery {
    #[serde(default)]
    pub market: Option<String>,
}

impl CodeListQuery {
    /// Selected market, defaulting to all
    pub fn market(&self) -> RestResult<Market> {
        match self.market.as_deref() {
            None => Ok(Market::All),
            Some(raw) => Market::parse(raw),
        }
    }
}

/// One security code, in the public schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeRecord {
    pub code: Option<String>,
    pub extend_code: Option<String>,
    pub name: Option<String>,
    /// Order quantity unit; 0 when absent or not a number
    pub memedan: i64,
    pub market: Option<String>,
    pub is_etf: Option<String>,
    pub is_spac: Option<String>,
    /// Self link
    pub uri: String,
}

impl CodeRecord {
    /// Shape a projected record. Missing text fields render as `null`.
    pub fn from_projected(projected: &Document) -> Self {
        let text = |name: &str| projected.get(name).and_then(as_text);
        let code = text("code");
        let uri = match &code {
            Some(code) => format!("{}/{}", CODES_URI, code),
            None => CODES_URI.to_string(),
        };

        Self {
            extend_code: text("extend_code"),
            name: text("name"),
            memedan: projected.get("memedan").and_then(as_integer).unwrap_or(0),
            market: text("market"),
            is_etf: text("is_etf"),
            is_spac: text("is_spac"),
            code,
            uri,
        }
    }
}

/// Body of `GET /codes`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeListResponse {
    pub code_list: Vec<CodeRecord>,
    pub count: usize,
    pub uri: String,
}

impl CodeListResponse {
    pub fn new(code_list: Vec<CodeRecord>) -> Self {
        Self {
            count: code_list.len(),
            code_list,
            uri: CODES_URI.to_string(),
        }
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
