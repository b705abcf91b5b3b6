//! Upstream price feed clients and tolerant payload normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_OFFICIAL_URL: &str = "http://localhost:5001/api/official_prices";
pub const DEFAULT_MARKET_URL: &str = "https://prices.runescape.wiki/api/v1/osrs/latest";
pub const DEFAULT_USER_AGENT: &str =
    "coffer-table - https://github.com/EwbiDev/osrs-coffer-utility";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub official_url: String,
    pub market_url: String,
    pub user_agent: String,
    pub http_timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            official_url: DEFAULT_OFFICIAL_URL.to_string(),
            market_url: DEFAULT_MARKET_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("http client build failed: {0}")]
    ClientBuild(String),
    #[error("feed request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("feed response from {url} is not valid JSON: {message}")]
    InvalidJson { url: String, message: String },
}

/// One item from the official feed: metadata plus the last official trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetadataRecord {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub volume: i64,
    #[serde(default)]
    pub examine: Option<String>,
    #[serde(default)]
    pub members: bool,
    #[serde(default)]
    pub lowalch: Option<i64>,
    #[serde(default)]
    pub highalch: Option<i64>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// One item from the market feed, keyed upstream by identifier-as-text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMarketRecord {
    pub id: i64,
    pub high: Option<i64>,
    pub high_time: Option<i64>,
    pub low: Option<i64>,
    pub low_time: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct MarketPoint {
    #[serde(default)]
    high: Option<i64>,
    #[serde(default, rename = "highTime")]
    high_time: Option<i64>,
    #[serde(default)]
    low: Option<i64>,
    #[serde(default, rename = "lowTime")]
    low_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetadataNormalizeReport {
    pub records: Vec<RawMetadataRecord>,
    pub skipped_keys: u64,
    pub skipped_records: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarketNormalizeReport {
    pub records: Vec<RawMarketRecord>,
    pub skipped_keys: u64,
    pub skipped_records: u64,
}

/// Flattens the official payload, which may arrive either as an array of
/// records or as a mapping keyed by identifier text. Mapping keys that do not
/// parse as integers are auxiliary noise and are skipped, not errors; when the
/// key parses, it is authoritative over any `id` inside the value.
pub fn normalize_metadata(payload: &Value) -> MetadataNormalizeReport {
    let mut report = MetadataNormalizeReport::default();

    match payload {
        Value::Array(entries) => {
            for entry in entries {
                match serde_json::from_value::<RawMetadataRecord>(entry.clone()) {
                    Ok(record) => report.records.push(record),
                    Err(_) => report.skipped_records += 1,
                }
            }
        }
        Value::Object(entries) => {
            for (key, entry) in entries {
                let Ok(id) = key.parse::<i64>() else {
                    report.skipped_keys += 1;
                    continue;
                };
                match serde_json::from_value::<RawMetadataRecord>(entry.clone()) {
                    Ok(mut record) => {
                        record.id = id;
                        report.records.push(record);
                    }
                    Err(_) => report.skipped_records += 1,
                }
            }
        }
        _ => {}
    }

    log_skips("official", report.skipped_keys, report.skipped_records);
    report
}

/// Flattens the market payload: an optional `data` envelope around a mapping
/// from identifier text to high/low points. Non-numeric keys are skipped.
pub fn normalize_market(payload: &Value) -> MarketNormalizeReport {
    let mut report = MarketNormalizeReport::default();
    let body = payload.get("data").unwrap_or(payload);

    if let Value::Object(entries) = body {
        for (key, entry) in entries {
            let Ok(id) = key.parse::<i64>() else {
                report.skipped_keys += 1;
                continue;
            };
            match serde_json::from_value::<MarketPoint>(entry.clone()) {
                Ok(point) => report.records.push(RawMarketRecord {
                    id,
                    high: point.high,
                    high_time: point.high_time,
                    low: point.low,
                    low_time: point.low_time,
                }),
                Err(_) => report.skipped_records += 1,
            }
        }
    }

    log_skips("market", report.skipped_keys, report.skipped_records);
    report
}

fn log_skips(feed: &str, skipped_keys: u64, skipped_records: u64) {
    if skipped_keys > 0 || skipped_records > 0 {
        warn!(
            component = "feeds",
            event = "feeds.normalize.skipped",
            feed,
            skipped_keys,
            skipped_records
        );
    }
}

pub trait FeedHttp: Send + Sync {
    fn get_json(&self, url: &str) -> Result<Value, FeedError>;
}

pub struct ReqwestBlockingFeed {
    client: reqwest::blocking::Client,
}

impl ReqwestBlockingFeed {
    pub fn new(cfg: &FeedConfig) -> Result<Self, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.http_timeout_ms))
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(|err| FeedError::ClientBuild(err.to_string()))?;
        Ok(Self { client })
    }
}

impl FeedHttp for ReqwestBlockingFeed {
    fn get_json(&self, url: &str) -> Result<Value, FeedError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| FeedError::Request {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Request {
                url: url.to_string(),
                message: format!("unexpected HTTP status {status}"),
            });
        }

        let bytes = response.bytes().map_err(|err| FeedError::Request {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|err| FeedError::InvalidJson {
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}

pub fn fetch_official(http: &dyn FeedHttp, cfg: &FeedConfig) -> Result<Value, FeedError> {
    http.get_json(&cfg.official_url)
}

pub fn fetch_market(http: &dyn FeedHttp, cfg: &FeedConfig) -> Result<Value, FeedError> {
    http.get_json(&cfg.market_url)
}
