use crate::config::Settings;
use crate::domain::goal::InflationRate;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_RETRIES: u32 = 1;
const CACHE_FILE_NAME: &str = "worldbank_inflation.json";
const MAX_BACKOFF_SHIFT: u32 = 6;

#[async_trait::async_trait]
pub trait InflationRateProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_inflation(&self) -> Result<InflationRate>;
}

/// Annual CPI inflation from the World Bank indicators API, cached on disk.
#[derive(Debug, Clone)]
pub struct WorldBankInflationProvider {
    http: reqwest::Client,
    url: String,
    retries: u32,
    cache_path: Option<PathBuf>,
    cache_ttl: Duration,
}

#[derive(Debug, Clone, Deserialize)]
struct WorldBankRecord {
    date: String,
    value: Option<f64>,
}

impl WorldBankInflationProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout_secs = std::env::var("INFLATION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("INFLATION_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build inflation http client")?;

        Ok(Self {
            http,
            url: settings.world_bank_inflation_url.clone(),
            retries,
            cache_path: Some(settings.cache_dir.join(CACHE_FILE_NAME)),
            cache_ttl: Duration::from_secs(settings.cache_ttl_inflation_seconds),
        })
    }

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            retries: 1,
            cache_path: None,
            cache_ttl: Duration::ZERO,
        }
    }

    pub fn with_cache(mut self, path: impl Into<PathBuf>, ttl: Duration) -> Self {
        self.cache_path = Some(path.into());
        self.cache_ttl = ttl;
        self
    }

    /// Fetches from the network, ignoring any cached value, and refreshes the cache.
    pub async fn refresh(&self) -> Result<InflationRate> {
        let rate = self.fetch_with_retries().await?;
        if let Some(path) = &self.cache_path {
            if let Err(err) = write_cache(path, &rate).await {
                tracing::warn!(path = %path.display(), error = %err, "failed to write inflation cache");
            }
        }
        Ok(rate)
    }

    async fn fetch_with_retries(&self) -> Result<InflationRate> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once().await {
                Ok(rate) => return Ok(rate),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = retry_backoff(attempt);
                    tracing::warn!(attempt, ?backoff, error = %err, "inflation fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn fetch_once(&self) -> Result<InflationRate> {
        let res = self
            .http
            .get(self.url.as_str())
            .send()
            .await
            .context("world bank request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read world bank response")?;

        anyhow::ensure!(status.is_success(), "world bank HTTP {status}: {text}");

        let raw = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("world bank response is not valid JSON: {text}"))?;
        parse_latest(raw)
    }

    async fn cached(&self) -> Option<InflationRate> {
        let path = self.cache_path.as_deref()?;
        match read_cache(path, self.cache_ttl).await {
            Ok(rate) => rate,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable inflation cache");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl InflationRateProvider for WorldBankInflationProvider {
    fn provider_name(&self) -> &'static str {
        "worldbank"
    }

    async fn fetch_inflation(&self) -> Result<InflationRate> {
        if let Some(rate) = self.cached().await {
            tracing::debug!(percent = rate.percent, year = rate.year, "using cached inflation rate");
            return Ok(rate);
        }
        self.refresh().await
    }
}

/// The indicators API answers `[page_meta, [records...]]`, newest year first; the
/// latest year may not be published yet and carries a null value.
fn parse_latest(raw: Value) -> Result<InflationRate> {
    let (_meta, records) = serde_json::from_value::<(Value, Option<Vec<WorldBankRecord>>)>(raw)
        .context("unexpected world bank response shape")?;

    let latest = records
        .unwrap_or_default()
        .into_iter()
        .find_map(|r| r.value.map(|v| (r.date, v)))
        .context("no recent inflation value found")?;

    let (date, percent) = latest;
    let year = date
        .trim()
        .parse::<i32>()
        .with_context(|| format!("invalid world bank record date: {date}"))?;

    Ok(InflationRate {
        percent,
        source: "worldbank".to_string(),
        year,
        fetched_at: Utc::now(),
    })
}

async fn read_cache(path: &Path, ttl: Duration) -> Result<Option<InflationRate>> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).context("failed to stat inflation cache"),
    };

    let modified = meta.modified().context("cache mtime unavailable")?;
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);
    if age >= ttl {
        return Ok(None);
    }

    let bytes = tokio::fs::read(path)
        .await
        .context("failed to read inflation cache")?;
    let rate = serde_json::from_slice::<InflationRate>(&bytes)
        .context("inflation cache is not a valid rate")?;
    Ok(Some(rate))
}

async fn write_cache(path: &Path, rate: &InflationRate) -> Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create cache dir {}", dir.display()))?;
    }
    let body = serde_json::to_vec_pretty(rate)?;
    tokio::fs::write(path, body)
        .await
        .context("failed to write inflation cache")?;
    Ok(())
}

/// 1s, 2s, 4s, ... capped at 64s.
fn retry_backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT))
}
