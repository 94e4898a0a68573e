use crate::config::Settings;
use crate::domain::market::{IndexQuote, MarketSummary};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::time::{Duration, Instant};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[async_trait::async_trait]
pub trait MarketDataClient: Send + Sync {
    async fn index_summary(&self) -> MarketSummary;
}

/// Fixed quotes, used when live market data is switched off.
pub fn mock_summary() -> MarketSummary {
    MarketSummary {
        nifty_50: IndexQuote {
            symbol: "^NSEI".to_string(),
            last_price: 22400.5,
            currency: "INR".to_string(),
        },
        sensex: IndexQuote {
            symbol: "^BSESN".to_string(),
            last_price: 74000.3,
            currency: "INR".to_string(),
        },
    }
}

#[derive(Debug)]
pub struct YahooMarketClient {
    http: reqwest::Client,
    nifty_url: String,
    sensex_url: String,
    use_mock: bool,
    cache_ttl: Duration,

    // Last summary served, shared by all requests of this process.
    cache: tokio::sync::Mutex<Option<CachedSummary>>,
}

#[derive(Debug, Clone)]
struct CachedSummary {
    summary: MarketSummary,
    fetched_at: Instant,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    regular_market_price: f64,
    currency: String,
}

impl YahooMarketClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout_secs = std::env::var("MARKET_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build market http client")?;

        Ok(Self {
            http,
            nifty_url: settings.yf_nifty_url.clone(),
            sensex_url: settings.yf_sensex_url.clone(),
            use_mock: settings.use_mock_market,
            cache_ttl: Duration::from_secs(settings.cache_ttl_market_seconds),
            cache: tokio::sync::Mutex::new(None),
        })
    }

    pub fn new(nifty_url: impl Into<String>, sensex_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            nifty_url: nifty_url.into(),
            sensex_url: sensex_url.into(),
            use_mock: false,
            cache_ttl: Duration::ZERO,
            cache: tokio::sync::Mutex::new(None),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers
    }

    /// A quote that cannot be fetched is reported as unavailable rather than failing
    /// the whole summary.
    pub async fn fetch_index(&self, url: &str) -> IndexQuote {
        match self.fetch_index_once(url).await {
            Ok(quote) => quote,
            Err(err) => {
                tracing::warn!(%url, error = %err, "market index fetch failed");
                IndexQuote::unavailable()
            }
        }
    }

    async fn fetch_index_once(&self, url: &str) -> Result<IndexQuote> {
        let res = self
            .http
            .get(url)
            .headers(Self::headers())
            .send()
            .await
            .context("market request failed")?;

        let status = res.status();
        anyhow::ensure!(status.is_success(), "market HTTP {status}");

        let parsed = res
            .json::<ChartResponse>()
            .await
            .context("failed to parse chart response")?;

        let meta = parsed
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .map(|r| r.meta)
            .context("chart response has no result")?;

        Ok(IndexQuote {
            symbol: meta.symbol,
            last_price: meta.regular_market_price,
            currency: meta.currency,
        })
    }
}

#[async_trait::async_trait]
impl MarketDataClient for YahooMarketClient {
    async fn index_summary(&self) -> MarketSummary {
        if self.use_mock {
            return mock_summary();
        }

        let mut guard = self.cache.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.fetched_at.elapsed() < self.cache_ttl {
                return cached.summary.clone();
            }
        }

        let (nifty_50, sensex) = tokio::join!(
            self.fetch_index(&self.nifty_url),
            self.fetch_index(&self.sensex_url)
        );
        let summary = MarketSummary { nifty_50, sensex };

        // Partial summaries are served but never cached, so the next call retries.
        if summary.is_complete() {
            *guard = Some(CachedSummary {
                summary: summary.clone(),
                fetched_at: Instant::now(),
            });
        }
        summary
    }
}
