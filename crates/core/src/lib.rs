pub mod agent;
pub mod domain;
pub mod error;
pub mod finance;
pub mod ingest;
pub mod ledger;
pub mod nlp;
pub mod planner;
pub mod storage;

pub use error::GoalError;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;
    use std::str::FromStr;

    const WORLD_BANK_INFLATION_URL: &str =
        "https://api.worldbank.org/v2/country/IND/indicator/FP.CPI.TOTL.ZG?format=json";
    const YF_NIFTY_URL: &str =
        "https://query1.finance.yahoo.com/v8/finance/chart/%5ENSEI?range=1d&interval=1d";
    const YF_SENSEX_URL: &str =
        "https://query1.finance.yahoo.com/v8/finance/chart/%5EBSESN?range=1d&interval=1d";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub world_bank_inflation_url: String,
        pub fallback_inflation: f64,
        pub cache_ttl_inflation_seconds: u64,
        pub cache_dir: PathBuf,
        pub yf_nifty_url: String,
        pub yf_sensex_url: String,
        pub cache_ttl_market_seconds: u64,
        pub use_mock_market: bool,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                database_url: None,
                sentry_dsn: None,
                world_bank_inflation_url: WORLD_BANK_INFLATION_URL.to_string(),
                fallback_inflation: 6.0,
                cache_ttl_inflation_seconds: 86_400,
                cache_dir: PathBuf::from(".cache"),
                yf_nifty_url: YF_NIFTY_URL.to_string(),
                yf_sensex_url: YF_SENSEX_URL.to_string(),
                cache_ttl_market_seconds: 900,
                use_mock_market: false,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();
            let settings = Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                world_bank_inflation_url: env_string("WORLD_BANK_INFLATION_URL")
                    .unwrap_or(defaults.world_bank_inflation_url),
                fallback_inflation: env_parse("FALLBACK_INFLATION")?
                    .unwrap_or(defaults.fallback_inflation),
                cache_ttl_inflation_seconds: env_parse("CACHE_TTL_INFLATION_SECONDS")?
                    .unwrap_or(defaults.cache_ttl_inflation_seconds),
                cache_dir: env_string("CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.cache_dir),
                yf_nifty_url: env_string("YF_NIFTY_URL").unwrap_or(defaults.yf_nifty_url),
                yf_sensex_url: env_string("YF_SENSEX_URL").unwrap_or(defaults.yf_sensex_url),
                cache_ttl_market_seconds: env_parse("CACHE_TTL_MARKET_SECONDS")?
                    .unwrap_or(defaults.cache_ttl_market_seconds),
                use_mock_market: env_bool("USE_MOCK_MARKET")?.unwrap_or(defaults.use_mock_market),
            };
            settings.validate()?;
            Ok(settings)
        }

        pub fn validate(&self) -> anyhow::Result<()> {
            anyhow::ensure!(
                self.fallback_inflation.is_finite() && self.fallback_inflation > 0.0,
                "FALLBACK_INFLATION must be a positive number (got {})",
                self.fallback_inflation
            );
            Ok(())
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }
    }

    fn env_string(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        env_string(key)
            .map(|s| {
                s.trim()
                    .parse::<T>()
                    .with_context(|| format!("{key} is not a valid value: {s}"))
            })
            .transpose()
    }

    fn env_bool(key: &str) -> anyhow::Result<Option<bool>> {
        let Some(s) = env_string(key) else {
            return Ok(None);
        };
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            other => anyhow::bail!("{key} must be a boolean (got {other})"),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn defaults_are_valid() {
            let settings = Settings::default();
            assert!(settings.validate().is_ok());
            assert_eq!(settings.fallback_inflation, 6.0);
            assert!(!settings.use_mock_market);
        }

        #[test]
        fn rejects_non_positive_fallback() {
            let settings = Settings {
                fallback_inflation: 0.0,
                ..Settings::default()
            };
            assert!(settings.validate().is_err());
        }
    }
}
