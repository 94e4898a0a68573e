use serde::{Deserialize, Serialize};

const UNAVAILABLE_SYMBOL: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    pub symbol: String,
    pub last_price: f64,
    pub currency: String,
}

impl IndexQuote {
    /// Returned in place of a quote that could not be fetched.
    pub fn unavailable() -> Self {
        Self {
            symbol: UNAVAILABLE_SYMBOL.to_string(),
            last_price: 0.0,
            currency: "INR".to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.symbol != UNAVAILABLE_SYMBOL
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    #[serde(rename = "NIFTY_50")]
    pub nifty_50: IndexQuote,
    #[serde(rename = "SENSEX")]
    pub sensex: IndexQuote,
}

impl MarketSummary {
    pub fn is_complete(&self) -> bool {
        self.nifty_50.is_available() && self.sensex.is_available()
    }
}
