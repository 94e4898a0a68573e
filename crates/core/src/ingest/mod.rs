//! Clients for the external data the planner consumes.

pub mod inflation;
pub mod market;

pub use inflation::{InflationRateProvider, WorldBankInflationProvider};
pub use market::{MarketDataClient, YahooMarketClient};
