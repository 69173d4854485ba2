#![allow(dead_code)]

use contrarian::domain::error::ContrarianError;
pub use contrarian::domain::market::{AnalysisResult, MarketData, Recommendation};
use contrarian::ports::market_port::MarketPort;
use std::io::Write;
use tempfile::NamedTempFile;

pub struct MockMarketPort {
    pub markets: Vec<MarketData>,
    pub error: Option<String>,
}

impl MockMarketPort {
    pub fn new(markets: Vec<MarketData>) -> Self {
        Self {
            markets,
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            markets: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl MarketPort for MockMarketPort {
    fn fetch_markets(&self) -> Result<Vec<MarketData>, ContrarianError> {
        match &self.error {
            Some(reason) => Err(ContrarianError::MarketData {
                reason: reason.clone(),
            }),
            None => Ok(self.markets.clone()),
        }
    }
}

pub const EXTRA_RULES: &str = "\
; Momentum rules shipped alongside the built-ins.
(= (momentum $delta)
   (if (> $delta 0) rising
       falling))

(market-type binary)
(settlement \"on-chain oracle\")
";

pub fn write_temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn market(ratio: f64, volume: f64) -> MarketData {
    MarketData::new(ratio, volume)
}

pub fn sample_markets() -> Vec<MarketData> {
    vec![
        MarketData::new(0.85, 15000.0).with_market_id("BTC-150K"),
        MarketData::new(0.25, 8000.0).with_market_id("ETH-7K"),
        MarketData::new(0.55, 500.0).with_market_id("SOL-300"),
    ]
}
