//! JSON market input adapter.
//!
//! A document is one market object or an array of them:
//!
//! ```json
//! {"marketId": "BTC-150K", "optionARatio": 0.85, "totalVolume": 15000}
//! ```
//!
//! Missing keys fall back to the analyzer defaults, so `{}` is a valid market.

use crate::domain::error::ContrarianError;
use crate::domain::market::MarketData;
use crate::ports::market_port::MarketPort;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

#[derive(Deserialize)]
#[serde(untagged)]
enum MarketDocument {
    Many(Vec<MarketData>),
    One(MarketData),
}

pub struct JsonMarketAdapter {
    path: PathBuf,
}

impl JsonMarketAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read every market in the document. `source` names the input in errors.
    pub fn read_markets<R: Read>(reader: R, source: &str) -> Result<Vec<MarketData>, ContrarianError> {
        let document: MarketDocument =
            serde_json::from_reader(reader).map_err(|e| ContrarianError::MarketData {
                reason: format!("invalid market JSON in {}: {}", source, e),
            })?;
        Ok(match document {
            MarketDocument::Many(markets) => markets,
            MarketDocument::One(market) => vec![market],
        })
    }

    /// Read a document holding exactly one market.
    pub fn read_market<R: Read>(reader: R, source: &str) -> Result<MarketData, ContrarianError> {
        let mut markets = Self::read_markets(reader, source)?;
        if markets.len() != 1 {
            return Err(ContrarianError::MarketData {
                reason: format!(
                    "{} holds {} markets, expected exactly one",
                    source,
                    markets.len()
                ),
            });
        }
        Ok(markets.remove(0))
    }

    pub fn fetch_market(&self) -> Result<MarketData, ContrarianError> {
        Self::read_market(self.open()?, &self.path.display().to_string())
    }

    fn open(&self) -> Result<BufReader<File>, ContrarianError> {
        File::open(&self.path)
            .map(BufReader::new)
            .map_err(|e| ContrarianError::MarketData {
                reason: format!("failed to read {}: {}", self.path.display(), e),
            })
    }
}

impl MarketPort for JsonMarketAdapter {
    fn fetch_markets(&self) -> Result<Vec<MarketData>, ContrarianError> {
        Self::read_markets(self.open()?, &self.path.display().to_string())
    }
}
