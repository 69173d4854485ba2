//! CSV market file adapter.
//!
//! Expected header: `market_id,option_a_ratio,total_volume`. Empty cells fall
//! back to the analyzer defaults.

use crate::domain::error::ContrarianError;
use crate::domain::market::MarketData;
use crate::ports::market_port::MarketPort;
use std::fs;
use std::path::PathBuf;

pub struct CsvMarketAdapter {
    path: PathBuf,
}

impl CsvMarketAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn parse(content: &str) -> Result<Vec<MarketData>, ContrarianError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut markets = Vec::new();

        for (index, result) in rdr.records().enumerate() {
            // Row 1 is the header.
            let row = index + 2;
            let record = result.map_err(|e| ContrarianError::MarketData {
                reason: format!("CSV parse error: {}", e),
            })?;

            let market_id = record
                .get(0)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            let option_a_ratio = parse_optional(record.get(1), "option_a_ratio", row)?;
            let total_volume = parse_optional(record.get(2), "total_volume", row)?;

            markets.push(MarketData {
                market_id,
                option_a_ratio,
                total_volume,
            });
        }

        Ok(markets)
    }
}

fn parse_optional(
    cell: Option<&str>,
    column: &str,
    row: usize,
) -> Result<Option<f64>, ContrarianError> {
    match cell.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .map(Some)
            .map_err(|e| ContrarianError::MarketData {
                reason: format!("row {}: invalid {} '{}': {}", row, column, text, e),
            }),
    }
}

impl MarketPort for CsvMarketAdapter {
    fn fetch_markets(&self) -> Result<Vec<MarketData>, ContrarianError> {
        let content = fs::read_to_string(&self.path).map_err(|e| ContrarianError::MarketData {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        Self::parse(&content)
    }
}
