//! Market input and analysis output records.

use crate::domain::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_OPTION_A_RATIO: f64 = 0.5;
pub const DEFAULT_TOTAL_VOLUME: f64 = 0.0;

/// One market to analyse. Missing fields fall back to a balanced, empty market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_id: Option<String>,
    #[serde(default, rename = "optionARatio")]
    pub option_a_ratio: Option<f64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
}

impl MarketData {
    pub fn new(option_a_ratio: f64, total_volume: f64) -> Self {
        Self {
            market_id: None,
            option_a_ratio: Some(option_a_ratio),
            total_volume: Some(total_volume),
        }
    }

    pub fn with_market_id(mut self, market_id: impl Into<String>) -> Self {
        self.market_id = Some(market_id.into());
        self
    }

    pub fn ratio(&self) -> f64 {
        self.option_a_ratio.unwrap_or(DEFAULT_OPTION_A_RATIO)
    }

    pub fn volume(&self) -> f64 {
        self.total_volume.unwrap_or(DEFAULT_TOTAL_VOLUME)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "BUY_A")]
    BuyA,
    #[serde(rename = "BUY_B")]
    BuyB,
    #[serde(rename = "HOLD")]
    Hold,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::BuyA => "BUY_A",
            Recommendation::BuyB => "BUY_B",
            Recommendation::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY_A" => Ok(Recommendation::BuyA),
            "BUY_B" => Ok(Recommendation::BuyB),
            "HOLD" => Ok(Recommendation::Hold),
            other => Err(format!("unknown recommendation '{}'", other)),
        }
    }
}

/// Outcome of one `analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_id: Option<String>,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub reasoning: String,
    pub risk_level: String,
    pub metta_analysis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrarian_signal: Option<String>,
    pub bindings_snapshot: BTreeMap<String, Value>,
}
