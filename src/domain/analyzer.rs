//! Market analysis orchestration.
//!
//! A [`Reasoner`] owns the knowledge base and evaluator. Each analysis binds
//! `$ratio` and `$volume` in a fresh environment, runs three fixed queries,
//! and derives a confidence score from their symbols. Any failure on that
//! path is replaced by a purely arithmetic fallback, so `analyze` always
//! returns a complete result.

use crate::domain::catalog::{
    HIGH_CONTRARIAN, HIGH_RISK, LOW_CONTRARIAN, LOW_RISK, MEDIUM_CONTRARIAN, MEDIUM_RISK,
};
use crate::domain::error::ContrarianError;
use crate::domain::evaluator::Evaluator;
use crate::domain::knowledge_base::{KnowledgeBase, LoadSummary};
use crate::domain::market::{AnalysisResult, MarketData, Recommendation};
use crate::domain::value::{Bindings, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

pub const CONTRARIAN_QUERY: &str = "(contrarian-signal $ratio)";
pub const RISK_QUERY: &str = "(risk-level $volume $ratio)";
pub const RECOMMENDATION_QUERY: &str = "(betting-recommendation $ratio $volume)";

const BASE_CONFIDENCE: f64 = 0.5;
const HIGH_CONTRARIAN_CONFIDENCE: f64 = 0.8;
const MEDIUM_CONTRARIAN_CONFIDENCE: f64 = 0.6;
const LOW_RISK_MULTIPLIER: f64 = 1.2;
const LOW_RISK_CAP: f64 = 0.95;
const HIGH_RISK_MULTIPLIER: f64 = 0.7;

const FALLBACK_CONFIDENCE_CAP: f64 = 0.8;
const FALLBACK_LOW_RISK_VOLUME: f64 = 10_000.0;

pub struct Reasoner {
    kb: KnowledgeBase,
    evaluator: Evaluator,
}

impl Default for Reasoner {
    fn default() -> Self {
        Self::new()
    }
}

impl Reasoner {
    /// Engine with the built-in market rules only.
    pub fn new() -> Self {
        Self {
            kb: KnowledgeBase::with_builtin_rules(),
            evaluator: Evaluator::new(),
        }
    }

    /// Engine with the built-in rules plus a best-effort load of `path`.
    pub fn with_rule_source<P: AsRef<Path>>(path: P) -> Self {
        let mut reasoner = Self::new();
        reasoner.load_rules(path);
        reasoner
    }

    pub fn load_rules<P: AsRef<Path>>(&mut self, path: P) -> LoadSummary {
        self.kb.load_from_file(path)
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Reason about one market. Never fails: a NaN or infinite ratio or
    /// volume skips the rule queries and goes straight to
    /// [`fallback_analysis`], as does any query error or unexpected signal.
    pub fn analyze(&self, market: &MarketData) -> AnalysisResult {
        match self.reason(market) {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    market_id = market.market_id.as_deref().unwrap_or("-"),
                    error = %e,
                    "reasoning failed, using fallback heuristic"
                );
                fallback_analysis(market)
            }
        }
    }

    pub fn analyze_batch(&self, markets: &[MarketData]) -> Vec<AnalysisResult> {
        let results: Vec<AnalysisResult> = markets.iter().map(|m| self.analyze(m)).collect();
        info!(markets = results.len(), "batch analysis complete");
        results
    }

    fn reason(&self, market: &MarketData) -> Result<AnalysisResult, ContrarianError> {
        let ratio = market.ratio();
        let volume = market.volume();
        if !ratio.is_finite() || !volume.is_finite() {
            return Err(ContrarianError::MarketData {
                reason: format!("non-finite input (ratio {}, volume {})", ratio, volume),
            });
        }

        let env = Bindings::new()
            .with("$ratio", Value::Float(ratio))
            .with("$volume", Value::Float(volume));

        let contrarian = self.first_symbol(CONTRARIAN_QUERY, &env, LOW_CONTRARIAN)?;
        let risk = self.first_symbol(RISK_QUERY, &env, MEDIUM_RISK)?;
        let recommendation_symbol = self.first_symbol(RECOMMENDATION_QUERY, &env, "HOLD")?;
        let recommendation: Recommendation =
            recommendation_symbol
                .parse()
                .map_err(|_| ContrarianError::InvalidSignal {
                    query: RECOMMENDATION_QUERY.to_string(),
                    found: recommendation_symbol.clone(),
                })?;

        let confidence = confidence_score(&contrarian, &risk);
        debug!(
            contrarian = contrarian.as_str(),
            risk = risk.as_str(),
            recommendation = %recommendation,
            confidence,
            "reasoning complete"
        );

        Ok(AnalysisResult {
            market_id: market.market_id.clone(),
            recommendation,
            confidence,
            reasoning: format!(
                "MeTTa analysis: {} detected with {:.1}% ratio, {}",
                contrarian,
                ratio * 100.0,
                risk
            ),
            risk_level: risk.replace('-', "_").to_uppercase(),
            metta_analysis: format!(
                "Applied MeTTa reasoning with {} rules",
                self.kb.rule_count()
            ),
            contrarian_signal: Some(contrarian),
            bindings_snapshot: env.snapshot(),
        })
    }

    /// First result of `query` rendered as a symbol name, or `default` when the
    /// query yields nothing.
    fn first_symbol(
        &self,
        query: &str,
        env: &Bindings,
        default: &str,
    ) -> Result<String, ContrarianError> {
        let results = self.evaluator.query(query, env)?;
        match results.first() {
            Some(value) => value
                .as_symbol()
                .map(str::to_string)
                .ok_or_else(|| ContrarianError::InvalidSignal {
                    query: query.to_string(),
                    found: value.to_string(),
                }),
            None => Ok(default.to_string()),
        }
    }
}

/// Confidence table applied on the reasoning path.
pub fn confidence_score(contrarian: &str, risk: &str) -> f64 {
    let base = if contrarian == HIGH_CONTRARIAN {
        HIGH_CONTRARIAN_CONFIDENCE
    } else if contrarian == MEDIUM_CONTRARIAN {
        MEDIUM_CONTRARIAN_CONFIDENCE
    } else {
        BASE_CONFIDENCE
    };

    if risk == LOW_RISK {
        (base * LOW_RISK_MULTIPLIER).min(LOW_RISK_CAP)
    } else if risk == HIGH_RISK {
        base * HIGH_RISK_MULTIPLIER
    } else {
        base
    }
}

/// Heuristic used when reasoning fails. Works on the raw numbers only.
pub fn fallback_analysis(market: &MarketData) -> AnalysisResult {
    let ratio = market.ratio();
    let volume = market.volume();

    let (recommendation, confidence, reasoning) = if ratio > 0.75 {
        (
            Recommendation::BuyB,
            ((ratio - 0.5) * 2.0).min(FALLBACK_CONFIDENCE_CAP),
            format!(
                "Fallback contrarian: Option A heavily favored at {:.1}%",
                ratio * 100.0
            ),
        )
    } else if ratio < 0.25 {
        (
            Recommendation::BuyA,
            ((0.5 - ratio) * 2.0).min(FALLBACK_CONFIDENCE_CAP),
            format!(
                "Fallback contrarian: Option B heavily favored at {:.1}%",
                (1.0 - ratio) * 100.0
            ),
        )
    } else {
        (
            Recommendation::Hold,
            BASE_CONFIDENCE,
            "Fallback: Market appears balanced".to_string(),
        )
    };

    let risk_level = if volume < 1000.0 {
        "HIGH"
    } else if volume > FALLBACK_LOW_RISK_VOLUME {
        "LOW"
    } else {
        "MEDIUM"
    };

    AnalysisResult {
        market_id: market.market_id.clone(),
        recommendation,
        confidence,
        reasoning,
        risk_level: risk_level.to_string(),
        metta_analysis: "Fallback heuristic analysis (MeTTa unavailable)".to_string(),
        contrarian_signal: None,
        bindings_snapshot: BTreeMap::new(),
    }
}
