//! Domain function catalog.
//!
//! The evaluator resolves operators against this closed registry only. Rules
//! loaded into the knowledge base are never consulted for dispatch, so the
//! names below are the complete callable surface.

use crate::domain::evaluator::Evaluator;
use crate::domain::expr::Expr;
use crate::domain::value::{Bindings, Value};
use std::collections::BTreeMap;

pub const HIGH_CONTRARIAN_RATIO: f64 = 0.75;
pub const MEDIUM_CONTRARIAN_RATIO: f64 = 0.65;
pub const LOW_RATIO: f64 = 0.25;
pub const THIN_VOLUME: f64 = 1000.0;
pub const DEEP_VOLUME: f64 = 5000.0;
pub const BALANCED_RATIO_LOW: f64 = 0.4;
pub const BALANCED_RATIO_HIGH: f64 = 0.6;

pub const HIGH_CONTRARIAN: &str = "high-contrarian";
pub const MEDIUM_CONTRARIAN: &str = "medium-contrarian";
pub const LOW_CONTRARIAN: &str = "low-contrarian";
pub const HIGH_RISK: &str = "high-risk";
pub const MEDIUM_RISK: &str = "medium-risk";
pub const LOW_RISK: &str = "low-risk";

/// Handler signature: receives the unevaluated argument expressions.
pub type DomainFn = fn(&Evaluator, &[Expr], &Bindings) -> Vec<Value>;

pub fn contrarian_signal(ratio: f64) -> &'static str {
    if ratio > HIGH_CONTRARIAN_RATIO {
        HIGH_CONTRARIAN
    } else if ratio > MEDIUM_CONTRARIAN_RATIO {
        MEDIUM_CONTRARIAN
    } else {
        LOW_CONTRARIAN
    }
}

pub fn risk_level(volume: f64, ratio: f64) -> &'static str {
    if volume < THIN_VOLUME {
        HIGH_RISK
    } else if volume > DEEP_VOLUME && BALANCED_RATIO_LOW < ratio && ratio < BALANCED_RATIO_HIGH {
        LOW_RISK
    } else {
        MEDIUM_RISK
    }
}

pub fn betting_recommendation(ratio: f64, volume: f64) -> &'static str {
    if ratio > HIGH_CONTRARIAN_RATIO && volume > THIN_VOLUME {
        "BUY_B"
    } else if ratio < LOW_RATIO && volume > THIN_VOLUME {
        "BUY_A"
    } else {
        "HOLD"
    }
}

fn contrarian_signal_fn(eval: &Evaluator, args: &[Expr], env: &Bindings) -> Vec<Value> {
    match args.first() {
        Some(arg) => vec![Value::symbol(contrarian_signal(eval.numeric(arg, env)))],
        None => Vec::new(),
    }
}

fn risk_level_fn(eval: &Evaluator, args: &[Expr], env: &Bindings) -> Vec<Value> {
    if args.len() < 2 {
        return Vec::new();
    }
    let volume = eval.numeric(&args[0], env);
    let ratio = eval.numeric(&args[1], env);
    vec![Value::symbol(risk_level(volume, ratio))]
}

fn betting_recommendation_fn(eval: &Evaluator, args: &[Expr], env: &Bindings) -> Vec<Value> {
    if args.len() < 2 {
        return Vec::new();
    }
    let ratio = eval.numeric(&args[0], env);
    let volume = eval.numeric(&args[1], env);
    vec![Value::symbol(betting_recommendation(ratio, volume))]
}

/// The registry installed into every [`Evaluator`].
pub fn market_functions() -> BTreeMap<&'static str, DomainFn> {
    let mut registry: BTreeMap<&'static str, DomainFn> = BTreeMap::new();
    registry.insert("contrarian-signal", contrarian_signal_fn);
    registry.insert("risk-level", risk_level_fn);
    registry.insert("betting-recommendation", betting_recommendation_fn);
    registry
}
