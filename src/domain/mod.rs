//! Core domain types and logic.

pub mod expr;
pub mod parser;
pub mod value;
pub mod knowledge_base;
pub mod catalog;
pub mod evaluator;
pub mod market;
pub mod analyzer;
pub mod config;
pub mod error;
