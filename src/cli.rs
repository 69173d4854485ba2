//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvMarketAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_market_adapter::JsonMarketAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::analyzer::Reasoner;
use crate::domain::config::{build_engine_config, EngineConfig};
use crate::domain::error::ContrarianError;
use crate::domain::expr::Expr;
use crate::domain::market::MarketData;
use crate::domain::parser;
use crate::domain::value::{Bindings, Value};
use crate::ports::market_port::MarketPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "contrarian", about = "Contrarian prediction-market reasoner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// INI configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Extra rule source, overrides [engine] rules_path
    #[arg(short, long)]
    pub rules: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse a single market
    Analyze {
        /// JSON market object to read, `-` for stdin; flags override its fields
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(long)]
        ratio: Option<f64>,
        #[arg(long)]
        volume: Option<f64>,
        #[arg(long)]
        market_id: Option<String>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Analyse every market in a CSV file (or a JSON array, by `.json` extension)
    Batch {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Evaluate a single expression
    Query {
        expr: String,
        /// Variable binding, e.g. `--bind ratio=0.8`
        #[arg(short, long = "bind")]
        bindings: Vec<String>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// List loaded rules, facts and domain functions
    Rules {
        #[command(flatten)]
        engine: EngineArgs,
    },
}

impl Command {
    fn engine_args(&self) -> &EngineArgs {
        match self {
            Command::Analyze { engine, .. }
            | Command::Batch { engine, .. }
            | Command::Query { engine, .. }
            | Command::Rules { engine } => engine,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let engine_args = cli.command.engine_args().clone();
    let config = match load_engine_config(engine_args.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    init_logging(&config);
    let reasoner = build_reasoner(&config, engine_args.rules.as_deref());

    let outcome = match cli.command {
        Command::Analyze {
            input,
            ratio,
            volume,
            market_id,
            ..
        } => build_market(input.as_deref(), ratio, volume, market_id)
            .and_then(|market| run_analyze(&reasoner, &market)),
        Command::Batch { input, output, .. } => run_batch(&reasoner, &input, output.as_deref()),
        Command::Query { expr, bindings, .. } => run_query(&reasoner, &expr, &bindings),
        Command::Rules { .. } => {
            run_rules(&reasoner);
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_engine_config(path: Option<&PathBuf>) -> Result<EngineConfig, ContrarianError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let adapter = FileConfigAdapter::from_file(path)?;
    build_engine_config(&adapter)
}

/// Initialise the `tracing` subscriber. `RUST_LOG` takes precedence over the
/// configured filter.
pub fn init_logging(config: &EngineConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = if config.log_json {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()
    };
}

pub fn build_reasoner(config: &EngineConfig, rules_override: Option<&Path>) -> Reasoner {
    let mut reasoner = Reasoner::new();
    if let Some(path) = rules_override.or(config.rules_path.as_deref()) {
        let summary = reasoner.load_rules(path);
        info!(
            path = %path.display(),
            rules = summary.rules,
            facts = summary.facts,
            rejected = summary.rejected,
            "extra rules loaded"
        );
    }
    reasoner
}

/// Parse `name=value`. A missing `$` is added to the name; the value is read
/// with the expression parser and must be a single atom.
pub fn parse_binding(text: &str) -> Result<(String, Value), ContrarianError> {
    let (name, value) = text.split_once('=').ok_or_else(|| ContrarianError::RuleInvalid {
        reason: format!("binding '{}' must look like name=value", text),
    })?;
    let name = name.trim();
    if name.is_empty() || name == "$" {
        return Err(ContrarianError::RuleInvalid {
            reason: format!("binding '{}' has no variable name", text),
        });
    }
    let name = if name.starts_with('$') {
        name.to_string()
    } else {
        format!("${}", name)
    };
    match parser::parse(value)? {
        Expr::Atom(atom) => Ok((name, Value::from(&atom))),
        Expr::List(_) => Err(ContrarianError::RuleInvalid {
            reason: format!("binding '{}' must bind a single value", text),
        }),
    }
}

pub fn build_bindings(bindings: &[String]) -> Result<Bindings, ContrarianError> {
    bindings.iter().try_fold(Bindings::new(), |env, text| {
        let (name, value) = parse_binding(text)?;
        Ok(env.with(name, value))
    })
}

pub fn evaluate_query(
    reasoner: &Reasoner,
    expr: &str,
    bindings: &[String],
) -> Result<Vec<Value>, ContrarianError> {
    let env = build_bindings(bindings)?;
    reasoner.evaluator().query(expr, &env).map_err(|e| {
        eprintln!("{}", e.display_with_context(expr));
        ContrarianError::from(e)
    })
}

/// The market for `analyze`: the JSON document at `input` (`-` reads stdin),
/// or an empty market, with any flag given replacing the matching field.
pub fn build_market(
    input: Option<&Path>,
    ratio: Option<f64>,
    volume: Option<f64>,
    market_id: Option<String>,
) -> Result<MarketData, ContrarianError> {
    let market = match input {
        None => MarketData::default(),
        Some(path) if path == Path::new("-") => {
            JsonMarketAdapter::read_market(io::stdin().lock(), "stdin")?
        }
        Some(path) => JsonMarketAdapter::new(path.to_path_buf()).fetch_market()?,
    };
    Ok(MarketData {
        market_id: market_id.or(market.market_id),
        option_a_ratio: ratio.or(market.option_a_ratio),
        total_volume: volume.or(market.total_volume),
    })
}

/// Pick the market reader for a batch input file by extension.
pub fn market_source(input: &Path) -> Box<dyn MarketPort> {
    let is_json = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Box::new(JsonMarketAdapter::new(input.to_path_buf()))
    } else {
        Box::new(CsvMarketAdapter::new(input.to_path_buf()))
    }
}

fn run_analyze(reasoner: &Reasoner, market: &MarketData) -> Result<(), ContrarianError> {
    let result = reasoner.analyze(market);
    let json = serde_json::to_string_pretty(&result).map_err(|e| ContrarianError::Report {
        reason: format!("failed to serialize result: {}", e),
    })?;
    println!("{}", json);
    Ok(())
}

fn run_batch(
    reasoner: &Reasoner,
    input: &Path,
    output: Option<&Path>,
) -> Result<(), ContrarianError> {
    eprintln!("Loading markets from {}", input.display());
    let markets = market_source(input).fetch_markets()?;
    eprintln!("Analysing {} markets...", markets.len());

    let results = reasoner.analyze_batch(&markets);
    let report = JsonReportAdapter::pretty();
    match output {
        Some(path) => {
            report.write(&results, path)?;
            eprintln!("Report written to: {}", path.display());
        }
        None => println!("{}", report.render(&results)?),
    }
    Ok(())
}

fn run_query(reasoner: &Reasoner, expr: &str, bindings: &[String]) -> Result<(), ContrarianError> {
    let results = evaluate_query(reasoner, expr, bindings)?;
    if results.is_empty() {
        eprintln!("(no result)");
    }
    for value in results {
        println!("{}", value);
    }
    Ok(())
}

fn run_rules(reasoner: &Reasoner) {
    let kb = reasoner.knowledge_base();
    println!("Rules ({}):", kb.rule_count());
    for rule in kb.rules() {
        println!("  {}", rule);
    }
    println!("Facts ({}):", kb.facts().len());
    for fact in kb.facts() {
        println!("  {}", fact);
    }
    println!("Domain functions:");
    for name in reasoner.evaluator().registered_functions() {
        println!("  {}", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_analyze_arguments() {
        let cli = Cli::try_parse_from([
            "contrarian",
            "analyze",
            "--ratio",
            "0.85",
            "--volume",
            "15000",
            "--market-id",
            "BTC",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze {
                input,
                ratio,
                volume,
                market_id,
                engine,
            } => {
                assert!(input.is_none());
                assert_eq!(ratio, Some(0.85));
                assert_eq!(volume, Some(15000.0));
                assert_eq!(market_id.as_deref(), Some("BTC"));
                assert!(engine.config.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_analyze_stdin_input() {
        let cli = Cli::try_parse_from(["contrarian", "analyze", "--input", "-", "--ratio", "0.3"])
            .unwrap();
        match cli.command {
            Command::Analyze { input, ratio, .. } => {
                assert_eq!(input, Some(PathBuf::from("-")));
                assert_eq!(ratio, Some(0.3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn build_market_without_input_uses_flags_only() {
        let market = build_market(None, Some(0.9), None, None).unwrap();
        assert_eq!(market.option_a_ratio, Some(0.9));
        assert_eq!(market.total_volume, None);
        assert_eq!(market.volume(), 0.0);
    }

    #[test]
    fn market_source_follows_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let json = dir.path().join("markets.JSON");
        std::fs::write(&json, r#"[{"optionARatio": 0.9}]"#).unwrap();
        assert_eq!(market_source(&json).fetch_markets().unwrap().len(), 1);

        let csv = dir.path().join("markets.csv");
        std::fs::write(&csv, "market_id,option_a_ratio,total_volume
A,0.5,1
B,0.6,2
").unwrap();
        assert_eq!(market_source(&csv).fetch_markets().unwrap().len(), 2);
    }

    #[test]
    fn parses_repeated_bindings() {
        let cli = Cli::try_parse_from([
            "contrarian",
            "query",
            "(risk-level $volume $ratio)",
            "--bind",
            "volume=6000",
            "-b",
            "ratio=0.5",
        ])
        .unwrap();
        match cli.command {
            Command::Query { expr, bindings, .. } => {
                assert_eq!(expr, "(risk-level $volume $ratio)");
                assert_eq!(bindings, vec!["volume=6000", "ratio=0.5"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_binding_adds_dollar_and_types_value() {
        assert_eq!(
            parse_binding("ratio=0.8").unwrap(),
            ("$ratio".to_string(), Value::Float(0.8))
        );
        assert_eq!(
            parse_binding("$volume=1500").unwrap(),
            ("$volume".to_string(), Value::Int(1500))
        );
        assert_eq!(
            parse_binding("signal=high-contrarian").unwrap(),
            ("$signal".to_string(), Value::symbol("high-contrarian"))
        );
    }

    #[test]
    fn parse_binding_rejects_malformed_input() {
        assert!(parse_binding("ratio").is_err());
        assert!(parse_binding("=0.5").is_err());
        assert!(parse_binding("ratio=").is_err());
        assert!(parse_binding("ratio=(a b)").is_err());
    }
}
