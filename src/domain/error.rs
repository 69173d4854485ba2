//! Domain error types.

/// A parse error with position information for expression parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for contrarian.
#[derive(Debug, thiserror::Error)]
pub enum ContrarianError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    RuleParse(#[from] ParseError),

    #[error("invalid rule: {reason}")]
    RuleInvalid { reason: String },

    #[error("invalid market data: {reason}")]
    MarketData { reason: String },

    #[error("query {query} produced unexpected signal '{found}'")]
    InvalidSignal { query: String, found: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ContrarianError> for std::process::ExitCode {
    fn from(err: &ContrarianError) -> Self {
        let code: u8 = match err {
            ContrarianError::Io(_) => 1,
            ContrarianError::ConfigParse { .. } | ContrarianError::ConfigInvalid { .. } => 2,
            ContrarianError::RuleParse(_) | ContrarianError::RuleInvalid { .. } => 4,
            ContrarianError::MarketData { .. } | ContrarianError::InvalidSignal { .. } => 5,
            ContrarianError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_context_points_at_position() {
        let err = ParseError::new("unexpected ')'", 4);
        let rendered = err.display_with_context("(a b))");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "(a b))");
        assert_eq!(lines[1], "    ^");
        assert_eq!(lines[2], "parse error at position 4: unexpected ')'");
    }

    #[test]
    fn parse_error_converts_into_rule_parse() {
        let err: ContrarianError = ParseError::new("empty input", 0).into();
        assert!(matches!(err, ContrarianError::RuleParse(_)));
        assert_eq!(err.to_string(), "parse error at position 0: empty input");
    }

    #[test]
    fn exit_codes_by_category() {
        use std::process::ExitCode;
        let config = ContrarianError::ConfigInvalid {
            section: "engine".into(),
            key: "rules_path".into(),
            reason: "empty".into(),
        };
        assert_eq!(ExitCode::from(&config), ExitCode::from(2));

        let market = ContrarianError::MarketData {
            reason: "row 2".into(),
        };
        assert_eq!(ExitCode::from(&market), ExitCode::from(5));

        let report = ContrarianError::Report {
            reason: "disk full".into(),
        };
        assert_eq!(ExitCode::from(&report), ExitCode::from(6));
    }
}
