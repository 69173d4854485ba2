//! Rule and fact storage.
//!
//! Rules are `(= pattern body)` expressions, facts are any other expression.
//! Both lists are append-only. Malformed entries are logged and dropped so a
//! single bad line never prevents the rest of a source from loading.

use crate::domain::error::ContrarianError;
use crate::domain::expr::Expr;
use crate::domain::parser;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const RULE_MARKER: &str = "(=";
const COMMENT_MARKER: char = ';';

/// Market rules every engine starts with.
pub const BUILTIN_RULES: [&str; 4] = [
    "(= (contrarian-signal $ratio)
        (if (> $ratio 0.75) high-contrarian
            (if (> $ratio 0.65) medium-contrarian
                low-contrarian)))",
    "(= (risk-level $volume $ratio)
        (if (< $volume 1000) high-risk
            (if (and (> $volume 5000) (< $ratio 0.6) (> $ratio 0.4)) low-risk
                medium-risk)))",
    "(= (confidence $ratio $volume)
        (let $contrarian (contrarian-signal $ratio)
             (let $risk (risk-level $volume $ratio)
                  (if (and (== $contrarian high-contrarian) (== $risk low-risk)) 0.9
                      (if (== $contrarian medium-contrarian) 0.7
                          0.5)))))",
    "(= (betting-recommendation $ratio $volume)
        (let $contrarian (contrarian-signal $ratio)
             (if (== $contrarian high-contrarian)
                 (if (> $ratio 0.5) BUY_B BUY_A)
                 HOLD)))",
];

/// Counts of what a single load accepted and rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub rules: usize,
    pub facts: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    rules: Vec<Expr>,
    facts: Vec<Expr>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_rules() -> Self {
        let mut kb = Self::new();
        for rule in BUILTIN_RULES {
            kb.add_rule(rule);
        }
        kb
    }

    pub fn rules(&self) -> &[Expr] {
        &self.rules
    }

    pub fn facts(&self) -> &[Expr] {
        &self.facts
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Parse and append a rule. Returns `false` when the text was dropped.
    pub fn add_rule(&mut self, text: &str) -> bool {
        match parse_rule(text) {
            Ok(rule) => {
                debug!(rule = rule.rule_name().unwrap_or("?"), "rule added");
                self.rules.push(rule);
                true
            }
            Err(e) => {
                warn!(error = %e, text = text.trim(), "dropping rule");
                false
            }
        }
    }

    /// Parse and append a fact. Returns `false` when the text was dropped.
    pub fn add_fact(&mut self, text: &str) -> bool {
        match parser::parse(text) {
            Ok(fact) => {
                self.facts.push(fact);
                true
            }
            Err(e) => {
                warn!(error = %e, text = text.trim(), "dropping fact");
                false
            }
        }
    }

    /// Load rules and facts from rule-source text.
    ///
    /// `;` starts a comment line. A line beginning with `(=` opens a rule that
    /// may span several lines and closes once its parentheses balance. Any
    /// other line is a single-line fact.
    pub fn load_from_source(&mut self, source: &str) -> LoadSummary {
        let mut summary = LoadSummary::default();
        let mut pending = String::new();
        let mut depth: i64 = 0;
        let mut in_string = false;

        for line in source.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(COMMENT_MARKER) {
                continue;
            }

            if pending.is_empty() && !line.starts_with(RULE_MARKER) {
                if self.add_fact(line) {
                    summary.facts += 1;
                } else {
                    summary.rejected += 1;
                }
                continue;
            }

            if !pending.is_empty() {
                pending.push(' ');
            }
            pending.push_str(line);
            depth += paren_balance(line, &mut in_string);

            if depth < 0 {
                warn!(text = pending.as_str(), "dropping rule with unbalanced ')'");
                summary.rejected += 1;
                pending.clear();
                depth = 0;
                in_string = false;
            } else if depth == 0 && !in_string {
                if self.add_rule(&pending) {
                    summary.rules += 1;
                } else {
                    summary.rejected += 1;
                }
                pending.clear();
            }
        }

        if !pending.is_empty() {
            warn!(text = pending.as_str(), "dropping unterminated rule at end of source");
            summary.rejected += 1;
        }

        info!(
            rules = summary.rules,
            facts = summary.facts,
            rejected = summary.rejected,
            "rule source loaded"
        );
        summary
    }

    /// Best-effort load from a file. A missing or unreadable file is logged and
    /// leaves the knowledge base unchanged.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> LoadSummary {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(source) => self.load_from_source(&source),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "rule source unavailable");
                LoadSummary::default()
            }
        }
    }
}

fn parse_rule(text: &str) -> Result<Expr, ContrarianError> {
    let expr = parser::parse(text)?;
    if !expr.is_rule() {
        return Err(ContrarianError::RuleInvalid {
            reason: format!("expected (= pattern body), found {}", expr),
        });
    }
    Ok(expr)
}

/// Net `(` minus `)` on a line, ignoring parentheses inside string literals.
/// `in_string` carries an open literal over to the next line of the same rule.
fn paren_balance(line: &str, in_string: &mut bool) -> i64 {
    let mut balance = 0;
    for ch in line.chars() {
        match ch {
            '"' => *in_string = !*in_string,
            '(' if !*in_string => balance += 1,
            ')' if !*in_string => balance -= 1,
            _ => {}
        }
    }
    balance
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn builtin_rules_all_parse() {
        let kb = KnowledgeBase::with_builtin_rules();
        assert_eq!(kb.rule_count(), 4);
        let names: Vec<&str> = kb.rules().iter().filter_map(Expr::rule_name).collect();
        assert_eq!(
            names,
            vec![
                "contrarian-signal",
                "risk-level",
                "confidence",
                "betting-recommendation"
            ]
        );
    }

    #[test]
    fn add_rule_accepts_valid_rule() {
        let mut kb = KnowledgeBase::new();
        assert!(kb.add_rule("(= (double $x) (* $x 2))"));
        assert_eq!(kb.rule_count(), 1);
    }

    #[test]
    fn add_rule_drops_unparseable_text() {
        let mut kb = KnowledgeBase::new();
        assert!(!kb.add_rule("(= (double $x) (* $x 2)"));
        assert_eq!(kb.rule_count(), 0);
    }

    #[test]
    fn add_rule_drops_non_rule_shape() {
        let mut kb = KnowledgeBase::new();
        assert!(!kb.add_rule("(market btc)"));
        assert!(!kb.add_rule("(= (foo))"));
        assert_eq!(kb.rule_count(), 0);
    }

    #[test]
    fn add_fact_appends_in_order() {
        let mut kb = KnowledgeBase::new();
        assert!(kb.add_fact("(market btc-150k)"));
        assert!(kb.add_fact("(market eth-7k)"));
        assert!(!kb.add_fact("(market"));
        assert_eq!(kb.facts().len(), 2);
        assert_eq!(kb.facts()[1].to_string(), "(market eth-7k)");
    }

    #[test]
    fn load_skips_comments_and_blank_lines() {
        let mut kb = KnowledgeBase::new();
        let summary = kb.load_from_source("; comment\n\n   ; indented comment\n(fact one)\n");
        assert_eq!(
            summary,
            LoadSummary {
                rules: 0,
                facts: 1,
                rejected: 0
            }
        );
    }

    #[test]
    fn load_multi_line_rule() {
        let source = "\
(= (contrarian-signal $ratio)
   (if (> $ratio 0.75) high-contrarian
       low-contrarian))
(market-type binary)
";
        let mut kb = KnowledgeBase::new();
        let summary = kb.load_from_source(source);
        assert_eq!(summary.rules, 1);
        assert_eq!(summary.facts, 1);
        assert_eq!(
            kb.rules()[0].to_string(),
            "(= (contrarian-signal $ratio) (if (> $ratio 0.75) high-contrarian low-contrarian))"
        );
    }

    #[test]
    fn load_keeps_valid_rules_around_malformed_one() {
        let source = "\
(= (first $x) one)
(= (broken $x) (two $x)))
(= (third $x)
   three)
";
        let mut kb = KnowledgeBase::new();
        let summary = kb.load_from_source(source);
        assert_eq!(summary.rules, 2);
        assert_eq!(summary.rejected, 1);
        let names: Vec<&str> = kb.rules().iter().filter_map(Expr::rule_name).collect();
        assert_eq!(names, vec!["first", "third"]);
    }

    #[test]
    fn load_drops_balanced_but_invalid_rule() {
        let source = "(= (a) b) (c)\n(= (ok) fine)\n";
        let mut kb = KnowledgeBase::new();
        let summary = kb.load_from_source(source);
        assert_eq!(summary.rules, 1);
        assert_eq!(summary.rejected, 1);
    }

    #[test]
    fn load_drops_unterminated_rule_at_end() {
        let mut kb = KnowledgeBase::new();
        let summary = kb.load_from_source("(= (ok) fine)\n(= (open $x)\n   (if");
        assert_eq!(summary.rules, 1);
        assert_eq!(summary.rejected, 1);
    }

    #[test]
    fn load_ignores_parens_inside_strings() {
        let source = "(= (label $x)\n   \"closing ) paren\")\n";
        let mut kb = KnowledgeBase::new();
        let summary = kb.load_from_source(source);
        assert_eq!(summary.rules, 1);
    }

    #[test]
    fn load_counts_rejected_facts() {
        let mut kb = KnowledgeBase::new();
        let summary = kb.load_from_source("(fine fact)\n(broken fact\n");
        assert_eq!(summary.facts, 1);
        assert_eq!(summary.rejected, 1);
    }

    #[test]
    fn load_from_file_reads_source() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "; extra rules\n(= (x) y)\n(fact)\n").unwrap();
        let mut kb = KnowledgeBase::with_builtin_rules();
        let summary = kb.load_from_file(file.path());
        assert_eq!(summary.rules, 1);
        assert_eq!(summary.facts, 1);
        assert_eq!(kb.rule_count(), 5);
    }

    #[test]
    fn load_from_missing_file_is_not_fatal() {
        let mut kb = KnowledgeBase::with_builtin_rules();
        let summary = kb.load_from_file("/nonexistent/rules.metta");
        assert_eq!(summary, LoadSummary::default());
        assert_eq!(kb.rule_count(), 4);
    }

    #[test]
    fn paren_balance_counts() {
        let mut in_string = false;
        assert_eq!(paren_balance("(= (a $x)", &mut in_string), 2);
        assert_eq!(paren_balance("b))", &mut in_string), -2);
        assert_eq!(paren_balance("\"(\" x", &mut in_string), 0);
        assert!(!in_string);
    }

    #[test]
    fn paren_balance_carries_open_string() {
        let mut in_string = false;
        assert_eq!(paren_balance("(= (note $x) \"opens (", &mut in_string), 1);
        assert!(in_string);
        assert_eq!(paren_balance("closes ( here\")", &mut in_string), -1);
        assert!(!in_string);
    }

    #[test]
    fn load_string_spanning_lines() {
        let source = "(= (note $x)\n   \"first line\nclosing ( here\")\n(= (ok) fine)\n";
        let mut kb = KnowledgeBase::new();
        let summary = kb.load_from_source(source);
        assert_eq!(summary.rules, 2);
        assert_eq!(summary.rejected, 0);
        let names: Vec<&str> = kb.rules().iter().filter_map(Expr::rule_name).collect();
        assert_eq!(names, vec!["note", "ok"]);
    }

    #[test]
    fn load_survives_deeply_nested_rule() {
        let depth = 100_000;
        let source = format!(
            "(= (deep) {}{})\n(= (ok) fine)\n",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let mut kb = KnowledgeBase::new();
        let summary = kb.load_from_source(&source);
        assert_eq!(summary.rules, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(kb.rules()[0].rule_name(), Some("ok"));
    }
}
