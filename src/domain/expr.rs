//! Expression data model.
//!
//! This module defines the homoiconic tree shared by rules, facts and queries:
//! - `Number`: integer or floating literal
//! - `Atom`: symbol, number, string literal or `$`-prefixed variable
//! - `Expr`: an atom or a parenthesized list of expressions
//!
//! `Display` writes an expression back in source notation; re-parsing the
//! output yields the same tree.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Symbol(String),
    Number(Number),
    Str(String),
    /// Raw variable name, including the leading `$`.
    Variable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Atom(Atom),
    List(Vec<Expr>),
}

impl Expr {
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Atom(Atom::Symbol(name.into()))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Atom(Atom::Variable(name.into()))
    }

    pub fn int(value: i64) -> Self {
        Expr::Atom(Atom::Number(Number::Int(value)))
    }

    pub fn float(value: f64) -> Self {
        Expr::Atom(Atom::Number(Number::Float(value)))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Atom(Atom::Str(value.into()))
    }

    /// The operator name when this is a list headed by a symbol.
    pub fn head_symbol(&self) -> Option<&str> {
        match self {
            Expr::List(items) => match items.first() {
                Some(Expr::Atom(Atom::Symbol(name))) => Some(name),
                _ => None,
            },
            Expr::Atom(_) => None,
        }
    }

    /// True for `(= pattern body)`.
    pub fn is_rule(&self) -> bool {
        matches!(self, Expr::List(items) if items.len() == 3) && self.head_symbol() == Some("=")
    }

    /// Head symbol of a rule's pattern, e.g. `risk-level` for
    /// `(= (risk-level $volume $ratio) ...)`.
    pub fn rule_name(&self) -> Option<&str> {
        if !self.is_rule() {
            return None;
        }
        match self {
            Expr::List(items) => items[1].head_symbol(),
            Expr::Atom(_) => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(v) => f.write_str(&format_float(*v)),
        }
    }
}

/// Shortest decimal text for `value` that re-parses to the same float: never
/// in exponent form, always with a `.` for finite values.
pub fn format_float(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        text + ".0"
    } else {
        text
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Symbol(s) | Atom::Variable(s) => write!(f, "{}", s),
            Atom::Number(n) => write!(f, "{}", n),
            Atom::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Atom(atom) => write!(f, "{}", atom),
            Expr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_as_f64() {
        assert_eq!(Number::Int(3).as_f64(), 3.0);
        assert_eq!(Number::Float(0.25).as_f64(), 0.25);
    }

    #[test]
    fn int_and_float_are_distinct() {
        assert_ne!(Expr::int(1), Expr::float(1.0));
    }

    #[test]
    fn display_atoms() {
        assert_eq!(Expr::symbol("high-risk").to_string(), "high-risk");
        assert_eq!(Expr::variable("$ratio").to_string(), "$ratio");
        assert_eq!(Expr::int(1000).to_string(), "1000");
        assert_eq!(Expr::float(0.75).to_string(), "0.75");
        assert_eq!(Expr::string("hello world").to_string(), "\"hello world\"");
    }

    #[test]
    fn display_whole_float_keeps_decimal_point() {
        assert_eq!(Expr::float(5000.0).to_string(), "5000.0");
        assert_eq!(Expr::float(-2.0).to_string(), "-2.0");
    }

    #[test]
    fn display_extreme_floats_without_exponent() {
        assert_eq!(Expr::float(1e-7).to_string(), "0.0000001");
        assert_eq!(Expr::float(1e17).to_string(), "100000000000000000.0");
        assert_eq!(format_float(2.5e-12), "0.0000000000025");
    }

    #[test]
    fn display_nested_list() {
        let expr = Expr::List(vec![
            Expr::symbol("if"),
            Expr::List(vec![
                Expr::symbol(">"),
                Expr::variable("$ratio"),
                Expr::float(0.75),
            ]),
            Expr::symbol("high-contrarian"),
            Expr::symbol("low-contrarian"),
        ]);
        assert_eq!(
            expr.to_string(),
            "(if (> $ratio 0.75) high-contrarian low-contrarian)"
        );
    }

    #[test]
    fn display_empty_list() {
        assert_eq!(Expr::List(vec![]).to_string(), "()");
    }

    #[test]
    fn head_symbol_of_list() {
        let expr = Expr::List(vec![Expr::symbol("and"), Expr::symbol("x")]);
        assert_eq!(expr.head_symbol(), Some("and"));
        assert_eq!(Expr::List(vec![]).head_symbol(), None);
        assert_eq!(Expr::List(vec![Expr::int(1)]).head_symbol(), None);
        assert_eq!(Expr::symbol("and").head_symbol(), None);
    }

    #[test]
    fn rule_shape() {
        let rule = Expr::List(vec![
            Expr::symbol("="),
            Expr::List(vec![Expr::symbol("contrarian-signal"), Expr::variable("$ratio")]),
            Expr::symbol("low-contrarian"),
        ]);
        assert!(rule.is_rule());
        assert_eq!(rule.rule_name(), Some("contrarian-signal"));

        let fact = Expr::List(vec![Expr::symbol("market"), Expr::symbol("btc")]);
        assert!(!fact.is_rule());
        assert_eq!(fact.rule_name(), None);

        let short = Expr::List(vec![Expr::symbol("="), Expr::symbol("x")]);
        assert!(!short.is_rule());
    }
}
