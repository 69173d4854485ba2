//! Expression evaluator.
//!
//! Walks an [`Expr`] tree against an explicit [`Bindings`] environment and
//! always yields a sequence of values. An empty sequence stands for "no
//! answer"; the evaluator itself never fails.
//!
//! # Evaluation Semantics
//!
//! - Variables resolve to their bound value, or to their own name when unbound
//! - `>` / `<`: numeric comparison; booleans count as `1.0` / `0.0`, other
//!   non-numeric operands as `0.0`
//! - `==`: compares the first result of each side by type and value
//! - `and`: short-circuits on the first empty or falsy result
//! - `or`: short-circuits on the first truthy result
//! - `if` / `let`: require exactly three arguments, otherwise `[]`
//! - Any other operator is looked up in the domain registry; unknown names yield `[]`

use crate::domain::catalog::{self, DomainFn};
use crate::domain::error::ParseError;
use crate::domain::expr::{Atom, Expr};
use crate::domain::parser;
use crate::domain::value::{Bindings, Value};
use std::collections::BTreeMap;
use tracing::debug;

pub struct Evaluator {
    registry: BTreeMap<&'static str, DomainFn>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            registry: catalog::market_functions(),
        }
    }

    pub fn registered_functions(&self) -> Vec<&'static str> {
        self.registry.keys().copied().collect()
    }

    /// Parse `text` and evaluate it. Only the parse step can fail.
    pub fn query(&self, text: &str, env: &Bindings) -> Result<Vec<Value>, ParseError> {
        let expr = parser::parse(text)?;
        let result = self.evaluate(&expr, env);
        debug!(query = text, result = ?result, "query evaluated");
        Ok(result)
    }

    pub fn evaluate(&self, expr: &Expr, env: &Bindings) -> Vec<Value> {
        match expr {
            Expr::Atom(atom) => vec![self.evaluate_atom(atom, env)],
            Expr::List(items) => self.evaluate_list(items, env),
        }
    }

    fn evaluate_atom(&self, atom: &Atom, env: &Bindings) -> Value {
        match atom {
            Atom::Variable(name) => env
                .get(name)
                .cloned()
                .unwrap_or_else(|| Value::symbol(name.clone())),
            Atom::Symbol(_) | Atom::Number(_) | Atom::Str(_) => Value::from(atom),
        }
    }

    fn evaluate_list(&self, items: &[Expr], env: &Bindings) -> Vec<Value> {
        let Some(Expr::Atom(Atom::Symbol(op))) = items.first() else {
            return Vec::new();
        };
        let args = &items[1..];

        match op.as_str() {
            ">" => self.compare(args, env, |a, b| a > b),
            "<" => self.compare(args, env, |a, b| a < b),
            "==" => self.equals(args, env),
            "and" => self.and(args, env),
            "or" => self.or(args, env),
            "if" => self.if_form(args, env),
            "let" => self.let_form(args, env),
            name => match self.registry.get(name) {
                Some(handler) => handler(self, args, env),
                None => {
                    debug!(operator = name, "no domain function registered");
                    Vec::new()
                }
            },
        }
    }

    /// Coerce an argument to a float through [`Value::as_f64`]; anything else
    /// becomes `0.0`.
    pub fn numeric(&self, expr: &Expr, env: &Bindings) -> f64 {
        match expr {
            Expr::Atom(Atom::Number(n)) => n.as_f64(),
            Expr::Atom(Atom::Variable(name)) => {
                env.get(name).and_then(Value::as_f64).unwrap_or(0.0)
            }
            _ => self
                .evaluate(expr, env)
                .first()
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
        }
    }

    fn compare(&self, args: &[Expr], env: &Bindings, op: fn(f64, f64) -> bool) -> Vec<Value> {
        if args.len() < 2 {
            return vec![Value::Bool(false)];
        }
        let left = self.numeric(&args[0], env);
        let right = self.numeric(&args[1], env);
        vec![Value::Bool(op(left, right))]
    }

    fn equals(&self, args: &[Expr], env: &Bindings) -> Vec<Value> {
        if args.len() < 2 {
            return vec![Value::Bool(false)];
        }
        let left = self.evaluate(&args[0], env).into_iter().next();
        let right = self.evaluate(&args[1], env).into_iter().next();
        vec![Value::Bool(left == right)]
    }

    fn and(&self, args: &[Expr], env: &Bindings) -> Vec<Value> {
        for arg in args {
            let truthy = self
                .evaluate(arg, env)
                .first()
                .is_some_and(Value::is_truthy);
            if !truthy {
                return vec![Value::Bool(false)];
            }
        }
        vec![Value::Bool(true)]
    }

    fn or(&self, args: &[Expr], env: &Bindings) -> Vec<Value> {
        for arg in args {
            if self.evaluate(arg, env).first().is_some_and(Value::is_truthy) {
                return vec![Value::Bool(true)];
            }
        }
        vec![Value::Bool(false)]
    }

    fn if_form(&self, args: &[Expr], env: &Bindings) -> Vec<Value> {
        let [cond, then, otherwise] = args else {
            return Vec::new();
        };
        if self.evaluate(cond, env).first().is_some_and(Value::is_truthy) {
            self.evaluate(then, env)
        } else {
            self.evaluate(otherwise, env)
        }
    }

    fn let_form(&self, args: &[Expr], env: &Bindings) -> Vec<Value> {
        let [target, value_expr, body] = args else {
            return Vec::new();
        };
        let name = match target {
            Expr::Atom(Atom::Variable(name)) | Expr::Atom(Atom::Symbol(name)) => name,
            _ => return Vec::new(),
        };
        match self.evaluate(value_expr, env).into_iter().next() {
            Some(value) => self.evaluate(body, &env.with(name.clone(), value)),
            None => self.evaluate(body, env),
        }
    }
}
