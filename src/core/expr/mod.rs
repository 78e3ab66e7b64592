//! Restricted expression language used by templates.
//!
//! An expression sees exactly the variables of its [`Scope`] plus the
//! `Math.*` library. Source text is tokenized, screened by [`safety::check`]
//! and parsed into an [`Expr`] tree before anything is evaluated; there is no
//! way for an expression to reach host facilities because the grammar has
//! no statements, member access (other than `Math.`), indexing or calls
//! other than the fixed math functions.

pub mod interp;
pub mod lexer;
pub mod parser;
pub mod safety;

pub use parser::Expr;

use crate::domain::model::{Scope, Value};
use crate::utils::error::{ItemGenError, Result};

/// A parsed, safety-checked expression ready to be evaluated repeatedly.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    pub fn compile(source: &str) -> Result<Self> {
        let tokens = lexer::tokenize(source);
        safety::check(source, &tokens)?;
        let ast = parser::parse(tokens).map_err(|message| ItemGenError::EvaluationError {
            expression: source.to_string(),
            message,
        })?;
        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval(&self, scope: &Scope) -> Result<Value> {
        let value = interp::eval(&self.ast, scope).map_err(|message| self.error(message))?;
        match value {
            Value::Number(n) if !n.is_finite() => {
                Err(self.error(format!("result is not a finite number ({})", n)))
            }
            other => Ok(other),
        }
    }

    fn error(&self, message: String) -> ItemGenError {
        ItemGenError::EvaluationError {
            expression: self.source.clone(),
            message,
        }
    }
}

/// Compile and evaluate `expression` against `scope` in one step.
pub fn evaluate(expression: &str, scope: &Scope) -> Result<Value> {
    Expression::compile(expression)?.eval(scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(pairs: &[(&str, Value)]) -> Scope {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_arithmetic_and_variables() {
        let s = scope(&[("x", Value::from(3.0)), ("y", Value::from(4.0))]);
        assert_eq!(evaluate("x*2", &s).unwrap(), Value::from(6.0));
        assert_eq!(evaluate("(x + y) % 4", &s).unwrap(), Value::from(3.0));
        assert_eq!(evaluate("2 ** 3 ** 2", &s).unwrap(), Value::from(512.0));
        assert_eq!(evaluate("-x + +y", &s).unwrap(), Value::from(1.0));
    }

    #[test]
    fn test_math_library() {
        let s = scope(&[("a", Value::from(3.0)), ("b", Value::from(4.0))]);
        assert_eq!(
            evaluate("Math.sqrt(a*a + b*b)", &s).unwrap(),
            Value::from(5.0)
        );
        assert_eq!(evaluate("Math.hypot(a, b)", &s).unwrap(), Value::from(5.0));
        assert_eq!(evaluate("Math.max(a, b, 1)", &s).unwrap(), Value::from(4.0));
        assert_eq!(
            evaluate("Math.round(Math.PI * 100) / 100", &s).unwrap(),
            Value::from(3.14)
        );
    }

    #[test]
    fn test_logic_and_comparison() {
        let s = scope(&[("x", Value::from(2.0)), ("name", Value::from("A"))]);
        assert_eq!(evaluate("x != 2", &s).unwrap(), Value::from(false));
        assert_eq!(evaluate("x >= 2 && name == 'A'", &s).unwrap(), Value::from(true));
        assert_eq!(evaluate("x > 5 || 'fallback'", &s).unwrap(), Value::from("fallback"));
        assert_eq!(evaluate("x === '2'", &s).unwrap(), Value::from(false));
        assert_eq!(evaluate("x == '2'", &s).unwrap(), Value::from(true));
        assert_eq!(evaluate("x > 1 ? 'big' : 'small'", &s).unwrap(), Value::from("big"));
        assert_eq!(evaluate("!x", &s).unwrap(), Value::from(false));
    }

    #[test]
    fn test_unsafe_rejected_before_evaluation() {
        let s = Scope::new();
        // `undefined_var` would fail evaluation; the safety check must come first
        let err = evaluate("undefined_var; new Thing()", &s).unwrap_err();
        assert!(matches!(err, ItemGenError::UnsafeExpression { .. }));

        // 數字格式錯誤之後的 token 仍要檢查
        let err = evaluate("1.2.3; new X", &s).unwrap_err();
        assert!(matches!(err, ItemGenError::UnsafeExpression { .. }));
    }

    #[test]
    fn test_evaluation_errors_carry_expression() {
        let s = Scope::new();
        match evaluate("missing + 1", &s).unwrap_err() {
            ItemGenError::EvaluationError { expression, message } => {
                assert_eq!(expression, "missing + 1");
                assert!(message.contains("missing"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(matches!(
            evaluate("1 / 0", &s),
            Err(ItemGenError::EvaluationError { .. })
        ));
        assert!(matches!(
            evaluate("Math.pow(10, 400)", &s),
            Err(ItemGenError::EvaluationError { .. })
        ));
        assert!(matches!(
            evaluate("The value is", &s),
            Err(ItemGenError::EvaluationError { .. })
        ));
    }

    #[test]
    fn test_compiled_expression_is_reusable() {
        let expr = Expression::compile("x + 1").unwrap();
        assert_eq!(expr.source(), "x + 1");
        for i in 0..3 {
            let s = scope(&[("x", Value::from(i as f64))]);
            assert_eq!(expr.eval(&s).unwrap(), Value::from(i as f64 + 1.0));
        }
    }
}
