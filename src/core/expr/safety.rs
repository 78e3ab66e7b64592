use super::lexer::Token;
use crate::utils::error::{ItemGenError, Result};

/// Identifiers that reach outside the arithmetic grammar.
const DENIED_IDENTIFIERS: &[&str] = &[
    "new",
    "function",
    "process",
    "global",
    "globalThis",
    "window",
    "document",
    "this",
    "eval",
    "require",
    "import",
    "constructor",
    "prototype",
    "__proto__",
];

/// 在解析之前檢查 token 序列；任何禁用結構都直接回報 `UnsafeExpression`
pub fn check(expression: &str, tokens: &[Token]) -> Result<()> {
    for token in tokens {
        let reason = match token {
            Token::LBrace | Token::RBrace => Some("block braces are not allowed".to_string()),
            Token::LBracket | Token::RBracket => {
                Some("array/index brackets are not allowed".to_string())
            }
            Token::Semicolon => Some("statement separators are not allowed".to_string()),
            Token::Arrow => Some("arrow functions are not allowed".to_string()),
            Token::Ident(name) if is_denied(name) => {
                Some(format!("identifier '{}' is not allowed", name))
            }
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(ItemGenError::UnsafeExpression {
                expression: expression.to_string(),
                reason,
            });
        }
    }
    Ok(())
}

fn is_denied(name: &str) -> bool {
    DENIED_IDENTIFIERS
        .iter()
        .any(|denied| denied.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expr::lexer::tokenize;

    fn check_str(src: &str) -> Result<()> {
        check(src, &tokenize(src))
    }

    #[test]
    fn test_rejects_denied_syntax() {
        for src in [
            "{ x }",
            "[1, 2]",
            "x; y",
            "() => 1",
            "new Date()",
            "process.exit(1)",
            "globalThis",
            "window.alert",
            "Function('x')",
            "x.constructor",
        ] {
            assert!(
                matches!(check_str(src), Err(ItemGenError::UnsafeExpression { .. })),
                "expected '{}' to be rejected",
                src
            );
        }
    }

    #[test]
    fn test_accepts_plain_arithmetic() {
        assert!(check_str("a + b * Math.sqrt(c) >= 2 && d != 'x'").is_ok());
        // 只比對完整識別字，不做子字串比對
        assert!(check_str("newton + renewal").is_ok());
    }

    #[test]
    fn test_rejection_wins_over_lex_errors() {
        assert!(matches!(
            check_str("a # {"),
            Err(ItemGenError::UnsafeExpression { .. })
        ));
    }
}
