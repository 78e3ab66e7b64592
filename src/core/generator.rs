//! Item generation pipeline: sample → derive → constrain → answer → render.
//!
//! One [`SeededRng`](crate::core::rng::SeededRng) stream is created per call
//! to [`generate`] and keeps advancing across attempts, so each retry sees a
//! fresh sample while the whole call stays a pure function of
//! `(template, seed)`.

use crate::core::expr::evaluate;
use crate::core::render::render;
use crate::core::rng::make_rng;
use crate::core::sampler::sample;
use crate::domain::model::{GeneratedItem, OrderedMap, Scope, Template, Value};
use crate::utils::error::{ItemGenError, Result};
use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;

/// 整題重抽上限
pub const MAX_ITEM_ATTEMPTS: usize = 250;

/// 干擾選項可使用的保留變數，綁定為已算出的答案
pub const ANSWER_VARIABLE: &str = "ans";

static EXPRESSION_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+\-*/^()=<>]|Math\.").expect("expression pattern is valid"));

enum Attempt {
    Accepted(GeneratedItem),
    Rejected(String),
}

/// Generate one item for `template` from `seed`.
///
/// Sampling, derivation and constraint failures only reject the current
/// attempt. `InvalidTemplate`, `InvalidParamSpec` and an `UnsafeExpression`
/// in the answer/distractor stage abort immediately; exhausting
/// [`MAX_ITEM_ATTEMPTS`] yields `Unsatisfiable`.
pub fn generate(template: &Template, seed: impl Display) -> Result<GeneratedItem> {
    let seed = seed.to_string();
    let answer = template
        .answer
        .as_ref()
        .ok_or_else(|| ItemGenError::InvalidTemplate {
            template_id: template.label().to_string(),
            reason: "missing answer".to_string(),
        })?;

    let mut rng = make_rng(seed.clone());
    let mut last_failure = None;
    for _ in 0..MAX_ITEM_ATTEMPTS {
        match attempt(template, answer, &mut rng)? {
            Attempt::Accepted(item) => return Ok(item),
            Attempt::Rejected(reason) => last_failure = Some(reason),
        }
    }

    Err(ItemGenError::Unsatisfiable {
        template_id: template.label().to_string(),
        seed,
        attempts: MAX_ITEM_ATTEMPTS,
        last_failure,
    })
}

fn attempt(template: &Template, answer: &Value, rng: &mut impl FnMut() -> f64) -> Result<Attempt> {
    let mut params = OrderedMap::new();
    for (name, spec) in template.params.iter() {
        match sample(name, spec.as_ref(), rng) {
            Ok(value) => params.insert(name, value),
            Err(e @ ItemGenError::InvalidParamSpec { .. }) => return Err(e),
            Err(e) => return Ok(Attempt::Rejected(e.to_string())),
        }
    }

    let mut scope: Scope = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();

    // 衍生值依宣告順序計算，只看得到參數與之前的衍生值
    let mut derived = OrderedMap::new();
    for (name, source) in template.derived.iter() {
        match evaluate(source, &scope) {
            Ok(value) => {
                scope.insert(name.to_string(), value.clone());
                derived.insert(name, value);
            }
            Err(e) => return Ok(Attempt::Rejected(format!("derived '{}': {}", name, e))),
        }
    }

    for constraint in &template.constraints {
        match evaluate(constraint, &scope) {
            Ok(value) if value.is_truthy() => {}
            Ok(_) => {
                return Ok(Attempt::Rejected(format!(
                    "constraint '{}' was not satisfied",
                    constraint
                )))
            }
            Err(e) => return Ok(Attempt::Rejected(format!("constraint '{}': {}", constraint, e))),
        }
    }

    let answer = match resolve_option(answer, &scope) {
        Ok(value) => value,
        Err(e) if e.is_attempt_local() => return Ok(Attempt::Rejected(format!("answer: {}", e))),
        Err(e) => return Err(e),
    };

    let answer_text = answer.to_string();
    let mut option_scope = scope.clone();
    option_scope.insert(ANSWER_VARIABLE.to_string(), answer.clone());

    let mut distractors = Vec::with_capacity(template.distractors.len());
    for raw in &template.distractors {
        let value = match resolve_option(raw, &option_scope) {
            Ok(value) => value,
            Err(e) if e.is_attempt_local() => {
                return Ok(Attempt::Rejected(format!("distractor: {}", e)))
            }
            Err(e) => return Err(e),
        };
        if value.to_string() != answer_text {
            distractors.push(value);
        }
    }

    Ok(Attempt::Accepted(GeneratedItem {
        stem: render(&template.stem, &scope),
        params,
        derived,
        answer,
        distractors,
    }))
}

/// 答案/干擾選項：不像表達式的字串只查變數名稱，否則原樣當作字面值；
/// 像表達式的才交給求值器
fn resolve_option(raw: &Value, scope: &Scope) -> Result<Value> {
    let Value::Text(source) = raw else {
        return Ok(raw.clone());
    };
    if !looks_like_expression(source) {
        return Ok(scope.get(source).cloned().unwrap_or_else(|| raw.clone()));
    }
    evaluate(source, scope)
}

pub fn looks_like_expression(text: &str) -> bool {
    EXPRESSION_LIKE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ParamSpec;

    fn template_x_times_two() -> Template {
        Template {
            id: Some("double".to_string()),
            stem: "What is {{x}} times 2?".to_string(),
            params: [("x", Some(ParamSpec::range(1.0, 3.0)))].into_iter().collect(),
            constraints: vec!["x != 2".to_string()],
            answer: Some(Value::from("x*2")),
            distractors: vec![Value::from("x*3"), Value::from("ans + 1"), Value::from("x+x")],
            ..Template::default()
        }
    }

    #[test]
    fn test_resolve_option_literal_fallback() {
        let scope: Scope = [("x".to_string(), Value::from(2.0))].into_iter().collect();
        assert_eq!(resolve_option(&Value::from("x"), &scope).unwrap(), Value::from(2.0));
        assert_eq!(resolve_option(&Value::from("A"), &scope).unwrap(), Value::from("A"));
        assert_eq!(
            resolve_option(&Value::from("The value is"), &scope).unwrap(),
            Value::from("The value is")
        );
        assert_eq!(resolve_option(&Value::from(5.0), &scope).unwrap(), Value::from(5.0));
        // 一般文字中的保留字不會被當成程式碼
        assert_eq!(
            resolve_option(&Value::from("This cannot be determined"), &scope).unwrap(),
            Value::from("This cannot be determined")
        );
        assert_eq!(
            resolve_option(&Value::from("New York"), &scope).unwrap(),
            Value::from("New York")
        );
        assert!(matches!(
            resolve_option(&Value::from("y * 2"), &scope),
            Err(ItemGenError::EvaluationError { .. })
        ));
    }

    #[test]
    fn test_looks_like_expression() {
        assert!(looks_like_expression("a+b"));
        assert!(looks_like_expression("Math.PI"));
        assert!(looks_like_expression("(x)"));
        assert!(!looks_like_expression("Paris"));
        assert!(!looks_like_expression("x"));
    }

    #[test]
    fn test_generates_valid_item() {
        let item = generate(&template_x_times_two(), "s1").unwrap();
        let x = item.params.get("x").unwrap().as_f64().unwrap();
        assert!(x == 1.0 || x == 3.0);
        assert_eq!(item.answer, Value::from(x * 2.0));
        assert_eq!(item.stem, format!("What is {} times 2?", x));
        // x+x 與答案相同，必須被去除
        assert_eq!(item.distractors, vec![Value::from(x * 3.0), Value::from(x * 2.0 + 1.0)]);
    }

    #[test]
    fn test_missing_answer_is_invalid_template() {
        let mut template = template_x_times_two();
        template.answer = None;
        assert!(matches!(
            generate(&template, "s1"),
            Err(ItemGenError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn test_invalid_param_spec_escapes() {
        let mut template = template_x_times_two();
        template.params.insert("broken", None);
        assert!(matches!(
            generate(&template, "s1"),
            Err(ItemGenError::InvalidParamSpec { ref param, .. }) if param == "broken"
        ));
    }

    #[test]
    fn test_unsafe_answer_escapes() {
        let mut template = template_x_times_two();
        template.answer = Some(Value::from("x + constructor"));
        assert!(matches!(
            generate(&template, "s1"),
            Err(ItemGenError::UnsafeExpression { .. })
        ));
    }

    #[test]
    fn test_failing_derived_reports_last_failure() {
        let mut template = template_x_times_two();
        template.derived.insert("bad", "x / 0".to_string());
        match generate(&template, "s1").unwrap_err() {
            ItemGenError::Unsatisfiable { attempts, last_failure, .. } => {
                assert_eq!(attempts, MAX_ITEM_ATTEMPTS);
                assert!(last_failure.unwrap().contains("derived 'bad'"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
