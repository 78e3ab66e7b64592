use crate::domain::model::{ParamSpec, Value};
use crate::utils::error::{ItemGenError, Result};

/// 範圍參數遇到排除值時的本地重抽上限
pub const MAX_SAMPLE_ATTEMPTS: usize = 400;

/// 解析後的取樣規則
#[derive(Debug, Clone, Copy, PartialEq)]
enum Rule<'a> {
    Discrete(&'a [Value]),
    IntRange { min: f64, max: f64 },
    RealRange { min: f64, max: f64 },
}

fn resolve<'a>(name: &str, spec: Option<&'a ParamSpec>) -> Result<Rule<'a>> {
    let invalid = |reason: &str| ItemGenError::InvalidParamSpec {
        param: name.to_string(),
        reason: reason.to_string(),
    };

    let spec = spec.ok_or_else(|| invalid("spec is missing"))?;
    if let Some(values) = &spec.values {
        if values.is_empty() {
            return Err(invalid("`values` must not be empty"));
        }
        return Ok(Rule::Discrete(values));
    }

    // 只有 max 時 min 預設為 0；只有 min 時 max 預設為 min
    let (min, max) = match (spec.min, spec.max) {
        (None, None) => return Err(invalid("needs either `values` or `min`/`max` bounds")),
        (Some(min), max) => (min, max.unwrap_or(min)),
        (None, Some(max)) => (0.0, max),
    };
    if !min.is_finite() || !max.is_finite() {
        return Err(invalid("bounds must be finite numbers"));
    }
    if min > max {
        return Err(invalid("`min` is greater than `max`"));
    }

    if min.fract() == 0.0 && max.fract() == 0.0 {
        Ok(Rule::IntRange { min, max })
    } else {
        Ok(Rule::RealRange { min, max })
    }
}

/// 為單一參數抽一個值。參數之間互相獨立，看不到先前抽出的值
pub fn sample(name: &str, spec: Option<&ParamSpec>, rng: &mut impl FnMut() -> f64) -> Result<Value> {
    let (min, max, is_int) = match resolve(name, spec)? {
        Rule::Discrete(values) => {
            let index = ((rng() * values.len() as f64).floor() as usize).min(values.len() - 1);
            return Ok(values[index].clone());
        }
        Rule::IntRange { min, max } => (min, max, true),
        Rule::RealRange { min, max } => (min, max, false),
    };

    let exclude = spec.map(|s| s.exclude.as_slice()).unwrap_or_default();
    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let candidate = if is_int {
            (min + rng() * (max - min + 1.0)).floor()
        } else {
            min + rng() * (max - min)
        };
        let value = Value::Number(candidate);
        if !exclude.contains(&value) {
            return Ok(value);
        }
    }

    Err(ItemGenError::SamplingExhausted {
        param: name.to_string(),
        attempts: MAX_SAMPLE_ATTEMPTS,
    })
}
