use super::parser::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::domain::model::{Scope, Value};
use std::cmp::Ordering;

type EvalResult = std::result::Result<Value, String>;

/// `Math.*` 常數
pub fn math_constant(name: &str) -> Option<f64> {
    use std::f64::consts;
    Some(match name {
        "PI" => consts::PI,
        "E" => consts::E,
        "LN2" => consts::LN_2,
        "LN10" => consts::LN_10,
        "LOG2E" => consts::LOG2_E,
        "LOG10E" => consts::LOG10_E,
        "SQRT2" => consts::SQRT_2,
        "SQRT1_2" => consts::FRAC_1_SQRT_2,
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MathFn {
    Abs,
    Sign,
    Floor,
    Ceil,
    Round,
    Trunc,
    Sqrt,
    Cbrt,
    Exp,
    Expm1,
    Log,
    Log2,
    Log10,
    Log1p,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Atan2,
    Pow,
    Hypot,
    Min,
    Max,
}

impl MathFn {
    pub fn lookup(name: &str) -> Option<Self> {
        use MathFn::*;
        Some(match name {
            "abs" => Abs,
            "sign" => Sign,
            "floor" => Floor,
            "ceil" => Ceil,
            "round" => Round,
            "trunc" => Trunc,
            "sqrt" => Sqrt,
            "cbrt" => Cbrt,
            "exp" => Exp,
            "expm1" => Expm1,
            "log" => Log,
            "log2" => Log2,
            "log10" => Log10,
            "log1p" => Log1p,
            "sin" => Sin,
            "cos" => Cos,
            "tan" => Tan,
            "asin" => Asin,
            "acos" => Acos,
            "atan" => Atan,
            "sinh" => Sinh,
            "cosh" => Cosh,
            "tanh" => Tanh,
            "asinh" => Asinh,
            "acosh" => Acosh,
            "atanh" => Atanh,
            "atan2" => Atan2,
            "pow" => Pow,
            "hypot" => Hypot,
            "min" => Min,
            "max" => Max,
            _ => return None,
        })
    }

    pub fn check_arity(self, given: usize) -> std::result::Result<(), String> {
        let expected = match self {
            MathFn::Hypot | MathFn::Min | MathFn::Max => return Ok(()),
            MathFn::Atan2 | MathFn::Pow => 2,
            _ => 1,
        };
        if given == expected {
            Ok(())
        } else {
            Err(format!("{:?} expects {} argument(s), got {}", self, expected, given))
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        use MathFn::*;
        match self {
            Abs => args[0].abs(),
            Sign => {
                let x = args[0];
                if x.is_nan() || x == 0.0 { x } else { x.signum() }
            }
            Floor => args[0].floor(),
            Ceil => args[0].ceil(),
            // 四捨五入往 +∞：-2.5 -> -2
            Round => {
                let floor = args[0].floor();
                if args[0] - floor >= 0.5 {
                    floor + 1.0
                } else {
                    floor
                }
            }
            Trunc => args[0].trunc(),
            Sqrt => args[0].sqrt(),
            Cbrt => args[0].cbrt(),
            Exp => args[0].exp(),
            Expm1 => args[0].exp_m1(),
            Log => args[0].ln(),
            Log2 => args[0].log2(),
            Log10 => args[0].log10(),
            Log1p => args[0].ln_1p(),
            Sin => args[0].sin(),
            Cos => args[0].cos(),
            Tan => args[0].tan(),
            Asin => args[0].asin(),
            Acos => args[0].acos(),
            Atan => args[0].atan(),
            Sinh => args[0].sinh(),
            Cosh => args[0].cosh(),
            Tanh => args[0].tanh(),
            Asinh => args[0].asinh(),
            Acosh => args[0].acosh(),
            Atanh => args[0].atanh(),
            Atan2 => args[0].atan2(args[1]),
            Pow => args[0].powf(args[1]),
            Hypot => args.iter().map(|x| x * x).sum::<f64>().sqrt(),
            Min => args.iter().copied().fold(f64::INFINITY, |acc, x| {
                if acc.is_nan() || x.is_nan() { f64::NAN } else { acc.min(x) }
            }),
            Max => args.iter().copied().fold(f64::NEG_INFINITY, |acc, x| {
                if acc.is_nan() || x.is_nan() { f64::NAN } else { acc.max(x) }
            }),
        }
    }
}

pub fn eval(expr: &Expr, scope: &Scope) -> EvalResult {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Var(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| format!("unknown identifier '{}'", name)),
        Expr::Call { func, args } => {
            let mut numbers = Vec::with_capacity(args.len());
            for arg in args {
                numbers.push(to_number(&eval(arg, scope)?)?);
            }
            Ok(Value::Number(func.apply(&numbers)))
        }
        Expr::Unary { op, operand } => {
            let value = eval(operand, scope)?;
            Ok(match op {
                UnaryOp::Neg => Value::Number(-to_number(&value)?),
                UnaryOp::Plus => Value::Number(to_number(&value)?),
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
            })
        }
        Expr::Logical { op, lhs, rhs } => {
            let left = eval(lhs, scope)?;
            let decided = match op {
                LogicalOp::And => !left.is_truthy(),
                LogicalOp::Or => left.is_truthy(),
            };
            if decided {
                Ok(left)
            } else {
                eval(rhs, scope)
            }
        }
        Expr::Conditional { cond, then, otherwise } => {
            if eval(cond, scope)?.is_truthy() {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let left = eval(lhs, scope)?;
            let right = eval(rhs, scope)?;
            binary(*op, &left, &right)
        }
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Text(_), _) | (_, Value::Text(_)) => Ok(Value::Text(format!("{}{}", left, right))),
            _ => Ok(Value::Number(to_number(left)? + to_number(right)?)),
        },
        BinaryOp::Sub => Ok(Value::Number(to_number(left)? - to_number(right)?)),
        BinaryOp::Mul => Ok(Value::Number(to_number(left)? * to_number(right)?)),
        BinaryOp::Div => {
            let divisor = to_number(right)?;
            if divisor == 0.0 {
                return Err("division by zero".to_string());
            }
            Ok(Value::Number(to_number(left)? / divisor))
        }
        BinaryOp::Rem => {
            let divisor = to_number(right)?;
            if divisor == 0.0 {
                return Err("modulo by zero".to_string());
            }
            Ok(Value::Number(to_number(left)? % divisor))
        }
        BinaryOp::Pow => Ok(Value::Number(to_number(left)?.powf(to_number(right)?))),
        BinaryOp::Lt => compare(left, right).map(|o| Value::Bool(o == Some(Ordering::Less))),
        BinaryOp::Le => compare(left, right)
            .map(|o| Value::Bool(matches!(o, Some(Ordering::Less | Ordering::Equal)))),
        BinaryOp::Gt => compare(left, right).map(|o| Value::Bool(o == Some(Ordering::Greater))),
        BinaryOp::Ge => compare(left, right)
            .map(|o| Value::Bool(matches!(o, Some(Ordering::Greater | Ordering::Equal)))),
        BinaryOp::LooseEq => Ok(Value::Bool(loose_eq(left, right))),
        BinaryOp::LooseNe => Ok(Value::Bool(!loose_eq(left, right))),
        BinaryOp::StrictEq => Ok(Value::Bool(left == right)),
        BinaryOp::StrictNe => Ok(Value::Bool(left != right)),
    }
}

fn to_number(value: &Value) -> std::result::Result<f64, String> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| format!("type mismatch: '{}' is not a number", s))
        }
    }
}

fn compare(left: &Value, right: &Value) -> std::result::Result<Option<Ordering>, String> {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => Ok(Some(a.cmp(b))),
        _ => Ok(to_number(left)?.partial_cmp(&to_number(right)?)),
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        _ => match (to_number(left), to_number(right)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
    }
}
