//! Evaluates an [`Expr`] tree against an [`Env`], producing a [`Value`].
//! Arithmetic promotes to `f64` only when an operand already is one;
//! otherwise everything stays in `i128` so operand-range checks downstream
//! see exact integers rather than float-rounded approximations.

use crate::error::EvaluationError;
use crate::expr::{BinOp, Expr, UnaryOp};
use crate::value::{describe, Env, Value};
use std::convert::TryFrom;

pub fn eval(expr: &Expr, env: &Env) -> Result<Value, EvaluationError> {
    match expr {
        Expr::Int(i) => Ok(Value::Int(*i)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bytes(b) => Ok(Value::Bytes(b.clone())),
        Expr::Name(path) => env
            .resolve_path(path)
            .ok_or_else(|| EvaluationError::UnknownName(path.join("."))),
        Expr::Unary(op, inner) => eval_unary(*op, eval(inner, env)?),
        Expr::Binary(op, lhs, rhs) => eval_binary(*op, eval(lhs, env)?, eval(rhs, env)?),
        Expr::Call(path, args) => {
            let callee = env
                .resolve_path(path)
                .ok_or_else(|| EvaluationError::UnknownName(path.join(".")))?;
            let values = args.iter().map(|a| eval(a, env)).collect::<Result<Vec<_>, _>>()?;
            match callee {
                Value::NativeFn(_, f) => f(&values),
                other => Err(EvaluationError::TypeMismatch(describe(&other))),
            }
        }
        Expr::Tuple(items) => Ok(Value::Tuple(
            items.iter().map(|e| eval(e, env)).collect::<Result<Vec<_>, _>>()?,
        )),
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> Result<Value, EvaluationError> {
    match (op, value) {
        (UnaryOp::Plus, v @ Value::Int(_)) | (UnaryOp::Plus, v @ Value::Float(_)) => Ok(v),
        (UnaryOp::Neg, Value::Int(i)) => Ok(Value::Int(-i)),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Not, Value::Int(i)) => Ok(Value::Int(!i)),
        (_, other) => Err(EvaluationError::TypeMismatch(describe(&other))),
    }
}

fn eval_binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, EvaluationError> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        return eval_int_binary(op, *a, *b);
    }

    let a = lhs.as_f64()?;
    let b = rhs.as_f64()?;
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::FloorDiv => (a / b).floor(),
        BinOp::Mod => a.rem_euclid(b),
        BinOp::Pow => a.powf(b),
        BinOp::Shl | BinOp::Shr | BinOp::BitAnd | BinOp::BitXor | BinOp::BitOr => {
            return Err(EvaluationError::TypeMismatch("float"))
        }
    };
    Ok(Value::Float(result))
}

/// Rounds toward negative infinity, matching the host's `//` rather than
/// Rust's truncating `/`; differs from `div_euclid` whenever `b` is negative.
/// `None` only for the `i128::MIN / -1` overflow case `checked_div` already
/// guards against.
fn floor_div(a: i128, b: i128) -> Option<i128> {
    let q = a.checked_div(b)?;
    let r = a.checked_rem(b)?;
    if r != 0 && (r < 0) != (b < 0) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// The remainder that pairs with [`floor_div`]: always takes the sign of
/// `b`, matching the host's `%`.
fn floor_rem(a: i128, b: i128) -> Option<i128> {
    let r = a.checked_rem(b)?;
    if r != 0 && (r < 0) != (b < 0) {
        r.checked_add(b)
    } else {
        Some(r)
    }
}

/// Narrows a shift/exponent count to `u32`, the width `i128`'s checked
/// shift/pow operations expect; a negative or oversized count can't be a
/// valid one regardless of what it's applied to.
fn small_count(n: i128) -> Option<u32> {
    u32::try_from(n).ok()
}

fn overflow<T>(value: Option<T>) -> Result<T, EvaluationError> {
    value.ok_or(EvaluationError::IntegerOverflow)
}

/// All of these operators can exceed `i128`'s own range (`1 << 200`,
/// `2 ** 200`, `i128::MIN - 1`, ...); the host's bignum evaluator would
/// happily produce a huge exact result and let operand narrowing reject it,
/// but `i128` itself has no headroom to widen into, so overflow here is
/// reported as an [`EvaluationError`] instead of panicking or wrapping.
fn eval_int_binary(op: BinOp, a: i128, b: i128) -> Result<Value, EvaluationError> {
    let value = match op {
        BinOp::Add => Value::Int(overflow(a.checked_add(b))?),
        BinOp::Sub => Value::Int(overflow(a.checked_sub(b))?),
        BinOp::Mul => Value::Int(overflow(a.checked_mul(b))?),
        BinOp::Div => {
            if b == 0 {
                return Err(EvaluationError::DivisionByZero);
            }
            Value::Float(a as f64 / b as f64)
        }
        BinOp::FloorDiv => {
            if b == 0 {
                return Err(EvaluationError::DivisionByZero);
            }
            Value::Int(overflow(floor_div(a, b))?)
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(EvaluationError::DivisionByZero);
            }
            Value::Int(overflow(floor_rem(a, b))?)
        }
        BinOp::Shl => {
            let count = overflow(small_count(b))?;
            Value::Int(overflow(a.checked_shl(count))?)
        }
        BinOp::Shr => {
            let count = overflow(small_count(b))?;
            Value::Int(overflow(a.checked_shr(count))?)
        }
        BinOp::BitAnd => Value::Int(a & b),
        BinOp::BitXor => Value::Int(a ^ b),
        BinOp::BitOr => Value::Int(a | b),
        BinOp::Pow if b >= 0 => {
            let exp = overflow(small_count(b))?;
            Value::Int(overflow(a.checked_pow(exp))?)
        }
        BinOp::Pow => Value::Float((a as f64).powf(b as f64)),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn eval_str(src: &str) -> Value {
        eval(&parse_expr(src).unwrap(), &Env::new()).unwrap()
    }

    #[test]
    fn arithmetic_stays_integral() {
        assert_eq!(eval_str("2 + 3 * 4"), Value::Int(14));
        assert_eq!(eval_str("(2 + 3) * 4"), Value::Int(20));
    }

    #[test]
    fn bitwise_and_shift_operators() {
        assert_eq!(eval_str("1 << 4"), Value::Int(16));
        assert_eq!(eval_str("0xF0 | 0x0F"), Value::Int(0xFF));
        assert_eq!(eval_str("~0"), Value::Int(-1));
    }

    #[test]
    fn floor_division_rounds_toward_negative_infinity() {
        assert_eq!(eval_str("7 // -2"), Value::Int(-4));
        assert_eq!(eval_str("7 % -2"), Value::Int(-1));
    }

    #[test]
    fn division_by_zero_is_an_evaluation_error() {
        assert!(matches!(
            eval(&parse_expr("1 / 0").unwrap(), &Env::new()),
            Err(EvaluationError::DivisionByZero)
        ));
    }

    #[test]
    fn registers_resolve_to_register_values() {
        assert!(matches!(eval_str("a"), Value::Register(_)));
    }

    #[test]
    fn math_namespace_and_flattened_names_agree() {
        assert_eq!(eval_str("math.sqrt(4)"), eval_str("sqrt(4)"));
    }

    #[test]
    fn pow_of_ints_stays_integral() {
        assert_eq!(eval_str("pow(2, 10)"), Value::Int(1024));
        assert_eq!(eval_str("2 ** 10"), Value::Int(1024));
    }

    #[test]
    fn oversized_shift_is_an_evaluation_error_instead_of_a_panic() {
        assert!(matches!(
            eval(&parse_expr("1 << 200").unwrap(), &Env::new()),
            Err(EvaluationError::IntegerOverflow)
        ));
    }

    #[test]
    fn oversized_power_is_an_evaluation_error_instead_of_a_panic() {
        assert!(matches!(
            eval(&parse_expr("2 ** 200").unwrap(), &Env::new()),
            Err(EvaluationError::IntegerOverflow)
        ));
    }

    #[test]
    fn addition_overflow_is_an_evaluation_error() {
        let huge = format!("{} + 1", i128::MAX);
        assert!(matches!(
            eval(&parse_expr(&huge).unwrap(), &Env::new()),
            Err(EvaluationError::IntegerOverflow)
        ));
    }

    #[test]
    fn unknown_name_is_an_evaluation_error() {
        assert!(matches!(
            eval(&parse_expr("bogus").unwrap(), &Env::new()),
            Err(EvaluationError::UnknownName(_))
        ));
    }
}
