//! `pow`, `data(...)`, and the handful of `math` constants/functions the
//! evaluator pre-binds both at top level and under the `math` namespace,
//! mirroring `from math import *` plus a bound `math` module.

use crate::error::EvaluationError;
use crate::value::{DataLiteral, Value, INT_RANGE_MAX, INT_RANGE_MIN};

pub fn math_members() -> Vec<(String, Value)> {
    vec![
        ("pi".to_owned(), Value::Float(std::f64::consts::PI)),
        ("e".to_owned(), Value::Float(std::f64::consts::E)),
        ("tau".to_owned(), Value::Float(std::f64::consts::TAU)),
        ("inf".to_owned(), Value::Float(f64::INFINITY)),
        ("nan".to_owned(), Value::Float(f64::NAN)),
        ("sqrt".to_owned(), Value::NativeFn("sqrt", sqrt)),
        ("floor".to_owned(), Value::NativeFn("floor", floor)),
        ("ceil".to_owned(), Value::NativeFn("ceil", ceil)),
        ("trunc".to_owned(), Value::NativeFn("trunc", trunc)),
        ("log".to_owned(), Value::NativeFn("log", log)),
        ("log2".to_owned(), Value::NativeFn("log2", log2)),
        ("log10".to_owned(), Value::NativeFn("log10", log10)),
        ("exp".to_owned(), Value::NativeFn("exp", exp)),
        ("gcd".to_owned(), Value::NativeFn("gcd", gcd)),
        ("pow".to_owned(), Value::NativeFn("pow", pow)),
    ]
}

fn one_arg(args: &[Value], name: &'static str) -> Result<f64, EvaluationError> {
    match args {
        [v] => v.as_f64(),
        _ => Err(EvaluationError::WrongArgumentCount(name, 1, args.len())),
    }
}

fn sqrt(args: &[Value]) -> Result<Value, EvaluationError> {
    Ok(Value::Float(one_arg(args, "sqrt")?.sqrt()))
}

fn floor(args: &[Value]) -> Result<Value, EvaluationError> {
    Ok(Value::Int(one_arg(args, "floor")?.floor() as i128))
}

fn ceil(args: &[Value]) -> Result<Value, EvaluationError> {
    Ok(Value::Int(one_arg(args, "ceil")?.ceil() as i128))
}

fn trunc(args: &[Value]) -> Result<Value, EvaluationError> {
    Ok(Value::Int(one_arg(args, "trunc")?.trunc() as i128))
}

fn log(args: &[Value]) -> Result<Value, EvaluationError> {
    match args {
        [v] => Ok(Value::Float(v.as_f64()?.ln())),
        [v, base] => Ok(Value::Float(v.as_f64()?.log(base.as_f64()?))),
        _ => Err(EvaluationError::WrongArgumentCount("log", 1, args.len())),
    }
}

fn log2(args: &[Value]) -> Result<Value, EvaluationError> {
    Ok(Value::Float(one_arg(args, "log2")?.log2()))
}

fn log10(args: &[Value]) -> Result<Value, EvaluationError> {
    Ok(Value::Float(one_arg(args, "log10")?.log10()))
}

fn exp(args: &[Value]) -> Result<Value, EvaluationError> {
    Ok(Value::Float(one_arg(args, "exp")?.exp()))
}

fn gcd(args: &[Value]) -> Result<Value, EvaluationError> {
    match args {
        [a, b] => {
            let mut a = a.as_int()?.unsigned_abs();
            let mut b = b.as_int()?.unsigned_abs();
            while b != 0 {
                let t = b;
                b = a % b;
                a = t;
            }
            Ok(Value::Int(a as i128))
        }
        _ => Err(EvaluationError::WrongArgumentCount("gcd", 2, args.len())),
    }
}

/// `pow(base, exp)`: integer result for integer inputs with a non-negative
/// exponent, floating point otherwise — mirroring the host's overloaded
/// `pow`/`**`.
pub fn pow(args: &[Value]) -> Result<Value, EvaluationError> {
    match args {
        [Value::Int(base), Value::Int(exp)] if *exp >= 0 => {
            Ok(Value::Int(base.pow(*exp as u32)))
        }
        [base, exp] => Ok(Value::Float(base.as_f64()?.powf(exp.as_f64()?))),
        _ => Err(EvaluationError::WrongArgumentCount("pow", 2, args.len())),
    }
}

/// `data(...)`: a byte string, a text string, or a finite sequence of
/// integers, each in `[-2^63, 2^64)`. A bare integer isn't iterable, so
/// (unlike a 1-tuple) it isn't accepted as a one-element sequence.
pub fn data(args: &[Value]) -> Result<Value, EvaluationError> {
    let value = match args {
        [v] => v,
        _ => return Err(EvaluationError::WrongArgumentCount("data", 1, args.len())),
    };

    let literal = match value {
        Value::Bytes(b) => DataLiteral::Bytes(b.clone()),
        Value::Str(s) => DataLiteral::Text(s.clone()),
        Value::Tuple(items) => {
            let ints = items
                .iter()
                .map(Value::as_int)
                .collect::<Result<Vec<_>, _>>()?;
            for i in &ints {
                if *i < INT_RANGE_MIN || *i > INT_RANGE_MAX {
                    return Err(EvaluationError::IntegerOutOfRange(*i));
                }
            }
            DataLiteral::Ints(ints)
        }
        other => return Err(EvaluationError::TypeMismatch(crate::value::describe(other))),
    };

    Ok(Value::Data(literal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_of_ints_within_range_is_accepted() {
        let result = data(&[Value::Tuple(vec![Value::Int(-1), Value::Int(INT_RANGE_MAX)])]).unwrap();
        assert_eq!(result, Value::Data(DataLiteral::Ints(vec![-1, INT_RANGE_MAX])));
    }

    #[test]
    fn data_of_ints_out_of_range_is_rejected() {
        assert!(matches!(
            data(&[Value::Tuple(vec![Value::Int(INT_RANGE_MAX + 1)])]),
            Err(EvaluationError::IntegerOutOfRange(_))
        ));
        assert!(matches!(
            data(&[Value::Tuple(vec![Value::Int(INT_RANGE_MIN - 1)])]),
            Err(EvaluationError::IntegerOutOfRange(_))
        ));
    }

    #[test]
    fn bare_int_is_not_a_valid_data_payload() {
        assert!(matches!(
            data(&[Value::Int(5)]),
            Err(EvaluationError::TypeMismatch(_))
        ));
    }
}
