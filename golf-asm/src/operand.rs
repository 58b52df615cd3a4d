//! Converts evaluated operand [`Value`]s into the narrower
//! [`LogicalOperand`] shape signature validation and encoding actually work
//! with, and implements that validation (§4.3).

use crate::error::SyntaxError;
use crate::value::{DataLiteral, LabelValue, Value, INT_RANGE_MAX, INT_RANGE_MIN};
use golf_vm::RegisterId;
use tracing::warn;

/// An operand after evaluation, narrowed to the four shapes a GOLF operand
/// can legally take. Distinct from [`Value`] because a `Tuple` or
/// `Namespace` can appear as an intermediate evaluation result but never as
/// a final operand.
#[derive(Clone, Debug, PartialEq)]
pub enum LogicalOperand {
    Register(RegisterId),
    /// A constant in `[-2^63, 2^64)`, width not yet chosen.
    Integer(i128),
    Label(LabelValue),
    Data(DataLiteral),
}

/// Narrows an evaluated [`Value`] to the operand position, checking the
/// `[-2^63, 2^64)` integer range the encoder ultimately needs.
pub fn value_to_operand(value: Value, line: u32, text: &str) -> Result<LogicalOperand, SyntaxError> {
    match value {
        Value::Register(r) => Ok(LogicalOperand::Register(r)),
        Value::Label(l) => Ok(LogicalOperand::Label(l)),
        Value::Data(d) => Ok(LogicalOperand::Data(d)),
        Value::Int(i) => {
            if i < INT_RANGE_MIN || i > INT_RANGE_MAX {
                Err(SyntaxError::OperandOutOfRange { line, text: text.to_owned() })
            } else {
                Ok(LogicalOperand::Integer(i))
            }
        }
        _ => Err(SyntaxError::InvalidOperandType { line, text: text.to_owned() }),
    }
}

/// Validates a real mnemonic's operand list against its `(k_out, k_in)`
/// signature: right arity, the first `k_out` operands are registers, and
/// (for `ret`) every operand is a register, with a warning rather than an
/// error when one of them is `z`.
pub fn validate_signature(
    mnemonic: &str,
    is_ret: bool,
    signature: (u8, u8),
    operands: &[LogicalOperand],
    line: u32,
    text: &str,
) -> Result<(), SyntaxError> {
    if is_ret {
        for operand in operands {
            match operand {
                LogicalOperand::Register(r) if *r == RegisterId::Z => {
                    warn!(line, text, "ret names register z; its pre-return value is discarded by the restore");
                }
                LogicalOperand::Register(_) => {}
                _ => {
                    return Err(SyntaxError::WrongOperandClass {
                        line,
                        text: text.to_owned(),
                        mnemonic: mnemonic.to_owned(),
                        expected: operands.len() as u8,
                    })
                }
            }
        }
        return Ok(());
    }

    let (k_out, k_in) = signature;
    let expected = k_out + k_in;
    if operands.len() != expected as usize {
        return Err(SyntaxError::WrongOperandCount {
            line,
            text: text.to_owned(),
            mnemonic: mnemonic.to_owned(),
            expected,
            got: operands.len(),
        });
    }

    for operand in &operands[..k_out as usize] {
        if !matches!(operand, LogicalOperand::Register(_)) {
            return Err(SyntaxError::WrongOperandClass {
                line,
                text: text.to_owned(),
                mnemonic: mnemonic.to_owned(),
                expected: k_out,
            });
        }
    }

    Ok(())
}

/// `sz`/`snz`'s skip count must be a constant integer, resolved before the
/// label-offset pass runs — it cannot itself be a register or a forward
/// label reference.
pub fn require_constant_skip(
    mnemonic: &str,
    operand: &LogicalOperand,
    line: u32,
    text: &str,
) -> Result<i128, SyntaxError> {
    match operand {
        LogicalOperand::Integer(i) => Ok(*i),
        _ => Err(SyntaxError::NonConstantSkipCount {
            line,
            text: text.to_owned(),
            mnemonic: mnemonic.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_operand_within_range_is_accepted() {
        assert_eq!(
            value_to_operand(Value::Int(-1), 1, "").unwrap(),
            LogicalOperand::Integer(-1)
        );
        assert_eq!(
            value_to_operand(Value::Int(INT_RANGE_MAX), 1, "").unwrap(),
            LogicalOperand::Integer(INT_RANGE_MAX)
        );
    }

    #[test]
    fn integer_operand_out_of_range_is_an_error() {
        assert!(matches!(
            value_to_operand(Value::Int(INT_RANGE_MAX + 1), 1, ""),
            Err(SyntaxError::OperandOutOfRange { .. })
        ));
        assert!(matches!(
            value_to_operand(Value::Int(INT_RANGE_MIN - 1), 1, ""),
            Err(SyntaxError::OperandOutOfRange { .. })
        ));
    }

    #[test]
    fn float_operand_is_invalid_type() {
        assert!(matches!(
            value_to_operand(Value::Float(1.0), 1, ""),
            Err(SyntaxError::InvalidOperandType { .. })
        ));
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let ops = vec![LogicalOperand::Register(RegisterId::from_index(0))];
        assert!(matches!(
            validate_signature("add", false, (1, 2), &ops, 1, ""),
            Err(SyntaxError::WrongOperandCount { .. })
        ));
    }

    #[test]
    fn first_k_out_operands_must_be_registers() {
        let ops = vec![
            LogicalOperand::Integer(1),
            LogicalOperand::Register(RegisterId::from_index(0)),
            LogicalOperand::Integer(2),
        ];
        assert!(matches!(
            validate_signature("add", false, (1, 2), &ops, 1, ""),
            Err(SyntaxError::WrongOperandClass { .. })
        ));
    }

    #[test]
    fn ret_accepts_any_register_count_and_rejects_non_registers() {
        let ops = vec![LogicalOperand::Register(RegisterId::from_index(0))];
        assert!(validate_signature("ret", true, (0, 0), &ops, 1, "").is_ok());

        let bad = vec![LogicalOperand::Integer(1)];
        assert!(matches!(
            validate_signature("ret", true, (0, 0), &bad, 1, ""),
            Err(SyntaxError::WrongOperandClass { .. })
        ));
    }

    #[test]
    fn ret_with_z_is_accepted_not_rejected() {
        let ops = vec![LogicalOperand::Register(RegisterId::Z)];
        assert!(validate_signature("ret", true, (0, 0), &ops, 1, "").is_ok());
    }
}
