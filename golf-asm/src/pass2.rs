//! Pass 2 (§2.5): walks the source a second time, this time evaluating
//! every assignment and instruction operand against an [`Env`] pre-seeded
//! with every label the label pass found. Pre-binding up front means a
//! forward reference to a label and a reference to "the name currently
//! bound to a label" are both answered by one plain `env.get`/`env.bind`
//! call, with no special-casing for direction.

use crate::error::{AssembleError, SyntaxError};
use crate::labels::run_label_pass;
use crate::lines::{classify, read_logical_lines, LineKind};
use crate::mnemonic::Mnemonic;
use crate::operand::{require_constant_skip, validate_signature, value_to_operand, LogicalOperand};
use crate::parser::{parse_expr, parse_operand_list};
use crate::value::{Env, LabelValue, Value};

#[derive(Clone, Debug)]
pub struct LogicalInstruction {
    pub line: u32,
    pub text: String,
    pub logical_index: u32,
    pub mnemonic: Mnemonic,
    pub mnemonic_name: String,
    pub operands: Vec<LogicalOperand>,
}

pub struct Pass2Output {
    pub instructions: Vec<LogicalInstruction>,
    pub labels: std::collections::HashMap<String, u32>,
}

pub fn run_pass2(source: &str) -> Result<Pass2Output, AssembleError> {
    let label_pass = run_label_pass(source)?;

    let mut env = Env::new();
    for (name, &instr_index) in &label_pass.labels {
        env.bind(
            name.clone(),
            Value::Label(LabelValue { name: Some(name.clone()), instr_index }),
        );
    }

    let mut instructions = Vec::new();
    let mut index = 0u32;

    for logical in read_logical_lines(source) {
        let kind = match classify(&logical)? {
            Some(k) => k,
            None => continue,
        };

        match kind {
            LineKind::Label { .. } => {}
            LineKind::Assignment { name, expr_text } => {
                if env.is_label(&name) {
                    return Err(SyntaxError::OverwritingLabel {
                        line: logical.line,
                        text: logical.raw.clone(),
                        name,
                    }
                    .into());
                }
                let expr = parse_expr(&expr_text)?;
                let value = crate::eval::eval(&expr, &env).map_err(|source| SyntaxError::Evaluation {
                    line: logical.line,
                    text: logical.raw.clone(),
                    source,
                })?;
                env.bind(name, value);
            }
            LineKind::Instruction { mnemonic, operand_text } => {
                let mnemonic_kind = Mnemonic::from_str(&mnemonic).ok_or_else(|| SyntaxError::UnknownMnemonic {
                    line: logical.line,
                    text: logical.raw.clone(),
                    mnemonic: mnemonic.clone(),
                })?;

                let exprs = parse_operand_list(&operand_text)?;
                let mut operands = Vec::with_capacity(exprs.len());
                for expr in &exprs {
                    let value = crate::eval::eval(expr, &env).map_err(|source| SyntaxError::Evaluation {
                        line: logical.line,
                        text: logical.raw.clone(),
                        source,
                    })?;
                    operands.push(value_to_operand(value, logical.line, &logical.raw)?);
                }

                validate_signature(
                    &mnemonic,
                    mnemonic_kind.is_ret(),
                    mnemonic_kind.signature(),
                    &operands,
                    logical.line,
                    &logical.raw,
                )?;

                if matches!(
                    mnemonic_kind,
                    Mnemonic::Pseudo(crate::mnemonic::PseudoOp::Sz) | Mnemonic::Pseudo(crate::mnemonic::PseudoOp::Snz)
                ) {
                    require_constant_skip(&mnemonic, &operands[1], logical.line, &logical.raw)?;
                }

                instructions.push(LogicalInstruction {
                    line: logical.line,
                    text: logical.raw.clone(),
                    logical_index: index,
                    mnemonic: mnemonic_kind,
                    mnemonic_name: mnemonic,
                    operands,
                });
                index += 1;
            }
        }
    }

    Ok(Pass2Output { instructions, labels: label_pass.labels })
}
