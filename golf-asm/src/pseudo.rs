//! Pseudo-instruction expansion (§4.4): rewrites each logical instruction
//! into one or more real instructions, preserving the original source line
//! for diagnostics. `sz`/`snz` additionally manufacture an anonymous
//! forward-pointing label bound to a *logical* instruction index, so a
//! `logical_index -> expanded_index` table is carried alongside the
//! expanded stream for the label-offset pass to remap against.

use crate::error::SyntaxError;
use crate::mnemonic::{Mnemonic, PseudoOp};
use crate::operand::LogicalOperand;
use crate::pass2::LogicalInstruction;
use crate::value::LabelValue;
use golf_vm::instructions::HALT_ID;
use golf_vm::Opcode;

/// One real instruction after pseudo-expansion: a stable opcode id (or
/// [`HALT_ID`]) and its final operand list, still carrying the original
/// source line for diagnostics and debug-info emission.
#[derive(Clone, Debug)]
pub struct RealInstruction {
    pub line: u32,
    pub text: String,
    pub opcode_id: u32,
    pub operands: Vec<LogicalOperand>,
}

pub struct ExpansionOutput {
    pub instructions: Vec<RealInstruction>,
    /// Index `i` is the expanded-stream index of the first real instruction
    /// produced from logical instruction `i`. Carries one trailing entry,
    /// at index `instructions_logical.len()`, equal to the total expanded
    /// count, so a label bound one-past-the-end still resolves.
    pub logical_to_expanded: Vec<u32>,
}

fn anon_label(target: i128, total_logical: u32, line: u32, text: &str) -> Result<LogicalOperand, SyntaxError> {
    if target < 0 || target > total_logical as i128 {
        return Err(SyntaxError::OperandOutOfRange { line, text: text.to_owned() });
    }
    Ok(LogicalOperand::Label(LabelValue { name: None, instr_index: target as u32 }))
}

fn real(opcode: Opcode, operands: Vec<LogicalOperand>, src: &LogicalInstruction) -> RealInstruction {
    RealInstruction { line: src.line, text: src.text.clone(), opcode_id: opcode.id(), operands }
}

/// Rewrites every [`LogicalOperand::Label`] operand's `instr_index` from a
/// logical instruction index to its expanded-stream index, using the table
/// [`expand`] produced. Must run after expansion and before layout; layout
/// has no other way to resolve a label's target.
pub fn remap_labels_to_expanded(instructions: &mut [RealInstruction], logical_to_expanded: &[u32]) {
    for instr in instructions {
        for op in &mut instr.operands {
            if let LogicalOperand::Label(label) = op {
                label.instr_index = logical_to_expanded[label.instr_index as usize];
            }
        }
    }
}

pub fn expand(logical: &[LogicalInstruction]) -> Result<ExpansionOutput, SyntaxError> {
    let total_logical = logical.len() as u32;
    let mut instructions = Vec::new();
    let mut logical_to_expanded = Vec::with_capacity(logical.len() + 1);

    for instr in logical {
        logical_to_expanded.push(instructions.len() as u32);
        let ops = &instr.operands;

        match instr.mnemonic {
            Mnemonic::Halt => instructions.push(RealInstruction {
                line: instr.line,
                text: instr.text.clone(),
                opcode_id: HALT_ID,
                operands: ops.clone(),
            }),
            Mnemonic::Real(op) => instructions.push(real(op, ops.clone(), instr)),
            Mnemonic::Pseudo(pseudo) => match pseudo {
                PseudoOp::Ge => instructions.push(real(Opcode::Le, vec![ops[0].clone(), ops[2].clone(), ops[1].clone()], instr)),
                PseudoOp::Geq => instructions.push(real(Opcode::Leq, vec![ops[0].clone(), ops[2].clone(), ops[1].clone()], instr)),
                PseudoOp::Geu => instructions.push(real(Opcode::Leu, vec![ops[0].clone(), ops[2].clone(), ops[1].clone()], instr)),
                PseudoOp::Gequ => instructions.push(real(Opcode::Lequ, vec![ops[0].clone(), ops[2].clone(), ops[1].clone()], instr)),

                PseudoOp::Mov => instructions.push(real(
                    Opcode::Add,
                    vec![ops[0].clone(), ops[1].clone(), LogicalOperand::Integer(0)],
                    instr,
                )),
                PseudoOp::Inc => instructions.push(real(
                    Opcode::Add,
                    vec![ops[0].clone(), ops[0].clone(), LogicalOperand::Integer(1)],
                    instr,
                )),
                PseudoOp::Dec => instructions.push(real(
                    Opcode::Add,
                    vec![ops[0].clone(), ops[0].clone(), LogicalOperand::Integer(-1)],
                    instr,
                )),
                PseudoOp::Neg => instructions.push(real(
                    Opcode::Sub,
                    vec![ops[0].clone(), LogicalOperand::Integer(0), ops[0].clone()],
                    instr,
                )),
                PseudoOp::Jmp => instructions.push(real(
                    Opcode::Jz,
                    vec![ops[0].clone(), LogicalOperand::Integer(0)],
                    instr,
                )),
                PseudoOp::Sz | PseudoOp::Snz => {
                    let k = match &ops[1] {
                        LogicalOperand::Integer(k) => *k,
                        _ => unreachable!("pass2 rejects a non-constant skip count before expansion runs"),
                    };
                    let target = instr.logical_index as i128 + k + 1;
                    let label = anon_label(target, total_logical, instr.line, &instr.text)?;
                    let opcode = if pseudo == PseudoOp::Sz { Opcode::Jz } else { Opcode::Jnz };
                    instructions.push(real(opcode, vec![label, ops[0].clone()], instr));
                }
                PseudoOp::Push => {
                    instructions.push(real(Opcode::Sw, vec![ops[0].clone(), ops[1].clone()], instr));
                    instructions.push(real(
                        Opcode::Add,
                        vec![ops[0].clone(), ops[0].clone(), LogicalOperand::Integer(8)],
                        instr,
                    ));
                }
                PseudoOp::Pop => {
                    instructions.push(real(
                        Opcode::Sub,
                        vec![ops[1].clone(), ops[1].clone(), LogicalOperand::Integer(8)],
                        instr,
                    ));
                    instructions.push(real(Opcode::Lw, vec![ops[0].clone(), ops[1].clone()], instr));
                }
            },
        }
    }

    logical_to_expanded.push(instructions.len() as u32);
    Ok(ExpansionOutput { instructions, logical_to_expanded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass2::run_pass2;

    fn expand_source(src: &str) -> ExpansionOutput {
        let out = run_pass2(src).unwrap();
        expand(&out.instructions).unwrap()
    }

    #[test]
    fn mov_expands_to_add_with_zero() {
        let out = expand_source("mov a, b\n");
        assert_eq!(out.instructions.len(), 1);
        assert_eq!(out.instructions[0].opcode_id, Opcode::Add.id());
        assert_eq!(out.instructions[0].operands[2], LogicalOperand::Integer(0));
    }

    #[test]
    fn push_and_pop_expand_to_two_real_instructions_each() {
        let out = expand_source("push z, a\npop b, z\n");
        assert_eq!(out.instructions.len(), 4);
        assert_eq!(out.instructions[0].opcode_id, Opcode::Sw.id());
        assert_eq!(out.instructions[1].opcode_id, Opcode::Add.id());
        assert_eq!(out.instructions[2].opcode_id, Opcode::Sub.id());
        assert_eq!(out.instructions[3].opcode_id, Opcode::Lw.id());
    }

    #[test]
    fn ge_swaps_operands_into_le() {
        use golf_vm::RegisterId;
        let out = expand_source("ge a, b, c\n");
        assert_eq!(out.instructions[0].opcode_id, Opcode::Le.id());
        assert_eq!(
            out.instructions[0].operands[1],
            LogicalOperand::Register(RegisterId::from_letter('c').unwrap())
        );
        assert_eq!(
            out.instructions[0].operands[2],
            LogicalOperand::Register(RegisterId::from_letter('b').unwrap())
        );
    }

    #[test]
    fn sz_targets_the_instruction_past_the_skip() {
        // sz a, 1 at logical index 0 skips one instruction, landing on index 2.
        let out = expand_source("sz a, 1\nhalt 1\nhalt 0\n");
        assert_eq!(out.instructions.len(), 3);
        assert_eq!(out.instructions[0].opcode_id, Opcode::Jz.id());
        match &out.instructions[0].operands[0] {
            LogicalOperand::Label(l) => assert_eq!(l.instr_index, 2),
            other => panic!("expected a label operand, got {other:?}"),
        }
    }

    #[test]
    fn logical_to_expanded_accounts_for_multi_instruction_expansions() {
        let out = expand_source("push z, a\nhalt 0\n");
        assert_eq!(out.logical_to_expanded, vec![0, 2, 3]);
    }
}
