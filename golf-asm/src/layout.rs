//! The assembler-side encoder (§4.5): chooses the narrowest immediate width
//! that fits each operand, lays out the expanded instruction stream with a
//! prefix-sum of sizes, and only then substitutes resolved label offsets —
//! a label operand's width is always 4 bytes regardless of its target, so
//! sizing never depends on offsets that haven't been computed yet.

use crate::operand::LogicalOperand;
use crate::pseudo::RealInstruction;
use golf_vm::constants::{DESC_I16, DESC_I32, DESC_I64, DESC_I8, DESC_ZERO};
use golf_vm::encode::{encode_opcode_word, encode_ret_word};
use golf_vm::instructions::Opcode;
use golf_vm::RegisterId;
use std::convert::TryFrom;

pub struct EncodedStream {
    pub bytes: Vec<u8>,
    /// Byte offset of expanded instruction `i`, plus one trailing entry
    /// equal to the total stream length for a label bound one-past-the-end.
    pub offsets: Vec<u32>,
}

fn descriptor_and_width(value: i128) -> (u32, u8) {
    if value == 0 {
        (DESC_ZERO, 0)
    } else if i8::try_from(value).is_ok() {
        (DESC_I8, 1)
    } else if i16::try_from(value).is_ok() {
        (DESC_I16, 2)
    } else if i32::try_from(value).is_ok() {
        (DESC_I32, 4)
    } else {
        (DESC_I64, 8)
    }
}

fn operand_descriptor(operand: &LogicalOperand) -> (u32, u8) {
    match operand {
        LogicalOperand::Register(r) => (5 + r.index() as u32, 0),
        LogicalOperand::Integer(v) => descriptor_and_width(*v),
        LogicalOperand::Label(_) => (DESC_I32, 4),
        LogicalOperand::Data(_) => unreachable!("data operands are resolved by the pool before layout runs"),
    }
}

fn instruction_size(instr: &RealInstruction, is_ret: bool) -> u32 {
    if is_ret {
        return 4;
    }
    4 + instr.operands.iter().map(|op| operand_descriptor(op).1 as u32).sum::<u32>()
}

fn write_tail(bytes: &mut Vec<u8>, value: i128, width: u8) {
    match width {
        0 => {}
        1 => bytes.extend_from_slice(&(value as i8).to_le_bytes()),
        2 => bytes.extend_from_slice(&(value as i16).to_le_bytes()),
        4 => bytes.extend_from_slice(&(value as i32).to_le_bytes()),
        8 => bytes.extend_from_slice(&(value as i64).to_le_bytes()),
        _ => unreachable!("no descriptor produces any other width"),
    }
}

fn ret_bitmap(operands: &[LogicalOperand]) -> u32 {
    let mut bitmap = 0u32;
    for op in operands {
        if let LogicalOperand::Register(r) = op {
            // `z`'s index (25) doesn't fit the 25-bit bitmap (bits 0..24);
            // signature validation already warned about this at parse time.
            if r.index() < 25 {
                bitmap |= 1 << r.index();
            }
        }
    }
    bitmap
}

/// Encodes `instructions` (with every [`LogicalOperand::Label`] already
/// carrying an *expanded*-stream target index) into the final bit-packed
/// instruction stream.
pub fn encode(instructions: &[RealInstruction]) -> EncodedStream {
    let is_ret: Vec<bool> = instructions.iter().map(|i| i.opcode_id == Opcode::Ret.id()).collect();
    let sizes: Vec<u32> = instructions.iter().zip(&is_ret).map(|(i, &r)| instruction_size(i, r)).collect();

    let mut offsets = Vec::with_capacity(sizes.len() + 1);
    let mut cursor = 0u32;
    for &size in &sizes {
        offsets.push(cursor);
        cursor += size;
    }
    offsets.push(cursor);

    let mut bytes = Vec::with_capacity(cursor as usize);
    for (i, instr) in instructions.iter().enumerate() {
        if is_ret[i] {
            let word = encode_ret_word(Opcode::Ret.id(), ret_bitmap(&instr.operands));
            bytes.extend_from_slice(&word.to_le_bytes());
            continue;
        }

        let mut descriptors = Vec::with_capacity(instr.operands.len());
        let mut tails: Vec<(i128, u8)> = Vec::with_capacity(instr.operands.len());
        for op in &instr.operands {
            match op {
                LogicalOperand::Label(label) => {
                    let target_offset = offsets[label.instr_index as usize] as i32;
                    descriptors.push(DESC_I32);
                    tails.push((target_offset as i128, 4));
                }
                other => {
                    let (desc, width) = operand_descriptor(other);
                    descriptors.push(desc);
                    let value = match other {
                        LogicalOperand::Integer(v) => *v,
                        _ => 0,
                    };
                    tails.push((value, width));
                }
            }
        }

        let word = encode_opcode_word(instr.opcode_id, &descriptors);
        bytes.extend_from_slice(&word.to_le_bytes());
        for (value, width) in tails {
            write_tail(&mut bytes, value, width);
        }
    }

    EncodedStream { bytes, offsets }
}
