//! Reverses the encoder's bit layout: splits a 32-bit opcode word into an
//! instruction id and packed operand descriptors, then walks the descriptor
//! sequence consuming immediates from the instruction stream's tail.
//! Register-coded operands are left symbolic; [`crate::processor`] resolves
//! them to live register values at dispatch time.

use crate::constants::{
    DESCRIPTOR_WIDTH, MAX_OPERANDS, OPCODE_ID_MASK, OPCODE_ID_WIDTH, RET_BITMAP_WIDTH,
};
use crate::errors::RuntimeError;
use crate::instructions::Opcode;
use crate::register::RegisterId;
use byteorder::ByteOrder;
use golf_util::Endian;

/// One decoded operand: either an already-resolved 64-bit value (for
/// immediate/label descriptors) or a register name still waiting to be read
/// at dispatch time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    Immediate(u64),
    Register(RegisterId),
}

impl Operand {
    pub fn as_register(self) -> Option<RegisterId> {
        match self {
            Operand::Register(r) => Some(r),
            Operand::Immediate(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedBody {
    /// `ret`'s register list, read off the 25-bit bitmap (`a`..`y`).
    Ret(Vec<RegisterId>),
    Operands(Vec<Operand>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// The raw 7-bit id; may be [`crate::instructions::HALT_ID`], which has
    /// no [`Opcode`] variant.
    pub opcode_id: u32,
    pub body: DecodedBody,
    /// Total bytes consumed, including the 4-byte opcode word.
    pub size: u32,
}

fn read_tail(stream: &[u8], at: usize, width: usize) -> Result<&[u8], RuntimeError> {
    stream
        .get(at..at + width)
        .ok_or(RuntimeError::IspOutOfBounds(at as u64))
}

/// Decodes one instruction starting at byte offset `isp` of `stream`.
pub fn decode(stream: &[u8], isp: u64) -> Result<DecodedInstruction, RuntimeError> {
    let start = isp as usize;
    let word_bytes = read_tail(stream, start, 4)?;
    let word = Endian::read_u32(word_bytes);
    let opcode_id = word & OPCODE_ID_MASK;
    let mut flags = word >> OPCODE_ID_WIDTH;
    let mut cursor = start + 4;

    if opcode_id == Opcode::Ret.id() {
        let mut regs = Vec::new();
        for i in 0..RET_BITMAP_WIDTH {
            if (flags >> i) & 1 != 0 {
                regs.push(RegisterId::from_index(i as u8));
            }
        }
        return Ok(DecodedInstruction {
            opcode_id,
            body: DecodedBody::Ret(regs),
            size: (cursor - start) as u32,
        });
    }

    let mut operands = Vec::new();
    while flags != 0 {
        let code = flags & ((1 << DESCRIPTOR_WIDTH) - 1);
        flags >>= DESCRIPTOR_WIDTH;

        let operand = match code {
            0 => Operand::Immediate(0),
            1 => {
                let v = read_tail(stream, cursor, 1)?[0] as i8;
                cursor += 1;
                Operand::Immediate(v as i64 as u64)
            }
            2 => {
                let v = byteorder::LittleEndian::read_i16(read_tail(stream, cursor, 2)?);
                cursor += 2;
                Operand::Immediate(v as i64 as u64)
            }
            3 => {
                let v = byteorder::LittleEndian::read_i32(read_tail(stream, cursor, 4)?);
                cursor += 4;
                Operand::Immediate(v as i64 as u64)
            }
            4 => {
                let v = Endian::read_u64(read_tail(stream, cursor, 8)?);
                cursor += 8;
                Operand::Immediate(v)
            }
            reg => Operand::Register(RegisterId::from_index((reg - 5) as u8)),
        };
        operands.push(operand);
    }

    // The flag field only carries descriptors up to the last non-zero one;
    // any operands beyond that (always literal zero) are never actually
    // encoded. Dispatch always indexes a full, fixed-arity operand list per
    // mnemonic, so pad back out to that arity here rather than at every call
    // site.
    while operands.len() < MAX_OPERANDS {
        operands.push(Operand::Immediate(0));
    }

    Ok(DecodedInstruction {
        opcode_id,
        body: DecodedBody::Operands(operands),
        size: (cursor - start) as u32,
    })
}
