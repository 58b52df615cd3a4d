//! The inverse of [`crate::decode`]: packs an instruction id and its operand
//! descriptors into the 4-byte opcode word. This crate only needs the
//! bit-packing primitive for its own round-trip tests; the assembler builds
//! on top of it to pick descriptor widths and emit the immediate tail.

use crate::constants::{DESCRIPTOR_WIDTH, MAX_OPERANDS, OPCODE_ID_MASK, OPCODE_ID_WIDTH};

/// Packs `opcode_id` and up to [`MAX_OPERANDS`] descriptor codes into a
/// single opcode word. Callers that need the full encoded instruction
/// (opcode word plus immediate tail) live in the assembler, which knows how
/// to choose the narrowest descriptor for each operand.
///
/// # Panics
/// Panics if `descriptors` has more than [`MAX_OPERANDS`] entries, or if
/// `opcode_id` doesn't fit in [`crate::constants::OPCODE_ID_WIDTH`] bits.
pub fn encode_opcode_word(opcode_id: u32, descriptors: &[u32]) -> u32 {
    assert!(descriptors.len() <= MAX_OPERANDS, "too many operand descriptors");
    assert_eq!(opcode_id & !OPCODE_ID_MASK, 0, "opcode id out of range");

    let mut flags = 0u32;
    for (i, &d) in descriptors.iter().enumerate() {
        flags |= d << (i as u32 * DESCRIPTOR_WIDTH);
    }
    opcode_id | (flags << OPCODE_ID_WIDTH)
}

/// Packs `ret`'s 25-bit register-presence bitmap into the opcode word. The
/// bitmap occupies the same flag field an ordinary instruction's descriptors
/// would, but is interpreted bit-per-register instead of 5-bits-per-operand.
pub fn encode_ret_word(opcode_id: u32, bitmap: u32) -> u32 {
    assert_eq!(opcode_id & !OPCODE_ID_MASK, 0, "opcode id out of range");
    opcode_id | (bitmap << OPCODE_ID_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode, DecodedBody, Operand};
    use crate::instructions::Opcode;
    use crate::register::RegisterId;

    #[test]
    fn round_trips_through_decode() {
        let word = encode_opcode_word(Opcode::Add.id(), &[5, 6, 7]);
        let decoded = decode(&word.to_le_bytes(), 0).unwrap();
        match &decoded.body {
            DecodedBody::Operands(ops) => {
                assert_eq!(ops[0], Operand::Register(RegisterId::from_index(0)));
                assert_eq!(ops[1], Operand::Register(RegisterId::from_index(1)));
                assert_eq!(ops[2], Operand::Register(RegisterId::from_index(2)));
            }
            _ => panic!("expected operands"),
        }
    }

    #[test]
    fn ret_bitmap_round_trips() {
        let bitmap = (1 << 0) | (1 << 5);
        let word = encode_ret_word(Opcode::Ret.id(), bitmap);
        let decoded = decode(&word.to_le_bytes(), 0).unwrap();
        match decoded.body {
            DecodedBody::Ret(regs) => {
                assert_eq!(
                    regs,
                    vec![RegisterId::from_index(0), RegisterId::from_index(5)]
                );
            }
            _ => panic!("expected ret body"),
        }
    }
}
