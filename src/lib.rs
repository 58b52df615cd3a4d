//! Decoder and interpreter core for the GOLF 64-bit register machine.
//!
//! This crate owns the pieces shared by every GOLF tool: the opcode table
//! ([`instructions`]), the bit-packing layer between opcode words and
//! decoded instructions ([`encode`]/[`decode`]), the register file and
//! three-segment address space ([`register`]/[`memory`]), and the dispatch
//! loop that ties them together ([`processor`]). The assembler and the
//! standalone VM binary build on top of these types rather than
//! reimplementing them.

pub mod constants;
pub mod decode;
pub mod encode;
pub mod errors;
pub mod instructions;
pub mod memory;
pub mod processor;
pub mod register;

pub use errors::RuntimeError;
pub use instructions::Opcode;
pub use memory::Memory;
pub use processor::{ExecutionResult, Processor};
pub use register::{RegisterFile, RegisterId};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode_opcode_word, encode_ret_word};
    use crate::instructions::HALT_ID;
    use crate::register::RegisterId;

    fn word(opcode: Opcode, descriptors: &[u32]) -> [u8; 4] {
        encode_opcode_word(opcode.id(), descriptors).to_le_bytes()
    }

    #[test]
    fn runs_a_tiny_program_to_completion() {
        // GOLF has no dedicated "load immediate" opcode (`li` reads 4 bytes
        // *from memory*); constants are loaded the way `mov`/`add` always
        // build a register value, through an `add` with an immediate input.
        // add a, 0, 42; add b, 0, 64; add c, a, b; halt c
        let mut stream = Vec::new();
        stream.extend_from_slice(&word(Opcode::Add, &[5, 0, 1]));
        stream.push(42);
        stream.extend_from_slice(&word(Opcode::Add, &[6, 0, 1]));
        stream.push(64);
        stream.extend_from_slice(&word(Opcode::Add, &[7, 5, 6]));
        stream.extend_from_slice(&encode_opcode_word(HALT_ID, &[7]).to_le_bytes());

        let processor = Processor::new(stream, Memory::new(vec![]));
        let result = processor.run().unwrap();

        assert_eq!(result.exit_code, 106);
        assert_eq!(result.registers.get(RegisterId::from_letter('c').unwrap()), 106);
    }

    #[test]
    fn call_then_ret_restores_caller_state() {
        // call target; halt a
        // target: add a, 0, 7; ret()
        let mut stream = Vec::new();
        stream.extend_from_slice(&word(Opcode::Call, &[3]));
        stream.extend_from_slice(&12i32.to_le_bytes());
        stream.extend_from_slice(&encode_opcode_word(HALT_ID, &[5]).to_le_bytes());
        assert_eq!(stream.len(), 12);
        stream.extend_from_slice(&word(Opcode::Add, &[5, 0, 1]));
        stream.push(7);
        stream.extend_from_slice(&encode_ret_word(Opcode::Ret.id(), 0).to_le_bytes());

        let processor = Processor::new(stream, Memory::new(vec![]));
        let result = processor.run().unwrap();

        // `a` was never named in ret's overlay, so the caller's pre-call
        // value (0) is restored rather than the callee's 7.
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn running_off_the_end_of_the_stream_is_an_error() {
        let processor = Processor::new(vec![0u8; 2], Memory::new(vec![]));
        assert!(processor.run().is_err());
    }
}
