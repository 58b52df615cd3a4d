//! Assembler for the GOLF register machine: turns a line-oriented assembly
//! source into a bit-packed [`Executable`] and a [`DebugInfo`] sidecar.
//!
//! The pipeline ([`assemble`]) runs, leaves first: [`lines`] joins and
//! classifies source lines, [`labels`] counts logical instructions to bind
//! every label before any expression is evaluated, [`pass2`] evaluates
//! operand expressions against the pre-bound symbol environment
//! ([`value`], [`eval`], [`parser`], [`expr`], [`builtins`]) and validates
//! signatures ([`mnemonic`], [`operand`]), [`pseudo`] expands
//! pseudo-mnemonics into real instructions, [`pool`] interns `data(…)`
//! literals into the read-only segment, and [`layout`] picks the narrowest
//! encoding per operand and emits the final stream.

mod builtins;
mod debug;
mod error;
mod eval;
mod expr;
mod labels;
mod layout;
mod lines;
mod mnemonic;
mod operand;
mod parser;
mod pass2;
mod pool;
mod pseudo;
mod value;

pub use debug::DebugInfo;
pub use error::{AssembleError, EvaluationError, SyntaxError};

use golf_file::Executable;
use tracing::debug;

/// Runs the full pipeline over `source`, producing a compiled [`Executable`]
/// and its [`DebugInfo`] sidecar.
pub fn assemble(source: &str) -> Result<(Executable, DebugInfo), AssembleError> {
    debug!("running label and instruction passes");
    let pass2::Pass2Output { instructions: logical, labels } = pass2::run_pass2(source)?;

    debug!(count = logical.len(), "expanding pseudo-instructions");
    let pseudo::ExpansionOutput { mut instructions, logical_to_expanded } = pseudo::expand(&logical)?;
    pseudo::remap_labels_to_expanded(&mut instructions, &logical_to_expanded);

    debug!("pooling data literals");
    let (instructions, data) = pool::pool_data(&instructions);

    debug!(count = instructions.len(), "encoding instruction stream");
    let stream = layout::encode(&instructions);

    let debug_info = debug::build(&instructions, &stream.offsets, &labels, &logical_to_expanded, source);
    let executable = Executable::from(data, stream.bytes);

    Ok((executable, debug_info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_a_tiny_program_to_completion() {
        let (exe, dbg) = assemble("li a, 42\nhalt a\n").unwrap();
        assert!(exe.instructions().len() >= 8);
        assert_eq!(dbg.lines.len(), 2);
    }

    #[test]
    fn pooled_data_literal_is_referenced_by_address() {
        let (exe, _) = assemble("xs = data(\"hi\")\nli a, xs\nhalt 0\n").unwrap();
        assert_eq!(exe.data(), b"hi\0");
    }

    #[test]
    fn jmp_and_labels_produce_a_resolvable_stream() {
        let source = "jmp skip\nhalt 1\nskip:\nhalt 0\n";
        let (exe, dbg) = assemble(source).unwrap();
        let target = dbg.labels["skip"];
        let decoded = golf_vm::decode::decode(exe.instructions(), 0).unwrap();
        match decoded.body {
            golf_vm::decode::DecodedBody::Operands(ops) => {
                assert_eq!(ops[0], golf_vm::decode::Operand::Immediate(target as u64));
            }
            _ => panic!("expected operands"),
        }
    }

    #[test]
    fn unknown_mnemonic_is_reported_as_a_syntax_error() {
        assert!(matches!(assemble("bogus a\n"), Err(AssembleError::Syntax(SyntaxError::UnknownMnemonic { .. }))));
    }

    fn run(source: &str) -> golf_vm::ExecutionResult {
        let (exe, _) = assemble(source).unwrap();
        let memory = golf_vm::Memory::new(exe.data().to_vec());
        let processor = golf_vm::Processor::new(exe.instructions().to_vec(), memory);
        processor.run().unwrap()
    }

    #[test]
    fn snz_loop_counts_a_register_down_to_zero() {
        let source = "add a, 0, 3\ndec a\nsnz a, -2\nhalt 0\n";
        let result = run(source);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.registers.get(golf_vm::RegisterId::from_letter('a').unwrap()), 0);
    }

    #[test]
    fn push_then_pop_round_trips_through_the_stack() {
        let source = "push z, 7\npop a, z\nhalt a\n";
        let result = run(source);
        assert_eq!(result.exit_code, 7);
        assert_eq!(result.registers.get(golf_vm::RegisterId::Z), golf_vm::constants::STACK_BASE);
    }

    #[test]
    fn a_data_literal_referenced_twice_resolves_to_one_pooled_address() {
        let source = "xs = data(\"hi\")\nys = data(\"hi\")\nli a, xs\nli b, ys\nhalt 0\n";
        let (exe, _) = assemble(source).unwrap();
        assert_eq!(exe.data(), b"hi\0");

        let first = golf_vm::decode::decode(exe.instructions(), 0).unwrap();
        let second = golf_vm::decode::decode(exe.instructions(), first.size as u64).unwrap();
        let address = |decoded: &golf_vm::decode::DecodedInstruction| match &decoded.body {
            golf_vm::decode::DecodedBody::Operands(ops) => match ops[1] {
                golf_vm::decode::Operand::Immediate(addr) => addr,
                other => panic!("expected an immediate address, got {other:?}"),
            },
            other => panic!("expected operands, got {other:?}"),
        };
        assert_eq!(address(&first), golf_vm::constants::DATA_BASE);
        assert_eq!(address(&first), address(&second));
    }
}
