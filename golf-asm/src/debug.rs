//! The debug sidecar (§6.2): a JSON-serializable mapping from
//! instruction-stream byte offset to source line, label name to byte
//! offset, and the original source lines, so external tooling (and tests)
//! can correlate a crash's `isp` back to the assembly that produced it.

use crate::pseudo::RealInstruction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DebugInfo {
    /// Instruction-stream byte offset to 0-based source line.
    pub offsets: BTreeMap<u32, u32>,
    /// Label name to byte offset in the instruction stream.
    pub labels: BTreeMap<String, u32>,
    /// The original source, one entry per physical line.
    pub lines: Vec<String>,
}

/// Builds the sidecar from the expanded instruction list (each instruction
/// still carrying its 1-based source line), the stream offset computed for
/// every expanded instruction, the source-level label table (keyed by
/// *logical* instruction index), the logical-to-expanded remap, and the
/// original source text.
pub fn build(
    instructions: &[RealInstruction],
    stream_offsets: &[u32],
    labels_by_logical_index: &HashMap<String, u32>,
    logical_to_expanded: &[u32],
    source: &str,
) -> DebugInfo {
    let mut offsets = BTreeMap::new();
    for (i, instr) in instructions.iter().enumerate() {
        offsets.insert(stream_offsets[i], instr.line - 1);
    }

    let mut labels = BTreeMap::new();
    for (name, &logical_index) in labels_by_logical_index {
        let expanded_index = logical_to_expanded[logical_index as usize];
        labels.insert(name.clone(), stream_offsets[expanded_index as usize]);
    }

    let lines = source.lines().map(str::to_owned).collect();

    DebugInfo { offsets, labels, lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use golf_vm::instructions::HALT_ID;

    fn instr(line: u32) -> RealInstruction {
        RealInstruction { line, text: String::new(), opcode_id: HALT_ID, operands: Vec::new() }
    }

    #[test]
    fn offsets_map_to_zero_based_source_lines() {
        let instructions = vec![instr(1), instr(3)];
        let info = build(&instructions, &[0, 4], &HashMap::new(), &[], "halt 0\n\nhalt 1\n");
        assert_eq!(info.offsets[&0], 0);
        assert_eq!(info.offsets[&4], 2);
    }

    #[test]
    fn labels_resolve_through_the_expansion_remap() {
        let mut labels_by_logical = HashMap::new();
        labels_by_logical.insert("done".to_owned(), 1u32);
        let logical_to_expanded = vec![0, 1, 2];
        let instructions = vec![instr(1), instr(2)];
        let info = build(&instructions, &[0, 4], &labels_by_logical, &logical_to_expanded, "jmp done\ndone:\n");
        assert_eq!(info.labels["done"], 4);
    }

    #[test]
    fn lines_preserves_the_original_source() {
        let info = build(&[], &[], &HashMap::new(), &[], "a\nb\n");
        assert_eq!(info.lines, vec!["a".to_owned(), "b".to_owned()]);
    }
}
