//! Pass 1 (§2.4): a label-only sweep over the source that counts logical
//! instructions — skipping blanks, comments, and assignments — so every
//! label can be bound to its defining instruction index *before* any
//! operand expression is evaluated. This resolves forward references and
//! the "currently bound to a label" check cleanly: pass 2 never has to
//! guess at a label it hasn't seen yet.

use crate::error::SyntaxError;
use crate::lines::{classify, read_logical_lines, LineKind};
use std::collections::HashMap;

pub struct LabelPass {
    /// Label name to the logical instruction index of its definition site.
    pub labels: HashMap<String, u32>,
    /// Total number of logical (pre-expansion) instructions in the source.
    pub instruction_count: u32,
}

pub fn run_label_pass(source: &str) -> Result<LabelPass, SyntaxError> {
    let mut labels = HashMap::new();
    let mut index = 0u32;

    for logical in read_logical_lines(source) {
        match classify(&logical)? {
            None | Some(LineKind::Assignment { .. }) => {}
            Some(LineKind::Label { name }) => {
                if labels.insert(name.clone(), index).is_some() {
                    return Err(SyntaxError::DuplicateLabel {
                        line: logical.line,
                        text: logical.raw.clone(),
                        name,
                    });
                }
            }
            Some(LineKind::Instruction { .. }) => {
                index += 1;
            }
        }
    }

    Ok(LabelPass { labels, instruction_count: index })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_bind_to_the_following_instructions_index() {
        let pass = run_label_pass("loop:\nadd a, a, 1\njnz loop, a\n").unwrap();
        assert_eq!(pass.labels["loop"], 0);
        assert_eq!(pass.instruction_count, 2);
    }

    #[test]
    fn blanks_comments_and_assignments_do_not_advance_the_index() {
        let pass = run_label_pass("# comment\n\nkk = 5\nmid:\nadd a, a, kk\n").unwrap();
        assert_eq!(pass.labels["mid"], 0);
        assert_eq!(pass.instruction_count, 1);
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let err = run_label_pass("aa:\nhalt 0\naa:\nhalt 1\n").unwrap_err();
        assert!(matches!(err, SyntaxError::DuplicateLabel { name, .. } if name == "aa"));
    }

    #[test]
    fn a_label_at_end_of_file_binds_to_the_instruction_count() {
        let pass = run_label_pass("halt 0\nend:\n").unwrap();
        assert_eq!(pass.labels["end"], 1);
        assert_eq!(pass.instruction_count, 1);
    }
}
