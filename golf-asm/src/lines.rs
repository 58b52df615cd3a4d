//! Turns raw source text into classified logical lines: trailing
//! whitespace stripped, backslash continuations joined, comments stripped
//! outside of string literals, and the remainder split into one of the
//! three shapes a GOLF line can take (label, assignment, instruction).

use crate::error::SyntaxError;

/// One logical line: possibly several physical lines joined by a trailing
/// `\`, attributed to the physical line number of the first piece so
/// diagnostics point at where a continuation starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogicalLine {
    pub line: u32,
    pub raw: String,
}

/// The three shapes a non-blank logical line can take after comment
/// stripping. Blank/comment-only lines never produce a `LineKind` at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineKind {
    Label { name: String },
    Assignment { name: String, expr_text: String },
    Instruction { mnemonic: String, operand_text: String },
}

/// Joins backslash-continued physical lines into logical ones, stripping
/// trailing whitespace from each physical piece before joining.
pub fn read_logical_lines(source: &str) -> Vec<LogicalLine> {
    let physical: Vec<&str> = source.lines().collect();
    let mut result = Vec::new();
    let mut i = 0;
    while i < physical.len() {
        let start_line = (i + 1) as u32;
        let mut buf = String::new();
        loop {
            let piece = physical[i].trim_end();
            i += 1;
            match piece.strip_suffix('\\') {
                Some(stripped) if i < physical.len() => {
                    buf.push_str(stripped);
                }
                Some(stripped) => {
                    // Trailing continuation mark with nothing left to join to.
                    buf.push_str(stripped);
                    break;
                }
                None => {
                    buf.push_str(piece);
                    break;
                }
            }
        }
        result.push(LogicalLine { line: start_line, raw: buf });
    }
    result
}

/// Strips a `#` comment from `line`, respecting single- and double-quoted
/// string literals (including the `b"..."` byte-string form, which only
/// differs from a plain string by the `b` prefix outside the quotes).
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match in_string {
            Some(quote) => {
                if c == b'\\' {
                    i += 1;
                } else if c == quote {
                    in_string = None;
                }
            }
            None => match c {
                b'"' | b'\'' => in_string = Some(c),
                b'#' => return &line[..i],
                _ => {}
            },
        }
        i += 1;
    }
    line
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Classifies one already-joined logical line: strips its comment, and
/// decides whether what remains is a label, an assignment, or an
/// instruction. Returns `None` for a blank or comment-only line.
pub fn classify(logical: &LogicalLine) -> Result<Option<LineKind>, SyntaxError> {
    let stripped = strip_comment(&logical.raw).trim();
    if stripped.is_empty() {
        return Ok(None);
    }

    let ident_len = stripped
        .char_indices()
        .take_while(|&(i, c)| if i == 0 { is_ident_start(c) } else { is_ident_continue(c) })
        .count();

    if ident_len < 2 || !stripped.starts_with(is_ident_start) {
        return Err(SyntaxError::MalformedIdentifier {
            line: logical.line,
            text: logical.raw.clone(),
        });
    }

    let name = stripped[..ident_len].to_owned();
    let rest = &stripped[ident_len..];

    if rest.is_empty() {
        return Ok(Some(LineKind::Instruction { mnemonic: name, operand_text: String::new() }));
    }

    if let Some(trailing) = rest.strip_prefix(':') {
        if !trailing.trim().is_empty() {
            return Err(SyntaxError::TrailingAfterLabel {
                line: logical.line,
                text: logical.raw.clone(),
            });
        }
        return Ok(Some(LineKind::Label { name }));
    }

    let rest_trimmed = rest.trim_start();
    if let Some(expr_text) = rest_trimmed.strip_prefix('=') {
        return Ok(Some(LineKind::Assignment {
            name,
            expr_text: expr_text.trim_start().to_owned(),
        }));
    }

    Ok(Some(LineKind::Instruction {
        mnemonic: name,
        operand_text: rest_trimmed.to_owned(),
    }))
}
