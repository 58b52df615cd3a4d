//! The assembler's error hierarchy: a `thiserror` enum per failure domain,
//! unified behind [`AssembleError`] so `assemble()` has a single `Result`
//! type. Every fatal [`SyntaxError`] variant carries the 1-based source
//! line and the original line text, matching what a human reading the
//! source would need to find the mistake.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("unknown name '{0}'")]
    UnknownName(String),

    #[error("expected a different type, found {0}")]
    TypeMismatch(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    #[error("'{0}' takes {1} argument(s), got {2}")]
    WrongArgumentCount(&'static str, usize, usize),

    #[error("arithmetic overflow evaluating expression")]
    IntegerOverflow,

    #[error("integer {0} is outside the representable range [-2^63, 2^64)")]
    IntegerOutOfRange(i128),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("grammar error: {0}")]
    Grammar(String),

    #[error("line {line}: malformed identifier\n{text}")]
    MalformedIdentifier { line: u32, text: String },

    #[error("line {line}: unknown instruction '{mnemonic}'\n{text}")]
    UnknownMnemonic { line: u32, text: String, mnemonic: String },

    #[error("line {line}: '{mnemonic}' takes {expected} operand(s), got {got}\n{text}")]
    WrongOperandCount {
        line: u32,
        text: String,
        mnemonic: String,
        expected: u8,
        got: usize,
    },

    #[error("line {line}: '{mnemonic}' requires {expected} output register(s)\n{text}")]
    WrongOperandClass {
        line: u32,
        text: String,
        mnemonic: String,
        expected: u8,
    },

    #[error("line {line}: operand out of 64-bit range\n{text}")]
    OperandOutOfRange { line: u32, text: String },

    #[error("line {line}: duplicate label '{name}'\n{text}")]
    DuplicateLabel { line: u32, text: String, name: String },

    #[error("line {line}: cannot assign to '{name}', it is already bound to a label\n{text}")]
    OverwritingLabel { line: u32, text: String, name: String },

    #[error("line {line}: trailing characters after label\n{text}")]
    TrailingAfterLabel { line: u32, text: String },

    #[error("line {line}: operand is not a register, label, data literal or integer\n{text}")]
    InvalidOperandType { line: u32, text: String },

    #[error("line {line}: skip count in '{mnemonic}' must be a constant integer\n{text}")]
    NonConstantSkipCount { line: u32, text: String, mnemonic: String },

    #[error("line {line}: {source}\n{text}")]
    Evaluation {
        line: u32,
        text: String,
        #[source]
        source: EvaluationError,
    },
}

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),
}
