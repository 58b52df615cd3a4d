use thiserror::Error;

/// Fatal execution-time failures. Unlike the assembler's error types,
/// these carry no source-line attribution — there is no source at this
/// point, only a decoded instruction stream and a register file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("ret executed while the callstack is empty")]
    EmptyCallstack,

    #[error("attempt to store into read-only data at address {0:#018x}")]
    ReadOnlyWrite(u64),

    #[error("stdio may only be accessed with 8-byte loads/stores, got width {0}")]
    NonByteStdio(u32),

    #[error("division by zero")]
    DivisionByZero,

    #[error("instruction pointer {0:#x} is outside the instruction stream")]
    IspOutOfBounds(u64),

    #[error("decoder misalignment: unknown opcode id {0} at byte offset {1:#x}")]
    UnknownOpcode(u32, u64),

    #[error("memory access out of bounds at address {0:#018x}")]
    BadMemoryAccess(u64),
}
