//! Small shared conventions used across every crate in this workspace.

/// The byte order every GOLF wire format (compiled executables, the
/// instruction stream's immediate tails, memory loads/stores) commits to.
pub type Endian = byteorder::LittleEndian;
