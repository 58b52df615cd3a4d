//! The assembler's view of "everything that can appear in mnemonic
//! position": the real opcodes from `golf_vm`, `halt` (decoded by the VM
//! but deliberately absent from its signature table, see
//! [`golf_vm::instructions`]), and the pseudo-mnemonics expanded away
//! before encoding (§4.4). Pseudo-mnemonics carry their own `(k_out, k_in)`
//! entries so signature validation (§4.3) runs uniformly before expansion.

use golf_vm::instructions::HALT_ID;
use golf_vm::Opcode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PseudoOp {
    Ge,
    Geq,
    Geu,
    Gequ,
    Mov,
    Inc,
    Dec,
    Neg,
    Jmp,
    Sz,
    Snz,
    Push,
    Pop,
}

impl PseudoOp {
    fn from_str(s: &str) -> Option<PseudoOp> {
        use PseudoOp::*;
        Some(match s {
            "ge" => Ge,
            "geq" => Geq,
            "geu" => Geu,
            "gequ" => Gequ,
            "mov" => Mov,
            "inc" => Inc,
            "dec" => Dec,
            "neg" => Neg,
            "jmp" => Jmp,
            "sz" => Sz,
            "snz" => Snz,
            "push" => Push,
            "pop" => Pop,
            _ => return None,
        })
    }

    /// `(k_out, k_in)` for the pseudo-mnemonic itself, *before* expansion —
    /// e.g. `mov d, x` is validated as one output and one input even though
    /// it expands to `add d, x, 0`.
    pub fn signature(self) -> (u8, u8) {
        use PseudoOp::*;
        match self {
            Ge | Geq | Geu | Gequ => (1, 2),
            Mov => (1, 1),
            Inc | Dec | Neg => (1, 0),
            Jmp => (0, 1),
            Sz | Snz => (0, 2),
            Push => (1, 1),
            Pop => (2, 0),
        }
    }
}

/// Everything that can head an instruction line: a real opcode, the
/// table-less `halt`, or a pseudo-mnemonic awaiting expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mnemonic {
    Halt,
    Real(Opcode),
    Pseudo(PseudoOp),
}

impl Mnemonic {
    pub fn from_str(s: &str) -> Option<Mnemonic> {
        if s == "halt" {
            return Some(Mnemonic::Halt);
        }
        if let Some(op) = Opcode::from_mnemonic(s) {
            return Some(Mnemonic::Real(op));
        }
        PseudoOp::from_str(s).map(Mnemonic::Pseudo)
    }

    /// `(k_out, k_in)` used by generic signature validation. `ret` has no
    /// fixed arity and is validated separately by its caller.
    pub fn signature(self) -> (u8, u8) {
        match self {
            Mnemonic::Halt => (0, 1),
            Mnemonic::Real(op) => op.signature(),
            Mnemonic::Pseudo(p) => p.signature(),
        }
    }

    pub fn is_ret(self) -> bool {
        matches!(self, Mnemonic::Real(Opcode::Ret))
    }

    /// The 7-bit id this mnemonic encodes to, once it (or what it expands
    /// to) reaches the encoder. Pseudo-mnemonics have no id of their own —
    /// [`crate::pseudo`] rewrites them into real instructions first.
    pub fn opcode_id(self) -> Option<u32> {
        match self {
            Mnemonic::Halt => Some(HALT_ID),
            Mnemonic::Real(op) => Some(op.id()),
            Mnemonic::Pseudo(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_mnemonics_resolve_through_the_vm_table() {
        assert_eq!(Mnemonic::from_str("add"), Some(Mnemonic::Real(Opcode::Add)));
        assert_eq!(Mnemonic::from_str("ret"), Some(Mnemonic::Real(Opcode::Ret)));
    }

    #[test]
    fn halt_is_not_a_real_opcode_but_still_a_mnemonic() {
        assert_eq!(Mnemonic::from_str("halt"), Some(Mnemonic::Halt));
        assert_eq!(Opcode::from_mnemonic("halt"), None);
    }

    #[test]
    fn pseudo_mnemonics_carry_their_own_signature() {
        assert_eq!(Mnemonic::from_str("mov").unwrap().signature(), (1, 1));
        assert_eq!(Mnemonic::from_str("push").unwrap().signature(), (1, 1));
        assert_eq!(Mnemonic::from_str("pop").unwrap().signature(), (2, 0));
    }

    #[test]
    fn unknown_mnemonic_is_none() {
        assert_eq!(Mnemonic::from_str("frobnicate"), None);
    }
}
