//! Data-literal pooling (§2.7): every `data(…)` operand is interned by
//! content, laid out once into the read-only data segment, and replaced in
//! its instruction operand position by the literal's absolute guest
//! address. Two data literals with equal content end up at the same
//! address; nothing is ever written to the segment twice.

use crate::operand::LogicalOperand;
use crate::pseudo::RealInstruction;
use crate::value::DataLiteral;
use golf_vm::constants::DATA_BASE;
use std::collections::HashMap;

pub struct DataPool {
    addresses: HashMap<DataLiteral, u64>,
    bytes: Vec<u8>,
}

impl DataPool {
    pub fn new() -> DataPool {
        DataPool { addresses: HashMap::new(), bytes: Vec::new() }
    }

    /// Interns `literal`, returning its absolute guest address. Appends its
    /// encoded bytes to the segment only the first time a given content is
    /// seen.
    pub fn intern(&mut self, literal: &DataLiteral) -> u64 {
        if let Some(&addr) = self.addresses.get(literal) {
            return addr;
        }
        let addr = DATA_BASE + self.bytes.len() as u64;
        self.bytes.extend(encode_literal(literal));
        self.addresses.insert(literal.clone(), addr);
        addr
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Default for DataPool {
    fn default() -> DataPool {
        DataPool::new()
    }
}

fn encode_literal(literal: &DataLiteral) -> Vec<u8> {
    match literal {
        DataLiteral::Bytes(b) => b.clone(),
        DataLiteral::Text(s) => {
            let mut out = s.as_bytes().to_vec();
            out.push(0);
            out
        }
        DataLiteral::Ints(ints) => {
            let mut out = Vec::with_capacity(ints.len() * 8);
            for i in ints {
                // Truncating `i128 as u64` is exactly the two's-complement
                // wrap §3 asks for, for any value already range-checked
                // into `[-2^63, 2^64)` by `builtins::data`.
                out.extend_from_slice(&(*i as u64).to_le_bytes());
            }
            out
        }
    }
}

/// Replaces every [`LogicalOperand::Data`] operand across `instructions`
/// with its pooled absolute address, returning the rewritten instructions
/// alongside the finished data segment.
pub fn pool_data(instructions: &[RealInstruction]) -> (Vec<RealInstruction>, Vec<u8>) {
    let mut pool = DataPool::new();
    let resolved = instructions
        .iter()
        .map(|instr| {
            let operands = instr
                .operands
                .iter()
                .map(|op| match op {
                    LogicalOperand::Data(lit) => LogicalOperand::Integer(pool.intern(lit) as i128),
                    other => other.clone(),
                })
                .collect();
            RealInstruction { operands, ..instr.clone() }
        })
        .collect();
    (resolved, pool.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_literal_is_utf8_plus_trailing_zero() {
        let mut pool = DataPool::new();
        pool.intern(&DataLiteral::Text("hi".to_owned()));
        assert_eq!(pool.into_bytes(), vec![b'h', b'i', 0]);
    }

    #[test]
    fn ints_literal_emits_little_endian_words() {
        let mut pool = DataPool::new();
        pool.intern(&DataLiteral::Ints(vec![1, -1]));
        let bytes = pool.into_bytes();
        assert_eq!(&bytes[0..8], &1u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &(u64::MAX).to_le_bytes());
    }

    #[test]
    fn equal_literals_share_one_address() {
        let mut pool = DataPool::new();
        let a = pool.intern(&DataLiteral::Text("hi".to_owned()));
        pool.intern(&DataLiteral::Bytes(vec![0xFF]));
        let b = pool.intern(&DataLiteral::Text("hi".to_owned()));
        assert_eq!(a, b);
    }

    #[test]
    fn addresses_are_relative_to_the_data_base() {
        let mut pool = DataPool::new();
        let addr = pool.intern(&DataLiteral::Bytes(vec![1, 2, 3]));
        assert_eq!(addr, DATA_BASE);
    }
}
