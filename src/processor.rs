//! The interpreter loop: fetches one instruction at a time via
//! [`crate::decode`], dispatches it against a [`RegisterFile`] and
//! [`Memory`], and folds its cycle cost into a running total. Structured the
//! way this workspace's own dispatch loop is (a `tick`-style step function
//! returning a small result enum, plus free `write_*`/`set_if` helpers)
//! rather than as one large match arm inlined into `run`.

use crate::decode::{decode, DecodedBody, Operand};
use crate::errors::RuntimeError;
use crate::instructions::{Opcode, HALT_ID};
use crate::memory::Memory;
use crate::register::{RegisterFile, RegisterId};
use tracing::{debug, info};

/// One step of the dispatch loop.
enum TickResult {
    /// Keep running; `isp` has already been advanced past the instruction.
    Running,
    /// `halt` was decoded; carries its operand as the process exit code.
    Halted(u64),
}

/// The outcome of a full run: the guest's chosen exit code, the number of
/// cycles billed, and the register file as it stood at `halt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: u64,
    pub cycle_count: u64,
    pub registers: RegisterFile,
}

/// Ties a decoded instruction stream, a register file and a memory image
/// together into a running machine.
pub struct Processor {
    registers: RegisterFile,
    memory: Memory,
    instructions: Vec<u8>,
    isp: u64,
    callstack: Vec<(u64, RegisterFile)>,
    cycle_count: u64,
}

impl Processor {
    pub fn new(instructions: Vec<u8>, memory: Memory) -> Processor {
        Processor {
            registers: RegisterFile::new(),
            memory,
            instructions,
            isp: 0,
            callstack: Vec::new(),
            cycle_count: 0,
        }
    }

    /// Runs until `halt` or a fatal error. Mirrors the host program's own
    /// `while isp < len(instructions)` loop, raising the same "fell off the
    /// end of the instruction stream" error in its place.
    pub fn run(mut self) -> Result<ExecutionResult, RuntimeError> {
        loop {
            if self.isp as usize >= self.instructions.len() {
                return Err(RuntimeError::IspOutOfBounds(self.isp));
            }

            match self.tick()? {
                TickResult::Running => {}
                TickResult::Halted(exit_code) => {
                    info!(exit_code, cycles = self.cycle_count, "halted");
                    return Ok(ExecutionResult {
                        exit_code,
                        cycle_count: self.cycle_count,
                        registers: self.registers,
                    })
                }
            }
        }
    }

    fn tick(&mut self) -> Result<TickResult, RuntimeError> {
        let decoded = decode(&self.instructions, self.isp)?;
        let next_isp = self.isp + decoded.size as u64;

        if decoded.opcode_id == HALT_ID {
            let exit_code = match &decoded.body {
                DecodedBody::Operands(ops) => self.resolve(ops.first().copied().unwrap_or(Operand::Immediate(0))),
                DecodedBody::Ret(_) => 0,
            };
            self.isp = next_isp;
            return Ok(TickResult::Halted(exit_code));
        }

        let opcode = Opcode::from_id(decoded.opcode_id)
            .ok_or(RuntimeError::UnknownOpcode(decoded.opcode_id, self.isp))?;

        if opcode == Opcode::Ret {
            let overlay = match decoded.body {
                DecodedBody::Ret(regs) => regs,
                DecodedBody::Operands(_) => unreachable!("ret always decodes to a register bitmap"),
            };
            self.exec_ret(&overlay)?;
            self.cycle_count += opcode.cycle_cost() as u64;
            return Ok(TickResult::Running);
        }

        let operands = match decoded.body {
            DecodedBody::Operands(ops) => ops,
            DecodedBody::Ret(_) => unreachable!("only ret decodes to a register bitmap"),
        };

        self.isp = next_isp;
        self.exec(opcode, &operands)?;
        self.cycle_count += opcode.cycle_cost() as u64;
        Ok(TickResult::Running)
    }

    fn resolve(&self, operand: Operand) -> u64 {
        match operand {
            Operand::Immediate(v) => v,
            Operand::Register(r) => self.registers.get(r),
        }
    }

    fn write(&mut self, dest: Operand, value: u64) {
        if let Some(r) = dest.as_register() {
            self.registers.set(r, value);
        }
    }

    fn set_if(&mut self, dest: Operand, condition: bool) {
        self.write(dest, condition as u64);
    }

    fn exec_ret(&mut self, overlay: &[RegisterId]) -> Result<(), RuntimeError> {
        let (old_isp, mut old_regs) = self.callstack.pop().ok_or(RuntimeError::EmptyCallstack)?;
        debug!(depth = self.callstack.len(), target = old_isp, "ret");
        for &r in overlay {
            old_regs.set(r, self.registers.get(r));
        }
        self.isp = old_isp;
        self.registers = old_regs;
        Ok(())
    }

    fn exec(&mut self, opcode: Opcode, operands: &[Operand]) -> Result<(), RuntimeError> {
        use Opcode::*;

        match opcode {
            Not => {
                let v = self.resolve(operands[1]);
                self.write(operands[0], (v == 0) as u64);
            }
            Or => self.binary(operands, |a, b| a | b),
            Xor => self.binary(operands, |a, b| a ^ b),
            And => self.binary(operands, |a, b| a & b),
            Shl => self.binary(operands, shl),
            Shr => self.binary(operands, shr),
            Sar => self.binary(operands, sar),
            Add => self.binary(operands, |a, b| a.wrapping_add(b)),
            Sub => self.binary(operands, |a, b| a.wrapping_sub(b)),
            Cmp => self.compare(operands, |a, b| a == b),
            Neq => self.compare(operands, |a, b| a != b),
            Le => self.compare(operands, |a, b| twos_i64(a) < twos_i64(b)),
            Leq => self.compare(operands, |a, b| twos_i64(a) <= twos_i64(b)),
            Leu => self.compare(operands, |a, b| a < b),
            Lequ => self.compare(operands, |a, b| a <= b),
            Mul => {
                let a = twos_i64(self.resolve(operands[2])) as i128;
                let b = twos_i64(self.resolve(operands[3])) as i128;
                let product = (a.wrapping_mul(b)) as u128;
                self.write(operands[0], product as u64);
                self.write(operands[1], (product >> 64) as u64);
            }
            Mulu => {
                let a = self.resolve(operands[2]);
                let b = self.resolve(operands[3]);
                let (lo, hi) = mulu(a, b);
                self.write(operands[0], lo);
                self.write(operands[1], hi);
            }
            Div => {
                let a = twos_i64(self.resolve(operands[2]));
                let b = twos_i64(self.resolve(operands[3]));
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                let (q, r) = floor_div_rem(a, b);
                self.write(operands[0], q as u64);
                self.write(operands[1], r as u64);
            }
            Divu => {
                let a = self.resolve(operands[2]);
                let b = self.resolve(operands[3]);
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                self.write(operands[0], a / b);
                self.write(operands[1], a % b);
            }
            Lb => self.load_sign_extend(operands, 1)?,
            Lbu => self.load_zero_extend(operands, 1)?,
            Ls => self.load_sign_extend(operands, 2)?,
            Lsu => self.load_zero_extend(operands, 2)?,
            Li => self.load_sign_extend(operands, 4)?,
            Liu => self.load_zero_extend(operands, 4)?,
            Lw => self.load_zero_extend(operands, 8)?,
            Sb => self.store(operands, 1)?,
            Ss => self.store(operands, 2)?,
            Si => self.store(operands, 4)?,
            Sw => self.store(operands, 8)?,
            Rand => {
                let v: u64 = rand::random();
                self.write(operands[0], v);
            }
            Jz => {
                let target = self.resolve(operands[0]);
                let cond = self.resolve(operands[1]);
                if cond == 0 {
                    self.isp = target;
                }
            }
            Jnz => {
                let target = self.resolve(operands[0]);
                let cond = self.resolve(operands[1]);
                if cond != 0 {
                    self.isp = target;
                }
            }
            Call => {
                let target = self.resolve(operands[0]);
                debug!(depth = self.callstack.len() + 1, target, "call");
                self.callstack.push((self.isp, self.registers.clone()));
                self.isp = target;
            }
            Ret => unreachable!("ret is dispatched separately in tick()"),
        }

        Ok(())
    }

    fn binary(&mut self, operands: &[Operand], f: impl Fn(u64, u64) -> u64) {
        let a = self.resolve(operands[1]);
        let b = self.resolve(operands[2]);
        self.write(operands[0], f(a, b));
    }

    fn compare(&mut self, operands: &[Operand], f: impl Fn(u64, u64) -> bool) {
        let a = self.resolve(operands[1]);
        let b = self.resolve(operands[2]);
        self.set_if(operands[0], f(a, b));
    }

    fn load_sign_extend(&mut self, operands: &[Operand], width: u32) -> Result<(), RuntimeError> {
        let addr = self.resolve(operands[1]);
        let raw = self.memory.load(addr, width)?;
        let extended = twos_width(raw, width * 8) as u64;
        self.write(operands[0], extended);
        Ok(())
    }

    fn load_zero_extend(&mut self, operands: &[Operand], width: u32) -> Result<(), RuntimeError> {
        let addr = self.resolve(operands[1]);
        let raw = self.memory.load(addr, width)?;
        self.write(operands[0], raw);
        Ok(())
    }

    fn store(&mut self, operands: &[Operand], width: u32) -> Result<(), RuntimeError> {
        let addr = self.resolve(operands[0]);
        let value = self.resolve(operands[1]);
        self.memory.store(addr, width, value)
    }
}

/// `n`-bit two's complement bit pattern widened to a signed 64-bit value.
/// `twos(x, 64)` reinterprets a full 64-bit register value as signed; the
/// narrower widths are used when sign-extending load results.
fn twos_width(x: u64, n: u32) -> i64 {
    let shift = 64 - n;
    ((x << shift) as i64) >> shift
}

fn twos_i64(x: u64) -> i64 {
    twos_width(x, 64)
}

/// `a` shifted by `twos(b)`: left if the count is non-negative, right
/// (by its absolute value) if negative. `a` is taken as the bit pattern of
/// an unsigned register value, so the right-shift branch is logical
/// (zero-filling), matching `shl`/`shr` as directly-callable instructions.
fn shl(a: u64, b: u64) -> u64 {
    shift_logical(a as i128, twos_i64(b))
}

/// `shl(a, -twos(b))`: same direction flip, logical fill either way.
fn shr(a: u64, b: u64) -> u64 {
    shift_logical(a as i128, twos_i64(b).wrapping_neg())
}

/// Arithmetic variant: `a` is sign-extended before the shift, so a negative
/// value's vacated high bits fill with ones instead of zeros.
fn sar(a: u64, b: u64) -> u64 {
    let signed_a = twos_i64(a) as i128;
    shift_logical(signed_a, twos_i64(b).wrapping_neg())
}

fn shift_logical(a: i128, count: i64) -> u64 {
    let result = if count < 0 {
        let mag = count.unsigned_abs().min(127) as u32;
        a >> mag
    } else {
        let mag = (count as u64).min(127) as u32;
        a << mag
    };
    result as u64
}

/// Full 128-bit unsigned product, split into the low and high 64 bits.
fn mulu(a: u64, b: u64) -> (u64, u64) {
    let product = (a as u128) * (b as u128);
    (product as u64, (product >> 64) as u64)
}

/// Quotient and remainder following floor-division semantics: the quotient
/// rounds toward negative infinity rather than toward zero, and the
/// remainder always carries the same sign as the divisor (or is zero).
/// Rust's native `/`/`%` truncate toward zero, so a plain `wrapping_div` on
/// `twos(a)`/`twos(b)` would disagree with this on mixed-sign inputs.
fn floor_div_rem(a: i64, b: i64) -> (i64, i64) {
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        (q.wrapping_sub(1), r.wrapping_add(b))
    } else {
        (q, r)
    }
}

#[cfg(test)]
mod arithmetic_tests {
    use super::*;

    #[test]
    fn floor_div_matches_python_semantics_on_mixed_signs() {
        assert_eq!(floor_div_rem(7, -2), (-4, -1));
        assert_eq!(floor_div_rem(-7, 2), (-4, 1));
        assert_eq!(floor_div_rem(7, 2), (3, 1));
        assert_eq!(floor_div_rem(-7, -2), (3, -1));
    }

    #[test]
    fn mulu_splits_full_width_product_across_two_destinations() {
        let (lo, hi) = mulu(0xFFFF_FFFF_FFFF_FFFF, 2);
        assert_eq!(lo, 0xFFFF_FFFF_FFFF_FFFE);
        assert_eq!(hi, 1);
    }

    #[test]
    fn sar_sign_extends_where_shr_zero_fills() {
        assert_eq!(sar(0x8000_0000_0000_0000, 1), 0xC000_0000_0000_0000);
        assert_eq!(shr(0x8000_0000_0000_0000, 1), 0x4000_0000_0000_0000);
    }

    #[test]
    fn negative_shift_count_inverts_direction() {
        // shl by -1 behaves like shr by 1.
        assert_eq!(shl(0b10, (-1i64) as u64), 0b1);
        assert_eq!(shr(0b1, (-1i64) as u64), 0b10);
    }
}
