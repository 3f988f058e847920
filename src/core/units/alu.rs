//! Arithmetic Logic Unit (ALU).
//!
//! A combinational 32-bit ALU built from 32 one-bit slices chained LSB to
//! MSB through a carry line. Each slice has an A-invert and B-invert input,
//! a full adder, and a result multiplexer selecting AND, OR, SUM, XOR or the
//! LESS input. Subtraction is B-invert plus a forced carry-in.

use serde::Serialize;

use super::adder::full_adder;
use crate::common::bits::BitVector;
use crate::common::error::BitsError;
use crate::core::signals::AluOp;

/// Result multiplexer selection inside one slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceMux {
    And,
    Or,
    Sum,
    Xor,
    Less,
}

/// Control lines fanned out to every slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceControl {
    pub a_invert: bool,
    pub b_invert: bool,
    pub carry_in: bool,
    pub mux: SliceMux,
}

impl SliceControl {
    /// Decodes an ALU opcode into slice control lines.
    pub fn for_op(op: AluOp) -> Self {
        let (a_invert, b_invert, carry_in, mux) = match op {
            AluOp::And => (false, false, false, SliceMux::And),
            AluOp::Or => (false, false, false, SliceMux::Or),
            AluOp::Add => (false, false, false, SliceMux::Sum),
            AluOp::Xor => (false, false, false, SliceMux::Xor),
            AluOp::Sub => (false, true, true, SliceMux::Sum),
            AluOp::Slt => (false, true, true, SliceMux::Less),
            // De Morgan: !a & !b, !a | !b
            AluOp::Nor => (true, true, false, SliceMux::And),
            AluOp::Nand => (true, true, false, SliceMux::Or),
        };
        Self {
            a_invert,
            b_invert,
            carry_in,
            mux,
        }
    }

    fn is_arithmetic(&self) -> bool {
        matches!(self.mux, SliceMux::Sum | SliceMux::Less)
    }
}

/// Outputs of one slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceOutput {
    pub result: bool,
    pub carry_out: bool,
    /// Raw adder sum, used as SET on the sign slice.
    pub set: bool,
}

/// One-bit ALU slice.
pub fn alu_slice(a: bool, b: bool, less: bool, carry_in: bool, ctrl: SliceControl) -> SliceOutput {
    let a = a ^ ctrl.a_invert;
    let b = b ^ ctrl.b_invert;
    let (sum, carry_out) = full_adder(a, b, carry_in);
    let result = match ctrl.mux {
        SliceMux::And => a & b,
        SliceMux::Or => a | b,
        SliceMux::Sum => sum,
        SliceMux::Xor => a ^ b,
        SliceMux::Less => less,
    };
    SliceOutput {
        result,
        carry_out,
        set: sum,
    }
}

/// Condition flags derived from a single ALU evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AluFlags {
    pub negative: bool,
    pub zero: bool,
    /// Carry out of bit 31; only meaningful for ADD/SUB/SLT, false otherwise.
    pub carry: bool,
    /// Signed overflow at the sign slice; only meaningful for ADD/SUB/SLT.
    pub overflow: bool,
}

impl std::fmt::Display for AluFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "N={} Z={} C={} V={}",
            self.negative as u8, self.zero as u8, self.carry as u8, self.overflow as u8
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AluResult {
    pub result: BitVector,
    pub flags: AluFlags,
    pub trace: Vec<String>,
}

/// Arithmetic Logic Unit.
pub struct Alu;

impl Alu {
    /// Operand width.
    pub const WIDTH: usize = 32;

    /// Evaluates `op` on two 32-bit operands.
    ///
    /// # Errors
    ///
    /// `BitsError::WidthMismatch` if either operand is not 32 bits wide.
    pub fn execute(op: AluOp, a: &BitVector, b: &BitVector) -> Result<AluResult, BitsError> {
        for operand in [a, b] {
            if operand.width() != Self::WIDTH {
                return Err(BitsError::WidthMismatch {
                    expected: Self::WIDTH,
                    actual: operand.width(),
                });
            }
        }

        let ctrl = SliceControl::for_op(op);
        let mut carry = ctrl.carry_in;
        let mut carry_into_msb = carry;
        let mut results = Vec::with_capacity(Self::WIDTH);
        let mut carries = Vec::with_capacity(Self::WIDTH);
        let mut set = false;

        for (pos, (ai, bi)) in a.iter_lsb().zip(b.iter_lsb()).enumerate() {
            if pos == Self::WIDTH - 1 {
                carry_into_msb = carry;
            }
            let out = alu_slice(ai, bi, false, carry, ctrl);
            results.push(out.result);
            carries.push(out.carry_out);
            carry = out.carry_out;
            set = out.set;
        }

        let overflow = carry ^ carry_into_msb;
        if ctrl.mux == SliceMux::Less {
            // LESS of slice 0 is SET of slice 31, corrected for overflow.
            results[0] = set ^ overflow;
        }

        let result = BitVector::from_lsb_first(results);
        let flags = AluFlags {
            negative: result.msb(),
            zero: result.is_zero(),
            carry: ctrl.is_arithmetic() && carry,
            overflow: ctrl.is_arithmetic() && overflow,
        };

        let trace = vec![
            format!(
                "ALU {} a={:#x} b={:#x} ainv={} binv={} cin={}",
                op.mnemonic(),
                a,
                b,
                ctrl.a_invert as u8,
                ctrl.b_invert as u8,
                ctrl.carry_in as u8
            ),
            format!("carry chain {}", BitVector::from_lsb_first(carries)),
            format!("result={:#x} {}", result, flags),
        ];
        for line in &trace {
            log::trace!("{}", line);
        }

        Ok(AluResult {
            result,
            flags,
            trace,
        })
    }
}
