//! Barrel shifter.
//!
//! Five cascaded conditional stages shift by 16, 8, 4, 2 and 1 positions.
//! Stage `k` is gated by bit `4 - k` of the 5-bit shift amount, so the widest
//! stage answers to the MSB. Shift amounts wider than 5 bits are truncated,
//! which wraps them modulo 32.

use serde::Serialize;

use crate::common::bits::BitVector;
use crate::common::error::BitsError;
use crate::core::signals::ShiftOp;

/// Stage distances, widest first.
pub const STAGE_DISTANCES: [usize; 5] = [16, 8, 4, 2, 1];

/// Width of the shift-amount field.
pub const SHAMT_BITS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShifterResult {
    pub result: BitVector,
    /// Value leaving each of the five stages, widest stage first.
    pub stages: Vec<BitVector>,
    pub trace: Vec<String>,
}

/// Barrel shifter for SLL/SRL/SRA.
pub struct Shifter;

impl Shifter {
    pub const WIDTH: usize = 32;

    /// Shifts `value` by the low five bits of `shamt`.
    ///
    /// `shamt` may be any width: a register operand passes its full 32 bits
    /// and only bits 4..0 are wired to the stage gates.
    pub fn execute(op: ShiftOp, value: &BitVector, shamt: &BitVector) -> Result<ShifterResult, BitsError> {
        if value.width() != Self::WIDTH {
            return Err(BitsError::WidthMismatch {
                expected: Self::WIDTH,
                actual: value.width(),
            });
        }
        // zero_extend to a narrower width truncates, so this is bits 4..0
        let amount = shamt.zero_extend(SHAMT_BITS);
        let sign = value.msb();

        let mut trace = vec![format!(
            "SHIFT {} value={:#x} shamt={}",
            op.mnemonic(),
            value,
            amount
        )];
        let mut stages = Vec::with_capacity(STAGE_DISTANCES.len());
        let mut current = value.clone();

        for (k, &distance) in STAGE_DISTANCES.iter().enumerate() {
            let gate = amount.bit(SHAMT_BITS - 1 - k);
            if gate {
                current = Self::stage(op, &current, distance, sign);
            }
            trace.push(format!(
                "stage {:>2}: {} -> {:#x}",
                distance,
                if gate { "shift" } else { "pass " },
                current
            ));
            stages.push(current.clone());
        }

        for line in &trace {
            log::trace!("{}", line);
        }

        Ok(ShifterResult {
            result: current,
            stages,
            trace,
        })
    }

    /// One fixed-distance stage, wired from slices. SRA fills from the
    /// original operand's sign bit.
    fn stage(op: ShiftOp, input: &BitVector, distance: usize, sign: bool) -> BitVector {
        let w = input.width();
        match op {
            ShiftOp::Sll => input
                .slice(w - 1 - distance, 0)
                .concat(&BitVector::zeros(distance)),
            ShiftOp::Srl => BitVector::zeros(distance).concat(&input.slice(w - 1, distance)),
            ShiftOp::Sra => BitVector::replicate(sign, distance).concat(&input.slice(w - 1, distance)),
        }
    }
}
