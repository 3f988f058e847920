//! Multiply/Divide Unit (MDU).
//!
//! Implements the RV32M operations with the algorithms a sequential
//! hardware unit would use:
//!
//! * **Multiply**: operands are reduced to sign-magnitude, then a 64-bit
//!   accumulator collects the multiplicand shifted by every set multiplier
//!   bit (LSB first). The product is negated if exactly one operand was
//!   negative.
//! * **Divide**: restoring division over a double-width remainder register,
//!   one quotient bit per iteration, followed by sign correction.
//!
//! Divide-by-zero and `INT_MIN / -1` are defined results of the M extension,
//! reported through `MduFlags`, never as errors.

use serde::Serialize;

use super::adder::{add, negate, sign_magnitude, sub};
use crate::common::bits::BitVector;
use crate::common::error::BitsError;
use crate::core::signals::MduOp;

/// Number of iterations of either algorithm; one per operand bit.
pub const MDU_ITERATIONS: u32 = 32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MduFlags {
    /// MUL: high word is not the sign extension of the low word.
    /// DIV/REM: `INT_MIN / -1`.
    pub overflow: bool,
    pub div_by_zero: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MulOutcome {
    /// The word written back: low half for MUL, high half for MULH*.
    pub result: BitVector,
    /// Full signed/unsigned 64-bit product.
    pub product: BitVector,
    pub flags: MduFlags,
    pub trace: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DivOutcome {
    /// The word written back: quotient for DIV*, remainder for REM*.
    pub result: BitVector,
    pub quotient: BitVector,
    pub remainder: BitVector,
    pub flags: MduFlags,
    pub trace: Vec<String>,
}

/// Outcome of one MDU evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum MduResult {
    Multiply(MulOutcome),
    Divide(DivOutcome),
}

impl MduResult {
    /// The word written to `rd`: product half, quotient or remainder.
    pub fn result(&self) -> &BitVector {
        match self {
            MduResult::Multiply(m) => &m.result,
            MduResult::Divide(d) => &d.result,
        }
    }

    pub fn flags(&self) -> MduFlags {
        match self {
            MduResult::Multiply(m) => m.flags,
            MduResult::Divide(d) => d.flags,
        }
    }

    /// Step strings, one `iter` line per iteration.
    pub fn trace(&self) -> &[String] {
        match self {
            MduResult::Multiply(m) => &m.trace,
            MduResult::Divide(d) => &d.trace,
        }
    }
}

/// Whether each operand is interpreted as signed.
fn operand_signedness(op: MduOp) -> (bool, bool) {
    match op {
        MduOp::Mul | MduOp::Mulh | MduOp::Div | MduOp::Rem => (true, true),
        MduOp::Mulhsu => (true, false),
        MduOp::Mulhu | MduOp::Divu | MduOp::Remu => (false, false),
    }
}

/// Unsigned shift-add multiply of an `n`-bit multiplicand by an `m`-bit
/// multiplier into an `n + m`-bit product.
///
/// Returns the product and one trace line per multiplier bit.
pub fn shift_add_multiply(
    multiplicand: &BitVector,
    multiplier: &BitVector,
) -> Result<(BitVector, Vec<String>), BitsError> {
    let width = multiplicand.width() + multiplier.width();
    let addend = multiplicand.zero_extend(width);
    let mut acc = BitVector::zeros(width);
    let mut trace = Vec::with_capacity(multiplier.width());

    for i in 0..multiplier.width() {
        if multiplier.bit(i) {
            acc = add(&acc, &addend.shl(i))?;
            trace.push(format!("iter {:>2}: bit=1 add   acc={:#x}", i, acc));
        } else {
            trace.push(format!("iter {:>2}: bit=0 shift acc={:#x}", i, acc));
        }
    }
    Ok((acc, trace))
}

/// Unsigned restoring division of equal-width operands.
///
/// The remainder register is `2n + 1` bits: the extra top bit keeps the
/// shifted partial remainder from losing its MSB when the divisor is at or
/// above `2^(n-1)`. Returns `(quotient, remainder, trace)`.
pub fn restoring_divide(
    dividend: &BitVector,
    divisor: &BitVector,
) -> Result<(BitVector, BitVector, Vec<String>), BitsError> {
    if dividend.width() != divisor.width() {
        return Err(BitsError::LengthMismatch {
            left: dividend.width(),
            right: divisor.width(),
        });
    }
    let n = dividend.width();
    let divisor = divisor.zero_extend(n + 1);
    let mut rem = BitVector::zeros(n + 1).concat(dividend);
    let mut trace = Vec::with_capacity(n);

    for i in 0..n {
        rem = rem.shl(1);
        let high = rem.slice(2 * n, n);
        let trial = sub(&high, &divisor)?;
        if trial.carry_out {
            rem = trial.sum.concat(&rem.slice(n - 1, 0)).with_bit(0, true);
            trace.push(format!("iter {:>2}: sub    q=1 rem={:#x}", i, rem.slice(2 * n - 1, n)));
        } else {
            trace.push(format!("iter {:>2}: restore q=0 rem={:#x}", i, high.truncate(n)));
        }
    }

    Ok((rem.slice(n - 1, 0), rem.slice(2 * n - 1, n), trace))
}

/// Multiply/Divide Unit.
pub struct Mdu;

impl Mdu {
    pub const WIDTH: usize = 32;

    /// Dispatches to `multiply` or `divide` by opcode family.
    pub fn execute(op: MduOp, a: &BitVector, b: &BitVector) -> Result<MduResult, BitsError> {
        if op.is_multiply() {
            Ok(MduResult::Multiply(Self::multiply(op, a, b)?))
        } else {
            Ok(MduResult::Divide(Self::divide(op, a, b)?))
        }
    }

    fn check_width(operand: &BitVector) -> Result<(), BitsError> {
        if operand.width() != Self::WIDTH {
            return Err(BitsError::WidthMismatch {
                expected: Self::WIDTH,
                actual: operand.width(),
            });
        }
        Ok(())
    }

    /// MUL / MULH / MULHSU / MULHU.
    pub fn multiply(op: MduOp, a: &BitVector, b: &BitVector) -> Result<MulOutcome, BitsError> {
        Self::check_width(a)?;
        Self::check_width(b)?;
        let (signed_a, signed_b) = operand_signedness(op);

        let (neg_a, mag_a) = sign_magnitude(a, signed_a);
        let (neg_b, mag_b) = sign_magnitude(b, signed_b);

        let mut trace = vec![format!(
            "MDU {} a={:#x} b={:#x} |a|={:#x} |b|={:#x}",
            op.mnemonic(),
            a,
            b,
            mag_a,
            mag_b
        )];
        let (magnitude, steps) = shift_add_multiply(&mag_a, &mag_b)?;
        trace.extend(steps);

        let product = if neg_a ^ neg_b {
            trace.push("sign fix: negate product".to_string());
            negate(&magnitude)
        } else {
            magnitude
        };

        let low = product.slice(31, 0);
        let high = product.slice(63, 32);
        let overflow = op == MduOp::Mul && high != BitVector::replicate(low.msb(), Self::WIDTH);
        let result = match op {
            MduOp::Mulh | MduOp::Mulhsu | MduOp::Mulhu => high,
            _ => low,
        };
        trace.push(format!("product={:#x} result={:#x}", product, result));

        for line in &trace {
            log::trace!("{}", line);
        }

        Ok(MulOutcome {
            result,
            product,
            flags: MduFlags {
                overflow,
                div_by_zero: false,
            },
            trace,
        })
    }

    /// DIV / DIVU / REM / REMU.
    pub fn divide(op: MduOp, a: &BitVector, b: &BitVector) -> Result<DivOutcome, BitsError> {
        Self::check_width(a)?;
        Self::check_width(b)?;
        let (signed, _) = operand_signedness(op);
        let mut flags = MduFlags::default();
        let mut trace = vec![format!("MDU {} a={:#x} b={:#x}", op.mnemonic(), a, b)];

        let int_min = a.msb() && a.slice(30, 0).is_zero();

        let (quotient, remainder) = if b.is_zero() {
            flags.div_by_zero = true;
            trace.push("divide by zero: q=all-ones, r=dividend".to_string());
            (BitVector::ones(Self::WIDTH), a.clone())
        } else if signed && int_min && b.is_ones() {
            flags.overflow = true;
            trace.push("INT_MIN / -1: q=INT_MIN, r=0".to_string());
            (a.clone(), BitVector::zeros(Self::WIDTH))
        } else {
            let (neg_a, mag_a) = sign_magnitude(a, signed);
            let (neg_b, mag_b) = sign_magnitude(b, signed);
            let (q, r, steps) = restoring_divide(&mag_a, &mag_b)?;
            trace.extend(steps);
            let q = if neg_a ^ neg_b { negate(&q) } else { q };
            let r = if neg_a { negate(&r) } else { r };
            (q, r)
        };

        let result = match op {
            MduOp::Rem | MduOp::Remu => remainder.clone(),
            _ => quotient.clone(),
        };
        trace.push(format!("quotient={:#x} remainder={:#x}", quotient, remainder));

        for line in &trace {
            log::trace!("{}", line);
        }

        Ok(DivOutcome {
            result,
            quotient,
            remainder,
            flags,
            trace,
        })
    }
}
