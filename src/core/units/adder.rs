//! Ripple-carry arithmetic on bit vectors.
//!
//! Every addition in the functional units goes through `full_adder`, chained
//! LSB to MSB. The helpers here (`add`, `sub`, `negate`, ...) are that chain
//! wired up for the common cases.

use crate::common::bits::BitVector;
use crate::common::error::BitsError;

/// Output of a ripple-carry chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdderOutput {
    pub sum: BitVector,
    /// Carry out of the MSB slice.
    pub carry_out: bool,
    /// Carry into the MSB slice; XOR with `carry_out` gives signed overflow.
    pub carry_into_msb: bool,
}

impl AdderOutput {
    /// Two's-complement overflow of the operation.
    pub fn overflow(&self) -> bool {
        self.carry_out ^ self.carry_into_msb
    }
}

/// One-bit full adder: `(sum, carry_out)`.
pub fn full_adder(a: bool, b: bool, carry_in: bool) -> (bool, bool) {
    let sum = a ^ b ^ carry_in;
    let carry_out = (a & b) | (a & carry_in) | (b & carry_in);
    (sum, carry_out)
}

/// `a + b + carry_in` through a ripple-carry chain of `a.width()` slices.
pub fn ripple_add(a: &BitVector, b: &BitVector, carry_in: bool) -> Result<AdderOutput, BitsError> {
    if a.width() != b.width() {
        return Err(BitsError::LengthMismatch {
            left: a.width(),
            right: b.width(),
        });
    }
    let mut carry = carry_in;
    let mut carry_into_msb = carry_in;
    let mut sum = Vec::with_capacity(a.width());
    for (pos, (ai, bi)) in a.iter_lsb().zip(b.iter_lsb()).enumerate() {
        if pos + 1 == a.width() {
            carry_into_msb = carry;
        }
        let (s, c) = full_adder(ai, bi, carry);
        sum.push(s);
        carry = c;
    }
    Ok(AdderOutput {
        sum: BitVector::from_lsb_first(sum),
        carry_out: carry,
        carry_into_msb,
    })
}

/// `a + b`, discarding the carry.
pub fn add(a: &BitVector, b: &BitVector) -> Result<BitVector, BitsError> {
    Ok(ripple_add(a, b, false)?.sum)
}

/// `a - b` as `a + !b + 1`. `carry_out == true` means no borrow (`a >= b`
/// unsigned).
pub fn sub(a: &BitVector, b: &BitVector) -> Result<AdderOutput, BitsError> {
    ripple_add(a, &b.not(), true)
}

/// Two's-complement negation: invert and increment.
pub fn negate(a: &BitVector) -> BitVector {
    increment(&a.not())
}

/// `a + 1` within the same width.
pub fn increment(a: &BitVector) -> BitVector {
    let mut carry = true;
    let bits: Vec<bool> = a
        .iter_lsb()
        .map(|bit| {
            let (s, c) = full_adder(bit, false, carry);
            carry = c;
            s
        })
        .collect();
    BitVector::from_lsb_first(bits)
}

/// `a - 1` within the same width (adds all-ones).
pub fn decrement(a: &BitVector) -> BitVector {
    let mut carry = false;
    let bits: Vec<bool> = a
        .iter_lsb()
        .map(|bit| {
            let (s, c) = full_adder(bit, true, carry);
            carry = c;
            s
        })
        .collect();
    BitVector::from_lsb_first(bits)
}

/// Unsigned `a < b`: the subtraction borrows.
pub fn less_than_unsigned(a: &BitVector, b: &BitVector) -> Result<bool, BitsError> {
    Ok(!sub(a, b)?.carry_out)
}

/// Signed `a < b`: sign of the difference corrected for overflow.
pub fn less_than_signed(a: &BitVector, b: &BitVector) -> Result<bool, BitsError> {
    let diff = sub(a, b)?;
    Ok(diff.sum.msb() ^ diff.overflow())
}

/// Absolute value of a two's-complement vector when `signed` is set, along
/// with the sign that was stripped.
pub fn sign_magnitude(a: &BitVector, signed: bool) -> (bool, BitVector) {
    let negative = signed && a.msb();
    let magnitude = if negative { negate(a) } else { a.clone() };
    (negative, magnitude)
}
