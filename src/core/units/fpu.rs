//! Floating-Point Unit (FPU).
//!
//! IEEE-754 binary32 addition, subtraction and multiplication computed on
//! unpacked fields with the usual hardware datapath:
//!
//! 1. **Align**: unpack, classify, resolve special operands, and line up the
//!    significands on a common exponent.
//! 2. **Op**: add/subtract the aligned significands, or shift-add multiply them.
//! 3. **Normalize**: renormalize the raw result and adjust the exponent.
//! 4. **Round**: round to nearest, ties to even, on guard/round/sticky bits.
//!
//! The working significand is 27 bits: hidden bit, 23 fraction bits, then
//! guard, round and sticky. Working exponents are 10-bit two's complement so
//! intermediate values below 1 and above 254 stay representable.
//!
//! Only `RoundingMode::Rne` is implemented. Other modes are accepted and
//! logged, and the result is still rounded to nearest-even.

use serde::Serialize;

use super::adder::{add, decrement, increment, less_than_signed, less_than_unsigned, negate, ripple_add, sub};
use super::mdu::shift_add_multiply;
use super::shifter::STAGE_DISTANCES;
use crate::common::bits::BitVector;
use crate::common::error::BitsError;
use crate::core::signals::{FpuOp, RoundingMode};

/// Binary32 exponent field width.
pub const EXP_BITS: usize = 8;
/// Binary32 fraction field width.
pub const FRAC_BITS: usize = 23;
/// Significand width including the hidden bit.
pub const SIG_BITS: usize = FRAC_BITS + 1;
/// Significand plus guard, round and sticky.
const WORK_BITS: usize = SIG_BITS + 3;
/// Working exponent width.
const EXP_WORK_BITS: usize = 10;

/// Unpacked binary32 fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FpFields {
    pub sign: bool,
    /// 8-bit biased exponent.
    pub exponent: BitVector,
    /// 23-bit fraction.
    pub fraction: BitVector,
}

/// IEEE-754 operand classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FpClass {
    Zero,
    Subnormal,
    Normal,
    Infinity,
    Nan,
}

impl FpFields {
    /// Classifies the operand from its exponent and fraction fields.
    pub fn class(&self) -> FpClass {
        match (self.exponent.is_zero(), self.exponent.is_ones(), self.fraction.is_zero()) {
            (true, _, true) => FpClass::Zero,
            (true, _, false) => FpClass::Subnormal,
            (_, true, true) => FpClass::Infinity,
            (_, true, false) => FpClass::Nan,
            _ => FpClass::Normal,
        }
    }

    /// `1.fraction` for normals, `0.fraction` for zeros and subnormals.
    pub fn significand(&self) -> BitVector {
        BitVector::replicate(self.exponent.any(), 1).concat(&self.fraction)
    }

    /// Exponent used by the datapath: subnormals behave as exponent 1.
    fn effective_exponent(&self) -> BitVector {
        if self.exponent.is_zero() {
            exp_one()
        } else {
            self.exponent.zero_extend(EXP_WORK_BITS)
        }
    }

    fn negated(&self) -> Self {
        Self {
            sign: !self.sign,
            ..self.clone()
        }
    }
}

/// Splits a 32-bit word into sign, exponent and fraction.
pub fn unpack(word: &BitVector) -> Result<FpFields, BitsError> {
    if word.width() != 32 {
        return Err(BitsError::WidthMismatch {
            expected: 32,
            actual: word.width(),
        });
    }
    Ok(FpFields {
        sign: word.msb(),
        exponent: word.slice(30, 23),
        fraction: word.slice(22, 0),
    })
}

/// Reassembles a 32-bit word from fields.
pub fn pack(fields: &FpFields) -> BitVector {
    BitVector::replicate(fields.sign, 1)
        .concat(&fields.exponent.zero_extend(EXP_BITS))
        .concat(&fields.fraction.zero_extend(FRAC_BITS))
}

/// Accrued exception flags (RISC-V `fflags` subset).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FpuFlags {
    /// NV
    pub invalid: bool,
    /// OF
    pub overflow: bool,
    /// UF
    pub underflow: bool,
    /// NX
    pub inexact: bool,
}

impl FpuFlags {
    /// True if any exception flag is raised.
    pub fn any(&self) -> bool {
        self.invalid || self.overflow || self.underflow || self.inexact
    }
}

impl std::fmt::Display for FpuFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "NV={} OF={} UF={} NX={}",
            self.invalid as u8, self.overflow as u8, self.underflow as u8, self.inexact as u8
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FpuResult {
    pub result: BitVector,
    pub flags: FpuFlags,
    /// Step log, each line prefixed with its pipeline stage.
    pub trace: Vec<String>,
}

fn exp_one() -> BitVector {
    BitVector::zeros(EXP_WORK_BITS).with_bit(0, true)
}

/// 127 in the working exponent width.
fn exp_bias() -> BitVector {
    BitVector::ones(EXP_BITS - 1).zero_extend(EXP_WORK_BITS)
}

/// 255 in the working exponent width.
fn exp_max() -> BitVector {
    BitVector::ones(EXP_BITS).zero_extend(EXP_WORK_BITS)
}

/// `0x7FC00000`.
pub fn canonical_nan() -> BitVector {
    BitVector::zeros(1)
        .concat(&BitVector::ones(EXP_BITS + 1))
        .concat(&BitVector::zeros(FRAC_BITS - 1))
}

fn signed_infinity(sign: bool) -> BitVector {
    BitVector::replicate(sign, 1)
        .concat(&BitVector::ones(EXP_BITS))
        .concat(&BitVector::zeros(FRAC_BITS))
}

fn signed_zero(sign: bool) -> BitVector {
    BitVector::replicate(sign, 1).concat(&BitVector::zeros(31))
}

/// Logical right shift by a 10-bit amount that ORs every bit shifted out
/// into the LSB.
///
/// Built like the barrel shifter: amount bits 4..0 gate 16/8/4/2/1 stages;
/// any higher amount bit shifts everything into the sticky position.
pub fn shift_right_sticky(value: &BitVector, amount: &BitVector) -> BitVector {
    let width = value.width();
    let amount = amount.zero_extend(EXP_WORK_BITS);
    if amount.slice(EXP_WORK_BITS - 1, 5).any() {
        return BitVector::zeros(width).with_bit(0, value.any());
    }
    let mut current = value.clone();
    for (k, &distance) in STAGE_DISTANCES.iter().enumerate() {
        if amount.bit(4 - k) {
            current = sticky_shift(&current, distance);
        }
    }
    current
}

fn sticky_shift(value: &BitVector, distance: usize) -> BitVector {
    if distance >= value.width() {
        return BitVector::zeros(value.width()).with_bit(0, value.any());
    }
    let lost = value.slice(distance - 1, 0).any();
    let shifted = value.shr(distance);
    let sticky = shifted.lsb() | lost;
    shifted.with_bit(0, sticky)
}

/// Floating-Point Unit.
pub struct Fpu;

impl Fpu {
    /// Evaluates `op` on two binary32 words.
    pub fn execute(op: FpuOp, a: &BitVector, b: &BitVector, rm: RoundingMode) -> Result<FpuResult, BitsError> {
        match op {
            FpuOp::Fadd => Self::fadd(a, b, rm),
            FpuOp::Fsub => Self::fsub(a, b, rm),
            FpuOp::Fmul => Self::fmul(a, b, rm),
        }
    }

    /// Adds two binary32 words.
    ///
    /// # Arguments
    ///
    /// * `a` - Augend
    /// * `b` - Addend
    /// * `rm` - Rounding mode
    ///
    /// # Returns
    ///
    /// The rounded sum with NV/OF/UF/NX flags and the per-stage trace.
    ///
    /// # Errors
    ///
    /// `BitsError::WidthMismatch` if either operand is not 32 bits wide.
    pub fn fadd(a: &BitVector, b: &BitVector, rm: RoundingMode) -> Result<FpuResult, BitsError> {
        let fa = unpack(a)?;
        let fb = unpack(b)?;
        let trace = vec![format!("ALIGN: FADD a={:#x} b={:#x}", a, b)];
        Self::add_fields(fa, fb, rm, trace)
    }

    /// FADD with B's sign flipped.
    pub fn fsub(a: &BitVector, b: &BitVector, rm: RoundingMode) -> Result<FpuResult, BitsError> {
        let fa = unpack(a)?;
        let fb = unpack(b)?.negated();
        let trace = vec![format!("ALIGN: FSUB a={:#x} b={:#x} (b sign flipped)", a, b)];
        Self::add_fields(fa, fb, rm, trace)
    }

    fn finish(result: BitVector, flags: FpuFlags, mut trace: Vec<String>) -> FpuResult {
        trace.push(format!("WRITEBACK: result={:#x} {}", result, flags));
        for line in &trace {
            log::trace!("{}", line);
        }
        FpuResult { result, flags, trace }
    }

    fn note_rounding_mode(rm: RoundingMode, trace: &mut Vec<String>) {
        if !rm.is_honoured() {
            log::warn!("rounding mode {:?} not implemented, rounding to nearest-even", rm);
            trace.push(format!("ROUND: mode {:?} not implemented, using RNE", rm));
        }
    }

    /// Special operands for addition, in priority order.
    fn add_special(a: &FpFields, b: &FpFields) -> Option<(BitVector, FpuFlags, &'static str)> {
        let invalid = FpuFlags {
            invalid: true,
            ..FpuFlags::default()
        };
        let none = FpuFlags::default();
        match (a.class(), b.class()) {
            (FpClass::Nan, _) | (_, FpClass::Nan) => Some((canonical_nan(), invalid, "NaN operand")),
            (FpClass::Infinity, FpClass::Infinity) if a.sign != b.sign => {
                Some((canonical_nan(), invalid, "inf - inf"))
            }
            (FpClass::Infinity, _) => Some((pack(a), none, "infinite operand")),
            (_, FpClass::Infinity) => Some((pack(b), none, "infinite operand")),
            (FpClass::Zero, FpClass::Zero) => Some((signed_zero(a.sign & b.sign), none, "zero + zero")),
            (FpClass::Zero, _) => Some((pack(b), none, "zero operand")),
            (_, FpClass::Zero) => Some((pack(a), none, "zero operand")),
            _ => None,
        }
    }

    fn add_fields(
        a: FpFields,
        b: FpFields,
        rm: RoundingMode,
        mut trace: Vec<String>,
    ) -> Result<FpuResult, BitsError> {
        if let Some((result, flags, why)) = Self::add_special(&a, &b) {
            trace.push(format!("ALIGN: special case, {}", why));
            return Ok(Self::finish(result, flags, trace));
        }
        Self::note_rounding_mode(rm, &mut trace);
        let mut flags = FpuFlags::default();

        // Larger exponent first.
        let (big, small) = if less_than_unsigned(&a.effective_exponent(), &b.effective_exponent())? {
            (b, a)
        } else {
            (a, b)
        };
        let exp_big = big.effective_exponent();
        let diff = sub(&exp_big, &small.effective_exponent())?.sum;

        let grs = BitVector::zeros(3);
        let sig_big = big.significand().concat(&grs);
        let sig_small = shift_right_sticky(&small.significand().concat(&grs), &diff);
        trace.push(format!(
            "ALIGN: exp diff={} big={} small>>={}",
            diff, sig_big, sig_small
        ));

        let (sign, mut exp, mut sig) = if big.sign == small.sign {
            let sum = add(&sig_big.zero_extend(WORK_BITS + 1), &sig_small.zero_extend(WORK_BITS + 1))?;
            trace.push(format!("OP: same sign, add -> {}", sum));
            if sum.msb() {
                let shifted = sticky_shift(&sum, 1).truncate(WORK_BITS);
                let exp = increment(&exp_big);
                trace.push(format!("NORMALIZE: carry out, shift right, exp={}", exp));
                (big.sign, exp, shifted)
            } else {
                trace.push("NORMALIZE: no carry".to_string());
                (big.sign, exp_big.clone(), sum.truncate(WORK_BITS))
            }
        } else {
            let delta = sub(&sig_big, &sig_small)?;
            // Borrow: equal exponents and the second operand is larger.
            let (magnitude, sign) = if delta.carry_out {
                (delta.sum, big.sign)
            } else {
                (negate(&delta.sum), small.sign)
            };
            trace.push(format!("OP: opposite signs, subtract -> {}", magnitude));
            if magnitude.is_zero() {
                trace.push("NORMALIZE: exact cancellation, +0".to_string());
                return Ok(Self::finish(signed_zero(false), flags, trace));
            }
            (sign, exp_big.clone(), magnitude)
        };

        // Left-normalize until the hidden bit is set or the exponent bottoms out at 1.
        let mut shifts = 0;
        while !sig.bit(WORK_BITS - 1) && less_than_signed(&exp_one(), &exp)? {
            sig = sig.shl(1);
            exp = decrement(&exp);
            shifts += 1;
        }
        if shifts > 0 {
            trace.push(format!("NORMALIZE: shifted left {} exp={}", shifts, exp));
        }
        if !sig.bit(WORK_BITS - 1) && big.sign != small.sign {
            flags.underflow = true;
            trace.push("NORMALIZE: exponent exhausted, subnormal result".to_string());
        }

        let result = Self::round_and_pack(sign, exp, &sig, &mut flags, &mut trace)?;
        Ok(Self::finish(result, flags, trace))
    }

    /// Multiplies two binary32 words with a 24x24 shift-add significand multiply.
    ///
    /// # Arguments
    ///
    /// * `a` - Multiplicand
    /// * `b` - Multiplier
    /// * `rm` - Rounding mode
    ///
    /// # Returns
    ///
    /// The rounded product with NV/OF/UF/NX flags and the per-stage trace.
    pub fn fmul(a: &BitVector, b: &BitVector, rm: RoundingMode) -> Result<FpuResult, BitsError> {
        let fa = unpack(a)?;
        let fb = unpack(b)?;
        let mut trace = vec![format!("ALIGN: FMUL a={:#x} b={:#x}", a, b)];
        let sign = fa.sign ^ fb.sign;

        let invalid = FpuFlags {
            invalid: true,
            ..FpuFlags::default()
        };
        let special = match (fa.class(), fb.class()) {
            (FpClass::Nan, _) | (_, FpClass::Nan) => Some((canonical_nan(), invalid, "NaN operand")),
            (FpClass::Infinity, FpClass::Zero) | (FpClass::Zero, FpClass::Infinity) => {
                Some((canonical_nan(), invalid, "inf * 0"))
            }
            (FpClass::Infinity, _) | (_, FpClass::Infinity) => {
                Some((signed_infinity(sign), FpuFlags::default(), "infinite operand"))
            }
            (FpClass::Zero, _) | (_, FpClass::Zero) => {
                Some((signed_zero(sign), FpuFlags::default(), "zero operand"))
            }
            _ => None,
        };
        if let Some((result, flags, why)) = special {
            trace.push(format!("ALIGN: special case, {}", why));
            return Ok(Self::finish(result, flags, trace));
        }
        Self::note_rounding_mode(rm, &mut trace);
        let mut flags = FpuFlags::default();

        let exp_sum = add(&fa.effective_exponent(), &fb.effective_exponent())?;
        let mut exp = sub(&exp_sum, &exp_bias())?.sum;
        trace.push(format!("ALIGN: sign={} exp={} (rebiased)", sign as u8, exp));

        // 24x24 -> 48-bit product in 2.46 fixed point.
        let (mut product, _) = shift_add_multiply(&fa.significand(), &fb.significand())?;
        trace.push(format!("OP: significand product {:#x}", product));
        let hidden = 2 * SIG_BITS - 2;

        if product.msb() {
            product = sticky_shift(&product, 1);
            exp = increment(&exp);
            trace.push(format!("NORMALIZE: product >= 2.0, shift right, exp={}", exp));
        }
        let mut shifts = 0;
        while !product.bit(hidden) && less_than_signed(&exp_one(), &exp)? {
            product = product.shl(1);
            exp = decrement(&exp);
            shifts += 1;
        }
        if shifts > 0 {
            trace.push(format!("NORMALIZE: shifted left {} exp={}", shifts, exp));
        }
        if !less_than_signed(&BitVector::zeros(EXP_WORK_BITS), &exp)? {
            let amount = sub(&exp_one(), &exp)?.sum;
            product = shift_right_sticky(&product, &amount);
            exp = exp_one();
            flags.underflow = true;
            trace.push(format!("NORMALIZE: exponent <= 0, denormalize by {}", amount));
        }

        // Keep hidden..round explicitly, OR everything below into sticky.
        let round_pos = hidden + 2 - WORK_BITS;
        let sticky = product.slice(round_pos - 1, 0).any();
        let sig = product
            .slice(hidden, round_pos)
            .concat(&BitVector::replicate(sticky, 1));

        let result = Self::round_and_pack(sign, exp, &sig, &mut flags, &mut trace)?;
        Ok(Self::finish(result, flags, trace))
    }

    /// Rounds a 27-bit working significand to nearest-even and packs it.
    ///
    /// `exp` is the working exponent for a significand whose hidden bit is
    /// bit 26; a clear hidden bit with `exp == 1` encodes a subnormal.
    fn round_and_pack(
        sign: bool,
        exp: BitVector,
        sig: &BitVector,
        flags: &mut FpuFlags,
        trace: &mut Vec<String>,
    ) -> Result<BitVector, BitsError> {
        let guard = sig.bit(2);
        let round = sig.bit(1);
        let sticky = sig.bit(0);
        let mut mantissa = sig.slice(WORK_BITS - 1, 3);
        let mut exp = exp;

        if guard | round | sticky {
            flags.inexact = true;
        }
        if guard && (round || sticky || mantissa.lsb()) {
            let bumped = ripple_add(
                &mantissa.zero_extend(SIG_BITS + 1),
                &BitVector::zeros(SIG_BITS + 1).with_bit(0, true),
                false,
            )?
            .sum;
            if bumped.msb() {
                mantissa = bumped.slice(SIG_BITS, 1);
                exp = increment(&exp);
            } else {
                mantissa = bumped.truncate(SIG_BITS);
            }
            trace.push(format!("ROUND: G={} R={} S={} round up", guard as u8, round as u8, sticky as u8));
        } else {
            trace.push(format!("ROUND: G={} R={} S={} truncate", guard as u8, round as u8, sticky as u8));
        }

        if !less_than_signed(&exp, &exp_max())? {
            flags.overflow = true;
            flags.inexact = true;
            trace.push("ROUND: exponent >= 255, overflow to infinity".to_string());
            return Ok(signed_infinity(sign));
        }

        let exponent = if mantissa.msb() {
            exp.truncate(EXP_BITS)
        } else {
            BitVector::zeros(EXP_BITS)
        };
        Ok(pack(&FpFields {
            sign,
            exponent,
            fraction: mantissa.truncate(FRAC_BITS),
        }))
    }
}
