//! Fixed-width bit vectors.
//!
//! `BitVector` is the only numeric vocabulary the functional units use. It is
//! an ordered, MSB-first sequence of bits with value semantics: every
//! operation returns a fresh vector and never mutates its inputs.
//!
//! Bit positions passed to `bit`, `slice` and friends use hardware numbering
//! (position 0 is the LSB), even though storage is MSB-first.
//!
//! Conversions to and from host integers and floats (`from_u32`, `to_u32`,
//! `from_f32`, ...) exist for fixtures, register presets and display only.
//! Result-computing code in `core::units` never calls them.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::BitsError;

/// An ordered, MSB-first, fixed-length sequence of bits.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitVector {
    bits: Vec<bool>,
}

impl BitVector {
    /// All-zero vector of the given width.
    pub fn zeros(width: usize) -> Self {
        Self {
            bits: vec![false; width],
        }
    }

    /// All-one vector of the given width.
    pub fn ones(width: usize) -> Self {
        Self {
            bits: vec![true; width],
        }
    }

    /// `width` copies of `bit`.
    pub fn replicate(bit: bool, width: usize) -> Self {
        Self {
            bits: vec![bit; width],
        }
    }

    /// Builds a vector from bits given MSB first.
    pub fn from_msb_first(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Builds a vector from bits given LSB first (the order a carry chain
    /// produces them in).
    pub fn from_lsb_first<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let mut bits: Vec<bool> = bits.into_iter().collect();
        bits.reverse();
        Self { bits }
    }

    /// Parses a binary literal such as `"0111_1111"`.
    ///
    /// Underscores are ignored so hardwired constants can be grouped.
    pub fn literal(text: &str) -> Result<Self, BitsError> {
        let mut bits = Vec::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '0' => bits.push(false),
                '1' => bits.push(true),
                '_' => {}
                _ => return Err(BitsError::InvalidLiteral { ch }),
            }
        }
        Ok(Self { bits })
    }

    /// Host integer to vector. I/O boundary only.
    pub fn from_u64(value: u64, width: usize) -> Self {
        Self::from_lsb_first((0..width).map(|pos| pos < 64 && (value >> pos) & 1 == 1))
    }

    /// Host word to 32-bit vector. I/O boundary only.
    pub fn from_u32(value: u32) -> Self {
        Self::from_u64(value as u64, 32)
    }

    /// Host signed word to 32-bit two's-complement vector. I/O boundary only.
    pub fn from_i32(value: i32) -> Self {
        Self::from_u32(value as u32)
    }

    /// Host float to its 32-bit IEEE-754 encoding. I/O boundary only.
    pub fn from_f32(value: f32) -> Self {
        Self::from_u32(value.to_bits())
    }

    /// Vector to host integer. I/O boundary only.
    ///
    /// # Panics
    ///
    /// Panics if the vector is wider than 64 bits.
    pub fn to_u64(&self) -> u64 {
        assert!(self.width() <= 64, "{}-bit vector does not fit in u64", self.width());
        self.bits
            .iter()
            .fold(0u64, |acc, &bit| (acc << 1) | bit as u64)
    }

    /// Low 32 bits as a host word. I/O boundary only.
    pub fn to_u32(&self) -> u32 {
        self.truncate(32.min(self.width())).to_u64() as u32
    }

    /// Low 32 bits as a host signed word. I/O boundary only.
    pub fn to_i32(&self) -> i32 {
        self.to_u32() as i32
    }

    /// Reinterprets a 32-bit vector as an `f32`. I/O boundary only.
    pub fn to_f32(&self) -> f32 {
        f32::from_bits(self.to_u32())
    }

    /// Number of bits held.
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Bit at hardware position `pos` (0 = LSB).
    pub fn bit(&self, pos: usize) -> bool {
        assert!(pos < self.width(), "bit {} out of range for width {}", pos, self.width());
        self.bits[self.width() - 1 - pos]
    }

    /// Copy of `self` with position `pos` forced to `value`.
    pub fn with_bit(&self, pos: usize, value: bool) -> Self {
        assert!(pos < self.width(), "bit {} out of range for width {}", pos, self.width());
        let mut bits = self.bits.clone();
        let idx = self.width() - 1 - pos;
        bits[idx] = value;
        Self { bits }
    }

    pub fn msb(&self) -> bool {
        self.bits.first().copied().unwrap_or(false)
    }

    pub fn lsb(&self) -> bool {
        self.bits.last().copied().unwrap_or(false)
    }

    /// Iterates from the LSB up.
    pub fn iter_lsb(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().rev().copied()
    }

    /// Iterates from the MSB down.
    pub fn iter_msb(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    fn zip_with(&self, other: &Self, f: impl Fn(bool, bool) -> bool) -> Result<Self, BitsError> {
        if self.width() != other.width() {
            return Err(BitsError::LengthMismatch {
                left: self.width(),
                right: other.width(),
            });
        }
        Ok(Self {
            bits: self
                .bits
                .iter()
                .zip(other.bits.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Bitwise AND of two equal-width vectors.
    ///
    /// # Errors
    ///
    /// `BitsError::LengthMismatch` if the widths differ.
    pub fn and(&self, other: &Self) -> Result<Self, BitsError> {
        self.zip_with(other, |a, b| a & b)
    }

    pub fn or(&self, other: &Self) -> Result<Self, BitsError> {
        self.zip_with(other, |a, b| a | b)
    }

    pub fn xor(&self, other: &Self) -> Result<Self, BitsError> {
        self.zip_with(other, |a, b| a ^ b)
    }

    /// Inverts every bit.
    pub fn not(&self) -> Self {
        Self {
            bits: self.bits.iter().map(|&b| !b).collect(),
        }
    }

    /// Widens to `width` by prepending zeros. Narrower targets truncate.
    pub fn zero_extend(&self, width: usize) -> Self {
        self.extend_with(false, width)
    }

    /// Widens to `width` by replicating the MSB. Narrower targets truncate.
    pub fn sign_extend(&self, width: usize) -> Self {
        self.extend_with(self.msb(), width)
    }

    fn extend_with(&self, fill: bool, width: usize) -> Self {
        if width <= self.width() {
            return self.truncate(width);
        }
        let mut bits = vec![fill; width - self.width()];
        bits.extend_from_slice(&self.bits);
        Self { bits }
    }

    /// Keeps the low `width` bits.
    pub fn truncate(&self, width: usize) -> Self {
        let width = width.min(self.width());
        Self {
            bits: self.bits[self.width() - width..].to_vec(),
        }
    }

    /// Bits `hi..=lo` in hardware numbering, e.g. `slice(30, 23)` is the
    /// exponent field of a binary32 word.
    pub fn slice(&self, hi: usize, lo: usize) -> Self {
        assert!(
            lo <= hi && hi < self.width(),
            "slice [{}:{}] out of range for width {}",
            hi,
            lo,
            self.width()
        );
        let start = self.width() - 1 - hi;
        let end = self.width() - lo;
        Self {
            bits: self.bits[start..end].to_vec(),
        }
    }

    /// `self` as the high part, `low` as the low part.
    pub fn concat(&self, low: &Self) -> Self {
        let mut bits = Vec::with_capacity(self.width() + low.width());
        bits.extend_from_slice(&self.bits);
        bits.extend_from_slice(&low.bits);
        Self { bits }
    }

    /// True when no bit is set.
    pub fn is_zero(&self) -> bool {
        self.bits.iter().all(|&b| !b)
    }

    pub fn is_ones(&self) -> bool {
        self.bits.iter().all(|&b| b)
    }

    /// OR-reduction of every bit.
    pub fn any(&self) -> bool {
        !self.is_zero()
    }

    /// Fixed-distance left shift: drops `n` high bits, zero-fills the LSB side.
    pub fn shl(&self, n: usize) -> Self {
        let w = self.width();
        if n >= w {
            return Self::zeros(w);
        }
        let mut bits = self.bits[n..].to_vec();
        bits.extend(std::iter::repeat(false).take(n));
        Self { bits }
    }

    /// Fixed-distance logical right shift.
    pub fn shr(&self, n: usize) -> Self {
        self.shift_right_fill(n, false)
    }

    /// Fixed-distance arithmetic right shift.
    pub fn sar(&self, n: usize) -> Self {
        self.shift_right_fill(n, self.msb())
    }

    /// Right shift that fills the vacated MSB positions with `fill`.
    pub fn shift_right_fill(&self, n: usize, fill: bool) -> Self {
        let w = self.width();
        if n >= w {
            return Self::replicate(fill, w);
        }
        let mut bits = vec![fill; n];
        bits.extend_from_slice(&self.bits[..w - n]);
        Self { bits }
    }

    /// MSB-first binary digits, no prefix.
    pub fn to_bin_string(&self) -> String {
        self.bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
    }

    /// Hex rendering, one digit per nibble; a partial top nibble is zero-padded.
    pub fn to_hex_string(&self) -> String {
        let padded = self.zero_extend(self.width().div_ceil(4) * 4);
        padded
            .bits
            .chunks(4)
            .map(|nibble| {
                let digit = nibble.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32);
                char::from_digit(digit, 16).unwrap_or('?')
            })
            .collect()
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bin_string())
    }
}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVector<{}>(0b{})", self.width(), self.to_bin_string())
    }
}

impl fmt::LowerHex for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        write!(f, "{}", self.to_hex_string())
    }
}

impl Serialize for BitVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_bin_string())
    }
}

impl<'de> Deserialize<'de> for BitVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        BitVector::literal(&text).map_err(serde::de::Error::custom)
    }
}
