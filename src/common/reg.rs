//! Register addressing and the register-file port.
//!
//! This module provides:
//! 1. **Addressing:** `RegisterAddress`, a validated 5-bit register index
//!    constructed once at the decode boundary.
//! 2. **Port abstraction:** `RegisterPort`, the read/write interface the
//!    Control Unit consumes.
//! 3. **Storage:** `RegisterFile`, combining the integer and floating-point
//!    banks.

use serde::{Deserialize, Serialize};

use super::bits::BitVector;
use super::error::{BitsError, SimError};
use crate::core::arch::fpr::Fpr;
use crate::core::arch::gpr::Gpr;

/// Number of architectural registers per bank.
pub const NUM_REGS: usize = 32;

/// Width of a register-address field.
pub const REG_ADDR_BITS: usize = 5;

/// A register index in `0..32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RegisterAddress(u8);

impl RegisterAddress {
    /// Register 0 (`x0` / `f0`).
    pub const ZERO: RegisterAddress = RegisterAddress(0);

    /// Validates a host index.
    pub fn new(index: u32) -> Result<Self, SimError> {
        if (index as usize) < NUM_REGS {
            Ok(Self(index as u8))
        } else {
            Err(SimError::InvalidRegister(index))
        }
    }

    /// Decodes a 5-bit register field.
    pub fn from_bits(field: &BitVector) -> Result<Self, SimError> {
        if field.width() != REG_ADDR_BITS {
            return Err(BitsError::WidthMismatch {
                expected: REG_ADDR_BITS,
                actual: field.width(),
            }
            .into());
        }
        Ok(Self(field.to_u64() as u8))
    }

    /// Encodes back into a 5-bit field.
    pub fn bits(&self) -> BitVector {
        BitVector::from_u64(self.0 as u64, REG_ADDR_BITS)
    }

    /// Register number as an array index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u32> for RegisterAddress {
    type Error = SimError;

    fn try_from(index: u32) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

impl From<RegisterAddress> for u32 {
    fn from(addr: RegisterAddress) -> u32 {
        addr.0 as u32
    }
}

impl std::fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The register-file interface consumed by the Control Unit.
///
/// Writes to integer register 0 must be ignored by the implementation; the
/// Control Unit never filters them itself.
pub trait RegisterPort {
    fn read_int_reg(&self, addr: RegisterAddress) -> BitVector;
    fn write_int_reg(&mut self, addr: RegisterAddress, value: &BitVector);
    fn read_fp_reg(&self, addr: RegisterAddress) -> BitVector;
    fn write_fp_reg(&mut self, addr: RegisterAddress, value: &BitVector);
}

impl<T: RegisterPort + ?Sized> RegisterPort for &mut T {
    fn read_int_reg(&self, addr: RegisterAddress) -> BitVector {
        (**self).read_int_reg(addr)
    }

    fn write_int_reg(&mut self, addr: RegisterAddress, value: &BitVector) {
        (**self).write_int_reg(addr, value)
    }

    fn read_fp_reg(&self, addr: RegisterAddress) -> BitVector {
        (**self).read_fp_reg(addr)
    }

    fn write_fp_reg(&mut self, addr: RegisterAddress, value: &BitVector) {
        (**self).write_fp_reg(addr, value)
    }
}

/// Unified register file with 32 integer and 32 single-precision registers.
#[derive(Clone, Debug, Default)]
pub struct RegisterFile {
    gpr: Gpr,
    fpr: Fpr,
}

impl RegisterFile {
    /// Creates a register file with every integer register at 0 and every FP
    /// register at `+0.0`.
    pub fn new() -> Self {
        Self {
            gpr: Gpr::new(),
            fpr: Fpr::new(),
        }
    }

    /// Presets an integer register from a host word (fixtures, config).
    pub fn set_int(&mut self, addr: RegisterAddress, value: u32) {
        self.gpr.write(addr, &BitVector::from_u32(value));
    }

    /// Reads an integer register as a host word (display, assertions).
    pub fn int(&self, addr: RegisterAddress) -> u32 {
        self.gpr.read(addr).to_u32()
    }

    /// Presets a floating-point register from a host float.
    pub fn set_fp(&mut self, addr: RegisterAddress, value: f32) {
        self.fpr.write(addr, &BitVector::from_f32(value));
    }

    /// Reads a floating-point register as a host float.
    pub fn fp(&self, addr: RegisterAddress) -> f32 {
        self.fpr.read(addr).to_f32()
    }

    /// Dumps both banks to stdout, two registers per line.
    pub fn dump(&self) {
        self.gpr.dump();
        self.fpr.dump();
    }
}

impl RegisterPort for RegisterFile {
    fn read_int_reg(&self, addr: RegisterAddress) -> BitVector {
        self.gpr.read(addr)
    }

    fn write_int_reg(&mut self, addr: RegisterAddress, value: &BitVector) {
        self.gpr.write(addr, value);
    }

    fn read_fp_reg(&self, addr: RegisterAddress) -> BitVector {
        self.fpr.read(addr)
    }

    fn write_fp_reg(&mut self, addr: RegisterAddress, value: &BitVector) {
        self.fpr.write(addr, value);
    }
}
