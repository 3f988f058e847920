//! RISC-V General-Purpose Register File.
//!
//! This module implements the integer register bank, containing 32 registers
//! (x0-x31) of 32 bits each. It enforces the architectural invariant that
//! register x0 is always hardwired to zero.

use crate::common::bits::BitVector;
use crate::common::reg::{RegisterAddress, NUM_REGS};

/// Width of an integer register.
pub const XLEN: usize = 32;

/// General-Purpose Register file.
///
/// Register x0 is hardwired to zero and cannot be modified.
#[derive(Clone, Debug)]
pub struct Gpr {
    regs: Vec<BitVector>,
}

impl Default for Gpr {
    fn default() -> Self {
        Self::new()
    }
}

impl Gpr {
    /// Creates a new register bank with all registers initialized to zero.
    pub fn new() -> Self {
        Self {
            regs: vec![BitVector::zeros(XLEN); NUM_REGS],
        }
    }

    /// Reads a general-purpose register value.
    ///
    /// Register x0 always reads as zero regardless of storage.
    pub fn read(&self, addr: RegisterAddress) -> BitVector {
        if addr == RegisterAddress::ZERO {
            BitVector::zeros(XLEN)
        } else {
            self.regs[addr.index()].clone()
        }
    }

    /// Writes a value to a general-purpose register.
    ///
    /// # Arguments
    ///
    /// * `addr` - Destination register
    /// * `value` - The value to write, resized to 32 bits
    ///
    /// # Note
    ///
    /// Writes to register x0 are silently ignored as x0 is hardwired to zero.
    pub fn write(&mut self, addr: RegisterAddress, value: &BitVector) {
        if addr != RegisterAddress::ZERO {
            self.regs[addr.index()] = value.zero_extend(XLEN);
        }
    }

    /// Dumps the contents of all general-purpose registers to stdout.
    pub fn dump(&self) {
        for i in (0..NUM_REGS).step_by(2) {
            println!(
                "x{:<2}={:#x} x{:<2}={:#x}",
                i,
                self.regs[i],
                i + 1,
                self.regs[i + 1]
            );
        }
    }
}
