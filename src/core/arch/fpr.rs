//! RISC-V Floating-Point Register File.
//!
//! 32 single-precision registers (`f0`-`f31`) holding raw binary32
//! encodings. Unlike `x0`, `f0` is an ordinary writable register.

use crate::common::bits::BitVector;
use crate::common::reg::{RegisterAddress, NUM_REGS};

/// Width of a floating-point register (binary32 only).
pub const FLEN: usize = 32;

/// Floating-Point Register file.
#[derive(Clone, Debug)]
pub struct Fpr {
    fregs: Vec<BitVector>,
}

impl Default for Fpr {
    fn default() -> Self {
        Self::new()
    }
}

impl Fpr {
    /// Creates a new floating-point register file with every register at `+0.0`.
    pub fn new() -> Self {
        Self {
            fregs: vec![BitVector::zeros(FLEN); NUM_REGS],
        }
    }

    /// Reads a floating-point register.
    ///
    /// # Arguments
    ///
    /// * `addr` - Register address (f0-f31)
    ///
    /// # Returns
    ///
    /// The raw 32-bit binary32 word stored in the register.
    pub fn read(&self, addr: RegisterAddress) -> BitVector {
        self.fregs[addr.index()].clone()
    }

    /// Writes a floating-point register.
    ///
    /// # Arguments
    ///
    /// * `addr` - Register address (f0-f31)
    /// * `value` - The word to store; narrower values are zero-extended to 32 bits
    ///
    /// # Note
    ///
    /// Unlike x0, f0 is an ordinary register and accepts writes.
    pub fn write(&mut self, addr: RegisterAddress, value: &BitVector) {
        self.fregs[addr.index()] = value.zero_extend(FLEN);
    }

    /// Dumps every register as raw bits and decoded value.
    pub fn dump(&self) {
        for (i, reg) in self.fregs.iter().enumerate() {
            println!("f{:<2}={:#x} ({})", i, reg, reg.to_f32());
        }
    }
}
