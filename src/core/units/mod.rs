//! Functional units.
//!
//! Every unit is a stateless, combinational function from operand bit
//! vectors to a result record. Sequencing and latency live in the Control
//! Unit, not here.

/// Ripple-carry adder chain shared by every unit.
pub mod adder;

/// 32-bit integer ALU.
pub mod alu;

/// Single-precision floating-point unit.
pub mod fpu;

/// Multiply/divide unit.
pub mod mdu;

/// Barrel shifter.
pub mod shifter;

pub use alu::{Alu, AluFlags, AluResult};
pub use fpu::{Fpu, FpuFlags, FpuResult};
pub use mdu::{Mdu, MduFlags, MduResult};
pub use shifter::{Shifter, ShifterResult};
