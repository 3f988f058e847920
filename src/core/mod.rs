//! Functional-unit core.
//!
//! Holds the architectural register banks, the four functional units, the
//! control wires that select their operations, and the Control Unit that
//! sequences them cycle by cycle.

/// Integer and floating-point register banks.
pub mod arch;

/// Control Unit FSM, trace entries and instruction decoding.
pub mod control;

/// Control signals, opcode families and sequencing states.
pub mod signals;

/// ALU, barrel shifter, multiply/divide unit and FPU.
pub mod units;

pub use control::{ControlUnit, ExecutionResult, Instruction, Operands, TraceEntry};
