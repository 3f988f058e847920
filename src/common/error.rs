//! Error types.
//!
//! Two families live here. `BitsError` covers misuse of the `BitVector`
//! primitive (mismatched widths, malformed literals). `SimError` covers the
//! contract violations a caller can commit against the Control Unit: issuing
//! while busy, naming an unknown unit or opcode, or omitting an operand.
//!
//! Architectural outcomes such as divide-by-zero or floating-point
//! exceptions are *not* errors; they are reported through result flags.

use thiserror::Error;

/// Errors raised by bit-vector primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitsError {
    /// Bitwise operation applied to operands of different widths.
    #[error("bit-vector length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    /// A functional unit received an operand of the wrong width.
    #[error("expected a {expected}-bit operand, got {actual} bits")]
    WidthMismatch { expected: usize, actual: usize },

    /// A binary literal contained something other than `0`, `1` or `_`.
    #[error("invalid character {ch:?} in binary literal")]
    InvalidLiteral { ch: char },
}

/// Contract violations raised by the Control Unit and its decode boundary.
#[derive(Debug, Error)]
pub enum SimError {
    /// An operation was started while another one is still in flight.
    #[error("control unit busy in state {state}")]
    Busy { state: String },

    /// `execute_instruction` was given a unit name it does not know.
    #[error("unknown functional unit '{0}'")]
    UnknownUnit(String),

    /// An opcode name does not belong to the named unit.
    #[error("unknown opcode '{opcode}' for unit {unit}")]
    UnknownOpcode { unit: String, opcode: String },

    /// A rounding-mode name outside rne/rtz/rdn/rup/rmm.
    #[error("unknown rounding mode '{0}'")]
    UnknownRoundingMode(String),

    /// A required operand (rs1, rs2, rd) was not supplied.
    #[error("missing required operand '{0}'")]
    MissingOperand(&'static str),

    /// Register index outside x0..x31 / f0..f31.
    #[error("invalid register index {0}")]
    InvalidRegister(u32),

    /// A fixed-width opcode encoding that maps to no operation.
    #[error("invalid {family} encoding {bits:#b}")]
    InvalidEncoding { family: &'static str, bits: u32 },

    #[error(transparent)]
    Bits(#[from] BitsError),

    #[error("control signal conversion failed: {0}")]
    Signals(#[from] serde_json::Error),

    /// A config file parsed but holds a value outside its allowed range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
