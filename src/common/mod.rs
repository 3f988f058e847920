//! Common utilities and types used throughout the simulator.
//!
//! This module provides the bit-vector value type every datapath works on,
//! error handling, and register addressing shared across the functional
//! units and the Control Unit.

/// Fixed-width bit vectors.
pub mod bits;

/// Error types.
pub mod error;

/// Register addresses, the register port trait and the register file.
pub mod reg;

pub use bits::BitVector;
pub use error::{BitsError, SimError};
pub use reg::{RegisterAddress, RegisterFile, RegisterPort};
