//! Simulation configuration.
//!
//! A run is described by one TOML file:
//!
//! ```toml
//! [general]
//! log_ticks = true
//! max_cycles = 1000
//! rounding_mode = "rne"
//!
//! [registers]
//! int = [[1, 6], [2, 7]]
//! fp = [[1, 1.5], [2, 2.25]]
//!
//! [[program]]
//! unit = "MDU"
//! op = "MUL"
//! rs1 = 1
//! rs2 = 2
//! rd = 3
//! ```
//!
//! Every section is optional.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::error::SimError;
use crate::common::reg::{RegisterAddress, RegisterFile};
use crate::core::control::Operands;
use crate::core::signals::RoundingMode;

const DEFAULT_MAX_CYCLES: u64 = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub registers: RegisterPresets,
    #[serde(default)]
    pub program: Vec<ProgramStep>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    /// Emit one `debug!` line per clock edge.
    #[serde(default)]
    pub log_ticks: bool,
    /// Per-instruction cycle budget.
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,
    /// Rounding mode for FPU steps that do not name one.
    #[serde(default)]
    pub rounding_mode: RoundingMode,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_ticks: false,
            max_cycles: default_max_cycles(),
            rounding_mode: RoundingMode::default(),
        }
    }
}

/// Initial register contents as `[index, value]` pairs.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterPresets {
    /// Integer values may be given signed (`-1`) or unsigned (`0xFFFF_FFFF`).
    #[serde(default)]
    pub int: Vec<(u32, i64)>,
    #[serde(default)]
    pub fp: Vec<(u32, f32)>,
}

/// One operation of the program.
#[derive(Debug, Deserialize)]
pub struct ProgramStep {
    pub unit: String,
    pub op: String,
    pub rs1: Option<RegisterAddress>,
    pub rs2: Option<RegisterAddress>,
    pub rd: Option<RegisterAddress>,
    pub rm: Option<RoundingMode>,
}

impl ProgramStep {
    /// Operand set for `ControlUnit::execute_instruction`.
    pub fn operands(&self) -> Operands {
        Operands {
            rs1: self.rs1,
            rs2: self.rs2,
            rd: self.rd,
            rounding_mode: self.rm,
        }
    }
}

impl SimConfig {
    /// Parses a run description from TOML text.
    ///
    /// # Arguments
    ///
    /// * `content` - The TOML document
    ///
    /// # Returns
    ///
    /// The parsed configuration, with missing sections at their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, SimError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a run description from a file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Writes the `[registers]` presets into `regs`.
    pub fn apply_registers(&self, regs: &mut RegisterFile) -> Result<(), SimError> {
        for &(index, value) in &self.registers.int {
            let addr = RegisterAddress::new(index)?;
            let word = if value < 0 {
                i32::try_from(value).map(|v| v as u32)
            } else {
                u32::try_from(value)
            }
            .map_err(|_| SimError::InvalidConfig(format!("x{} = {} does not fit in 32 bits", index, value)))?;
            regs.set_int(addr, word);
        }
        for &(index, value) in &self.registers.fp {
            regs.set_fp(RegisterAddress::new(index)?, value);
        }
        Ok(())
    }
}

fn default_max_cycles() -> u64 {
    DEFAULT_MAX_CYCLES
}
