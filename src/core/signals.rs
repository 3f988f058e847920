//! Control signals and operation types.
//!
//! This module defines every wire the Control Unit drives:
//! 1. **Opcode families:** closed enums per functional unit, decoded from their
//!    fixed-width encodings or parsed from mnemonics.
//! 2. **Sequencing state:** top-level and per-unit sub-states.
//! 3. **`ControlSignals`:** a flat, `Copy` record of all of the above plus
//!    register addresses, write enables, rounding mode and the cycle stamp.
//!    Trace entries hold their own copy, so later mutation is never observed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::bits::BitVector;
use crate::common::error::SimError;
use crate::common::reg::RegisterAddress;

/// The functional units a Control Unit can sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionalUnit {
    Alu,
    Shifter,
    Mdu,
    Fpu,
}

impl FunctionalUnit {
    pub const ALL: [FunctionalUnit; 4] = [
        FunctionalUnit::Alu,
        FunctionalUnit::Shifter,
        FunctionalUnit::Mdu,
        FunctionalUnit::Fpu,
    ];

    /// Upper-case unit name as accepted by `FromStr`.
    pub fn name(&self) -> &'static str {
        match self {
            FunctionalUnit::Alu => "ALU",
            FunctionalUnit::Shifter => "SHIFTER",
            FunctionalUnit::Mdu => "MDU",
            FunctionalUnit::Fpu => "FPU",
        }
    }
}

impl fmt::Display for FunctionalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FunctionalUnit {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ALU" => Ok(FunctionalUnit::Alu),
            "SHIFTER" | "SHIFT" => Ok(FunctionalUnit::Shifter),
            "MDU" => Ok(FunctionalUnit::Mdu),
            "FPU" => Ok(FunctionalUnit::Fpu),
            _ => Err(SimError::UnknownUnit(s.to_string())),
        }
    }
}

fn unknown_opcode(unit: FunctionalUnit, opcode: &str) -> SimError {
    SimError::UnknownOpcode {
        unit: unit.name().to_string(),
        opcode: opcode.to_string(),
    }
}

/// ALU operations, 4-bit encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AluOp {
    /// Bitwise AND (`0000`).
    And,
    /// Bitwise OR (`0001`).
    Or,
    /// Two's-complement addition (`0010`).
    Add,
    /// Bitwise XOR (`0011`).
    Xor,
    /// Two's-complement subtraction (`0110`).
    Sub,
    /// Set less than, signed (`0111`).
    Slt,
    /// Bitwise NOR (`1100`).
    Nor,
    /// Bitwise NAND (`1101`).
    Nand,
}

impl AluOp {
    pub const ALL: [AluOp; 8] = [
        AluOp::And,
        AluOp::Or,
        AluOp::Add,
        AluOp::Xor,
        AluOp::Sub,
        AluOp::Slt,
        AluOp::Nor,
        AluOp::Nand,
    ];

    /// Decodes a 4-bit ALU control field.
    pub fn from_bits(bits: u8) -> Result<Self, SimError> {
        match bits {
            0b0000 => Ok(AluOp::And),
            0b0001 => Ok(AluOp::Or),
            0b0010 => Ok(AluOp::Add),
            0b0011 => Ok(AluOp::Xor),
            0b0110 => Ok(AluOp::Sub),
            0b0111 => Ok(AluOp::Slt),
            0b1100 => Ok(AluOp::Nor),
            0b1101 => Ok(AluOp::Nand),
            _ => Err(SimError::InvalidEncoding {
                family: "ALU",
                bits: bits as u32,
            }),
        }
    }

    /// Returns the 4-bit ALU control encoding.
    ///
    /// # Returns
    ///
    /// The value `from_bits` maps back to this operation.
    pub fn encoding(&self) -> u8 {
        match self {
            AluOp::And => 0b0000,
            AluOp::Or => 0b0001,
            AluOp::Add => 0b0010,
            AluOp::Xor => 0b0011,
            AluOp::Sub => 0b0110,
            AluOp::Slt => 0b0111,
            AluOp::Nor => 0b1100,
            AluOp::Nand => 0b1101,
        }
    }

    /// The 4-bit control field as wires.
    pub fn bits(&self) -> BitVector {
        BitVector::from_u64(self.encoding() as u64, 4)
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            AluOp::And => "AND",
            AluOp::Or => "OR",
            AluOp::Add => "ADD",
            AluOp::Xor => "XOR",
            AluOp::Sub => "SUB",
            AluOp::Slt => "SLT",
            AluOp::Nor => "NOR",
            AluOp::Nand => "NAND",
        }
    }
}

impl FromStr for AluOp {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        AluOp::ALL
            .into_iter()
            .find(|op| op.mnemonic() == upper)
            .ok_or_else(|| unknown_opcode(FunctionalUnit::Alu, s))
    }
}

/// Shifter operations, 3-bit encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftOp {
    /// Shift left logical (`001`).
    Sll,
    /// Shift right logical (`101`).
    Srl,
    /// Shift right arithmetic (`111`).
    Sra,
}

impl ShiftOp {
    pub const ALL: [ShiftOp; 3] = [ShiftOp::Sll, ShiftOp::Srl, ShiftOp::Sra];

    /// Decodes a 3-bit shifter control field.
    ///
    /// # Arguments
    ///
    /// * `bits` - `001` SLL, `101` SRL, `111` SRA
    ///
    /// # Returns
    ///
    /// `SimError::InvalidEncoding` for any other pattern.
    pub fn from_bits(bits: u8) -> Result<Self, SimError> {
        match bits {
            0b001 => Ok(ShiftOp::Sll),
            0b101 => Ok(ShiftOp::Srl),
            0b111 => Ok(ShiftOp::Sra),
            _ => Err(SimError::InvalidEncoding {
                family: "shifter",
                bits: bits as u32,
            }),
        }
    }

    /// 3-bit shifter control encoding.
    pub fn encoding(&self) -> u8 {
        match self {
            ShiftOp::Sll => 0b001,
            ShiftOp::Srl => 0b101,
            ShiftOp::Sra => 0b111,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            ShiftOp::Sll => "SLL",
            ShiftOp::Srl => "SRL",
            ShiftOp::Sra => "SRA",
        }
    }
}

impl FromStr for ShiftOp {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        ShiftOp::ALL
            .into_iter()
            .find(|op| op.mnemonic() == upper)
            .ok_or_else(|| unknown_opcode(FunctionalUnit::Shifter, s))
    }
}

/// RV32M multiply/divide operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MduOp {
    /// Low 32 bits of signed × signed.
    Mul,
    /// High 32 bits of signed × signed.
    Mulh,
    /// High 32 bits of signed × unsigned.
    Mulhsu,
    /// High 32 bits of unsigned × unsigned.
    Mulhu,
    /// Signed quotient.
    Div,
    /// Unsigned quotient.
    Divu,
    /// Signed remainder.
    Rem,
    /// Unsigned remainder.
    Remu,
}

impl MduOp {
    pub const ALL: [MduOp; 8] = [
        MduOp::Mul,
        MduOp::Mulh,
        MduOp::Mulhsu,
        MduOp::Mulhu,
        MduOp::Div,
        MduOp::Divu,
        MduOp::Rem,
        MduOp::Remu,
    ];

    /// True for MUL, MULH, MULHSU and MULHU.
    pub fn is_multiply(&self) -> bool {
        matches!(self, MduOp::Mul | MduOp::Mulh | MduOp::Mulhsu | MduOp::Mulhu)
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            MduOp::Mul => "MUL",
            MduOp::Mulh => "MULH",
            MduOp::Mulhsu => "MULHSU",
            MduOp::Mulhu => "MULHU",
            MduOp::Div => "DIV",
            MduOp::Divu => "DIVU",
            MduOp::Rem => "REM",
            MduOp::Remu => "REMU",
        }
    }
}

impl FromStr for MduOp {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        MduOp::ALL
            .into_iter()
            .find(|op| op.mnemonic() == upper)
            .ok_or_else(|| unknown_opcode(FunctionalUnit::Mdu, s))
    }
}

/// Single-precision FPU operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FpuOp {
    Fadd,
    Fsub,
    Fmul,
}

impl FpuOp {
    pub const ALL: [FpuOp; 3] = [FpuOp::Fadd, FpuOp::Fsub, FpuOp::Fmul];

    pub fn mnemonic(&self) -> &'static str {
        match self {
            FpuOp::Fadd => "FADD.S",
            FpuOp::Fsub => "FSUB.S",
            FpuOp::Fmul => "FMUL.S",
        }
    }
}

impl FromStr for FpuOp {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        let bare = upper.strip_suffix(".S").unwrap_or(&upper);
        match bare {
            "FADD" => Ok(FpuOp::Fadd),
            "FSUB" => Ok(FpuOp::Fsub),
            "FMUL" => Ok(FpuOp::Fmul),
            _ => Err(unknown_opcode(FunctionalUnit::Fpu, s)),
        }
    }
}

/// RISC-V rounding mode encoding (`frm`).
///
/// Only `Rne` is honoured by the FPU; the others are carried on the control
/// wires and reported, but results are rounded to nearest-even.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RoundingMode {
    /// Round to Nearest, ties to Even.
    #[default]
    Rne = 0b000,
    /// Round towards Zero.
    Rtz = 0b001,
    /// Round Down (towards -inf).
    Rdn = 0b010,
    /// Round Up (towards +inf).
    Rup = 0b011,
    /// Round to Nearest, ties to Max Magnitude.
    Rmm = 0b100,
}

impl RoundingMode {
    /// Decodes a 3-bit `frm` field.
    ///
    /// Reserved encodings and the dynamic sentinel (`0b111`) are rejected;
    /// this core has no `fcsr` to resolve them against.
    pub fn from_bits(bits: u8) -> Result<Self, SimError> {
        match bits {
            0b000 => Ok(Self::Rne),
            0b001 => Ok(Self::Rtz),
            0b010 => Ok(Self::Rdn),
            0b011 => Ok(Self::Rup),
            0b100 => Ok(Self::Rmm),
            _ => Err(SimError::InvalidEncoding {
                family: "rounding mode",
                bits: bits as u32,
            }),
        }
    }

    /// Whether the FPU implements this mode exactly.
    pub fn is_honoured(&self) -> bool {
        *self == RoundingMode::Rne
    }
}

impl FromStr for RoundingMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rne" => Ok(Self::Rne),
            "rtz" => Ok(Self::Rtz),
            "rdn" => Ok(Self::Rdn),
            "rup" => Ok(Self::Rup),
            "rmm" => Ok(Self::Rmm),
            _ => Err(SimError::UnknownRoundingMode(s.to_string())),
        }
    }
}

/// Top-level sequencing state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlState {
    #[default]
    Idle,
    Execute,
    Writeback,
}

/// MDU sub-state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MduState {
    #[default]
    Idle,
    MulShift,
    MulAdd,
    DivTestbit,
    DivSub,
    DivRestore,
    DivShift,
    Writeback,
}

impl MduState {
    /// Sub-state for multiply iteration `k`; shift and add alternate.
    pub fn multiply_phase(iteration: u32) -> Self {
        if iteration % 2 == 0 {
            MduState::MulShift
        } else {
            MduState::MulAdd
        }
    }

    /// Sub-state for divide iteration `k`; the four phases rotate.
    pub fn divide_phase(iteration: u32) -> Self {
        match iteration % 4 {
            0 => MduState::DivTestbit,
            1 => MduState::DivSub,
            2 => MduState::DivRestore,
            _ => MduState::DivShift,
        }
    }
}

/// FPU sub-state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FpuState {
    #[default]
    Idle,
    Align,
    Op,
    Normalize,
    Round,
    Writeback,
}

impl FpuState {
    /// Successor in the fixed ALIGN -> OP -> NORMALIZE -> ROUND -> WRITEBACK pipeline.
    pub fn next(&self) -> Self {
        match self {
            FpuState::Idle => FpuState::Align,
            FpuState::Align => FpuState::Op,
            FpuState::Op => FpuState::Normalize,
            FpuState::Normalize => FpuState::Round,
            FpuState::Round => FpuState::Writeback,
            FpuState::Writeback => FpuState::Idle,
        }
    }
}

/// Every control wire the Control Unit drives, as one flat value.
///
/// | Field           | Default | Valid values                                   |
/// |-----------------|---------|------------------------------------------------|
/// | `cycle`         | 0       | any                                            |
/// | `state`         | IDLE    | IDLE, EXECUTE, WRITEBACK                       |
/// | `unit`          | none    | ALU, SHIFTER, MDU, FPU                         |
/// | `alu_op`        | none    | `AluOp`                                        |
/// | `shifter_op`    | none    | `ShiftOp`                                      |
/// | `mdu_op`        | none    | `MduOp`                                        |
/// | `mdu_state`     | IDLE    | `MduState`                                     |
/// | `mdu_iteration` | 0       | 0..=32                                         |
/// | `fpu_op`        | none    | `FpuOp`                                        |
/// | `fpu_state`     | IDLE    | IDLE, ALIGN, OP, NORMALIZE, ROUND, WRITEBACK   |
/// | `rounding_mode` | rne     | `RoundingMode`                                 |
/// | `rs1/rs2/rd`    | 0       | 0..=31                                         |
/// | `reg_write`     | false   | integer write enable                           |
/// | `fp_reg_write`  | false   | floating-point write enable                    |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSignals {
    pub cycle: u64,
    pub state: ControlState,
    pub unit: Option<FunctionalUnit>,
    pub alu_op: Option<AluOp>,
    pub shifter_op: Option<ShiftOp>,
    pub mdu_op: Option<MduOp>,
    pub mdu_state: MduState,
    pub mdu_iteration: u32,
    pub fpu_op: Option<FpuOp>,
    pub fpu_state: FpuState,
    pub rounding_mode: RoundingMode,
    pub rs1: RegisterAddress,
    pub rs2: RegisterAddress,
    pub rd: RegisterAddress,
    pub reg_write: bool,
    pub fp_reg_write: bool,
}

impl ControlSignals {
    /// Signals in their reset state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores every wire to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Independent copy for a trace entry.
    pub fn snapshot(&self) -> Self {
        *self
    }

    /// Dictionary form: a JSON object keyed by field name.
    pub fn to_json(&self) -> Result<serde_json::Value, SimError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Inverse of `to_json`. Rejects unknown state names and out-of-range
    /// register addresses.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SimError> {
        Ok(Self::deserialize(value)?)
    }

    /// Whether any write enable is asserted.
    pub fn write_enabled(&self) -> bool {
        self.reg_write || self.fp_reg_write
    }
}

impl fmt::Display for ControlSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cyc={} state={:?}", self.cycle, self.state)?;
        match self.unit {
            Some(FunctionalUnit::Alu) => {
                if let Some(op) = self.alu_op {
                    write!(f, " alu={}", op.mnemonic())?;
                }
            }
            Some(FunctionalUnit::Shifter) => {
                if let Some(op) = self.shifter_op {
                    write!(f, " shift={}", op.mnemonic())?;
                }
            }
            Some(FunctionalUnit::Mdu) => {
                if let Some(op) = self.mdu_op {
                    write!(
                        f,
                        " mdu={} sub={:?} iter={}",
                        op.mnemonic(),
                        self.mdu_state,
                        self.mdu_iteration
                    )?;
                }
            }
            Some(FunctionalUnit::Fpu) => {
                if let Some(op) = self.fpu_op {
                    write!(
                        f,
                        " fpu={} sub={:?} rm={:?}",
                        op.mnemonic(),
                        self.fpu_state,
                        self.rounding_mode
                    )?;
                }
            }
            None => {}
        }
        write!(
            f,
            " rs1={} rs2={} rd={} we={}",
            self.rs1,
            self.rs2,
            self.rd,
            self.write_enabled() as u8
        )
    }
}
