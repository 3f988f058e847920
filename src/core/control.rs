//! Control Unit.
//!
//! A finite-state machine that issues one operation at a time to a
//! functional unit and advances it one clock edge per `tick()`:
//!
//! * **ALU / Shifter**: EXECUTE -> WRITEBACK (2 cycles).
//! * **MDU**: 32 iteration cycles (MUL_SHIFT/MUL_ADD or the four divide
//!   phases) -> WRITEBACK (33 cycles).
//! * **FPU**: ALIGN -> OP -> NORMALIZE -> ROUND -> WRITEBACK (5 cycles).
//!
//! Source registers are read when the first cycle executes, and the unit's
//! result is computed once at that point; the remaining cycles replay the
//! unit's sequencing so latency is operand-independent. The destination is
//! written only on the final WRITEBACK cycle, so an abandoned operation never
//! commits partial state.
//!
//! Every tick appends one `TraceEntry` carrying its own copy of the control
//! signals and bumps the performance counters.

use serde::{Deserialize, Serialize};

use super::signals::{
    AluOp, ControlSignals, ControlState, FpuOp, FpuState, FunctionalUnit, MduOp, MduState, RoundingMode, ShiftOp,
};
use super::units::alu::{Alu, AluFlags, AluResult};
use super::units::fpu::{Fpu, FpuFlags, FpuResult};
use super::units::mdu::{Mdu, MduFlags, MduResult, MDU_ITERATIONS};
use super::units::shifter::{Shifter, ShifterResult};
use crate::common::bits::BitVector;
use crate::common::error::SimError;
use crate::common::reg::{RegisterAddress, RegisterPort};
use crate::config::GeneralConfig;
use crate::stats::{PerformanceCounters, PerformanceStats};

/// Cycles taken by an ALU or Shifter operation.
pub const SINGLE_STAGE_LATENCY: u64 = 2;
/// Cycles taken by any MDU operation.
pub const MDU_LATENCY: u64 = MDU_ITERATIONS as u64 + 1;
/// Cycles taken by any FPU operation.
pub const FPU_LATENCY: u64 = 5;

/// Phase of a single-stage unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Execute,
    Writeback,
}

/// Phase of an MDU operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MduPhase {
    /// Iteration `k` of 32.
    Iterate(u32),
    Writeback,
}

/// Sequencing state. The active unit and its sub-state travel together, so
/// e.g. an FPU sub-state while the ALU is active cannot be expressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnitState {
    #[default]
    Idle,
    Alu(AluOp, Stage),
    Shifter(ShiftOp, Stage),
    Mdu(MduOp, MduPhase),
    Fpu(FpuOp, FpuState),
}

impl UnitState {
    /// Unit currently occupied, or `None` when idle.
    pub fn unit(&self) -> Option<FunctionalUnit> {
        match self {
            UnitState::Idle => None,
            UnitState::Alu(..) => Some(FunctionalUnit::Alu),
            UnitState::Shifter(..) => Some(FunctionalUnit::Shifter),
            UnitState::Mdu(..) => Some(FunctionalUnit::Mdu),
            UnitState::Fpu(..) => Some(FunctionalUnit::Fpu),
        }
    }
}

/// One line of the execution trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub cycle: u64,
    pub message: String,
    pub signals: ControlSignals,
}

impl std::fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:>6}] {:<48} | {}", self.cycle, self.message, self.signals)
    }
}

/// Result latched by the unit on its first cycle, held until writeback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitOutput {
    Alu(AluResult),
    Shifter(ShifterResult),
    Mdu(MduResult),
    Fpu(FpuResult),
}

impl UnitOutput {
    /// The 32-bit word destined for `rd`.
    pub fn result(&self) -> &BitVector {
        match self {
            UnitOutput::Alu(r) => &r.result,
            UnitOutput::Shifter(r) => &r.result,
            UnitOutput::Mdu(r) => r.result(),
            UnitOutput::Fpu(r) => &r.result,
        }
    }
}

/// Register operands as supplied by a caller, before validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operands {
    pub rs1: Option<RegisterAddress>,
    pub rs2: Option<RegisterAddress>,
    pub rd: Option<RegisterAddress>,
    #[serde(default, rename = "rm")]
    pub rounding_mode: Option<RoundingMode>,
}

impl Operands {
    /// Three register operands from host indices.
    pub fn new(rs1: u32, rs2: u32, rd: u32) -> Result<Self, SimError> {
        Ok(Self {
            rs1: Some(RegisterAddress::new(rs1)?),
            rs2: Some(RegisterAddress::new(rs2)?),
            rd: Some(RegisterAddress::new(rd)?),
            rounding_mode: None,
        })
    }

    pub fn with_rounding_mode(mut self, rm: RoundingMode) -> Self {
        self.rounding_mode = Some(rm);
        self
    }

    fn require(&self) -> Result<(RegisterAddress, RegisterAddress, RegisterAddress), SimError> {
        Ok((
            self.rs1.ok_or(SimError::MissingOperand("rs1"))?,
            self.rs2.ok_or(SimError::MissingOperand("rs2"))?,
            self.rd.ok_or(SimError::MissingOperand("rd"))?,
        ))
    }
}

/// A fully decoded operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    Alu {
        op: AluOp,
        rs1: RegisterAddress,
        rs2: RegisterAddress,
        rd: RegisterAddress,
    },
    Shifter {
        op: ShiftOp,
        rs1: RegisterAddress,
        rs2: RegisterAddress,
        rd: RegisterAddress,
    },
    Mdu {
        op: MduOp,
        rs1: RegisterAddress,
        rs2: RegisterAddress,
        rd: RegisterAddress,
    },
    Fpu {
        op: FpuOp,
        rs1: RegisterAddress,
        rs2: RegisterAddress,
        rd: RegisterAddress,
        rm: RoundingMode,
    },
}

impl Instruction {
    /// Decodes a unit name, opcode mnemonic and operand set.
    ///
    /// FPU operations without an explicit rounding mode use `default_rm`.
    pub fn parse(
        unit: &str,
        opcode: &str,
        operands: &Operands,
        default_rm: RoundingMode,
    ) -> Result<Self, SimError> {
        let unit: FunctionalUnit = unit.parse()?;
        let (rs1, rs2, rd) = operands.require()?;
        Ok(match unit {
            FunctionalUnit::Alu => Instruction::Alu {
                op: opcode.parse()?,
                rs1,
                rs2,
                rd,
            },
            FunctionalUnit::Shifter => Instruction::Shifter {
                op: opcode.parse()?,
                rs1,
                rs2,
                rd,
            },
            FunctionalUnit::Mdu => Instruction::Mdu {
                op: opcode.parse()?,
                rs1,
                rs2,
                rd,
            },
            FunctionalUnit::Fpu => Instruction::Fpu {
                op: opcode.parse()?,
                rs1,
                rs2,
                rd,
                rm: operands.rounding_mode.unwrap_or(default_rm),
            },
        })
    }

    /// Functional unit that executes this instruction.
    pub fn unit(&self) -> FunctionalUnit {
        match self {
            Instruction::Alu { .. } => FunctionalUnit::Alu,
            Instruction::Shifter { .. } => FunctionalUnit::Shifter,
            Instruction::Mdu { .. } => FunctionalUnit::Mdu,
            Instruction::Fpu { .. } => FunctionalUnit::Fpu,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Alu { op, .. } => op.mnemonic(),
            Instruction::Shifter { op, .. } => op.mnemonic(),
            Instruction::Mdu { op, .. } => op.mnemonic(),
            Instruction::Fpu { op, .. } => op.mnemonic(),
        }
    }

    /// Number of cycles this operation takes from issue to writeback.
    pub fn latency(&self) -> u64 {
        match self {
            Instruction::Alu { .. } | Instruction::Shifter { .. } => SINGLE_STAGE_LATENCY,
            Instruction::Mdu { .. } => MDU_LATENCY,
            Instruction::Fpu { .. } => FPU_LATENCY,
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Alu { rs1, rs2, rd, .. }
            | Instruction::Shifter { rs1, rs2, rd, .. }
            | Instruction::Mdu { rs1, rs2, rd, .. } => {
                write!(f, "{} x{}, x{}, x{}", self.mnemonic(), rd, rs1, rs2)
            }
            Instruction::Fpu { rs1, rs2, rd, rm, .. } => {
                write!(f, "{} f{}, f{}, f{}, {:?}", self.mnemonic(), rd, rs1, rs2, rm)
            }
        }
    }
}

/// Outcome of `execute_instruction`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub instruction: String,
    pub unit: FunctionalUnit,
    /// Value produced by the unit; `None` if the budget ran out before the
    /// first execute cycle.
    pub result: Option<BitVector>,
    pub cycles: u64,
    pub success: bool,
    pub timed_out: bool,
    pub trace: Vec<TraceEntry>,
    /// Unit-specific record: flags, quotient/remainder, stage values.
    pub output: Option<UnitOutput>,
}

impl ExecutionResult {
    /// N/Z/C/V flags, for ALU results only.
    pub fn alu_flags(&self) -> Option<AluFlags> {
        match &self.output {
            Some(UnitOutput::Alu(r)) => Some(r.flags),
            _ => None,
        }
    }

    pub fn mdu_flags(&self) -> Option<MduFlags> {
        match &self.output {
            Some(UnitOutput::Mdu(r)) => Some(r.flags()),
            _ => None,
        }
    }

    pub fn fpu_flags(&self) -> Option<FpuFlags> {
        match &self.output {
            Some(UnitOutput::Fpu(r)) => Some(r.flags),
            _ => None,
        }
    }
}

/// The Control Unit.
///
/// Owns its control signals, trace and counters. The register file is any
/// `RegisterPort`: pass a `RegisterFile` to let the unit own it, or
/// `&mut RegisterFile` to lend one for the unit's lifetime.
pub struct ControlUnit<R: RegisterPort> {
    regs: R,
    state: UnitState,
    signals: ControlSignals,
    latch: Option<UnitOutput>,
    trace: Vec<TraceEntry>,
    stats: PerformanceCounters,
    log_ticks: bool,
    default_rm: RoundingMode,
}

impl<R: RegisterPort> ControlUnit<R> {
    /// Creates an idle Control Unit attached to a register file.
    ///
    /// # Arguments
    ///
    /// * `regs` - The register file, owned or borrowed through `&mut`
    ///
    /// # Returns
    ///
    /// A Control Unit in IDLE with zeroed counters, an empty trace and RNE as
    /// the default rounding mode.
    pub fn new(regs: R) -> Self {
        Self {
            regs,
            state: UnitState::Idle,
            signals: ControlSignals::new(),
            latch: None,
            trace: Vec::new(),
            stats: PerformanceCounters::default(),
            log_ticks: false,
            default_rm: RoundingMode::Rne,
        }
    }

    /// Builds a Control Unit honouring the `[general]` config section.
    pub fn with_config(regs: R, config: &GeneralConfig) -> Self {
        let mut cu = Self::new(regs);
        cu.log_ticks = config.log_ticks;
        cu.default_rm = config.rounding_mode;
        cu
    }

    pub fn regs(&self) -> &R {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    pub fn into_regs(self) -> R {
        self.regs
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Current control wires.
    pub fn signals(&self) -> &ControlSignals {
        &self.signals
    }

    /// True when no operation is in flight.
    pub fn is_idle(&self) -> bool {
        self.state == UnitState::Idle
    }

    /// Full trace since construction or the last `reset()`.
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Raw counters.
    pub fn stats(&self) -> &PerformanceCounters {
        &self.stats
    }

    /// Counters plus derived CPI and per-unit utilization.
    pub fn performance_stats(&self) -> PerformanceStats {
        self.stats.summary()
    }

    /// Clears FSM state, signals, latch and trace. Counters survive; use
    /// `reset_stats` for those.
    pub fn reset(&mut self) {
        self.state = UnitState::Idle;
        self.signals.reset();
        self.latch = None;
        self.trace.clear();
    }

    /// Zeroes all performance counters.
    pub fn reset_stats(&mut self) {
        self.stats = PerformanceCounters::default();
    }

    fn ensure_idle(&self) -> Result<(), SimError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(SimError::Busy {
                state: format!("{:?}", self.state),
            })
        }
    }

    fn record(&mut self, message: String) {
        if self.log_ticks {
            log::debug!("[{}] {}", self.signals.cycle, message);
        }
        self.trace.push(TraceEntry {
            cycle: self.signals.cycle,
            message,
            signals: self.signals.snapshot(),
        });
    }

    fn begin(&mut self, unit: FunctionalUnit, rs1: RegisterAddress, rs2: RegisterAddress, rd: RegisterAddress) {
        self.signals.reset();
        self.signals.cycle = self.stats.total_cycles;
        self.signals.state = ControlState::Execute;
        self.signals.unit = Some(unit);
        self.signals.rs1 = rs1;
        self.signals.rs2 = rs2;
        self.signals.rd = rd;
        self.latch = None;
    }

    /// Issues an ALU operation. Fails with `SimError::Busy` if not idle.
    pub fn start_alu_operation(
        &mut self,
        op: AluOp,
        rs1: RegisterAddress,
        rs2: RegisterAddress,
        rd: RegisterAddress,
    ) -> Result<(), SimError> {
        self.ensure_idle()?;
        self.begin(FunctionalUnit::Alu, rs1, rs2, rd);
        self.signals.alu_op = Some(op);
        self.state = UnitState::Alu(op, Stage::Execute);
        log::debug!("issue {} x{}, x{}, x{}", op.mnemonic(), rd, rs1, rs2);
        self.record(format!("ISSUE ALU {}", op.mnemonic()));
        Ok(())
    }

    /// Issues a shift of `rs1` by the low five bits of `rs2`.
    pub fn start_shifter_operation(
        &mut self,
        op: ShiftOp,
        rs1: RegisterAddress,
        rs2: RegisterAddress,
        rd: RegisterAddress,
    ) -> Result<(), SimError> {
        self.ensure_idle()?;
        self.begin(FunctionalUnit::Shifter, rs1, rs2, rd);
        self.signals.shifter_op = Some(op);
        self.state = UnitState::Shifter(op, Stage::Execute);
        log::debug!("issue {} x{}, x{}, x{}", op.mnemonic(), rd, rs1, rs2);
        self.record(format!("ISSUE SHIFTER {}", op.mnemonic()));
        Ok(())
    }

    /// Issues a multiply or divide.
    ///
    /// # Arguments
    ///
    /// * `op` - The MDU operation
    /// * `rs1` - Multiplicand or dividend register
    /// * `rs2` - Multiplier or divisor register
    /// * `rd` - Destination register
    ///
    /// # Returns
    ///
    /// `SimError::Busy` if another operation is in flight. The result is written
    /// back on the 33rd tick.
    pub fn start_mdu_operation(
        &mut self,
        op: MduOp,
        rs1: RegisterAddress,
        rs2: RegisterAddress,
        rd: RegisterAddress,
    ) -> Result<(), SimError> {
        self.ensure_idle()?;
        self.begin(FunctionalUnit::Mdu, rs1, rs2, rd);
        self.signals.mdu_op = Some(op);
        self.state = UnitState::Mdu(op, MduPhase::Iterate(0));
        log::debug!("issue {} x{}, x{}, x{}", op.mnemonic(), rd, rs1, rs2);
        self.record(format!("ISSUE MDU {}", op.mnemonic()));
        Ok(())
    }

    /// Issues a binary32 FPU operation reading and writing the FP register bank.
    ///
    /// # Arguments
    ///
    /// * `op` - FADD, FSUB or FMUL
    /// * `rs1` - First source register
    /// * `rs2` - Second source register
    /// * `rd` - Destination register
    /// * `rm` - Rounding mode; only RNE is honoured, others round as RNE
    ///
    /// # Returns
    ///
    /// `SimError::Busy` if another operation is in flight.
    pub fn start_fpu_operation(
        &mut self,
        op: FpuOp,
        rs1: RegisterAddress,
        rs2: RegisterAddress,
        rd: RegisterAddress,
        rm: RoundingMode,
    ) -> Result<(), SimError> {
        self.ensure_idle()?;
        self.begin(FunctionalUnit::Fpu, rs1, rs2, rd);
        self.signals.fpu_op = Some(op);
        self.signals.rounding_mode = rm;
        self.state = UnitState::Fpu(op, FpuState::Align);
        log::debug!("issue {} f{}, f{}, f{} rm={:?}", op.mnemonic(), rd, rs1, rs2, rm);
        self.record(format!("ISSUE FPU {}", op.mnemonic()));
        Ok(())
    }

    /// Issues a decoded instruction through the matching `start_*` method.
    pub fn issue(&mut self, instr: Instruction) -> Result<(), SimError> {
        match instr {
            Instruction::Alu { op, rs1, rs2, rd } => self.start_alu_operation(op, rs1, rs2, rd),
            Instruction::Shifter { op, rs1, rs2, rd } => self.start_shifter_operation(op, rs1, rs2, rd),
            Instruction::Mdu { op, rs1, rs2, rd } => self.start_mdu_operation(op, rs1, rs2, rd),
            Instruction::Fpu { op, rs1, rs2, rd, rm } => self.start_fpu_operation(op, rs1, rs2, rd, rm),
        }
    }

    fn read_int_sources(&self) -> (BitVector, BitVector) {
        (
            self.regs.read_int_reg(self.signals.rs1),
            self.regs.read_int_reg(self.signals.rs2),
        )
    }

    fn read_fp_sources(&self) -> (BitVector, BitVector) {
        (
            self.regs.read_fp_reg(self.signals.rs1),
            self.regs.read_fp_reg(self.signals.rs2),
        )
    }

    /// Commits the latched result and returns to IDLE.
    fn writeback(&mut self) -> String {
        self.signals.state = ControlState::Writeback;
        let rd = self.signals.rd;
        let message = match self.latch.take() {
            Some(output) if self.signals.fp_reg_write => {
                self.regs.write_fp_reg(rd, output.result());
                format!("WRITEBACK f{} <= {:#x}", rd, output.result())
            }
            Some(output) if self.signals.reg_write => {
                self.regs.write_int_reg(rd, output.result());
                format!("WRITEBACK x{} <= {:#x}", rd, output.result())
            }
            _ => "WRITEBACK (write disabled)".to_string(),
        };
        log::debug!("{}", message);
        message
    }

    /// Advances one clock edge.
    ///
    /// Returns `Ok(true)` on the cycle an operation completes its writeback,
    /// `Ok(false)` otherwise (including idle cycles).
    ///
    /// If the unit rejects its operands the error is returned and the clock
    /// edge does not happen: counters, trace and state are left as they were.
    pub fn tick(&mut self) -> Result<bool, SimError> {
        let active = self.state.unit();

        let (message, next, done) = match self.state {
            UnitState::Idle => ("IDLE".to_string(), UnitState::Idle, false),

            UnitState::Alu(op, Stage::Execute) => {
                let (a, b) = self.read_int_sources();
                let out = Alu::execute(op, &a, &b)?;
                self.signals.reg_write = true;
                let message = format!("EXECUTE {} -> {:#x} {}", op.mnemonic(), out.result, out.flags);
                self.latch = Some(UnitOutput::Alu(out));
                (message, UnitState::Alu(op, Stage::Writeback), false)
            }
            UnitState::Alu(_, Stage::Writeback) => (self.writeback(), UnitState::Idle, true),

            UnitState::Shifter(op, Stage::Execute) => {
                let (a, b) = self.read_int_sources();
                let out = Shifter::execute(op, &a, &b)?;
                self.signals.reg_write = true;
                let message = format!("EXECUTE {} -> {:#x}", op.mnemonic(), out.result);
                self.latch = Some(UnitOutput::Shifter(out));
                (message, UnitState::Shifter(op, Stage::Writeback), false)
            }
            UnitState::Shifter(_, Stage::Writeback) => (self.writeback(), UnitState::Idle, true),

            UnitState::Mdu(op, MduPhase::Iterate(k)) => {
                if k == 0 {
                    let (a, b) = self.read_int_sources();
                    self.latch = Some(UnitOutput::Mdu(Mdu::execute(op, &a, &b)?));
                    self.signals.reg_write = true;
                }
                let sub_state = if op.is_multiply() {
                    MduState::multiply_phase(k)
                } else {
                    MduState::divide_phase(k)
                };
                self.signals.mdu_state = sub_state;
                self.signals.mdu_iteration = k;
                let detail = match &self.latch {
                    Some(UnitOutput::Mdu(r)) => r
                        .trace()
                        .iter()
                        .filter(|line| line.starts_with("iter"))
                        .nth(k as usize)
                        .cloned(),
                    _ => None,
                };
                let message = match detail {
                    Some(line) => format!("{:?} {}", sub_state, line),
                    None => format!("{:?} iter {:>2}", sub_state, k),
                };
                let next = if k + 1 == MDU_ITERATIONS {
                    MduPhase::Writeback
                } else {
                    MduPhase::Iterate(k + 1)
                };
                (message, UnitState::Mdu(op, next), false)
            }
            UnitState::Mdu(_, MduPhase::Writeback) => {
                self.signals.mdu_state = MduState::Writeback;
                self.signals.mdu_iteration = MDU_ITERATIONS;
                (self.writeback(), UnitState::Idle, true)
            }

            UnitState::Fpu(op, stage) => {
                if stage == FpuState::Align {
                    let (a, b) = self.read_fp_sources();
                    let out = Fpu::execute(op, &a, &b, self.signals.rounding_mode)?;
                    self.latch = Some(UnitOutput::Fpu(out));
                    self.signals.fp_reg_write = true;
                }
                self.signals.fpu_state = stage;
                if stage == FpuState::Writeback {
                    (self.writeback(), UnitState::Idle, true)
                } else {
                    let prefix = format!("{:?}:", stage).to_ascii_uppercase();
                    let detail = match &self.latch {
                        Some(UnitOutput::Fpu(r)) => r
                            .trace
                            .iter()
                            .filter(|line| line.starts_with(&prefix))
                            .map(|line| line[prefix.len()..].trim())
                            .collect::<Vec<_>>()
                            .join("; "),
                        _ => String::new(),
                    };
                    let message = format!("{} {} {}", prefix, op.mnemonic(), detail);
                    (message, UnitState::Fpu(op, stage.next()), false)
                }
            }
        };

        self.stats.record_cycle(active);
        self.signals.cycle = self.stats.total_cycles;
        self.record(message);
        self.state = next;
        if done {
            if let Some(unit) = self.signals.unit {
                self.stats.record_completion(unit);
            }
            self.signals.reset();
            self.signals.cycle = self.stats.total_cycles;
        }
        Ok(done)
    }

    /// Issues `instr` and ticks until writeback or until `max_cycles` ticks
    /// have elapsed.
    ///
    /// Running out of budget is reported as `success: false, timed_out:
    /// true`; the operation stays in flight and can be finished with further
    /// `tick()` calls or dropped with `reset()`.
    pub fn execute(&mut self, instr: Instruction, max_cycles: u64) -> Result<ExecutionResult, SimError> {
        let trace_start = self.trace.len();
        self.issue(instr)?;

        let mut cycles = 0;
        let mut success = false;
        let mut output = None;
        while cycles < max_cycles {
            // Keep a copy: writeback consumes the latch.
            if let Some(latched) = &self.latch {
                output = Some(latched.clone());
            }
            cycles += 1;
            if self.tick()? {
                success = true;
                break;
            }
        }
        if output.is_none() {
            output = self.latch.clone();
        }

        Ok(ExecutionResult {
            instruction: instr.to_string(),
            unit: instr.unit(),
            result: output.as_ref().map(|o| o.result().clone()),
            cycles,
            success,
            timed_out: !success,
            trace: self.trace[trace_start..].to_vec(),
            output,
        })
    }

    /// String-keyed entry point: `execute_instruction("MDU", "MUL", &ops, 100)`.
    ///
    /// Unknown unit or opcode names and missing operands are contract
    /// violations and fail before anything is issued.
    pub fn execute_instruction(
        &mut self,
        unit: &str,
        opcode: &str,
        operands: &Operands,
        max_cycles: u64,
    ) -> Result<ExecutionResult, SimError> {
        let instr = Instruction::parse(unit, opcode, operands, self.default_rm)?;
        self.execute(instr, max_cycles)
    }
}
