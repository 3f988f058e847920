//! Unit tests for the Control Unit FSM.

use rv32_fu_sim::common::bits::BitVector;
use rv32_fu_sim::common::reg::{RegisterAddress, RegisterFile, RegisterPort};
use rv32_fu_sim::common::SimError;
use rv32_fu_sim::config::GeneralConfig;
use rv32_fu_sim::core::control::{
    ControlUnit, Instruction, Operands, UnitOutput, UnitState, FPU_LATENCY, MDU_LATENCY, SINGLE_STAGE_LATENCY,
};
use rv32_fu_sim::core::signals::*;

fn r(i: u32) -> RegisterAddress {
    RegisterAddress::new(i).unwrap()
}

fn ops(rs1: u32, rs2: u32, rd: u32) -> Operands {
    Operands::new(rs1, rs2, rd).unwrap()
}

fn cu_with(ints: &[(u32, u32)]) -> ControlUnit<RegisterFile> {
    let mut regs = RegisterFile::new();
    for &(i, v) in ints {
        regs.set_int(r(i), v);
    }
    ControlUnit::new(regs)
}

/// Ticks until writeback, returning the number of ticks taken.
fn run_to_completion<R: RegisterPort>(cu: &mut ControlUnit<R>) -> u64 {
    let mut n = 0;
    loop {
        n += 1;
        if cu.tick().unwrap() {
            return n;
        }
        assert!(n < 100, "operation never completed");
    }
}

/// Tests an ALU add end to end.
#[test]
fn test_alu_add_two_cycles() {
    let mut cu = cu_with(&[(1, 15), (2, 27)]);
    let res = cu.execute_instruction("ALU", "ADD", &ops(1, 2, 3), 10).unwrap();
    assert!(res.success);
    assert!(!res.timed_out);
    assert_eq!(res.cycles, SINGLE_STAGE_LATENCY);
    assert_eq!(res.result.as_ref().unwrap().to_u32(), 42);
    assert_eq!(cu.regs().int(r(3)), 42);
    assert!(res.alu_flags().is_some());
    assert!(cu.is_idle());
}

/// Tests that the destination is only written on the writeback tick.
#[test]
fn test_writeback_only_on_last_tick() {
    let mut cu = cu_with(&[(1, 6), (2, 7)]);
    cu.start_mdu_operation(MduOp::Mul, r(1), r(2), r(3)).unwrap();
    for _ in 0..MDU_LATENCY - 1 {
        assert!(!cu.tick().unwrap());
        assert_eq!(cu.regs().int(r(3)), 0);
    }
    assert!(cu.tick().unwrap());
    assert_eq!(cu.regs().int(r(3)), 42);
}

/// Tests the fixed latency of every unit regardless of operands.
#[test]
fn test_unit_latencies() {
    let mut cu = cu_with(&[(1, 0xFFFF_FFFF), (2, 0)]);
    cu.start_shifter_operation(ShiftOp::Sra, r(1), r(2), r(3)).unwrap();
    assert_eq!(run_to_completion(&mut cu), 2);

    for op in [MduOp::Mul, MduOp::Div, MduOp::Remu] {
        cu.start_mdu_operation(op, r(1), r(2), r(3)).unwrap();
        assert_eq!(run_to_completion(&mut cu), 33);
    }

    cu.start_fpu_operation(FpuOp::Fmul, r(1), r(2), r(3), RoundingMode::Rne).unwrap();
    assert_eq!(run_to_completion(&mut cu), FPU_LATENCY);
}

/// Tests that issuing while busy fails and leaves the running op intact.
#[test]
fn test_busy_rejects_issue() {
    let mut cu = cu_with(&[(1, 100), (2, 7)]);
    cu.start_mdu_operation(MduOp::Div, r(1), r(2), r(3)).unwrap();
    cu.tick().unwrap();
    let err = cu.start_alu_operation(AluOp::Add, r(1), r(2), r(4)).unwrap_err();
    assert!(matches!(err, SimError::Busy { .. }));
    run_to_completion(&mut cu);
    assert_eq!(cu.regs().int(r(3)), 14);
    assert_eq!(cu.regs().int(r(4)), 0);
}

/// Tests the MDU sub-state sequence seen in the trace.
#[test]
fn test_mdu_sub_states_in_trace() {
    let mut cu = cu_with(&[(1, 6), (2, 7)]);
    let res = cu.execute_instruction("MDU", "MUL", &ops(1, 2, 3), 100).unwrap();
    assert_eq!(res.cycles, 33);
    assert_eq!(res.trace.len() as u64, res.cycles + 1);

    let iterations: Vec<_> = res.trace[1..33].iter().map(|e| e.signals).collect();
    assert_eq!(iterations[0].mdu_state, MduState::MulShift);
    assert_eq!(iterations[1].mdu_state, MduState::MulAdd);
    assert_eq!(iterations[31].mdu_iteration, 31);
    assert!(iterations.iter().all(|s| s.state == ControlState::Execute));

    let last = res.trace.last().unwrap();
    assert_eq!(last.signals.state, ControlState::Writeback);
    assert_eq!(last.signals.mdu_state, MduState::Writeback);
    assert_eq!(cu.regs().int(r(3)), 42);
}

/// Tests the divide sub-state rotation.
#[test]
fn test_divide_sub_states() {
    let mut cu = cu_with(&[(1, 100), (2, 7)]);
    let res = cu.execute_instruction("MDU", "REM", &ops(1, 2, 3), 100).unwrap();
    let states: Vec<_> = res.trace[1..5].iter().map(|e| e.signals.mdu_state).collect();
    assert_eq!(
        states,
        vec![
            MduState::DivTestbit,
            MduState::DivSub,
            MduState::DivRestore,
            MduState::DivShift
        ]
    );
    assert_eq!(cu.regs().int(r(3)), 2);
}

/// Tests the FPU stage sequence and floating-point writeback.
#[test]
fn test_fpu_pipeline_stages() {
    let mut regs = RegisterFile::new();
    regs.set_fp(r(1), 1.5);
    regs.set_fp(r(2), 2.25);
    let mut cu = ControlUnit::new(regs);
    let res = cu
        .execute_instruction("FPU", "FADD.S", &ops(1, 2, 3), 100)
        .unwrap();
    assert_eq!(res.cycles, 5);
    let stages: Vec<_> = res.trace[1..].iter().map(|e| e.signals.fpu_state).collect();
    assert_eq!(
        stages,
        vec![
            FpuState::Align,
            FpuState::Op,
            FpuState::Normalize,
            FpuState::Round,
            FpuState::Writeback
        ]
    );
    assert!(res.trace[1].message.starts_with("ALIGN:"));
    assert_eq!(cu.regs().fp(r(3)), 3.75);
    assert!(!res.fpu_flags().unwrap().any());
    // Integer bank untouched.
    assert_eq!(cu.regs().int(r(3)), 0);
}

/// Tests that writes to x0 are discarded.
#[test]
fn test_x0_write_suppressed() {
    let mut cu = cu_with(&[(1, 5), (2, 9)]);
    let res = cu.execute_instruction("ALU", "ADD", &ops(1, 2, 0), 10).unwrap();
    assert!(res.success);
    assert_eq!(res.result.unwrap().to_u32(), 14);
    assert_eq!(cu.regs().int(r(0)), 0);
}

/// Tests that f0 is written like any other FP register.
#[test]
fn test_f0_is_writable() {
    let mut regs = RegisterFile::new();
    regs.set_fp(r(1), 2.0);
    regs.set_fp(r(2), 3.0);
    let mut cu = ControlUnit::new(regs);
    cu.execute_instruction("FPU", "FMUL", &ops(1, 2, 0), 10).unwrap();
    assert_eq!(cu.regs().fp(r(0)), 6.0);
}

/// Tests that a too-small budget times out without writing.
#[test]
fn test_timeout() {
    let mut cu = cu_with(&[(1, 6), (2, 7)]);
    let res = cu.execute_instruction("MDU", "MUL", &ops(1, 2, 3), 10).unwrap();
    assert!(!res.success);
    assert!(res.timed_out);
    assert_eq!(res.cycles, 10);
    assert_eq!(cu.regs().int(r(3)), 0);
    assert!(!cu.is_idle());

    // The operation is still in flight and can be finished.
    assert_eq!(run_to_completion(&mut cu), MDU_LATENCY - 10);
    assert_eq!(cu.regs().int(r(3)), 42);
}

/// Tests that a zero budget issues but never ticks.
#[test]
fn test_zero_budget() {
    let mut cu = cu_with(&[]);
    let res = cu.execute_instruction("ALU", "OR", &ops(1, 2, 3), 0).unwrap();
    assert!(res.timed_out);
    assert_eq!(res.cycles, 0);
    assert!(res.result.is_none());
    assert_eq!(res.trace.len(), 1);
}

/// Tests contract violations at the string boundary.
#[test]
fn test_decode_errors() {
    let mut cu = cu_with(&[]);
    assert!(matches!(
        cu.execute_instruction("GPU", "ADD", &ops(1, 2, 3), 10),
        Err(SimError::UnknownUnit(_))
    ));
    assert!(matches!(
        cu.execute_instruction("ALU", "MUL", &ops(1, 2, 3), 10),
        Err(SimError::UnknownOpcode { .. })
    ));
    let missing = Operands {
        rd: None,
        ..ops(1, 2, 3)
    };
    assert!(matches!(
        cu.execute_instruction("ALU", "ADD", &missing, 10),
        Err(SimError::MissingOperand("rd"))
    ));
    assert!(cu.is_idle());
    assert!(cu.trace().is_empty());
}

/// Tests that idle ticks are counted but do nothing.
#[test]
fn test_idle_tick() {
    let mut cu = cu_with(&[]);
    assert!(!cu.tick().unwrap());
    assert_eq!(cu.state(), UnitState::Idle);
    assert_eq!(cu.stats().idle_cycles, 1);
    assert_eq!(cu.stats().total_cycles, 1);
    assert_eq!(cu.stats().instruction_count, 0);
}

/// Tests that trace entries keep their own signal snapshots.
#[test]
fn test_trace_snapshots_are_independent() {
    let mut cu = cu_with(&[(1, 1), (2, 2)]);
    cu.start_alu_operation(AluOp::Sub, r(1), r(2), r(3)).unwrap();
    cu.tick().unwrap();
    let execute = cu.trace()[1].clone();
    cu.tick().unwrap();
    assert_eq!(cu.trace()[1], execute);
    assert_eq!(execute.signals.state, ControlState::Execute);
    assert_eq!(execute.signals.alu_op, Some(AluOp::Sub));
    assert!(execute.signals.reg_write);
    // Signals return to idle after writeback.
    assert_eq!(cu.signals().state, ControlState::Idle);
    assert_eq!(cu.signals().unit, None);
}

/// Tests that trace cycle stamps increase by one per tick.
#[test]
fn test_trace_cycles_monotonic() {
    let mut cu = cu_with(&[(1, 3), (2, 4)]);
    cu.execute_instruction("ALU", "XOR", &ops(1, 2, 3), 10).unwrap();
    cu.execute_instruction("SHIFTER", "SLL", &ops(1, 2, 4), 10).unwrap();
    let cycles: Vec<u64> = cu.trace().iter().map(|e| e.cycle).collect();
    assert_eq!(cycles, vec![0, 1, 2, 2, 3, 4]);
    assert_eq!(cu.regs().int(r(4)), 3 << 4);
}

/// Tests counters across a mixed sequence.
#[test]
fn test_performance_counters() {
    let mut regs = RegisterFile::new();
    regs.set_int(r(1), 6);
    regs.set_int(r(2), 7);
    regs.set_fp(r(1), 1.0);
    regs.set_fp(r(2), 2.0);
    let mut cu = ControlUnit::new(regs);
    cu.execute_instruction("ALU", "ADD", &ops(1, 2, 3), 100).unwrap();
    cu.execute_instruction("SHIFTER", "SRL", &ops(1, 2, 4), 100).unwrap();
    cu.execute_instruction("MDU", "MULHU", &ops(1, 2, 5), 100).unwrap();
    cu.execute_instruction("FPU", "FSUB", &ops(1, 2, 6), 100).unwrap();
    cu.tick().unwrap();

    let stats = cu.performance_stats();
    let c = &stats.counters;
    assert_eq!(c.total_cycles, 2 + 2 + 33 + 5 + 1);
    assert_eq!(c.instruction_count, 4);
    assert_eq!(c.alu_cycles, 2);
    assert_eq!(c.shifter_cycles, 2);
    assert_eq!(c.mdu_cycles, 33);
    assert_eq!(c.fpu_cycles, 5);
    assert_eq!(c.idle_cycles, 1);
    assert_eq!(c.alu_ops + c.shifter_ops + c.mdu_ops + c.fpu_ops, 4);
    assert!((stats.cpi - 43.0 / 4.0).abs() < 1e-9);
    assert!((stats.mdu_utilization - 33.0 / 43.0 * 100.0).abs() < 1e-9);
    assert_eq!(cu.regs().fp(r(6)), -1.0);
}

/// Tests that utilization is reported as a percentage of total cycles.
#[test]
fn test_utilization_is_percentage() {
    let mut cu = cu_with(&[(1, 6), (2, 7)]);
    cu.execute_instruction("MDU", "MUL", &ops(1, 2, 3), 100).unwrap();
    let stats = cu.performance_stats();
    assert_eq!(stats.mdu_utilization, 100.0);
    assert_eq!(stats.alu_utilization, 0.0);

    cu.execute_instruction("FPU", "FADD", &ops(1, 2, 4), 100).unwrap();
    cu.tick().unwrap();
    cu.tick().unwrap();
    let stats = cu.performance_stats();
    assert_eq!(stats.counters.total_cycles, 40);
    assert!((stats.mdu_utilization - 82.5).abs() < 1e-9);
    assert_eq!(stats.fpu_utilization, 12.5);
}

/// Register port that hands out 16-bit words.
struct NarrowPort;

impl RegisterPort for NarrowPort {
    fn read_int_reg(&self, _addr: RegisterAddress) -> BitVector {
        BitVector::zeros(16)
    }

    fn write_int_reg(&mut self, _addr: RegisterAddress, _value: &BitVector) {}

    fn read_fp_reg(&self, _addr: RegisterAddress) -> BitVector {
        BitVector::zeros(16)
    }

    fn write_fp_reg(&mut self, _addr: RegisterAddress, _value: &BitVector) {}
}

/// Tests that a rejected operand width leaves counters, trace and state untouched.
#[test]
fn test_failed_tick_does_not_advance_clock() {
    let mut cu = ControlUnit::new(NarrowPort);
    cu.start_alu_operation(AluOp::Add, r(1), r(2), r(3)).unwrap();
    let trace_len = cu.trace().len();
    let state = cu.state();

    assert!(matches!(cu.tick(), Err(SimError::Bits(_))));
    assert_eq!(cu.stats().total_cycles, 0);
    assert_eq!(cu.stats().alu_cycles, 0);
    assert_eq!(cu.trace().len(), trace_len);
    assert_eq!(cu.state(), state);
    assert_eq!(cu.signals().cycle, 0);
}

/// Tests reset semantics for trace and counters.
#[test]
fn test_reset_and_reset_stats() {
    let mut cu = cu_with(&[(1, 6), (2, 7)]);
    cu.execute_instruction("MDU", "MUL", &ops(1, 2, 3), 5).unwrap();
    assert!(!cu.is_idle());

    cu.reset();
    assert!(cu.is_idle());
    assert!(cu.trace().is_empty());
    assert_eq!(*cu.signals(), ControlSignals::default());
    assert_eq!(cu.stats().total_cycles, 5);
    assert_eq!(cu.regs().int(r(3)), 0);

    cu.reset_stats();
    assert_eq!(cu.stats().total_cycles, 0);
    assert_eq!(cu.performance_stats().cpi, 0.0);
}

/// Tests driving a borrowed register file.
#[test]
fn test_borrowed_register_file() {
    let mut regs = RegisterFile::new();
    regs.set_int(r(1), 0x8000_0000);
    regs.set_int(r(2), 4);
    {
        let mut cu = ControlUnit::new(&mut regs);
        let instr = Instruction::Shifter {
            op: ShiftOp::Sra,
            rs1: r(1),
            rs2: r(2),
            rd: r(3),
        };
        let res = cu.execute(instr, 10).unwrap();
        assert!(res.success);
        assert_eq!(res.instruction, "SRA x3, x1, x2");
    }
    assert_eq!(regs.int(r(3)), 0xF800_0000);
}

/// Tests that divide flags are reported, not raised.
#[test]
fn test_divide_by_zero_is_data() {
    let mut cu = cu_with(&[(1, 42)]);
    let res = cu.execute_instruction("MDU", "DIVU", &ops(1, 2, 3), 100).unwrap();
    assert!(res.success);
    assert!(res.mdu_flags().unwrap().div_by_zero);
    assert_eq!(cu.regs().int(r(3)), 0xFFFF_FFFF);
    match res.output {
        Some(UnitOutput::Mdu(_)) => {}
        other => panic!("unexpected output {:?}", other),
    }
}

/// Tests the default rounding mode taken from config.
#[test]
fn test_default_rounding_mode_from_config() {
    let config = GeneralConfig {
        log_ticks: true,
        max_cycles: 50,
        rounding_mode: RoundingMode::Rup,
    };
    let mut regs = RegisterFile::new();
    regs.set_fp(r(1), 1.0);
    regs.set_fp(r(2), 1.0);
    let mut cu = ControlUnit::with_config(regs, &config);
    let res = cu.execute_instruction("FPU", "FADD", &ops(1, 2, 3), 50).unwrap();
    assert_eq!(res.trace[1].signals.rounding_mode, RoundingMode::Rup);
    assert_eq!(cu.regs().fp(r(3)), 2.0);

    let explicit = ops(1, 2, 4).with_rounding_mode(RoundingMode::Rne);
    let res = cu.execute_instruction("FPU", "FADD", &explicit, 50).unwrap();
    assert_eq!(res.trace[1].signals.rounding_mode, RoundingMode::Rne);
}

/// Tests instruction decoding and latency metadata.
#[test]
fn test_instruction_parse() {
    let instr = Instruction::parse("fpu", "fmul.s", &ops(1, 2, 3), RoundingMode::Rne).unwrap();
    assert_eq!(instr.unit(), FunctionalUnit::Fpu);
    assert_eq!(instr.mnemonic(), "FMUL.S");
    assert_eq!(instr.latency(), FPU_LATENCY);
    assert_eq!(instr.to_string(), "FMUL.S f3, f1, f2, Rne");
}

/// Tests that an execution result serializes to JSON.
#[test]
fn test_execution_result_json() {
    let mut cu = cu_with(&[(1, 15), (2, 27)]);
    let res = cu.execute_instruction("ALU", "ADD", &ops(1, 2, 3), 10).unwrap();
    let value = serde_json::to_value(&res).unwrap();
    assert_eq!(value["unit"], "ALU");
    assert_eq!(value["cycles"], 2);
    assert_eq!(value["result"], "00000000000000000000000000101010");
    assert_eq!(value["trace"].as_array().unwrap().len(), 3);
}
