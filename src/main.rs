//! RV32 Functional Unit Simulator CLI.
//!
//! Loads a TOML run description, presets the register file, issues each
//! program step to the Control Unit and reports the results.
//!
//! # Usage
//!
//! ```text
//! rv32-fu-sim --config configs/demo.toml [--trace] [--json] [--max-cycles N]
//! ```
//!
//! Set `RUST_LOG=debug` together with `log_ticks = true` for per-cycle logs.

use clap::Parser;
use std::process;

extern crate rv32_fu_sim;

use rv32_fu_sim::common::reg::RegisterFile;
use rv32_fu_sim::common::SimError;
use rv32_fu_sim::config::SimConfig;
use rv32_fu_sim::core::control::{ControlUnit, ExecutionResult};
use rv32_fu_sim::core::signals::FunctionalUnit;

/// Command-line arguments for the functional unit simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "RV32 Functional Unit Simulator")]
struct Args {
    #[arg(short, long)]
    config: String,

    /// Print the per-cycle trace of every step.
    #[arg(short, long)]
    trace: bool,

    /// Emit results and statistics as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Override `[general] max_cycles`.
    #[arg(long)]
    max_cycles: Option<u64>,
}

fn print_result(step: usize, res: &ExecutionResult, trace: bool) {
    let status = if res.success { "ok" } else { "TIMEOUT" };
    match &res.result {
        Some(value) => println!(
            "[{:>3}] {:<32} {:>3} cycles  {:<7} -> {:#x}",
            step, res.instruction, res.cycles, status, value
        ),
        None => println!("[{:>3}] {:<32} {:>3} cycles  {:<7}", step, res.instruction, res.cycles, status),
    }
    if let Some(flags) = res.alu_flags() {
        println!("      flags: {}", flags);
    }
    if let Some(flags) = res.mdu_flags() {
        if flags.overflow || flags.div_by_zero {
            println!("      flags: overflow={} div_by_zero={}", flags.overflow, flags.div_by_zero);
        }
    }
    if let Some(flags) = res.fpu_flags() {
        if flags.any() {
            println!("      flags: {}", flags);
        }
    }
    if trace {
        for entry in &res.trace {
            println!("      {}", entry);
        }
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    let config = SimConfig::load(&args.config)?;
    let max_cycles = args.max_cycles.unwrap_or(config.general.max_cycles);

    let mut regs = RegisterFile::new();
    config.apply_registers(&mut regs)?;
    let mut cu = ControlUnit::with_config(regs, &config.general);

    log::info!(
        "loaded {} program steps from {} (max_cycles={})",
        config.program.len(),
        args.config,
        max_cycles
    );

    let mut results = Vec::with_capacity(config.program.len());
    for (i, step) in config.program.iter().enumerate() {
        let res = cu.execute_instruction(&step.unit, &step.op, &step.operands(), max_cycles)?;
        if !res.success {
            log::warn!("step {} ({}) timed out after {} cycles", i, res.instruction, res.cycles);
            // Drop the in-flight operation so the next step can issue.
            cu.reset();
        }
        if !args.json {
            print_result(i, &res, args.trace);
        }
        results.push(res);
    }

    let stats = cu.performance_stats();
    if args.json {
        let report = serde_json::json!({
            "results": results,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\nRegister File");
    println!("-------------");
    let regs = cu.regs();
    for step in &config.program {
        if let Some(rd) = step.rd {
            if step.unit.parse::<FunctionalUnit>()? == FunctionalUnit::Fpu {
                println!("  f{:<2} = {:>12} ({:#010x})", rd, regs.fp(rd), regs.fp(rd).to_bits());
            } else {
                println!("  x{:<2} = {:>12} ({:#010x})", rd, regs.int(rd) as i32, regs.int(rd));
            }
        }
    }
    stats.print();
    Ok(())
}

/// Main entry point.
///
/// 1. **Configuration**: Parses arguments and loads the TOML run description.
/// 2. **Initialization**: Presets registers and builds the Control Unit.
/// 3. **Execution**: Runs each program step to writeback or timeout.
/// 4. **Report**: Prints written registers and performance statistics.
fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
