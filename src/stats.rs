//! Simulation statistics collection and reporting.
//!
//! Tracks total and per-unit cycle counts, completed operations per unit,
//! and the derived CPI and utilization figures.

use serde::Serialize;

use crate::core::signals::FunctionalUnit;

/// Raw counters maintained by the Control Unit.
///
/// Every `tick()` adds one to `total_cycles` and one to exactly one of the
/// idle or per-unit cycle counters, so those always sum to `total_cycles`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PerformanceCounters {
    pub total_cycles: u64,
    pub instruction_count: u64,

    pub idle_cycles: u64,
    pub alu_cycles: u64,
    pub shifter_cycles: u64,
    pub mdu_cycles: u64,
    pub fpu_cycles: u64,

    pub alu_ops: u64,
    pub shifter_ops: u64,
    pub mdu_ops: u64,
    pub fpu_ops: u64,
}

/// Snapshot of the counters with derived metrics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceStats {
    #[serde(flatten)]
    pub counters: PerformanceCounters,
    pub cpi: f64,
    pub alu_utilization: f64,
    pub shifter_utilization: f64,
    pub mdu_utilization: f64,
    pub fpu_utilization: f64,
}

impl PerformanceCounters {
    /// Accounts one clock edge to `unit`, or to idle time.
    pub fn record_cycle(&mut self, unit: Option<FunctionalUnit>) {
        self.total_cycles += 1;
        match unit {
            None => self.idle_cycles += 1,
            Some(FunctionalUnit::Alu) => self.alu_cycles += 1,
            Some(FunctionalUnit::Shifter) => self.shifter_cycles += 1,
            Some(FunctionalUnit::Mdu) => self.mdu_cycles += 1,
            Some(FunctionalUnit::Fpu) => self.fpu_cycles += 1,
        }
    }

    /// Accounts one completed writeback.
    pub fn record_completion(&mut self, unit: FunctionalUnit) {
        self.instruction_count += 1;
        match unit {
            FunctionalUnit::Alu => self.alu_ops += 1,
            FunctionalUnit::Shifter => self.shifter_ops += 1,
            FunctionalUnit::Mdu => self.mdu_ops += 1,
            FunctionalUnit::Fpu => self.fpu_ops += 1,
        }
    }

    /// Returns the number of cycles accounted to a unit.
    ///
    /// # Arguments
    ///
    /// * `unit` - The functional unit to query.
    pub fn unit_cycles(&self, unit: FunctionalUnit) -> u64 {
        match unit {
            FunctionalUnit::Alu => self.alu_cycles,
            FunctionalUnit::Shifter => self.shifter_cycles,
            FunctionalUnit::Mdu => self.mdu_cycles,
            FunctionalUnit::Fpu => self.fpu_cycles,
        }
    }

    /// Returns the number of operations a unit has written back.
    ///
    /// # Arguments
    ///
    /// * `unit` - The functional unit to query.
    pub fn unit_ops(&self, unit: FunctionalUnit) -> u64 {
        match unit {
            FunctionalUnit::Alu => self.alu_ops,
            FunctionalUnit::Shifter => self.shifter_ops,
            FunctionalUnit::Mdu => self.mdu_ops,
            FunctionalUnit::Fpu => self.fpu_ops,
        }
    }

    /// Cycles per completed instruction; 0.0 before anything completes.
    pub fn cpi(&self) -> f64 {
        if self.instruction_count == 0 {
            0.0
        } else {
            self.total_cycles as f64 / self.instruction_count as f64
        }
    }

    /// Percentage (0..=100) of all cycles spent in `unit`; 0.0 before the
    /// first tick.
    pub fn utilization(&self, unit: FunctionalUnit) -> f64 {
        if self.total_cycles == 0 {
            0.0
        } else {
            self.unit_cycles(unit) as f64 / self.total_cycles as f64 * 100.0
        }
    }

    /// Builds a `PerformanceStats` snapshot with CPI and utilization filled in.
    pub fn summary(&self) -> PerformanceStats {
        PerformanceStats {
            counters: self.clone(),
            cpi: self.cpi(),
            alu_utilization: self.utilization(FunctionalUnit::Alu),
            shifter_utilization: self.utilization(FunctionalUnit::Shifter),
            mdu_utilization: self.utilization(FunctionalUnit::Mdu),
            fpu_utilization: self.utilization(FunctionalUnit::Fpu),
        }
    }
}

impl PerformanceStats {
    /// Prints a formatted summary of the counters.
    pub fn print(&self) {
        let c = &self.counters;
        let cyc = if c.total_cycles == 0 { 1 } else { c.total_cycles };
        let instr = if c.instruction_count == 0 {
            1
        } else {
            c.instruction_count
        };

        println!("\n==========================================================");
        println!("FUNCTIONAL UNIT SIMULATION STATISTICS");
        println!("==========================================================");
        println!("sim_cycles               {}", c.total_cycles);
        println!("sim_insts                {}", c.instruction_count);
        println!("sim_cpi                  {:.4}", self.cpi);
        println!("----------------------------------------------------------");
        println!("CYCLE BREAKDOWN");
        println!(
            "  cycles.idle            {} ({:.2}%)",
            c.idle_cycles,
            (c.idle_cycles as f64 / cyc as f64) * 100.0
        );
        for unit in FunctionalUnit::ALL {
            println!(
                "  cycles.{:<15} {} ({:.2}%)",
                unit.name().to_ascii_lowercase(),
                c.unit_cycles(unit),
                c.utilization(unit)
            );
        }
        println!("----------------------------------------------------------");
        println!("INSTRUCTION MIX");
        for unit in FunctionalUnit::ALL {
            let ops = c.unit_ops(unit);
            println!(
                "  op.{:<19} {} ({:.2}%)",
                unit.name().to_ascii_lowercase(),
                ops,
                (ops as f64 / instr as f64) * 100.0
            );
        }
        println!("==========================================================");
    }
}
