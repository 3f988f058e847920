//! RV32 Functional Unit Simulator Library.
//!
//! This crate models the execution units of a 32-bit RISC-V core at the bit
//! level: every value is a `BitVector`, and arithmetic is carried out by
//! gate-level algorithms (ripple-carry adders, a barrel shifter, shift-add
//! multiply, restoring divide, and an IEEE-754 binary32 add/multiply
//! pipeline) rather than host arithmetic.
//!
//! # Architecture
//!
//! * **Units**: ALU (2 cycles), Shifter (2 cycles), MDU (33 cycles), FPU (5 cycles).
//! * **Control Unit**: an FSM that issues one operation at a time, drives the
//!   control wires, records a per-cycle trace and keeps performance counters.
//!
//! # Modules
//!
//! * `common`: Bit vectors, error types and register addressing.
//! * `config`: Configuration loading and parsing.
//! * `core`: Register banks, functional units and the Control Unit.
//! * `stats`: Performance statistics collection.

/// Bit vectors, error types and register definitions.
///
/// Provides the fixed-width value type used by every datapath and the
/// register file abstraction the Control Unit reads and writes through.
pub mod common;

/// Configuration system for simulation runs.
///
/// Loads and parses TOML files describing logging options, initial register
/// contents and the program to execute.
pub mod config;

/// Functional units and the Control Unit that sequences them.
pub mod core;

/// Performance statistics collection and reporting.
///
/// Tracks total, idle and per-unit cycle counts, completed operations, and
/// derived CPI and utilization.
pub mod stats;
