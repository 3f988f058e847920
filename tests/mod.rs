//! Test module organization.
//!
//! This module organizes all integration tests for the functional unit simulator.



/// Bit-vector primitive and error type tests.
mod common_tests;


/// Control Unit sequencing, trace and counter tests.
mod control_tests;







/// Stress tests over randomized operands.
mod stress_tests;
