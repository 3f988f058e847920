//! Stress tests and edge case tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rv32_fu_sim::common::bits::BitVector;
use rv32_fu_sim::common::reg::{RegisterAddress, RegisterFile};
use rv32_fu_sim::core::control::{ControlUnit, Operands};
use rv32_fu_sim::core::signals::{AluOp, FpuOp, MduOp, RoundingMode};
use rv32_fu_sim::core::units::alu::Alu;
use rv32_fu_sim::core::units::fpu::Fpu;
use rv32_fu_sim::core::units::mdu::Mdu;

/// Stress test for ALU arithmetic against host wrapping arithmetic.
#[test]
fn test_alu_arithmetic_stress() {
    let mut rng = StdRng::seed_from_u64(0x1234_5678);
    for _ in 0..500 {
        let (a, b): (u32, u32) = (rng.gen(), rng.gen());
        let va = BitVector::from_u32(a);
        let vb = BitVector::from_u32(b);
        let add = Alu::execute(AluOp::Add, &va, &vb).unwrap();
        assert_eq!(add.result.to_u32(), a.wrapping_add(b));
        assert_eq!(add.flags.carry, a.checked_add(b).is_none());
        assert_eq!(add.flags.overflow, (a as i32).checked_add(b as i32).is_none());

        let sub = Alu::execute(AluOp::Sub, &va, &vb).unwrap();
        assert_eq!(sub.result.to_u32(), a.wrapping_sub(b));
        assert_eq!(sub.flags.overflow, (a as i32).checked_sub(b as i32).is_none());

        let slt = Alu::execute(AluOp::Slt, &va, &vb).unwrap();
        assert_eq!(slt.result.to_u32(), ((a as i32) < (b as i32)) as u32);
    }
}

/// Stress test for the MDU against host arithmetic.
#[test]
fn test_mdu_stress() {
    let mut rng = StdRng::seed_from_u64(0xCAFE_F00D);
    for _ in 0..200 {
        let a: u32 = rng.gen();
        let b = rng.gen::<u32>() >> rng.gen_range(0..32u32);
        let va = BitVector::from_u32(a);
        let vb = BitVector::from_u32(b);
        let mul = Mdu::execute(MduOp::Mulhsu, &va, &vb).unwrap();
        let expected = ((a as i32 as i64) * (b as i64)) >> 32;
        assert_eq!(mul.result().to_u32(), expected as u32);
        if b != 0 {
            let div = Mdu::execute(MduOp::Divu, &va, &vb).unwrap();
            assert_eq!(div.result().to_u32(), a / b);
            let rem = Mdu::execute(MduOp::Rem, &va, &vb).unwrap();
            assert_eq!(rem.result().to_u32(), (a as i32).wrapping_rem(b as i32) as u32);
        }
    }
}

/// Stress test for FPU add and multiply across random bit patterns.
#[test]
fn test_fpu_random_patterns() {
    let mut rng = StdRng::seed_from_u64(0x0BAD_5EED);
    for _ in 0..300 {
        let (a, b): (u32, u32) = (rng.gen(), rng.gen());
        let (fa, fb) = (f32::from_bits(a), f32::from_bits(b));
        let va = BitVector::from_u32(a);
        let vb = BitVector::from_u32(b);

        let sum = Fpu::execute(FpuOp::Fadd, &va, &vb, RoundingMode::Rne).unwrap().result;
        let prod = Fpu::execute(FpuOp::Fmul, &va, &vb, RoundingMode::Rne).unwrap().result;
        for (ours, host) in [(sum, fa + fb), (prod, fa * fb)] {
            if host.is_nan() {
                assert_eq!(ours.to_u32(), 0x7FC0_0000);
            } else {
                assert_eq!(ours.to_u32(), host.to_bits(), "{:#x} {:#x}", a, b);
            }
        }
    }
}

/// Stress test for many back-to-back operations through one Control Unit.
#[test]
fn test_control_unit_long_run() {
    let mut regs = RegisterFile::new();
    regs.set_int(RegisterAddress::new(1).unwrap(), 1);
    let mut cu = ControlUnit::new(regs);
    let ops = Operands::new(1, 1, 1).unwrap();
    // x1 doubles each step; after 31 steps only bit 31 remains
    for _ in 0..31 {
        let res = cu.execute_instruction("ALU", "ADD", &ops, 10).unwrap();
        assert!(res.success);
    }
    assert_eq!(cu.regs().int(RegisterAddress::new(1).unwrap()), 0x8000_0000);
    assert_eq!(cu.stats().total_cycles, 62);
    assert_eq!(cu.trace().len(), 31 * 3);
}
