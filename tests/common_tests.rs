//! Unit tests for the bit-vector primitive and error types.

use rv32_fu_sim::common::*;

/// Tests that binary literals parse MSB first and ignore underscores.
#[test]
fn test_literal_parsing() {
    let v = BitVector::literal("1010_0001").unwrap();
    assert_eq!(v.width(), 8);
    assert!(v.msb());
    assert!(v.lsb());
    assert!(!v.bit(1));
    assert_eq!(v.to_u64(), 0xA1);
}

/// Tests that a literal with a stray character is rejected.
#[test]
fn test_literal_invalid_char() {
    assert_eq!(
        BitVector::literal("10x1"),
        Err(BitsError::InvalidLiteral { ch: 'x' })
    );
}

/// Tests hardware bit numbering of slices.
#[test]
fn test_slice_hardware_numbering() {
    let word = BitVector::from_u32(0x3FC0_0000);
    assert_eq!(word.slice(30, 23).to_u64(), 0x7F);
    assert_eq!(word.slice(22, 0).to_u64(), 0x40_0000);
    assert_eq!(word.slice(31, 31).width(), 1);
}

/// Tests that concatenation places the receiver in the high bits.
#[test]
fn test_concat() {
    let high = BitVector::literal("11").unwrap();
    let low = BitVector::literal("0001").unwrap();
    let v = high.concat(&low);
    assert_eq!(v.width(), 6);
    assert_eq!(v.to_u64(), 0b11_0001);
}

/// Tests zero and sign extension, including narrowing.
#[test]
fn test_extension() {
    let v = BitVector::literal("1001").unwrap();
    assert_eq!(v.zero_extend(8).to_u64(), 0x09);
    assert_eq!(v.sign_extend(8).to_u64(), 0xF9);
    assert_eq!(v.zero_extend(2).to_u64(), 0b01);
    assert_eq!(BitVector::literal("0110").unwrap().sign_extend(8).to_u64(), 0x06);
}

/// Tests truncation keeps the low bits.
#[test]
fn test_truncate() {
    let v = BitVector::from_u32(0xDEAD_BEEF);
    assert_eq!(v.truncate(16).to_u64(), 0xBEEF);
    assert_eq!(v.truncate(64).width(), 32);
}

/// Tests bitwise operators and the width check they enforce.
#[test]
fn test_bitwise_ops() {
    let a = BitVector::literal("1100").unwrap();
    let b = BitVector::literal("1010").unwrap();
    assert_eq!(a.and(&b).unwrap().to_bin_string(), "1000");
    assert_eq!(a.or(&b).unwrap().to_bin_string(), "1110");
    assert_eq!(a.xor(&b).unwrap().to_bin_string(), "0110");
    assert_eq!(a.not().to_bin_string(), "0011");

    let c = BitVector::zeros(5);
    assert_eq!(
        a.and(&c),
        Err(BitsError::LengthMismatch { left: 4, right: 5 })
    );
}

/// Tests fixed-distance shifts and their fill behaviour.
#[test]
fn test_fixed_shifts() {
    let v = BitVector::literal("1001_0110").unwrap();
    assert_eq!(v.shl(2).to_bin_string(), "01011000");
    assert_eq!(v.shr(2).to_bin_string(), "00100101");
    assert_eq!(v.sar(2).to_bin_string(), "11100101");
    assert_eq!(v.shl(8), BitVector::zeros(8));
    assert_eq!(v.sar(20), BitVector::ones(8));
    assert_eq!(v.shift_right_fill(3, true).to_bin_string(), "11110010");
}

/// Tests that operations never mutate their inputs.
#[test]
fn test_value_semantics() {
    let v = BitVector::from_u32(0x0000_00FF);
    let _ = v.shl(4);
    let _ = v.with_bit(31, true);
    let _ = v.not();
    assert_eq!(v.to_u32(), 0xFF);
}

/// Tests the constant constructors and reductions.
#[test]
fn test_constants_and_reductions() {
    assert!(BitVector::zeros(32).is_zero());
    assert!(BitVector::ones(32).is_ones());
    assert!(!BitVector::zeros(32).any());
    assert!(BitVector::zeros(32).with_bit(7, true).any());
    assert_eq!(BitVector::replicate(true, 3).to_bin_string(), "111");
}

/// Tests host conversions at the I/O boundary.
#[test]
fn test_host_conversions() {
    assert_eq!(BitVector::from_i32(-1), BitVector::ones(32));
    assert_eq!(BitVector::from_i32(-2).to_i32(), -2);
    assert_eq!(BitVector::from_f32(1.5).to_u32(), 0x3FC0_0000);
    assert_eq!(BitVector::from_u32(0x4070_0000).to_f32(), 3.75);
    assert_eq!(BitVector::from_u64(0x1_0000_0001, 40).to_u64(), 0x1_0000_0001);
}

/// Tests LSB-first construction order.
#[test]
fn test_from_lsb_first() {
    let v = BitVector::from_lsb_first([true, false, false]);
    assert_eq!(v.to_bin_string(), "001");
}

/// Tests hex and debug rendering.
#[test]
fn test_formatting() {
    let v = BitVector::from_u32(0x0000_ABCD);
    assert_eq!(v.to_hex_string(), "0000abcd");
    assert_eq!(format!("{:#x}", v), "0x0000abcd");
    assert_eq!(format!("{}", BitVector::literal("101").unwrap()), "101");
    assert_eq!(format!("{:?}", BitVector::literal("101").unwrap()), "BitVector<3>(0b101)");
    assert_eq!(BitVector::literal("101").unwrap().to_hex_string(), "5");
}

/// Tests that bit vectors serialize as binary strings.
#[test]
fn test_serde_binary_string() {
    let v = BitVector::literal("0110").unwrap();
    let json = serde_json::to_string(&v).unwrap();
    assert_eq!(json, "\"0110\"");
    let back: BitVector = serde_json::from_str(&json).unwrap();
    assert_eq!(back, v);
    assert!(serde_json::from_str::<BitVector>("\"0121\"").is_err());
}

/// Tests register address validation.
#[test]
fn test_register_address() {
    assert_eq!(RegisterAddress::new(31).unwrap().index(), 31);
    assert!(matches!(
        RegisterAddress::new(32),
        Err(SimError::InvalidRegister(32))
    ));
    let addr = RegisterAddress::from_bits(&BitVector::literal("00101").unwrap()).unwrap();
    assert_eq!(addr.index(), 5);
    assert_eq!(addr.bits().to_bin_string(), "00101");
    assert!(RegisterAddress::from_bits(&BitVector::zeros(6)).is_err());
}

/// Tests error display messages.
#[test]
fn test_error_messages() {
    let e = SimError::MissingOperand("rd");
    assert_eq!(e.to_string(), "missing required operand 'rd'");
    let e: SimError = BitsError::WidthMismatch {
        expected: 32,
        actual: 16,
    }
    .into();
    assert_eq!(e.to_string(), "expected a 32-bit operand, got 16 bits");
}
