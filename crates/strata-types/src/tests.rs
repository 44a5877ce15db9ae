//! Unit tests for strata-types

use crate::Offset;

#[test]
fn offset_arithmetic() {
    let mut offset = Offset::new(16);
    offset += Offset::from(1u64);
    assert_eq!(offset, Offset::new(17));

    assert_eq!(Offset::new(17) - Offset::new(16), Offset::new(1));
    assert_eq!(Offset::new(3) + Offset::new(4), Offset::new(7));
}

#[test]
fn offset_conversions() {
    let offset = Offset::from(42u64);
    assert_eq!(offset.as_u64(), 42);
    assert_eq!(u64::from(offset), 42);
}

#[test]
fn offset_ordering() {
    assert!(Offset::new(1) < Offset::new(2));
    assert_eq!(Offset::ZERO, Offset::new(0));
    assert_eq!(Offset::default(), Offset::ZERO);
}

#[test]
fn offset_display() {
    assert_eq!(Offset::new(1024).to_string(), "1024");
}
