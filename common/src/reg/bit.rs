use core::marker::PhantomData;

use super::{RegValue, Register, span_mask};

/// Single bit `I` of register `R`.
///
/// `set`, `clear`, `write` and `toggle` are read-modify-write sequences and
/// are not atomic with respect to interrupts.
///
/// An index past the register width is rejected when the accessor is used:
///
/// ```compile_fail
/// common::register! { Ctrl: u8 = 0; }
/// common::reg::Bit::<Ctrl, 8>::set();
/// ```
pub struct Bit<R, const I: u8>(PhantomData<R>);

impl<R: Register, const I: u8> Bit<R, I> {
    const IN_RANGE: () = assert!(
        I < <R::Value as RegValue>::BITS,
        "bit index exceeds register width"
    );

    const MASK: u16 = span_mask(I, I);

    #[inline(always)]
    fn mask() -> R::Value {
        let () = Self::IN_RANGE;
        <R::Value as RegValue>::from_u16(Self::MASK)
    }

    /// Whether the bit is 1.
    #[inline(always)]
    pub fn read() -> bool {
        R::read() & Self::mask() != <R::Value as RegValue>::from_u16(0)
    }

    /// Force the bit to 1, leaving the other bits untouched.
    #[inline(always)]
    pub fn set() {
        let mask = Self::mask();
        R::modify(|r| r | mask);
    }

    /// Force the bit to 0, leaving the other bits untouched.
    #[inline(always)]
    pub fn clear() {
        let mask = Self::mask();
        R::modify(|r| r & !mask);
    }

    #[inline(always)]
    pub fn write(value: bool) {
        if value { Self::set() } else { Self::clear() }
    }

    /// Invert the bit.
    #[inline(always)]
    pub fn toggle() {
        let mask = Self::mask();
        R::modify(|r| (r & !mask) | (!r & mask));
    }

    /// Write a 1 to this bit alone, with every other bit written as 0.
    ///
    /// Interrupt flag registers clear a flag when a 1 is written to it; a
    /// read-modify-write `set` would also clear every other pending flag.
    #[inline(always)]
    pub fn acknowledge() {
        R::write(Self::mask());
    }
}
