use core::marker::PhantomData;

use super::{FieldValue, RegValue, Register, span_mask};

/// Contiguous bits `LO..=HI` of register `R`, read and written as a `V`.
///
/// `write` clears exactly the bits of the group and ORs in the encoded
/// value; every other bit of the register is written back as it was read.
/// `read` decodes whatever bits are present, which may be an encoding that
/// `V` has no name for.
///
/// Both are read-modify-write sequences without interrupt masking.
///
/// The range must lie inside the register and `V` must fit in it:
///
/// ```compile_fail
/// common::register! { Ctrl: u8 = 0; }
/// // 8 bits of value into a 3-bit group
/// common::reg::BitGroup::<Ctrl, 0, 2, u8>::write(0);
/// ```
///
/// ```compile_fail
/// common::register! { Ctrl: u8 = 0; }
/// common::reg::BitGroup::<Ctrl, 6, 8, u8>::read_raw();
/// ```
///
/// ```compile_fail
/// common::register! { Ctrl: u8 = 0; }
/// // reversed range
/// common::reg::BitGroup::<Ctrl, 5, 2, u8>::write_raw(0);
/// ```
pub struct BitGroup<R, const LO: u8, const HI: u8, V>(PhantomData<(R, V)>);

impl<R: Register, const LO: u8, const HI: u8, V> BitGroup<R, LO, HI, V> {
    const IN_RANGE: () = {
        assert!(LO <= HI, "bit group range is reversed");
        assert!(
            HI < <R::Value as RegValue>::BITS,
            "bit group exceeds register width"
        );
    };

    const MASK: u16 = span_mask(LO, HI);

    /// Number of bits in the group.
    pub const WIDTH: u8 = HI - LO + 1;

    #[inline(always)]
    fn mask() -> R::Value {
        let () = Self::IN_RANGE;
        <R::Value as RegValue>::from_u16(Self::MASK)
    }

    /// Group bits shifted down to bit 0.
    #[inline(always)]
    pub fn read_raw() -> R::Value {
        (R::read() & Self::mask()) >> LO
    }

    /// Replace the group bits with `bits`, truncated to the group width.
    #[inline(always)]
    pub fn write_raw(bits: R::Value) {
        let mask = Self::mask();
        R::modify(|r| (r & !mask) | ((bits << LO) & mask));
    }
}

impl<R: Register, const LO: u8, const HI: u8, V: FieldValue> BitGroup<R, LO, HI, V> {
    const FITS: () = assert!(
        V::BITS <= HI - LO + 1,
        "value type is wider than its bit group"
    );

    #[inline(always)]
    pub fn read() -> V {
        let () = Self::FITS;
        V::from_bits(Self::read_raw().into_u16())
    }

    #[inline(always)]
    pub fn write(value: V) {
        let () = Self::FITS;
        Self::write_raw(<R::Value as RegValue>::from_u16(value.into_bits()));
    }
}
