use super::{Bit, BitGroup, Composite, FieldValue, Layout, Register};

/// A single-bit field, named by type.
///
/// Lets a driver take "the enable bit" as a type parameter when its position
/// differs between instances of the same peripheral.
pub trait Flag {
    fn read() -> bool;

    fn set();

    fn clear();

    fn write(value: bool) {
        if value { Self::set() } else { Self::clear() }
    }

    /// Write a 1 to the flag alone. See [`Bit::acknowledge`].
    fn acknowledge();
}

impl<R: Register, const I: u8> Flag for Bit<R, I> {
    #[inline(always)]
    fn read() -> bool {
        Bit::<R, I>::read()
    }

    #[inline(always)]
    fn set() {
        Bit::<R, I>::set()
    }

    #[inline(always)]
    fn clear() {
        Bit::<R, I>::clear()
    }

    #[inline(always)]
    fn acknowledge() {
        Bit::<R, I>::acknowledge()
    }
}

/// A typed multi-bit field, named by type.
///
/// Implemented by [`BitGroup`] and [`Composite`], so a driver does not care
/// whether a setting sits in one register or is split across several.
pub trait Field {
    type Value: FieldValue;

    fn read() -> Self::Value;

    fn write(value: Self::Value);
}

impl<R: Register, const LO: u8, const HI: u8, V: FieldValue> Field for BitGroup<R, LO, HI, V> {
    type Value = V;

    #[inline(always)]
    fn read() -> V {
        BitGroup::<R, LO, HI, V>::read()
    }

    #[inline(always)]
    fn write(value: V) {
        BitGroup::<R, LO, HI, V>::write(value)
    }
}

impl<L: Layout, V: FieldValue> Field for Composite<L, V> {
    type Value = V;

    #[inline(always)]
    fn read() -> V {
        Composite::<L, V>::read()
    }

    #[inline(always)]
    fn write(value: V) {
        Composite::<L, V>::write(value)
    }
}
