//! Logical fields split across registers.
//!
//! Some settings do not fit in one register: a timer's waveform generation
//! mode keeps its low bits in control register A and its high bits in
//! control register B, and the SPI clock rate keeps two bits in SPCR and the
//! third in SPSR. A [`Composite`] names such a value once, as an ordered
//! list of [`Part`]s, so the split and the reassembly live in one place.
//!
//! ```
//! use common::reg::{Bit, BitGroup, Composite, Part, Register};
//!
//! common::register! {
//!     CtrlA: u8 = 0;
//!     CtrlB: u8 = 0;
//! }
//!
//! // Logical bits 0..=1 in CtrlA[1:0], logical bit 2 in CtrlB[3].
//! type Mode = Composite<(
//!     Part<BitGroup<CtrlA, 0, 1, u8>, 0>,
//!     Part<Bit<CtrlB, 3>, 2>,
//! )>;
//!
//! Mode::write_raw(0b101);
//! assert_eq!(CtrlA::read(), 0b01);
//! assert_eq!(CtrlB::read(), 0b1000);
//! assert_eq!(Mode::read_raw(), 0b101);
//! ```
//!
//! With a [`FieldValue`] type as the second parameter the composite is read
//! and written as that type instead, see [`Composite`].
//!
//! # Atomicity
//!
//! A composite write is one read-modify-write per part, performed in
//! declaration order. Nothing masks interrupts between the parts, so an
//! interrupt handler (or a reader) can observe a value assembled from the
//! new low part and the old high part. The same holds for `read`. Callers
//! that need a consistent view must hold a
//! [`CriticalSection`](crate::sync::CriticalSection) across the call.

use core::marker::PhantomData;

use super::{Bit, BitGroup, FieldValue, RegValue, Register, span_mask};

/// A register field usable as one part of a composite.
pub trait SubField {
    /// Number of bits the field holds.
    const WIDTH: u8;

    /// Field bits, right-aligned.
    fn read_bits() -> u16;

    /// Replace the field bits with the low `WIDTH` bits of `bits`.
    fn write_bits(bits: u16);
}

impl<R: Register, const I: u8> SubField for Bit<R, I> {
    const WIDTH: u8 = 1;

    #[inline(always)]
    fn read_bits() -> u16 {
        Self::read() as u16
    }

    #[inline(always)]
    fn write_bits(bits: u16) {
        Self::write(bits & 1 != 0)
    }
}

impl<R: Register, const LO: u8, const HI: u8, V> SubField for BitGroup<R, LO, HI, V> {
    const WIDTH: u8 = HI - LO + 1;

    #[inline(always)]
    fn read_bits() -> u16 {
        Self::read_raw().into_u16()
    }

    #[inline(always)]
    fn write_bits(bits: u16) {
        Self::write_raw(<R::Value as RegValue>::from_u16(bits))
    }
}

/// Sub-field `F` holding logical bits `AT..AT + F::WIDTH`.
pub struct Part<F, const AT: u8>(PhantomData<F>);

/// One placed part of a composite.
pub trait Slice {
    /// Logical bits covered by this part.
    const MASK: u16;

    /// This part's bits, placed at their logical position.
    fn read() -> u16;

    /// Store this part's share of `logical`.
    fn write(logical: u16);
}

impl<F: SubField, const AT: u8> Slice for Part<F, AT> {
    const MASK: u16 = {
        assert!(AT + F::WIDTH <= 16, "composite part exceeds 16 logical bits");
        span_mask(AT, AT + F::WIDTH - 1)
    };

    #[inline(always)]
    fn read() -> u16 {
        F::read_bits() << AT
    }

    #[inline(always)]
    fn write(logical: u16) {
        F::write_bits((logical & Self::MASK) >> AT)
    }
}

/// Ordered list of parts making up a composite.
///
/// Implemented for tuples of two and three [`Slice`]s.
pub trait Layout {
    /// Union of the parts' logical masks.
    const MASK: u16;

    /// Sum of the parts' widths; equals `MASK.count_ones()` iff no two
    /// parts overlap.
    const COVERED: u32;

    fn read() -> u16;

    fn write(logical: u16);
}

macro_rules! tuple_layout {
    ($($part:ident),+) => {
        impl<$($part: Slice),+> Layout for ($($part,)+) {
            const MASK: u16 = 0 $(| $part::MASK)+;
            const COVERED: u32 = 0 $(+ $part::MASK.count_ones())+;

            #[inline(always)]
            fn read() -> u16 {
                0 $(| $part::read())+
            }

            #[inline(always)]
            fn write(logical: u16) {
                $($part::write(logical);)+
            }
        }
    };
}

tuple_layout!(A, B);
tuple_layout!(A, B, C);

/// A logical value of type `V` stored across the parts of layout `L`.
///
/// The parts must not overlap and must cover logical bits `0..WIDTH` without
/// a gap:
///
/// ```compile_fail
/// use common::reg::{Bit, Composite, Part};
/// common::register! { A: u8 = 0; B: u8 = 0; }
/// // logical bit 1 is never stored
/// type Gap = Composite<(Part<Bit<A, 0>, 0>, Part<Bit<B, 0>, 2>)>;
/// Gap::write_raw(0);
/// ```
///
/// Two parts may not claim the same logical bit:
///
/// ```compile_fail
/// use common::reg::{Bit, BitGroup, Composite, Part};
/// common::register! { A: u8 = 0; B: u8 = 0; }
/// // logical bit 1 is claimed by both parts
/// type Overlap = Composite<(Part<BitGroup<A, 0, 1, u8>, 0>, Part<Bit<B, 0>, 1>)>;
/// Overlap::write_raw(0);
/// ```
///
/// The typed accessors additionally require the parts to cover exactly
/// `V::BITS` bits:
///
/// ```compile_fail
/// use common::reg::{Bit, BitGroup, Composite, Part};
/// common::register! { A: u8 = 0; B: u8 = 0; }
/// // 3 bits of storage for an 8-bit value
/// type Short = Composite<(Part<BitGroup<A, 0, 1, u8>, 0>, Part<Bit<B, 0>, 2>), u8>;
/// Short::write(0);
/// ```
pub struct Composite<L, V = u16>(PhantomData<(L, V)>);

impl<L: Layout, V> Composite<L, V> {
    const DISJOINT: () = {
        assert!(
            L::COVERED == L::MASK.count_ones(),
            "composite parts overlap"
        );
        assert!(
            L::MASK as u32 == (1u32 << L::COVERED) - 1,
            "composite parts leave a gap"
        );
    };

    /// Number of logical bits.
    pub const WIDTH: u32 = L::COVERED;

    /// Read every part and reassemble the right-aligned bits.
    #[inline(always)]
    pub fn read_raw() -> u16 {
        let () = Self::DISJOINT;
        L::read()
    }

    /// Split `bits` and write every part, in declaration order. Bits past
    /// the composite width are dropped.
    #[inline(always)]
    pub fn write_raw(bits: u16) {
        let () = Self::DISJOINT;
        L::write(bits)
    }
}

impl<L: Layout, V: FieldValue> Composite<L, V> {
    const COVERS: () = assert!(
        L::COVERED == V::BITS as u32,
        "composite parts do not cover the value exactly"
    );

    /// Read every part and reassemble the value.
    #[inline(always)]
    pub fn read() -> V {
        let () = Self::COVERS;
        V::from_bits(Self::read_raw())
    }

    /// Split the value and write every part, in declaration order.
    #[inline(always)]
    pub fn write(value: V) {
        let () = Self::COVERS;
        Self::write_raw(value.into_bits())
    }
}
