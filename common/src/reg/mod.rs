//! Memory-mapped register access.
//!
//! A register is named by a zero-sized type implementing [`Register`]. The
//! type carries the address and the value width; every read and write goes
//! through `read_volatile`/`write_volatile` so the compiler can neither
//! elide nor merge hardware accesses.
//!
//! Fields are layered on top of a register type:
//!
//! - [`Bit`]: one bit, read as `bool`
//! - [`BitGroup`]: a contiguous run of bits, read as a [`FieldValue`]
//! - [`Composite`]: one logical value whose bits live in two or three
//!   separate register fields
//!
//! [`Flag`] and [`Field`] name a field by type, for drivers whose field
//! positions differ from one peripheral instance to the next.
//!
//! # Concurrency
//!
//! Every field write is a read-modify-write of the whole register and none
//! of them masks interrupts. If an interrupt handler writes the same
//! register between the read and the write back, its update is lost. Wrap
//! such sequences in a [`CriticalSection`](crate::sync::CriticalSection).
//!
//! # Example
//!
//! ```
//! use common::reg::{Bit, BitGroup, Register};
//! use common::register;
//!
//! register! {
//!     /// Simulated control register.
//!     pub Ctrl: u8 = 0;
//! }
//!
//! type Enable = Bit<Ctrl, 7>;
//! type Prescaler = BitGroup<Ctrl, 0, 2, u8>;
//!
//! Enable::set();
//! Prescaler::write_raw(0b101);
//! assert_eq!(Ctrl::read(), 0b1000_0101);
//! assert_eq!(Prescaler::read_raw(), 0b101);
//! ```

mod bit;
mod composite;
mod field;
mod group;
mod value;

pub use bit::Bit;
pub use composite::{Composite, Layout, Part, Slice, SubField};
pub use field::{Field, Flag};
pub use group::BitGroup;
pub use value::FieldValue;

use core::fmt::Debug;
use core::ops::{BitAnd, BitOr, Not, Shl, Shr};
use core::ptr::{read_volatile, write_volatile};

/// Storage width of a register.
///
/// Field arithmetic is done in the register's own width; conversion to and
/// from the `u16` carrier used by [`FieldValue`] truncates.
pub trait RegValue:
    Copy
    + Eq
    + Debug
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
    + Shl<u8, Output = Self>
    + Shr<u8, Output = Self>
{
    /// Register width in bits.
    const BITS: u8;

    /// Truncate a carrier value to this width.
    fn from_u16(bits: u16) -> Self;

    /// Widen to the carrier type.
    fn into_u16(self) -> u16;
}

impl RegValue for u8 {
    const BITS: u8 = 8;

    #[inline(always)]
    fn from_u16(bits: u16) -> Self {
        bits as u8
    }

    #[inline(always)]
    fn into_u16(self) -> u16 {
        self as u16
    }
}

impl RegValue for u16 {
    const BITS: u8 = 16;

    #[inline(always)]
    fn from_u16(bits: u16) -> Self {
        bits
    }

    #[inline(always)]
    fn into_u16(self) -> u16 {
        self
    }
}

/// A fixed-address, fixed-width volatile storage cell.
///
/// Reads are never cached: two consecutive calls to [`read`](Self::read)
/// perform two hardware accesses. [`write`](Self::write) stores exactly the
/// given value without merging the previous contents.
///
/// # Safety
///
/// [`ptr`](Self::ptr) must return a pointer that is valid for volatile reads
/// and writes of `Self::Value` for the whole program, and properly aligned.
/// Use the [`register!`](crate::register) macro rather than implementing
/// this by hand.
pub unsafe trait Register {
    /// Storage width.
    type Value: RegValue;

    /// Location of the register.
    fn ptr() -> *mut Self::Value;

    /// Read the raw register contents.
    #[inline(always)]
    fn read() -> Self::Value {
        // SAFETY: validity of the location is the implementor's contract.
        unsafe { read_volatile(Self::ptr()) }
    }

    /// Overwrite the whole register.
    #[inline(always)]
    fn write(value: Self::Value) {
        // SAFETY: validity of the location is the implementor's contract.
        unsafe { write_volatile(Self::ptr(), value) }
    }

    /// Read the register, transform the value and write it back.
    ///
    /// Not atomic with respect to interrupts.
    #[inline(always)]
    fn modify(f: impl FnOnce(Self::Value) -> Self::Value) {
        Self::write(f(Self::read()))
    }
}

/// Mask covering bits `lo..=hi` in the `u16` carrier.
#[inline(always)]
pub(crate) const fn span_mask(lo: u8, hi: u8) -> u16 {
    (((1u32 << (hi - lo + 1)) - 1) << lo) as u16
}

/// Backing store for a simulated register.
///
/// Gives a register declared with `register! { pub Name: u8 = 0; }` a static
/// home so that drivers can run against it off-target.
#[repr(transparent)]
pub struct Cell<T>(core::cell::UnsafeCell<T>);

// SAFETY: the cell is only ever accessed through volatile raw-pointer reads
// and writes, the same discipline as a hardware register.
unsafe impl<T: Send> Sync for Cell<T> {}

impl<T> Cell<T> {
    /// Create a cell holding `value`.
    pub const fn new(value: T) -> Self {
        Self(core::cell::UnsafeCell::new(value))
    }

    /// Raw pointer to the contents.
    pub const fn as_ptr(&self) -> *mut T {
        self.0.get()
    }
}

/// Declare register types.
///
/// Two forms are accepted:
///
/// - `Name: u8 @ 0xC0;` a memory-mapped register at an absolute data-space
///   address
/// - `Name: u8 = 0x00;` a register backed by a static cell with the given
///   reset value, for simulation and tests
///
/// ```
/// common::register! {
///     /// USART0 I/O data register.
///     pub Udr0: u8 @ 0xC6;
///     /// Scratch register.
///     pub Scratch: u16 = 0xBEEF;
/// }
///
/// use common::reg::Register;
/// assert_eq!(Scratch::read(), 0xBEEF);
/// ```
#[macro_export]
macro_rules! register {
    () => {};
    (
        $(#[$attr:meta])*
        $vis:vis $name:ident : $ty:ident @ $addr:expr;
        $($rest:tt)*
    ) => {
        $(#[$attr])*
        #[derive(Debug)]
        $vis struct $name;

        // SAFETY: the address is taken from the device register map.
        unsafe impl $crate::reg::Register for $name {
            type Value = $ty;

            #[inline(always)]
            fn ptr() -> *mut $ty {
                ($addr) as usize as *mut $ty
            }
        }

        $crate::register!($($rest)*);
    };
    (
        $(#[$attr:meta])*
        $vis:vis $name:ident : $ty:ident = $reset:expr;
        $($rest:tt)*
    ) => {
        $(#[$attr])*
        #[derive(Debug)]
        $vis struct $name;

        // SAFETY: the pointer targets a static that lives for the whole
        // program and is only touched through this register type.
        unsafe impl $crate::reg::Register for $name {
            type Value = $ty;

            #[inline(always)]
            fn ptr() -> *mut $ty {
                static CELL: $crate::reg::Cell<$ty> = $crate::reg::Cell::new($reset);
                CELL.as_ptr()
            }
        }

        $crate::register!($($rest)*);
    };
}
