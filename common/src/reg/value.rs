use core::fmt::Debug;

/// A logical value stored in a register field.
///
/// The encoding is carried in a `u16`. Decoding is total: `from_bits` must
/// accept every pattern that fits in `BITS` bits, including patterns that
/// have no name. A field reports what is physically in the register, it does
/// not validate it.
pub trait FieldValue: Copy + Debug {
    /// Number of bits the value occupies.
    const BITS: u8;

    /// Encode into the low `BITS` bits.
    fn into_bits(self) -> u16;

    /// Decode from the low `BITS` bits.
    fn from_bits(bits: u16) -> Self;
}

impl FieldValue for bool {
    const BITS: u8 = 1;

    #[inline(always)]
    fn into_bits(self) -> u16 {
        self as u16
    }

    #[inline(always)]
    fn from_bits(bits: u16) -> Self {
        bits & 1 != 0
    }
}

impl FieldValue for u8 {
    const BITS: u8 = 8;

    #[inline(always)]
    fn into_bits(self) -> u16 {
        self as u16
    }

    #[inline(always)]
    fn from_bits(bits: u16) -> Self {
        bits as u8
    }
}

impl FieldValue for u16 {
    const BITS: u8 = 16;

    #[inline(always)]
    fn into_bits(self) -> u16 {
        self
    }

    #[inline(always)]
    fn from_bits(bits: u16) -> Self {
        bits
    }
}

/// Declare a field value type with named encodings.
///
/// The generated type is a transparent `u8` newtype rather than a Rust
/// `enum`, so decoding a reserved pattern yields a value instead of
/// undefined behaviour. [`is_known`](#method.is_known) tells named and
/// reserved patterns apart, and `Debug` prints the name when there is one.
///
/// ```
/// use common::field_enum;
/// use common::reg::FieldValue;
///
/// field_enum! {
///     /// Parity mode.
///     pub struct Parity: 2 {
///         /// No parity bit.
///         NONE = 0b00,
///         /// Even parity.
///         EVEN = 0b10,
///         /// Odd parity.
///         ODD = 0b11,
///     }
/// }
///
/// assert_eq!(Parity::EVEN.into_bits(), 0b10);
/// let reserved = Parity::from_bits(0b01);
/// assert!(!reserved.is_known());
/// ```
///
/// Every named value must fit in the declared width:
///
/// ```compile_fail
/// common::field_enum! {
///     pub struct Mode: 3 {
///         NORMAL = 0b000,
///         WIDE = 0b1000,
///     }
/// }
/// ```
#[macro_export]
macro_rules! field_enum {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident : $bits:literal {
            $(
                $(#[$vattr:meta])*
                $variant:ident = $value:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        $vis struct $name(u8);

        #[allow(dead_code)]
        impl $name {
            $(
                $(#[$vattr])*
                pub const $variant: Self = Self($value);
            )+

            /// Encoded value.
            pub const fn bits(self) -> u8 {
                self.0
            }

            /// Whether the encoding has a name.
            pub const fn is_known(self) -> bool {
                $(self.0 == $value)||+
            }

            const MASK: u8 = ((1u16 << $bits) - 1) as u8;
        }

        impl $crate::reg::FieldValue for $name {
            const BITS: u8 = $bits;

            #[inline(always)]
            fn into_bits(self) -> u16 {
                self.0 as u16
            }

            #[inline(always)]
            fn from_bits(bits: u16) -> Self {
                Self(bits as u8 & Self::MASK)
            }
        }

        impl ::core::fmt::Debug for $name {
            #[allow(unreachable_patterns)]
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match *self {
                    $(Self::$variant => f.write_str(stringify!($variant)),)+
                    Self(other) => ::core::write!(f, "{}({:#b})", stringify!($name), other),
                }
            }
        }

        const _: () = {
            $(
                ::core::assert!(
                    (($value) as u32) < (1u32 << $bits),
                    "named value is wider than the field"
                );
            )+
        };
    };
}

#[cfg(test)]
mod tests {
    use super::FieldValue;

    crate::field_enum! {
        struct Mode: 3 {
            NORMAL = 0b000,
            CTC = 0b010,
            FAST = 0b111,
        }
    }

    #[test]
    fn named_values_encode() {
        assert_eq!(Mode::NORMAL.into_bits(), 0);
        assert_eq!(Mode::CTC.into_bits(), 0b010);
        assert_eq!(Mode::FAST.bits(), 0b111);
    }

    #[test]
    fn decode_keeps_reserved_patterns() {
        let m = Mode::from_bits(0b011);
        assert!(!m.is_known());
        assert_eq!(m.bits(), 0b011);
        assert!(Mode::from_bits(0b010).is_known());
        assert_eq!(Mode::from_bits(0b010), Mode::CTC);
    }

    #[test]
    fn decode_masks_to_width() {
        assert_eq!(Mode::from_bits(0b1010), Mode::CTC);
    }

    #[test]
    fn primitive_encodings() {
        assert!(bool::from_bits(1));
        assert!(!bool::from_bits(2));
        assert_eq!(true.into_bits(), 1);
        assert_eq!(u8::from_bits(0x1FF), 0xFF);
    }
}
