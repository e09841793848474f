//! Global interrupt flag for the current target.
//!
//! On AVR builds these execute `cli`/`sei` and read the real status
//! register. Elsewhere they operate on a simulated one so driver code builds
//! and runs on the host.

use crate::arch::avr::{self, AvrIrq, Sreg};
use crate::reg::Bit;
use crate::sync::{self, CriticalSection};

type IBit = Bit<Sreg, 7>;

/// Interrupt masking backend for this target.
pub type Interrupts = AvrIrq;

/// Set the global interrupt enable flag.
///
/// # Safety
///
/// Must not be called inside a [`CriticalSection`]: the guard's caller relies
/// on interrupts staying masked until it is dropped.
#[inline(always)]
pub unsafe fn enable() {
    // SAFETY: upheld by the caller.
    unsafe { avr::sei() };
}

/// Clear the global interrupt enable flag.
#[inline(always)]
pub fn disable() {
    avr::cli();
}

/// Whether the global interrupt enable flag is set.
#[inline(always)]
pub fn is_enabled() -> bool {
    IBit::read()
}

/// Run `f` with interrupts disabled, restoring the previous state after.
#[inline(always)]
pub fn free<R>(f: impl FnOnce(&CriticalSection<Interrupts>) -> R) -> R {
    sync::free(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test touching the shared status register.
    #[test]
    fn global_flag_and_free() {
        disable();
        assert!(!is_enabled());
        assert!(!free(|_| is_enabled()));
        assert!(!is_enabled());

        unsafe { enable() };
        assert!(is_enabled());
        let inside = free(|_| free(|_| is_enabled()));
        assert!(!inside);
        assert!(is_enabled());

        disable();
    }
}
