use core::arch::asm;
use core::sync::atomic::{Ordering, compiler_fence};

use super::StatusFlags;
use crate::sync::irq::IrqControl;

/// Clear the global interrupt flag with `cli`.
#[inline(always)]
pub fn cli() {
    // SAFETY: masking interrupts cannot break memory safety.
    unsafe { asm!("cli") };
    compiler_fence(Ordering::SeqCst);
}

/// Set the global interrupt flag with `sei`.
///
/// # Safety
///
/// See [`crate::interrupt::enable`].
#[inline(always)]
pub unsafe fn sei() {
    compiler_fence(Ordering::SeqCst);
    // SAFETY: upheld by the caller.
    unsafe { asm!("sei") };
}

/// Interrupt control through the `cli`/`sei` instructions.
///
/// `disable` reads SREG and executes `cli` back to back instead of writing
/// SREG, so no flag computed between the two is lost. `restore` executes
/// `sei` only when `I` was set on entry.
pub struct CpuInterrupt;

impl IrqControl for CpuInterrupt {
    type State = StatusFlags;

    #[inline(always)]
    fn disable() -> StatusFlags {
        let sreg: u8;
        // SAFETY: reads SREG (I/O 0x3F) and masks interrupts.
        unsafe { asm!("in {sreg}, 0x3F", "cli", sreg = out(reg) sreg) };
        compiler_fence(Ordering::SeqCst);
        StatusFlags::from_bits_retain(sreg) & StatusFlags::I
    }

    #[inline(always)]
    fn restore(saved: StatusFlags) {
        compiler_fence(Ordering::SeqCst);
        if saved.contains(StatusFlags::I) {
            // SAFETY: interrupts were enabled when the section was entered.
            unsafe { asm!("sei") };
        }
    }
}
