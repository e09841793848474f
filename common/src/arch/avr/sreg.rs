use core::marker::PhantomData;
use core::sync::atomic::{Ordering, compiler_fence};

use crate::reg::Register;
use crate::sync::irq::IrqControl;

bitflags::bitflags! {
    /// AVR status register flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        /// Carry.
        const C = 1 << 0;
        /// Zero.
        const Z = 1 << 1;
        /// Negative.
        const N = 1 << 2;
        /// Two's complement overflow.
        const V = 1 << 3;
        /// Sign.
        const S = 1 << 4;
        /// Half carry.
        const H = 1 << 5;
        /// Bit copy storage.
        const T = 1 << 6;
        /// Global interrupt enable.
        const I = 1 << 7;
    }
}

/// Interrupt control through the `I` flag of status register `R`.
///
/// # State Management
///
/// The saved state is the status register masked down to `I`. Keeping the
/// masked register rather than a `bool` lets `restore` OR it straight back
/// in without a branch.
///
/// - `disable()`: reads the status register once, writes it back with `I`
///   cleared and returns the captured `I` flag
/// - `restore(saved)`: ORs the captured flag into the current status
///   register, so the other flags keep whatever value they have now and a
///   section entered with interrupts off leaves them off
///
/// Both sides carry a compiler fence, so ordinary memory accesses inside the
/// section are not moved out of it.
pub struct GlobalInterrupt<R>(PhantomData<R>);

impl<R: Register<Value = u8>> IrqControl for GlobalInterrupt<R> {
    type State = StatusFlags;

    #[inline(always)]
    fn disable() -> StatusFlags {
        let sreg = R::read();
        R::write(sreg & !StatusFlags::I.bits());
        compiler_fence(Ordering::SeqCst);
        StatusFlags::from_bits_retain(sreg) & StatusFlags::I
    }

    #[inline(always)]
    fn restore(saved: StatusFlags) {
        compiler_fence(Ordering::SeqCst);
        R::modify(|sreg| sreg | saved.bits());
    }
}
