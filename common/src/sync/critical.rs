use core::marker::PhantomData;

use super::irq::IrqControl;

/// Scoped interrupt masking.
///
/// - Snapshots the interrupt-enable state and disables interrupts on creation
/// - Restores the snapshot on drop
///
/// Nesting is safe: each guard restores only what it captured, so an inner
/// guard dropped inside an outer one leaves interrupts disabled.
///
/// Never blocks, never fails. Not `Send`: the snapshot belongs to the
/// execution context that took it.
///
/// ```
/// use common::sync::{CriticalSection, IrqControl};
///
/// struct NoIrq;
/// impl IrqControl for NoIrq {
///     type State = ();
///     fn disable() {}
///     fn restore(_: ()) {}
/// }
///
/// {
///     let _cs = CriticalSection::<NoIrq>::new();
///     // interrupt-safe sequence
/// }
/// ```
#[must_use = "interrupts are re-enabled as soon as the guard is dropped"]
pub struct CriticalSection<I: IrqControl> {
    state: I::State,
    _not_send: PhantomData<*const ()>,
}

impl<I: IrqControl> CriticalSection<I> {
    /// Disable interrupts until the returned guard is dropped.
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            state: I::disable(),
            _not_send: PhantomData,
        }
    }

    /// Interrupt state captured on entry.
    pub fn saved_state(&self) -> I::State {
        self.state
    }
}

impl<I: IrqControl> Default for CriticalSection<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: IrqControl> Drop for CriticalSection<I> {
    #[inline(always)]
    fn drop(&mut self) {
        I::restore(self.state);
    }
}

/// Run `f` with interrupts disabled.
///
/// The guard is passed to `f` as proof that interrupts are masked.
#[inline(always)]
pub fn free<I: IrqControl, R>(f: impl FnOnce(&CriticalSection<I>) -> R) -> R {
    let cs = CriticalSection::new();
    f(&cs)
}
