use core::fmt::Debug;

/// Architecture-specific interrupt masking interface.
///
/// Implemented by the architecture layer, see [`crate::arch`].
pub trait IrqControl {
    /// Saved interrupt state.
    type State: Copy + Debug;

    /// Disable interrupts and return the previous state.
    fn disable() -> Self::State;

    /// Restore interrupts to a previous state.
    ///
    /// Only the interrupt-enable bit captured in `state` is put back. A state
    /// taken while interrupts were already off leaves them off.
    fn restore(state: Self::State);
}
