//! Interrupt-safety primitives.
//!
//! The HAL provides exactly one concurrency primitive, [`CriticalSection`].
//! Register accessors never take it implicitly; callers decide which
//! read-modify-write sequences must not be interrupted.

pub mod critical;
pub mod irq;

pub use critical::{CriticalSection, free};
pub use irq::IrqControl;
