//! Register access core for the ATmega328P HAL.
//!
//! Everything the peripheral drivers are built on lives here:
//!
//! - [`reg`]: volatile register handles and the typed accessors layered on
//!   top of them (single bits, contiguous bit groups, and logical fields
//!   split across two or three registers)
//! - [`sync`]: the interrupt-masking trait and the [`CriticalSection`] guard
//! - [`arch`]: the AVR status-register backend for interrupt masking
//! - [`interrupt`]: global interrupt flag control for the current target
//! - [`baud`]: compile-time USART clock divisor selection
//!
//! All accessors are zero-sized types whose operations are associated
//! functions, so each use monomorphizes to a direct memory access.
//! Structural mistakes (a bit index past the register width, a value type
//! wider than its field, overlapping composite parts) are rejected when the
//! offending accessor is instantiated, not at run time.
//!
//! [`CriticalSection`]: sync::CriticalSection

#![no_std]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]

pub mod arch;
pub mod baud;
pub mod interrupt;
pub mod reg;
pub mod sync;

pub use baud::{BaudSettings, SpeedMode};
pub use reg::{Bit, BitGroup, Composite, Field, FieldValue, Flag, Part, Register};
pub use sync::{CriticalSection, IrqControl};
