//! ATmega328P peripheral drivers.
//!
//! This crate provides a layered architecture for hardware abstraction:
//!
//! # Module Organization
//!
//! - [`hal`]: Platform-independent trait definitions
//! - [`hw`]: Device register map and peripheral instances
//! - [`peripheral`]: Peripheral drivers, generic over their registers
//!
//! Register access, critical sections and baud rate selection come from the
//! `common` crate.
//!
//! # Usage Example
//!
//! ```no_run
//! use drivers::hal::serial::{SerialConfig, SerialPort};
//! use drivers::hw::device::{Led, Usart0};
//!
//! let mut uart = Usart0::new(16_000_000);
//! uart.configure(SerialConfig::new_8n1(115_200)).unwrap();
//!
//! Led::set_as_output();
//! Led::toggle();
//! ```

#![no_std]

pub mod hal;
pub mod hw;
pub mod peripheral;

// Re-export commonly used types
pub use hal::gpio::{InputPin, OutputPin, PinLevel, StatefulOutputPin};
pub use hal::serial::{SerialConfig, SerialPort, SerialWriter};
