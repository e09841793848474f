//! CPU-core support.
//!
//! - [`avr`]: AVR status register and global interrupt flag

pub mod avr;
