//! Peripheral Drivers
//!
//! Each driver is generic over a register-set trait naming the registers
//! (or fields) it touches, so the same code runs on the device map in
//! [`crate::hw`] and on simulated registers in tests.
//!
//! # Available Peripherals
//!
//! - [`gpio`]: ports, pin groups and single pins
//! - [`adc`]: analog to digital converter
//! - [`spi`]: serial peripheral interface
//! - [`usart`]: USART serial port
//! - [`timer`]: 8- and 16-bit timer/counters
//! - [`exint`]: external interrupt lines
//! - [`eeprom`]: internal EEPROM

pub mod adc;
pub mod eeprom;
pub mod exint;
pub mod gpio;
pub mod spi;
pub mod timer;
pub mod usart;
