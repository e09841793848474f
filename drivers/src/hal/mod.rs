//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! This module defines generic traits for interacting with hardware
//! peripherals. These traits are implemented by the peripheral drivers,
//! allowing application code to be written without naming a device.
//!
//! # Available Interfaces
//!
//! - [`gpio`]: General Purpose Input/Output control
//! - [`serial`]: Serial port (UART) communication

pub mod gpio;
pub mod serial;
