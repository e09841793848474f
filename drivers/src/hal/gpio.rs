//! GPIO (General Purpose Input/Output) Hardware Abstraction Layer.
//!
//! This module defines platform-independent traits for single pins.

/// Pin logic level.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinLevel {
    /// Logic low (ground).
    Low,
    /// Logic high (VCC).
    High,
}

impl From<bool> for PinLevel {
    fn from(value: bool) -> Self {
        if value {
            PinLevel::High
        } else {
            PinLevel::Low
        }
    }
}

impl From<PinLevel> for bool {
    fn from(level: PinLevel) -> bool {
        matches!(level, PinLevel::High)
    }
}

/// Event detection configuration for interrupt-capable pins.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EdgeDetect {
    /// Detect rising edge (low-to-high transition).
    Rising,
    /// Detect falling edge (high-to-low transition).
    Falling,
    /// Detect both rising and falling edges.
    Both,
}

/// Input pin trait.
///
/// This trait represents a GPIO pin configured as an input.
pub trait InputPin {
    /// Error type for read operations.
    type Error: core::fmt::Debug;

    /// Read the pin state.
    fn read(&self) -> Result<PinLevel, Self::Error>;

    /// Check if the pin is currently high.
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.read()? == PinLevel::High)
    }

    /// Check if the pin is currently low.
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.read()? == PinLevel::Low)
    }
}

/// Output pin trait.
///
/// This trait represents a GPIO pin configured as an output.
pub trait OutputPin {
    /// Error type for write operations.
    type Error: core::fmt::Debug;

    /// Set the pin to logic high.
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Set the pin to logic low.
    fn set_low(&mut self) -> Result<(), Self::Error>;

    /// Set the pin to a specific level.
    fn set_level(&mut self, level: PinLevel) -> Result<(), Self::Error> {
        match level {
            PinLevel::High => self.set_high(),
            PinLevel::Low => self.set_low(),
        }
    }

    /// Set the pin state based on a boolean value.
    fn set_state(&mut self, state: bool) -> Result<(), Self::Error> {
        self.set_level(state.into())
    }
}

/// Stateful output pin that can be toggled.
pub trait StatefulOutputPin: OutputPin {
    /// Read back the level the pin is driven to.
    fn read_output(&self) -> Result<PinLevel, Self::Error>;

    /// Toggle the output state.
    fn toggle(&mut self) -> Result<(), Self::Error> {
        let level = self.read_output()?;
        self.set_level(if level == PinLevel::High {
            PinLevel::Low
        } else {
            PinLevel::High
        })
    }

    /// Check if the pin is currently driven high.
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(self.read_output()? == PinLevel::High)
    }

    /// Check if the pin is currently driven low.
    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(self.read_output()? == PinLevel::Low)
    }
}
