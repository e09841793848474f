//! AVR GPIO ports.
//!
//! Each port is three 8-bit registers:
//!
//! - `PINx`: input levels (read); writing a 1 toggles the matching `PORTx` bit
//! - `DDRx`: direction, 1 = output
//! - `PORTx`: output level, or the pull-up enable for an input pin
//!
//! Three granularities are provided over the same registers: [`Port`] for
//! all eight pins, [`SubPort`] for a contiguous run of pins, and [`Pin`] for
//! one pin. All three are zero-sized and their operations are associated
//! functions, so they can be named as types by other drivers (the SPI driver
//! takes its four pins this way).
//!
//! Single-pin updates are read-modify-write on `DDRx`/`PORTx` and are not
//! interrupt safe.

use core::convert::Infallible;
use core::marker::PhantomData;

use common::reg::{Bit, BitGroup, Register};

use crate::hal::gpio::{InputPin, OutputPin, PinLevel, StatefulOutputPin};

/// The three registers of one GPIO port.
pub trait PortRegs {
    /// Input register (`PINx`).
    type Pin: Register<Value = u8>;
    /// Data direction register (`DDRx`).
    type Ddr: Register<Value = u8>;
    /// Output register (`PORTx`).
    type Port: Register<Value = u8>;
}

/// A whole 8-bit port.
pub struct Port<P>(PhantomData<P>);

impl<P: PortRegs> Port<P> {
    pub fn set_as_output() {
        P::Ddr::write(0xFF);
    }

    pub fn set_as_input() {
        P::Ddr::write(0x00);
    }

    /// Input levels of all eight pins.
    pub fn read() -> u8 {
        P::Pin::read()
    }

    /// Drive all eight output levels.
    pub fn write(value: u8) {
        P::Port::write(value);
    }

    /// Invert the output levels selected by `mask` in a single write.
    pub fn toggle(mask: u8) {
        P::Pin::write(mask);
    }
}

/// Pins `LO..=HI` of a port, accessed as one right-aligned value.
pub struct SubPort<P, const LO: u8, const HI: u8>(PhantomData<P>);

impl<P: PortRegs, const LO: u8, const HI: u8> SubPort<P, LO, HI> {
    pub fn set_as_output() {
        BitGroup::<P::Ddr, LO, HI, u8>::write_raw(0xFF);
    }

    pub fn set_as_input() {
        BitGroup::<P::Ddr, LO, HI, u8>::write_raw(0x00);
    }

    pub fn read() -> u8 {
        BitGroup::<P::Pin, LO, HI, u8>::read_raw()
    }

    /// Drive the group; bits of `value` past the group width are dropped.
    pub fn write(value: u8) {
        BitGroup::<P::Port, LO, HI, u8>::write_raw(value);
    }
}

/// Pin `N` of a port.
pub struct Pin<P, const N: u8>(PhantomData<P>);

impl<P: PortRegs, const N: u8> Pin<P, N> {
    /// Handle for the HAL traits.
    pub const fn new() -> Self {
        Self(PhantomData)
    }

    pub fn set_as_output() {
        Bit::<P::Ddr, N>::set();
    }

    /// Make the pin an input, leaving the pull-up setting as it was.
    pub fn set_as_input() {
        Bit::<P::Ddr, N>::clear();
    }

    /// Make the pin an input with the internal pull-up enabled.
    pub fn set_as_input_pull_up() {
        Bit::<P::Ddr, N>::clear();
        Bit::<P::Port, N>::set();
    }

    pub fn is_output() -> bool {
        Bit::<P::Ddr, N>::read()
    }

    /// Input level.
    pub fn read() -> bool {
        Bit::<P::Pin, N>::read()
    }

    /// Drive the output level.
    pub fn write(high: bool) {
        Bit::<P::Port, N>::write(high);
    }

    pub fn high() {
        Bit::<P::Port, N>::set();
    }

    pub fn low() {
        Bit::<P::Port, N>::clear();
    }

    pub fn toggle() {
        Bit::<P::Port, N>::toggle();
    }

    /// Level the pin is driven to (the `PORTx` bit).
    pub fn output_level() -> bool {
        Bit::<P::Port, N>::read()
    }
}

impl<P: PortRegs, const N: u8> Default for Pin<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// A pin named by type.
///
/// Used by drivers that own fixed pins (SPI, external interrupts, ADC).
pub trait IoPin {
    fn set_as_input();

    fn set_as_output();

    fn read() -> bool;

    fn write(high: bool);
}

impl<P: PortRegs, const N: u8> IoPin for Pin<P, N> {
    fn set_as_input() {
        Pin::<P, N>::set_as_input()
    }

    fn set_as_output() {
        Pin::<P, N>::set_as_output()
    }

    fn read() -> bool {
        Pin::<P, N>::read()
    }

    fn write(high: bool) {
        Pin::<P, N>::write(high)
    }
}

impl<P: PortRegs, const N: u8> InputPin for Pin<P, N> {
    type Error = Infallible;

    fn read(&self) -> Result<PinLevel, Infallible> {
        Ok(Pin::<P, N>::read().into())
    }
}

impl<P: PortRegs, const N: u8> OutputPin for Pin<P, N> {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Infallible> {
        Pin::<P, N>::high();
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        Pin::<P, N>::low();
        Ok(())
    }
}

impl<P: PortRegs, const N: u8> StatefulOutputPin for Pin<P, N> {
    fn read_output(&self) -> Result<PinLevel, Infallible> {
        Ok(Pin::<P, N>::output_level().into())
    }

    fn toggle(&mut self) -> Result<(), Infallible> {
        Pin::<P, N>::toggle();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Declare a simulated port named `$name` with its own register cells.
    macro_rules! sim_port {
        ($name:ident) => {
            common::register! {
                SimPin: u8 = 0;
                SimDdr: u8 = 0;
                SimPort: u8 = 0;
            }

            struct $name;

            impl $crate::peripheral::gpio::PortRegs for $name {
                type Pin = SimPin;
                type Ddr = SimDdr;
                type Port = SimPort;
            }
        };
    }
    pub(crate) use sim_port;

    #[test]
    fn whole_port() {
        sim_port!(P);

        Port::<P>::set_as_output();
        assert_eq!(SimDdr::read(), 0xFF);
        Port::<P>::write(0xA5);
        assert_eq!(SimPort::read(), 0xA5);

        Port::<P>::set_as_input();
        assert_eq!(SimDdr::read(), 0x00);
        SimPin::write(0x3C);
        assert_eq!(Port::<P>::read(), 0x3C);

        Port::<P>::toggle(0b1000_0001);
        assert_eq!(SimPin::read(), 0b1000_0001);
    }

    #[test]
    fn sub_port_leaves_other_pins_alone() {
        sim_port!(P);
        type Nibble = SubPort<P, 2, 5>;

        SimDdr::write(0b1000_0001);
        Nibble::set_as_output();
        assert_eq!(SimDdr::read(), 0b1011_1101);
        Nibble::set_as_input();
        assert_eq!(SimDdr::read(), 0b1000_0001);

        SimPort::write(0b1100_0011);
        Nibble::write(0b1_1010);
        assert_eq!(SimPort::read(), 0b1110_1011);

        SimPin::write(0b0001_0100);
        assert_eq!(Nibble::read(), 0b0101);
    }

    #[test]
    fn single_pin() {
        sim_port!(P);
        type Led = Pin<P, 5>;

        Led::set_as_output();
        assert!(Led::is_output());
        assert_eq!(SimDdr::read(), 0b0010_0000);

        Led::high();
        assert_eq!(SimPort::read(), 0b0010_0000);
        Led::toggle();
        assert_eq!(SimPort::read(), 0);
        Led::write(true);
        assert!(Led::output_level());
        Led::low();
        assert!(!Led::output_level());

        SimPin::write(0b0010_0000);
        assert!(Led::read());
    }

    #[test]
    fn pull_up_input() {
        sim_port!(P);
        type Button = Pin<P, 2>;

        SimDdr::write(0xFF);
        Button::set_as_input_pull_up();
        assert_eq!(SimDdr::read(), 0b1111_1011);
        assert_eq!(SimPort::read(), 0b0000_0100);
    }

    #[test]
    fn hal_traits() {
        sim_port!(P);
        let mut pin = Pin::<P, 0>::new();

        OutputPin::set_high(&mut pin).unwrap();
        assert_eq!(StatefulOutputPin::read_output(&pin), Ok(PinLevel::High));
        StatefulOutputPin::toggle(&mut pin).unwrap();
        assert!(StatefulOutputPin::is_set_low(&pin).unwrap());

        SimPin::write(1);
        assert!(InputPin::is_high(&pin).unwrap());
    }
}
