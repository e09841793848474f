//! Internal EEPROM.
//!
//! Raw byte access only; there is no wear levelling and no record format.
//! Positions wrap: every address is masked to the capacity, which must be a
//! power of two.
//!
//! A write must set `EEMPE` and then `EEPE` within four clock cycles, so that
//! pair runs inside a [`CriticalSection`]. Each access first waits for the
//! previous write to finish (about 3.4 ms per byte), with no timeout.

use core::marker::PhantomData;

use common::reg::{Bit, BitGroup, Register};
use common::sync::{CriticalSection, IrqControl};

/// EEPROM registers and geometry.
pub trait EepromRegs {
    /// Control register (`EECR`).
    type Eecr: Register<Value = u8>;
    /// Data register (`EEDR`).
    type Eedr: Register<Value = u8>;
    /// Address register pair (`EEAR`).
    type Eear: Register<Value = u16>;
    /// Interrupt masking used around the write strobe.
    type Irq: IrqControl;

    /// Size in bytes.
    const CAPACITY: u16;
}

// EECR
const EEPM_LO: u8 = 4;
const EEPM_HI: u8 = 5;
const EERIE: u8 = 3;
const EEMPE: u8 = 2;
const EEPE: u8 = 1;
const EERE: u8 = 0;

/// Erase and write in one operation.
const ERASE_AND_WRITE: u8 = 0b00;

/// EEPROM driver.
///
/// Positions wrap at the capacity, which must be a power of two:
///
/// ```compile_fail
/// use drivers::peripheral::eeprom::{Eeprom, EepromRegs};
///
/// common::register! {
///     Eecr: u8 = 0;
///     Eedr: u8 = 0;
///     Eear: u16 = 0;
/// }
///
/// struct Odd;
///
/// impl EepromRegs for Odd {
///     type Eecr = Eecr;
///     type Eedr = Eedr;
///     type Eear = Eear;
///     type Irq = common::interrupt::Interrupts;
///
///     const CAPACITY: u16 = 1000;
/// }
///
/// Eeprom::<Odd>::new().read_byte(0);
/// ```
pub struct Eeprom<R> {
    _regs: PhantomData<R>,
}

impl<R: EepromRegs> Eeprom<R> {
    const POWER_OF_TWO: () = assert!(
        R::CAPACITY.is_power_of_two(),
        "EEPROM capacity must be a power of two"
    );

    pub const fn new() -> Self {
        Self { _regs: PhantomData }
    }

    /// Size in bytes.
    pub const fn capacity(&self) -> u16 {
        R::CAPACITY
    }

    fn address(pos: u16) -> u16 {
        let () = Self::POWER_OF_TWO;
        pos & (R::CAPACITY - 1)
    }

    /// Whether a write is still in progress.
    pub fn is_busy(&self) -> bool {
        Bit::<R::Eecr, EEPE>::read()
    }

    fn wait_ready(&self) {
        while self.is_busy() {
            core::hint::spin_loop();
        }
    }

    /// Read the byte at `pos`.
    pub fn read_byte(&self, pos: u16) -> u8 {
        self.wait_ready();
        R::Eear::write(Self::address(pos));
        Bit::<R::Eecr, EERE>::set();
        R::Eedr::read()
    }

    /// Erase and write the byte at `pos`.
    pub fn write_byte(&mut self, pos: u16, byte: u8) {
        self.wait_ready();
        R::Eear::write(Self::address(pos));
        R::Eedr::write(byte);
        BitGroup::<R::Eecr, EEPM_LO, EEPM_HI, u8>::write_raw(ERASE_AND_WRITE);

        // EEPE must follow EEMPE within four cycles: two plain stores
        let _cs = CriticalSection::<R::Irq>::new();
        let eecr = R::Eecr::read() | (1 << EEMPE);
        R::Eecr::write(eecr);
        R::Eecr::write(eecr | (1 << EEPE));
    }

    /// Fill `buffer` from consecutive positions starting at `pos`.
    pub fn read(&self, pos: u16, buffer: &mut [u8]) {
        let mut at = pos;
        for byte in buffer.iter_mut() {
            *byte = self.read_byte(at);
            at = at.wrapping_add(1);
        }
    }

    /// Write `data` to consecutive positions starting at `pos`.
    pub fn write(&mut self, pos: u16, data: &[u8]) {
        log::trace!("eeprom: {} bytes at {:#05x}", data.len(), Self::address(pos));
        let mut at = pos;
        for &byte in data {
            self.write_byte(at, byte);
            at = at.wrapping_add(1);
        }
    }

    /// Enable the ready interrupt, raised while no write is in progress.
    pub fn enable_ready_interrupt(&mut self) {
        Bit::<R::Eecr, EERIE>::set();
    }

    pub fn disable_ready_interrupt(&mut self) {
        Bit::<R::Eecr, EERIE>::clear();
    }
}

impl<R: EepromRegs> Default for Eeprom<R> {
    fn default() -> Self {
        Self::new()
    }
}
