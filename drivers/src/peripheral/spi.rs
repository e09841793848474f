//! SPI master/slave driver.
//!
//! The clock rate is a 3-bit setting split across two registers: `SPR1:0`
//! in SPCR and the doubling bit `SPI2X` in SPSR. It is handled as one
//! composite field, [`Rate`], so callers never assemble it by hand.
//!
//! Transfers are polled on `SPIF` with no timeout.

use core::marker::PhantomData;

use common::field_enum;
use common::reg::{Bit, BitGroup, Composite, Part, Register};

use super::gpio::IoPin;

/// SPI registers and the four pins the peripheral drives.
pub trait SpiRegs {
    /// Control register (`SPCR`).
    type Spcr: Register<Value = u8>;
    /// Status register (`SPSR`).
    type Spsr: Register<Value = u8>;
    /// Data register (`SPDR`).
    type Spdr: Register<Value = u8>;

    type Ss: IoPin;
    type Mosi: IoPin;
    type Miso: IoPin;
    type Sck: IoPin;
}

// SPCR
const SPIE: u8 = 7;
const SPE: u8 = 6;
const DORD: u8 = 5;
const MSTR: u8 = 4;
const CPOL: u8 = 3;
const CPHA: u8 = 2;

// SPSR
const SPIF: u8 = 7;
const WCOL: u8 = 6;
const SPI2X: u8 = 0;

field_enum! {
    /// SCK frequency as a division of the CPU clock.
    ///
    /// Logical bits 1:0 are `SPR1:0`, bit 2 is `SPI2X`.
    pub struct ClockRate: 3 {
        DIV_4 = 0b000,
        DIV_16 = 0b001,
        DIV_64 = 0b010,
        DIV_128 = 0b011,
        DIV_2 = 0b100,
        DIV_8 = 0b101,
        DIV_32 = 0b110,
        /// Same rate as `DIV_64`, reached through the doubling bit.
        DIV_64_DOUBLED = 0b111,
    }
}

/// Clock rate field of SPI block `R`.
pub type Rate<R> = Composite<
    (
        Part<BitGroup<<R as SpiRegs>::Spcr, 0, 1, u8>, 0>,
        Part<Bit<<R as SpiRegs>::Spsr, SPI2X>, 2>,
    ),
    ClockRate,
>;

/// Bus role.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Role {
    Master,
    Slave,
}

/// Bit order on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DataOrder {
    MsbFirst,
    LsbFirst,
}

/// Clock polarity and phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Idle low, sample on leading edge.
    Mode0,
    /// Idle low, sample on trailing edge.
    Mode1,
    /// Idle high, sample on leading edge.
    Mode2,
    /// Idle high, sample on trailing edge.
    Mode3,
}

impl Mode {
    const fn polarity(self) -> bool {
        matches!(self, Mode::Mode2 | Mode::Mode3)
    }

    const fn phase(self) -> bool {
        matches!(self, Mode::Mode1 | Mode::Mode3)
    }
}

/// SPI configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SpiConfig {
    pub role: Role,
    pub mode: Mode,
    pub data_order: DataOrder,
    /// Ignored by a slave, which is clocked by the master.
    pub clock: ClockRate,
    /// Enable the transfer complete interrupt.
    pub interrupt: bool,
}

impl SpiConfig {
    /// Mode 0, MSB first, polled.
    pub const fn master(clock: ClockRate) -> Self {
        Self {
            role: Role::Master,
            mode: Mode::Mode0,
            data_order: DataOrder::MsbFirst,
            clock,
            interrupt: false,
        }
    }

    /// Mode 0, MSB first, polled.
    pub const fn slave() -> Self {
        Self {
            role: Role::Slave,
            ..Self::master(ClockRate::DIV_4)
        }
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self::master(ClockRate::DIV_16)
    }
}

/// SPI driver.
pub struct Spi<R> {
    _regs: PhantomData<R>,
}

impl<R: SpiRegs> Spi<R> {
    pub const fn new() -> Self {
        Self { _regs: PhantomData }
    }

    /// Set pin directions, apply `config` and enable the peripheral.
    ///
    /// A master drives MOSI, SCK and SS; SS is driven high (deselected) and
    /// must stay an output, or a low level on it would force the peripheral
    /// back to slave mode. SCK and MOSI start low. A slave drives only MISO,
    /// and a transfer flag left over from before init is discarded.
    pub fn init(&mut self, config: SpiConfig) {
        match config.role {
            Role::Master => {
                R::Ss::write(true);
                R::Ss::set_as_output();
                R::Sck::write(false);
                R::Sck::set_as_output();
                R::Mosi::write(false);
                R::Mosi::set_as_output();
                R::Miso::set_as_input();
            }
            Role::Slave => {
                R::Ss::set_as_input();
                R::Mosi::set_as_input();
                R::Sck::set_as_input();
                R::Miso::write(false);
                R::Miso::set_as_output();
            }
        }

        let mut spcr = 1 << SPE;
        if config.interrupt {
            spcr |= 1 << SPIE;
        }
        if config.data_order == DataOrder::LsbFirst {
            spcr |= 1 << DORD;
        }
        if config.role == Role::Master {
            spcr |= 1 << MSTR;
        }
        if config.mode.polarity() {
            spcr |= 1 << CPOL;
        }
        if config.mode.phase() {
            spcr |= 1 << CPHA;
        }
        R::Spcr::write(spcr);
        Rate::<R>::write(config.clock);

        if config.role == Role::Slave {
            // SPIF clears on a read of SPSR followed by a read of SPDR
            let _ = R::Spsr::read();
            let _ = R::Spdr::read();
        }

        log::debug!(
            "spi: {:?} {:?} {:?}, clock {:?}",
            config.role,
            config.mode,
            config.data_order,
            config.clock
        );
    }

    pub fn enable(&mut self) {
        Bit::<R::Spcr, SPE>::set();
    }

    pub fn disable(&mut self) {
        Bit::<R::Spcr, SPE>::clear();
    }

    pub fn enable_interrupt(&mut self) {
        Bit::<R::Spcr, SPIE>::set();
    }

    pub fn disable_interrupt(&mut self) {
        Bit::<R::Spcr, SPIE>::clear();
    }

    pub fn set_clock(&mut self, rate: ClockRate) {
        Rate::<R>::write(rate);
    }

    pub fn clock(&self) -> ClockRate {
        Rate::<R>::read()
    }

    /// Whether the last transfer has completed.
    pub fn is_complete(&self) -> bool {
        Bit::<R::Spsr, SPIF>::read()
    }

    /// Whether `SPDR` was written during a transfer.
    pub fn write_collision(&self) -> bool {
        Bit::<R::Spsr, WCOL>::read()
    }

    fn wait(&self) {
        while !self.is_complete() {
            core::hint::spin_loop();
        }
    }

    /// Shift `byte` out and return the byte shifted in.
    pub fn transfer(&mut self, byte: u8) -> u8 {
        R::Spdr::write(byte);
        self.wait();
        R::Spdr::read()
    }

    /// Shift `byte` out, discarding what comes back.
    pub fn transmit(&mut self, byte: u8) {
        R::Spdr::write(byte);
        self.wait();
    }

    /// Wait for the master to complete a transfer and return the byte.
    pub fn receive(&mut self) -> u8 {
        self.wait();
        R::Spdr::read()
    }

    /// Full-duplex transfer of a buffer in place.
    pub fn transfer_in_place(&mut self, buffer: &mut [u8]) {
        for byte in buffer.iter_mut() {
            *byte = self.transfer(*byte);
        }
    }
}

impl<R: SpiRegs> Default for Spi<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripheral::gpio::{Pin, tests::sim_port};
    use common::reg::Cell;
    use core::ptr::{read_volatile, write_volatile};
    use core::sync::atomic::{AtomicBool, Ordering};

    macro_rules! sim_spi {
        ($name:ident) => {
            sim_port!(PortB);

            common::register! {
                Spcr: u8 = 0;
                Spsr: u8 = 0;
                Spdr: u8 = 0;
            }

            struct $name;

            impl SpiRegs for $name {
                type Spcr = Spcr;
                type Spsr = Spsr;
                type Spdr = Spdr;
                type Ss = Pin<PortB, 2>;
                type Mosi = Pin<PortB, 3>;
                type Miso = Pin<PortB, 4>;
                type Sck = Pin<PortB, 5>;
            }
        };
    }

    #[test]
    fn master_init() {
        sim_spi!(R);
        let mut spi = Spi::<R>::new();

        spi.init(SpiConfig::master(ClockRate::DIV_8));
        assert_eq!(SimDdr::read(), 0b0010_1100);
        assert_eq!(SimPort::read(), 0b0000_0100);
        assert_eq!(Spcr::read(), 0b0101_0001);
        assert_eq!(Spsr::read(), 0b0000_0001);
        assert_eq!(spi.clock(), ClockRate::DIV_8);
    }

    #[test]
    fn master_init_drives_clock_and_data_low() {
        sim_spi!(R);
        let mut spi = Spi::<R>::new();

        SimPort::write(0b0010_1000);
        spi.init(SpiConfig::master(ClockRate::DIV_4));
        assert_eq!(SimPort::read(), 0b0000_0100);
    }

    #[test]
    fn slave_init_discards_stale_transfer() {
        static SPSR_SEEN: AtomicBool = AtomicBool::new(false);

        /// Status register whose SPIF is cleared the way the hardware does.
        struct LatchedSpsr;

        // SAFETY: backed by a static cell that lives for the whole program.
        unsafe impl Register for LatchedSpsr {
            type Value = u8;

            fn ptr() -> *mut u8 {
                static CELL: Cell<u8> = Cell::new(1 << SPIF);
                CELL.as_ptr()
            }

            fn read() -> u8 {
                // SAFETY: see `ptr`.
                let value = unsafe { read_volatile(Self::ptr()) };
                SPSR_SEEN.store(value & (1 << SPIF) != 0, Ordering::Relaxed);
                value
            }
        }

        /// Data register completing the SPIF clear sequence.
        struct LatchedSpdr;

        // SAFETY: backed by a static cell that lives for the whole program.
        unsafe impl Register for LatchedSpdr {
            type Value = u8;

            fn ptr() -> *mut u8 {
                static CELL: Cell<u8> = Cell::new(0xEE);
                CELL.as_ptr()
            }

            fn read() -> u8 {
                if SPSR_SEEN.swap(false, Ordering::Relaxed) {
                    // SAFETY: see `LatchedSpsr::ptr`.
                    unsafe {
                        let spsr = LatchedSpsr::ptr();
                        write_volatile(spsr, read_volatile(spsr) & !(1 << SPIF));
                    }
                }
                // SAFETY: see `ptr`.
                unsafe { read_volatile(Self::ptr()) }
            }
        }

        sim_port!(PortB);
        common::register! {
            Spcr: u8 = 0;
        }

        struct R;

        impl SpiRegs for R {
            type Spcr = Spcr;
            type Spsr = LatchedSpsr;
            type Spdr = LatchedSpdr;
            type Ss = Pin<PortB, 2>;
            type Mosi = Pin<PortB, 3>;
            type Miso = Pin<PortB, 4>;
            type Sck = Pin<PortB, 5>;
        }

        let mut spi = Spi::<R>::new();
        assert!(spi.is_complete());

        SimPort::write(0b0001_0000);
        spi.init(SpiConfig::slave());
        assert!(!spi.is_complete());
        assert_eq!(SimPort::read(), 0);
        assert_eq!(SimDdr::read(), 0b0001_0000);
    }

    #[test]
    fn slave_init_with_options() {
        sim_spi!(R);
        let mut spi = Spi::<R>::new();

        SimDdr::write(0xFF);
        spi.init(SpiConfig {
            mode: Mode::Mode3,
            data_order: DataOrder::LsbFirst,
            interrupt: true,
            ..SpiConfig::slave()
        });
        assert_eq!(SimDdr::read(), 0b1101_0011);
        assert_eq!(Spcr::read(), 0b1110_1100);
    }

    #[test]
    fn clock_rate_spans_two_registers() {
        sim_spi!(R);
        let mut spi = Spi::<R>::new();

        Spcr::write(0b0101_0000);
        Spsr::write(0);
        spi.set_clock(ClockRate::DIV_32);
        assert_eq!(Spcr::read(), 0b0101_0010);
        assert_eq!(Spsr::read(), 0b0000_0001);

        spi.set_clock(ClockRate::DIV_128);
        assert_eq!(Spcr::read(), 0b0101_0011);
        assert_eq!(Spsr::read(), 0);
    }

    #[test]
    fn enable_and_interrupt_bits() {
        sim_spi!(R);
        let mut spi = Spi::<R>::new();

        spi.enable();
        spi.enable_interrupt();
        assert_eq!(Spcr::read(), 0b1100_0000);
        spi.disable_interrupt();
        spi.disable();
        assert_eq!(Spcr::read(), 0);
    }

    #[test]
    fn polled_transfer() {
        sim_spi!(R);
        let mut spi = Spi::<R>::new();

        Spsr::write(1 << SPIF);
        assert!(spi.is_complete());
        assert!(!spi.write_collision());

        // the simulated data register reads back what was written
        assert_eq!(spi.transfer(0x5A), 0x5A);
        spi.transmit(0x11);
        assert_eq!(spi.receive(), 0x11);

        let mut buf = [1, 2, 3];
        spi.transfer_in_place(&mut buf);
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(Spdr::read(), 3);
    }
}
