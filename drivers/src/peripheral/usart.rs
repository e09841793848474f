//! USART driver.
//!
//! # Features
//!
//! - Asynchronous or synchronous frames of 5 to 8 data bits, with optional
//!   parity and one or two stop bits
//! - Baud rate divisor and speed mode picked by [`BaudSettings`]
//! - Polled blocking I/O through [`SerialPort`]
//! - Interrupt enables for receive complete, transmit complete and data
//!   register empty
//!
//! The character size is split across two registers (`UCSZn2` in UCSRnB,
//! `UCSZn1:0` in UCSRnC) and is written as one composite field.
//!
//! # Example
//!
//! ```no_run
//! use drivers::hal::serial::{SerialConfig, SerialPort};
//! use drivers::hw::device::Usart0;
//!
//! let mut uart = Usart0::new(16_000_000);
//! uart.configure(SerialConfig::new_8n1(9600)).unwrap();
//! uart.write(b"Hello, world!\n").unwrap();
//! ```

use core::convert::Infallible;
use core::marker::PhantomData;

use common::baud::BaudSettings;
use common::field_enum;
use common::reg::{Bit, BitGroup, Composite, Part, Register};

use crate::hal::serial::{DataBits, Parity, SerialConfig, SerialPort, StopBits};

/// USART registers.
pub trait UsartRegs {
    /// Control and status A (`UCSRnA`).
    type Ucsra: Register<Value = u8>;
    /// Control and status B (`UCSRnB`).
    type Ucsrb: Register<Value = u8>;
    /// Control and status C (`UCSRnC`).
    type Ucsrc: Register<Value = u8>;
    /// Baud rate register pair (`UBRRn`).
    type Ubrr: Register<Value = u16>;
    /// I/O data register (`UDRn`).
    type Udr: Register<Value = u8>;
}

// UCSRnA
const RXC: u8 = 7;
const TXC: u8 = 6;
const UDRE: u8 = 5;
const FE: u8 = 4;
const DOR: u8 = 3;
const UPE: u8 = 2;
const U2X: u8 = 1;
const MPCM: u8 = 0;

// UCSRnB
const RXEN: u8 = 4;
const TXEN: u8 = 3;
const UCSZ2: u8 = 2;
const INTERRUPT_MASK: u8 = 0b1110_0000;

// UCSRnC
const UMSEL_LO: u8 = 6;
const UMSEL_HI: u8 = 7;
const UPM_LO: u8 = 4;
const UPM_HI: u8 = 5;
const USBS: u8 = 3;
const UCSZ_LO: u8 = 1;
const UCSZ_HI: u8 = 2;
const UCPOL: u8 = 0;

field_enum! {
    /// Operating mode (`UMSELn1:0`).
    pub struct UsartMode: 2 {
        ASYNCHRONOUS = 0b00,
        SYNCHRONOUS = 0b01,
        MASTER_SPI = 0b11,
    }
}

field_enum! {
    /// Data bits per frame (`UCSZn2:0`).
    pub struct CharSize: 3 {
        FIVE = 0b000,
        SIX = 0b001,
        SEVEN = 0b010,
        EIGHT = 0b011,
        NINE = 0b111,
    }
}

field_enum! {
    /// Parity generation and check (`UPMn1:0`).
    pub struct ParityMode: 2 {
        DISABLED = 0b00,
        EVEN = 0b10,
        ODD = 0b11,
    }
}

impl From<DataBits> for CharSize {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => CharSize::FIVE,
            DataBits::Six => CharSize::SIX,
            DataBits::Seven => CharSize::SEVEN,
            DataBits::Eight => CharSize::EIGHT,
        }
    }
}

impl From<Parity> for ParityMode {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => ParityMode::DISABLED,
            Parity::Even => ParityMode::EVEN,
            Parity::Odd => ParityMode::ODD,
        }
    }
}

/// Character size field of USART `R`.
pub type CharSizeField<R> = Composite<
    (
        Part<BitGroup<<R as UsartRegs>::Ucsrc, UCSZ_LO, UCSZ_HI, u8>, 0>,
        Part<Bit<<R as UsartRegs>::Ucsrb, UCSZ2>, 2>,
    ),
    CharSize,
>;

bitflags::bitflags! {
    /// USART interrupt sources, at their `UCSRnB` positions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UsartInterrupts: u8 {
        /// Receive complete.
        const RX_COMPLETE = 1 << 7;
        /// Transmit complete.
        const TX_COMPLETE = 1 << 6;
        /// Data register empty.
        const DATA_EMPTY = 1 << 5;
    }
}

bitflags::bitflags! {
    /// Receive errors for the byte at the head of the receive buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LineErrors: u8 {
        const FRAME = 1 << FE;
        const OVERRUN = 1 << DOR;
        const PARITY = 1 << UPE;
    }
}

/// Full USART configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UsartConfig {
    pub serial: SerialConfig,
    pub mode: UsartMode,
    /// Sample on the falling XCK edge (synchronous mode only).
    pub clock_polarity: bool,
    pub transmitter: bool,
    pub receiver: bool,
    pub interrupts: UsartInterrupts,
}

impl UsartConfig {
    /// Asynchronous, transmitter and receiver on, no interrupts.
    pub const fn new(serial: SerialConfig) -> Self {
        Self {
            serial,
            mode: UsartMode::ASYNCHRONOUS,
            clock_polarity: false,
            transmitter: true,
            receiver: true,
            interrupts: UsartInterrupts::empty(),
        }
    }
}

impl Default for UsartConfig {
    fn default() -> Self {
        Self::new(SerialConfig::default())
    }
}

/// USART driver clocked from a `clock_hz` system clock.
pub struct Usart<R> {
    clock_hz: u32,
    _regs: PhantomData<R>,
}

impl<R: UsartRegs> Usart<R> {
    pub const fn new(clock_hz: u32) -> Self {
        Self {
            clock_hz,
            _regs: PhantomData,
        }
    }

    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Apply `config`: frame format, baud rate, enables and interrupts.
    pub fn init(&mut self, config: UsartConfig) {
        // Stop both directions while the frame format changes.
        R::Ucsrb::modify(|b| b & !((1 << RXEN) | (1 << TXEN)));

        let baud = self.set_baud_rate(config.serial.baud_rate);

        BitGroup::<R::Ucsrc, UMSEL_LO, UMSEL_HI, UsartMode>::write(config.mode);
        BitGroup::<R::Ucsrc, UPM_LO, UPM_HI, ParityMode>::write(config.serial.parity.into());
        Bit::<R::Ucsrc, USBS>::write(config.serial.stop_bits == StopBits::Two);
        Bit::<R::Ucsrc, UCPOL>::write(config.clock_polarity);
        CharSizeField::<R>::write(config.serial.data_bits.into());

        self.set_interrupts(config.interrupts);
        Bit::<R::Ucsrb, TXEN>::write(config.transmitter);
        Bit::<R::Ucsrb, RXEN>::write(config.receiver);

        log::debug!(
            "usart: {} baud -> UBRR {} {:?} ({} permille off), {:?} {:?} {:?}",
            config.serial.baud_rate,
            baud.divisor,
            baud.mode,
            baud.error_permille,
            config.serial.data_bits,
            config.serial.parity,
            config.serial.stop_bits
        );
    }

    /// Program the divisor and speed mode closest to `baud`.
    pub fn set_baud_rate(&mut self, baud: u32) -> BaudSettings {
        let settings = BaudSettings::new(self.clock_hz, baud);
        R::Ubrr::write(settings.divisor);
        Bit::<R::Ucsra, U2X>::write(settings.mode.is_double());
        log::trace!("usart: UBRR {} U2X {}", settings.divisor, settings.mode.is_double());
        settings
    }

    /// Replace the enabled interrupt sources.
    pub fn set_interrupts(&mut self, interrupts: UsartInterrupts) {
        R::Ucsrb::modify(|b| (b & !INTERRUPT_MASK) | interrupts.bits());
    }

    pub fn interrupts(&self) -> UsartInterrupts {
        UsartInterrupts::from_bits_truncate(R::Ucsrb::read())
    }

    /// Store a byte in the transmit buffer without waiting.
    pub fn put(&mut self, byte: u8) {
        R::Udr::write(byte);
    }

    /// Take the byte at the head of the receive buffer without waiting.
    pub fn get(&mut self) -> u8 {
        R::Udr::read()
    }

    /// Enable the data register empty interrupt, so its handler feeds the
    /// transmit buffer.
    pub fn start_transmission(&mut self) {
        self.enable_interrupts(UsartInterrupts::DATA_EMPTY);
    }

    /// Disable the data register empty interrupt.
    pub fn stop_transmission(&mut self) {
        self.disable_interrupts(UsartInterrupts::DATA_EMPTY);
    }

    pub fn enable_interrupts(&mut self, interrupts: UsartInterrupts) {
        R::Ucsrb::modify(|b| b | interrupts.bits());
    }

    pub fn disable_interrupts(&mut self, interrupts: UsartInterrupts) {
        R::Ucsrb::modify(|b| b & !interrupts.bits());
    }

    /// Whether the transmit buffer can take a byte.
    pub fn is_data_empty(&self) -> bool {
        Bit::<R::Ucsra, UDRE>::read()
    }

    /// Whether unread data is in the receive buffer.
    pub fn is_receive_complete(&self) -> bool {
        Bit::<R::Ucsra, RXC>::read()
    }

    /// Whether the last frame has been shifted out.
    pub fn is_transmit_complete(&self) -> bool {
        Bit::<R::Ucsra, TXC>::read()
    }

    /// Clear the transmit complete flag.
    pub fn clear_transmit_complete(&mut self) {
        // U2X and MPCM are settings; every other bit is a flag and is
        // written as 0 so only TXC clears.
        R::Ucsra::modify(|a| (a & ((1 << U2X) | (1 << MPCM))) | (1 << TXC));
    }

    /// Receive errors for the next byte; read before [`get`](Self::get).
    pub fn errors(&self) -> LineErrors {
        LineErrors::from_bits_truncate(R::Ucsra::read())
    }
}

impl<R: UsartRegs> SerialPort for Usart<R> {
    type Error = Infallible;

    fn configure(&mut self, config: SerialConfig) -> Result<(), Infallible> {
        self.init(UsartConfig::new(config));
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Infallible> {
        while !self.is_data_empty() {
            core::hint::spin_loop();
        }
        self.put(byte);
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Infallible> {
        while !self.is_receive_complete() {
            core::hint::spin_loop();
        }
        Ok(self.get())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        while !self.is_data_empty() {
            core::hint::spin_loop();
        }
        Ok(())
    }

    fn is_busy(&self) -> bool {
        !self.is_data_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::serial::SerialWriter;
    use core::fmt::Write;
    use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

    const F_CPU: u32 = 16_000_000;

    macro_rules! sim_usart {
        ($name:ident) => {
            common::register! {
                Ucsra: u8 = 0b0010_0000;
                Ucsrb: u8 = 0;
                Ucsrc: u8 = 0b0000_0110;
                Ubrr: u16 = 0;
                Udr: u8 = 0;
            }

            struct $name;

            impl UsartRegs for $name {
                type Ucsra = Ucsra;
                type Ucsrb = Ucsrb;
                type Ucsrc = Ucsrc;
                type Ubrr = Ubrr;
                type Udr = Udr;
            }
        };
    }

    #[test]
    fn configure_8n1_9600() {
        sim_usart!(R);
        let mut uart = Usart::<R>::new(F_CPU);

        uart.configure(SerialConfig::new_8n1(9600)).unwrap();
        assert_eq!(Ubrr::read(), 103);
        assert_eq!(Ucsra::read() & (1 << U2X), 0);
        assert_eq!(Ucsrb::read(), (1 << RXEN) | (1 << TXEN));
        assert_eq!(Ucsrc::read(), 0b0000_0110);
    }

    #[test]
    fn high_rate_uses_double_speed() {
        sim_usart!(R);
        let mut uart = Usart::<R>::new(F_CPU);

        let baud = uart.set_baud_rate(115_200);
        assert_eq!(baud.divisor, 16);
        assert_eq!(Ubrr::read(), 16);
        assert_ne!(Ucsra::read() & (1 << U2X), 0);

        uart.set_baud_rate(9600);
        assert_eq!(Ucsra::read() & (1 << U2X), 0);
    }

    #[test]
    fn slow_rate_fits_the_divisor_register() {
        sim_usart!(R);
        let mut uart = Usart::<R>::new(F_CPU);

        let baud = uart.set_baud_rate(200);
        assert_eq!(Ubrr::read(), 0x0FFF);
        assert_eq!(baud.divisor, 0x0FFF);
        assert_eq!(baud.error_permille, 220);
        assert_eq!(Ucsra::read() & (1 << U2X), 0);
    }

    #[test]
    fn frame_format() {
        sim_usart!(R);
        let mut uart = Usart::<R>::new(F_CPU);

        uart.init(UsartConfig {
            serial: SerialConfig {
                baud_rate: 9600,
                data_bits: DataBits::Five,
                parity: Parity::Odd,
                stop_bits: StopBits::Two,
            },
            receiver: false,
            ..UsartConfig::default()
        });
        assert_eq!(Ucsrc::read(), 0b0011_1000);
        assert_eq!(Ucsrb::read(), 1 << TXEN);
        assert_eq!(CharSizeField::<R>::read(), CharSize::FIVE);

        uart.init(UsartConfig {
            mode: UsartMode::SYNCHRONOUS,
            clock_polarity: true,
            ..UsartConfig::new(SerialConfig {
                data_bits: DataBits::Seven,
                parity: Parity::Even,
                ..SerialConfig::new_8n1(9600)
            })
        });
        assert_eq!(Ucsrc::read(), 0b0110_0101);
    }

    #[test]
    fn nine_bit_size_reaches_control_b() {
        sim_usart!(R);

        CharSizeField::<R>::write(CharSize::NINE);
        assert_eq!(Ucsrb::read(), 1 << UCSZ2);
        assert_eq!(Ucsrc::read(), 0b0000_0110);
        CharSizeField::<R>::write(CharSize::EIGHT);
        assert_eq!(Ucsrb::read(), 0);
    }

    #[test]
    fn interrupt_enables() {
        sim_usart!(R);
        let mut uart = Usart::<R>::new(F_CPU);

        uart.configure(SerialConfig::default()).unwrap();
        uart.start_transmission();
        assert_eq!(uart.interrupts(), UsartInterrupts::DATA_EMPTY);
        uart.enable_interrupts(UsartInterrupts::RX_COMPLETE);
        assert_eq!(Ucsrb::read(), 0b1011_1000);
        uart.stop_transmission();
        assert_eq!(uart.interrupts(), UsartInterrupts::RX_COMPLETE);

        uart.set_interrupts(UsartInterrupts::TX_COMPLETE);
        assert_eq!(Ucsrb::read(), 0b0101_1000);
    }

    #[test]
    fn polled_io() {
        sim_usart!(R);
        let mut uart = Usart::<R>::new(F_CPU);

        Ucsra::write((1 << UDRE) | (1 << RXC));
        assert!(!uart.is_busy());

        uart.write_byte(b'x').unwrap();
        assert_eq!(Udr::read(), b'x');
        assert_eq!(uart.read_byte(), Ok(b'x'));

        assert_eq!(SerialPort::write(&mut uart, b"abc"), Ok(3));
        let mut buf = [0u8; 2];
        assert_eq!(SerialPort::read(&mut uart, &mut buf), Ok(2));
        assert_eq!(buf, [b'c', b'c']);
        uart.flush().unwrap();
    }

    #[test]
    fn writer_translates_newlines() {
        static SENT: [AtomicU8; 8] = [const { AtomicU8::new(0) }; 8];
        static COUNT: AtomicUsize = AtomicUsize::new(0);

        /// Data register that keeps every byte written to it.
        struct TxLog;

        // SAFETY: backed by a static cell that lives for the whole program.
        unsafe impl Register for TxLog {
            type Value = u8;

            fn ptr() -> *mut u8 {
                static CELL: common::reg::Cell<u8> = common::reg::Cell::new(0);
                CELL.as_ptr()
            }

            fn write(value: u8) {
                let at = COUNT.fetch_add(1, Ordering::Relaxed);
                SENT[at].store(value, Ordering::Relaxed);
            }
        }

        common::register! {
            Ucsra: u8 = 1 << UDRE;
            Ucsrb: u8 = 0;
            Ucsrc: u8 = 0;
            Ubrr: u16 = 0;
        }

        struct R;

        impl UsartRegs for R {
            type Ucsra = Ucsra;
            type Ucsrb = Ucsrb;
            type Ucsrc = Ucsrc;
            type Ubrr = Ubrr;
            type Udr = TxLog;
        }

        let mut writer = SerialWriter(Usart::<R>::new(F_CPU));
        writeln!(writer, "ok").unwrap();
        writer.write_str("\n").unwrap();

        let count = COUNT.load(Ordering::Relaxed);
        let sent: [u8; 6] = core::array::from_fn(|i| SENT[i].load(Ordering::Relaxed));
        assert_eq!(count, 6);
        assert_eq!(&sent, b"ok\r\n\r\n");
    }

    #[test]
    fn status_flags() {
        sim_usart!(R);
        let mut uart = Usart::<R>::new(F_CPU);

        Ucsra::write((1 << FE) | (1 << DOR) | (1 << U2X) | (1 << TXC));
        assert_eq!(uart.errors(), LineErrors::FRAME | LineErrors::OVERRUN);
        assert!(uart.is_transmit_complete());

        uart.clear_transmit_complete();
        assert_eq!(Ucsra::read(), (1 << U2X) | (1 << TXC));
    }
}
