//! ATmega328P register map and peripheral instances.
//!
//! Addresses are data-space addresses: registers in the I/O range appear
//! 0x20 above their I/O address.

use common::reg::{Bit, BitGroup};
use common::register;

use crate::peripheral::adc::{self, AdcRegs};
use crate::peripheral::eeprom::{self, EepromRegs};
use crate::peripheral::exint::{self, ExtIntLine, SenseControl};
use crate::peripheral::gpio::{self, PortRegs};
use crate::peripheral::spi::{self, SpiRegs};
use crate::peripheral::timer::{
    self, CaptureRegs, ClockSelectField, Prescaler, Prescaler2, TimerRegs, Wgm8, Wgm16,
};
use crate::peripheral::usart::{self, UsartRegs};

register! {
    pub Pinb: u8 @ 0x23;
    pub Ddrb: u8 @ 0x24;
    pub Portb: u8 @ 0x25;
    pub Pinc: u8 @ 0x26;
    pub Ddrc: u8 @ 0x27;
    pub Portc: u8 @ 0x28;
    pub Pind: u8 @ 0x29;
    pub Ddrd: u8 @ 0x2A;
    pub Portd: u8 @ 0x2B;

    pub Tifr0: u8 @ 0x35;
    pub Tifr1: u8 @ 0x36;
    pub Tifr2: u8 @ 0x37;
    pub Eifr: u8 @ 0x3C;
    pub Eimsk: u8 @ 0x3D;

    pub Eecr: u8 @ 0x3F;
    pub Eedr: u8 @ 0x40;
    /// `EEARL`/`EEARH`.
    pub Eear: u16 @ 0x41;

    pub Tccr0a: u8 @ 0x44;
    pub Tccr0b: u8 @ 0x45;
    pub Tcnt0: u8 @ 0x46;
    pub Ocr0a: u8 @ 0x47;
    pub Ocr0b: u8 @ 0x48;

    pub Spcr: u8 @ 0x4C;
    pub Spsr: u8 @ 0x4D;
    pub Spdr: u8 @ 0x4E;

    pub Eicra: u8 @ 0x69;
    pub Timsk0: u8 @ 0x6E;
    pub Timsk1: u8 @ 0x6F;
    pub Timsk2: u8 @ 0x70;

    /// `ADCL`/`ADCH`.
    pub AdcData: u16 @ 0x78;
    pub Adch: u8 @ 0x79;
    pub Adcsra: u8 @ 0x7A;
    pub Adcsrb: u8 @ 0x7B;
    pub Admux: u8 @ 0x7C;
    pub Didr0: u8 @ 0x7E;

    pub Tccr1a: u8 @ 0x80;
    pub Tccr1b: u8 @ 0x81;
    pub Tccr1c: u8 @ 0x82;
    pub Tcnt1: u16 @ 0x84;
    pub Icr1: u16 @ 0x86;
    pub Ocr1a: u16 @ 0x88;
    pub Ocr1b: u16 @ 0x8A;

    pub Tccr2a: u8 @ 0xB0;
    pub Tccr2b: u8 @ 0xB1;
    pub Tcnt2: u8 @ 0xB2;
    pub Ocr2a: u8 @ 0xB3;
    pub Ocr2b: u8 @ 0xB4;

    pub Ucsr0a: u8 @ 0xC0;
    pub Ucsr0b: u8 @ 0xC1;
    pub Ucsr0c: u8 @ 0xC2;
    /// `UBRR0L`/`UBRR0H`.
    pub Ubrr0: u16 @ 0xC4;
    pub Udr0: u8 @ 0xC6;
}

// ============================================================================
// GPIO
// ============================================================================

pub struct PortB;

impl PortRegs for PortB {
    type Pin = Pinb;
    type Ddr = Ddrb;
    type Port = Portb;
}

pub struct PortC;

impl PortRegs for PortC {
    type Pin = Pinc;
    type Ddr = Ddrc;
    type Port = Portc;
}

pub struct PortD;

impl PortRegs for PortD {
    type Pin = Pind;
    type Ddr = Ddrd;
    type Port = Portd;
}

pub type Pb<const N: u8> = gpio::Pin<PortB, N>;
pub type Pc<const N: u8> = gpio::Pin<PortC, N>;
pub type Pd<const N: u8> = gpio::Pin<PortD, N>;

/// On-board LED of an Arduino Uno (digital pin 13).
pub type Led = Pb<5>;

// ============================================================================
// ADC
// ============================================================================

pub struct Adc0;

impl AdcRegs for Adc0 {
    type Admux = Admux;
    type Adcsra = Adcsra;
    type Adcsrb = Adcsrb;
    type Adc = AdcData;
    type Adch = Adch;
    type Didr0 = Didr0;
}

pub type Adc = adc::Adc<Adc0>;
pub type AdcPin<const CH: u8> = adc::AdcPin<Adc0, CH>;

// ============================================================================
// SPI
// ============================================================================

pub struct Spi0;

impl SpiRegs for Spi0 {
    type Spcr = Spcr;
    type Spsr = Spsr;
    type Spdr = Spdr;
    type Ss = Pb<2>;
    type Mosi = Pb<3>;
    type Miso = Pb<4>;
    type Sck = Pb<5>;
}

pub type Spi = spi::Spi<Spi0>;

// ============================================================================
// USART
// ============================================================================

pub struct Usart0Regs;

impl UsartRegs for Usart0Regs {
    type Ucsra = Ucsr0a;
    type Ucsrb = Ucsr0b;
    type Ucsrc = Ucsr0c;
    type Ubrr = Ubrr0;
    type Udr = Udr0;
}

pub type Usart0 = usart::Usart<Usart0Regs>;

// ============================================================================
// Timers
// ============================================================================

pub struct Timer0Regs;

impl TimerRegs for Timer0Regs {
    type Value = u8;
    type Tccra = Tccr0a;
    type Tccrb = Tccr0b;
    type Tcnt = Tcnt0;
    type Ocra = Ocr0a;
    type Ocrb = Ocr0b;
    type Timsk = Timsk0;
    type Tifr = Tifr0;
    type ClockSelect = ClockSelectField<Tccr0b, Prescaler>;
    type Waveform = Wgm8<Tccr0a, Tccr0b>;
}

pub struct Timer1Regs;

impl TimerRegs for Timer1Regs {
    type Value = u16;
    type Tccra = Tccr1a;
    type Tccrb = Tccr1b;
    type Tcnt = Tcnt1;
    type Ocra = Ocr1a;
    type Ocrb = Ocr1b;
    type Timsk = Timsk1;
    type Tifr = Tifr1;
    type ClockSelect = ClockSelectField<Tccr1b, Prescaler>;
    type Waveform = Wgm16<Tccr1a, Tccr1b>;
}

impl CaptureRegs for Timer1Regs {
    type Icr = Icr1;
}

pub struct Timer2Regs;

impl TimerRegs for Timer2Regs {
    type Value = u8;
    type Tccra = Tccr2a;
    type Tccrb = Tccr2b;
    type Tcnt = Tcnt2;
    type Ocra = Ocr2a;
    type Ocrb = Ocr2b;
    type Timsk = Timsk2;
    type Tifr = Tifr2;
    type ClockSelect = ClockSelectField<Tccr2b, Prescaler2>;
    type Waveform = Wgm8<Tccr2a, Tccr2b>;
}

pub type Timer0 = timer::Timer<Timer0Regs>;
pub type Timer1 = timer::Timer<Timer1Regs>;
pub type Timer2 = timer::Timer<Timer2Regs>;

// ============================================================================
// External interrupts
// ============================================================================

pub struct Int0Line;

impl ExtIntLine for Int0Line {
    type Sense = BitGroup<Eicra, 0, 1, SenseControl>;
    type Enable = Bit<Eimsk, 0>;
    type Pending = Bit<Eifr, 0>;
    type Pin = Pd<2>;
}

pub struct Int1Line;

impl ExtIntLine for Int1Line {
    type Sense = BitGroup<Eicra, 2, 3, SenseControl>;
    type Enable = Bit<Eimsk, 1>;
    type Pending = Bit<Eifr, 1>;
    type Pin = Pd<3>;
}

pub type Int0 = exint::ExtInt<Int0Line>;
pub type Int1 = exint::ExtInt<Int1Line>;

// ============================================================================
// EEPROM
// ============================================================================

pub struct Eeprom0;

impl EepromRegs for Eeprom0 {
    type Eecr = Eecr;
    type Eedr = Eedr;
    type Eear = Eear;
    type Irq = common::interrupt::Interrupts;

    const CAPACITY: u16 = 1024;
}

pub type Eeprom = eeprom::Eeprom<Eeprom0>;
