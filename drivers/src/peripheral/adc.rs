//! 10-bit successive approximation ADC.
//!
//! # Features
//!
//! - Reference, prescaler, result alignment and auto trigger configuration
//! - Digital input disable for the analog-only pins ADC0..ADC5
//! - Single conversions on any channel, read as 8 or 16 bits
//! - [`AdcPin`] handles with the channel checked at compile time
//!
//! Conversions are polled: [`Adc::convert`] busy-waits on `ADSC` with no
//! timeout.

use core::marker::PhantomData;

use common::field_enum;
use common::reg::{Bit, BitGroup, Register};

/// ADC registers.
pub trait AdcRegs {
    /// Multiplexer selection (`ADMUX`).
    type Admux: Register<Value = u8>;
    /// Control and status A (`ADCSRA`).
    type Adcsra: Register<Value = u8>;
    /// Control and status B (`ADCSRB`).
    type Adcsrb: Register<Value = u8>;
    /// Full conversion result (`ADCL`/`ADCH` pair).
    type Adc: Register<Value = u16>;
    /// High byte of the result (`ADCH`).
    type Adch: Register<Value = u8>;
    /// Digital input disable (`DIDR0`).
    type Didr0: Register<Value = u8>;
}

// ADMUX
const REFS_LO: u8 = 6;
const REFS_HI: u8 = 7;
const ADLAR: u8 = 5;
const MUX_HI: u8 = 3;

// ADCSRA
const ADEN: u8 = 7;
const ADSC: u8 = 6;
const ADATE: u8 = 5;
const ADIF: u8 = 4;
const ADIE: u8 = 3;
const ADPS_HI: u8 = 2;

// ADCSRB
const ADTS_HI: u8 = 2;

field_enum! {
    /// Voltage reference (`REFS1:0`).
    pub struct Reference: 2 {
        /// External voltage on the AREF pin.
        AREF = 0b00,
        /// AVCC with a capacitor on AREF.
        AVCC = 0b01,
        /// Internal 1.1 V bandgap.
        INTERNAL_1V1 = 0b11,
    }
}

field_enum! {
    /// ADC clock division factor (`ADPS2:0`).
    pub struct Prescaler: 3 {
        DIV_2 = 0b001,
        DIV_4 = 0b010,
        DIV_8 = 0b011,
        DIV_16 = 0b100,
        DIV_32 = 0b101,
        DIV_64 = 0b110,
        DIV_128 = 0b111,
    }
}

field_enum! {
    /// Auto trigger source (`ADTS2:0`).
    pub struct TriggerSource: 3 {
        FREE_RUNNING = 0b000,
        ANALOG_COMPARATOR = 0b001,
        EXTERNAL_INT0 = 0b010,
        TIMER0_COMPARE_A = 0b011,
        TIMER0_OVERFLOW = 0b100,
        TIMER1_COMPARE_B = 0b101,
        TIMER1_OVERFLOW = 0b110,
        TIMER1_CAPTURE = 0b111,
    }
}

field_enum! {
    /// Analog input channel (`MUX3:0`).
    pub struct Channel: 4 {
        ADC0 = 0,
        ADC1 = 1,
        ADC2 = 2,
        ADC3 = 3,
        ADC4 = 4,
        ADC5 = 5,
        ADC6 = 6,
        ADC7 = 7,
        /// Internal temperature sensor.
        ADC8 = 8,
        /// 1.1 V bandgap reference.
        VBG = 14,
        /// Ground.
        GND = 15,
    }
}

bitflags::bitflags! {
    /// Pins whose digital input buffer is switched off (`DIDR0`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AnalogInputs: u8 {
        const ADC0 = 1 << 0;
        const ADC1 = 1 << 1;
        const ADC2 = 1 << 2;
        const ADC3 = 1 << 3;
        const ADC4 = 1 << 4;
        const ADC5 = 1 << 5;
    }
}

/// ADC configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AdcConfig {
    pub reference: Reference,
    pub prescaler: Prescaler,
    /// Left-align the result so `ADCH` holds the top 8 bits.
    pub left_adjust: bool,
    /// Enable the conversion complete interrupt.
    pub interrupt: bool,
    /// Start conversions on this trigger instead of on request.
    pub auto_trigger: Option<TriggerSource>,
    pub digital_disable: AnalogInputs,
}

impl AdcConfig {
    /// AVCC reference, clock divided by 128, right-aligned result.
    ///
    /// At 16 MHz the divided clock is 125 kHz, inside the 50 to 200 kHz
    /// range needed for full resolution.
    pub const fn new() -> Self {
        Self {
            reference: Reference::AVCC,
            prescaler: Prescaler::DIV_128,
            left_adjust: false,
            interrupt: false,
            auto_trigger: None,
            digital_disable: AnalogInputs::empty(),
        }
    }
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Width in which a conversion result is read.
pub trait Sample: Sized {
    fn fetch<R: AdcRegs>() -> Self;
}

/// The high byte only; pair with `left_adjust` for an 8-bit reading.
impl Sample for u8 {
    fn fetch<R: AdcRegs>() -> Self {
        R::Adch::read()
    }
}

/// The full 16-bit result register.
impl Sample for u16 {
    fn fetch<R: AdcRegs>() -> Self {
        R::Adc::read()
    }
}

/// ADC driver.
pub struct Adc<R> {
    _regs: PhantomData<R>,
}

impl<R: AdcRegs> Adc<R> {
    pub const fn new() -> Self {
        Self { _regs: PhantomData }
    }

    /// Apply `config` and power the converter up.
    pub fn init(&mut self, config: AdcConfig) {
        BitGroup::<R::Admux, REFS_LO, REFS_HI, Reference>::write(config.reference);
        Bit::<R::Admux, ADLAR>::write(config.left_adjust);

        R::Didr0::write(config.digital_disable.bits());

        BitGroup::<R::Adcsra, 0, ADPS_HI, Prescaler>::write(config.prescaler);
        Bit::<R::Adcsra, ADIE>::write(config.interrupt);
        match config.auto_trigger {
            Some(source) => {
                BitGroup::<R::Adcsrb, 0, ADTS_HI, TriggerSource>::write(source);
                Bit::<R::Adcsra, ADATE>::set();
            }
            None => Bit::<R::Adcsra, ADATE>::clear(),
        }
        Bit::<R::Adcsra, ADEN>::set();

        log::debug!(
            "adc: ref {:?}, clock {:?}, trigger {:?}",
            config.reference,
            config.prescaler,
            config.auto_trigger
        );
    }

    /// Power the converter down.
    pub fn disable(&mut self) {
        Bit::<R::Adcsra, ADEN>::clear();
    }

    /// Route `channel` to the converter.
    pub fn select(&mut self, channel: Channel) {
        BitGroup::<R::Admux, 0, MUX_HI, Channel>::write(channel);
    }

    pub fn selected(&self) -> Channel {
        BitGroup::<R::Admux, 0, MUX_HI, Channel>::read()
    }

    /// Start a conversion on the selected channel.
    pub fn start(&mut self) {
        Bit::<R::Adcsra, ADSC>::set();
    }

    /// Whether a conversion is in progress.
    pub fn is_busy(&self) -> bool {
        Bit::<R::Adcsra, ADSC>::read()
    }

    /// Spin until the current conversion finishes.
    pub fn wait(&self) {
        while self.is_busy() {
            core::hint::spin_loop();
        }
    }

    /// Result of the last conversion.
    pub fn read<T: Sample>(&self) -> T {
        T::fetch::<R>()
    }

    /// Select `channel`, convert once and return the result.
    pub fn convert<T: Sample>(&mut self, channel: Channel) -> T {
        self.select(channel);
        self.start();
        self.wait();
        self.read()
    }

    /// Clear the conversion complete flag.
    pub fn clear_interrupt(&mut self) {
        Bit::<R::Adcsra, ADIF>::set();
    }
}

impl<R: AdcRegs> Default for Adc<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for analog channel `CH`.
///
/// Only ADC0 to ADC8 can be named:
///
/// ```compile_fail
/// use drivers::hw::device::AdcPin;
/// let mut adc = drivers::hw::device::Adc::new();
/// AdcPin::<9>::read::<u16>(&mut adc);
/// ```
pub struct AdcPin<R, const CH: u8>(PhantomData<R>);

impl<R: AdcRegs, const CH: u8> AdcPin<R, CH> {
    const VALID: () = assert!(CH <= 8, "no such ADC channel");

    /// Channel this handle converts.
    pub const fn channel() -> Channel {
        let () = Self::VALID;
        match CH {
            0 => Channel::ADC0,
            1 => Channel::ADC1,
            2 => Channel::ADC2,
            3 => Channel::ADC3,
            4 => Channel::ADC4,
            5 => Channel::ADC5,
            6 => Channel::ADC6,
            7 => Channel::ADC7,
            _ => Channel::ADC8,
        }
    }

    /// Convert this channel once.
    pub fn read<T: Sample>(adc: &mut Adc<R>) -> T {
        adc.convert(Self::channel())
    }
}
