//! Timer/counter driver.
//!
//! One driver covers the 8-bit timers (Timer0, Timer2) and the 16-bit
//! Timer1. What differs between them is carried by [`TimerRegs`]:
//!
//! - the counter width (`Value`)
//! - the clock select encoding (Timer2 has a different prescaler ladder)
//! - the waveform generation mode, three bits on the 8-bit timers and four on
//!   Timer1, split across both control registers in either case
//!
//! The control registers share one layout: compare output modes in
//! `TCCRnA[7:4]`, the low waveform bits in `TCCRnA[1:0]`, the clock select
//! in `TCCRnB[2:0]`, and interrupt enables and flags at the same positions in
//! `TIMSKn`/`TIFRn`.

use core::marker::PhantomData;

use common::field_enum;
use common::reg::{Bit, BitGroup, Composite, Field, FieldValue, Part, RegValue, Register};

/// Registers of one timer/counter.
pub trait TimerRegs {
    /// Counter width.
    type Value: RegValue;

    /// Control register A (`TCCRnA`).
    type Tccra: Register<Value = u8>;
    /// Control register B (`TCCRnB`).
    type Tccrb: Register<Value = u8>;
    /// Counter (`TCNTn`).
    type Tcnt: Register<Value = Self::Value>;
    /// Output compare A (`OCRnA`).
    type Ocra: Register<Value = Self::Value>;
    /// Output compare B (`OCRnB`).
    type Ocrb: Register<Value = Self::Value>;
    /// Interrupt mask (`TIMSKn`).
    type Timsk: Register<Value = u8>;
    /// Interrupt flags (`TIFRn`).
    type Tifr: Register<Value = u8>;

    /// Clock select field, `TCCRnB[2:0]`.
    type ClockSelect: Field;
    /// Waveform generation mode field.
    type Waveform: Field;
}

/// Timer1 input capture unit.
pub trait CaptureRegs: TimerRegs {
    /// Input capture register (`ICR1`).
    type Icr: Register<Value = Self::Value>;
}

// TCCRnA
const COMA_LO: u8 = 6;
const COMA_HI: u8 = 7;
const COMB_LO: u8 = 4;
const COMB_HI: u8 = 5;

// TCCRnB
const ICNC: u8 = 7;
const ICES: u8 = 6;
const CS_HI: u8 = 2;

// TIMSKn
const ICIE: u8 = 5;
const OCIEB: u8 = 2;
const OCIEA: u8 = 1;
const TOIE: u8 = 0;

// TIFRn
const ICF: u8 = 5;
const OCFB: u8 = 2;
const OCFA: u8 = 1;
const TOV: u8 = 0;

field_enum! {
    /// Timer0 and Timer1 clock source (`CSn2:0`).
    pub struct Prescaler: 3 {
        STOPPED = 0b000,
        DIV_1 = 0b001,
        DIV_8 = 0b010,
        DIV_64 = 0b011,
        DIV_256 = 0b100,
        DIV_1024 = 0b101,
        /// External clock on the Tn pin, falling edge.
        EXTERNAL_FALLING = 0b110,
        /// External clock on the Tn pin, rising edge.
        EXTERNAL_RISING = 0b111,
    }
}

field_enum! {
    /// Timer2 clock source (`CS22:0`).
    pub struct Prescaler2: 3 {
        STOPPED = 0b000,
        DIV_1 = 0b001,
        DIV_8 = 0b010,
        DIV_32 = 0b011,
        DIV_64 = 0b100,
        DIV_128 = 0b101,
        DIV_256 = 0b110,
        DIV_1024 = 0b111,
    }
}

field_enum! {
    /// 8-bit timer waveform generation mode (`WGMn2:0`).
    pub struct Waveform8: 3 {
        NORMAL = 0b000,
        /// Phase correct PWM, TOP = 0xFF.
        PWM_PHASE_CORRECT = 0b001,
        /// Clear timer on compare match, TOP = OCRA.
        CTC = 0b010,
        /// Fast PWM, TOP = 0xFF.
        FAST_PWM = 0b011,
        /// Phase correct PWM, TOP = OCRA.
        PWM_PHASE_CORRECT_OCRA = 0b101,
        /// Fast PWM, TOP = OCRA.
        FAST_PWM_OCRA = 0b111,
    }
}

field_enum! {
    /// Timer1 waveform generation mode (`WGM13:0`).
    pub struct Waveform16: 4 {
        NORMAL = 0b0000,
        PWM_PHASE_CORRECT_8 = 0b0001,
        PWM_PHASE_CORRECT_9 = 0b0010,
        PWM_PHASE_CORRECT_10 = 0b0011,
        /// Clear timer on compare match, TOP = OCR1A.
        CTC_OCRA = 0b0100,
        FAST_PWM_8 = 0b0101,
        FAST_PWM_9 = 0b0110,
        FAST_PWM_10 = 0b0111,
        PWM_PHASE_FREQ_CORRECT_ICR = 0b1000,
        PWM_PHASE_FREQ_CORRECT_OCRA = 0b1001,
        PWM_PHASE_CORRECT_ICR = 0b1010,
        PWM_PHASE_CORRECT_OCRA = 0b1011,
        /// Clear timer on compare match, TOP = ICR1.
        CTC_ICR = 0b1100,
        FAST_PWM_ICR = 0b1110,
        FAST_PWM_OCRA = 0b1111,
    }
}

field_enum! {
    /// Compare output mode (`COMnx1:0`).
    ///
    /// The meaning of `TOGGLE` and the PWM polarity of `CLEAR`/`SET` depend
    /// on the waveform mode.
    pub struct CompareOutput: 2 {
        DISCONNECTED = 0b00,
        TOGGLE = 0b01,
        CLEAR = 0b10,
        SET = 0b11,
    }
}

/// Waveform field of an 8-bit timer: `WGMn1:0` in A, `WGMn2` at B bit 3.
pub type Wgm8<A, B> = Composite<(Part<BitGroup<A, 0, 1, u8>, 0>, Part<Bit<B, 3>, 2>), Waveform8>;

/// Waveform field of Timer1: `WGM11:10` in A, `WGM13:12` in B bits 4:3.
pub type Wgm16<A, B> =
    Composite<(Part<BitGroup<A, 0, 1, u8>, 0>, Part<BitGroup<B, 3, 4, u8>, 2>), Waveform16>;

/// Clock select field in control register `B`.
pub type ClockSelectField<B, V> = BitGroup<B, 0, CS_HI, V>;

/// Waveform mode type of timer `R`.
pub type WaveformOf<R> = <<R as TimerRegs>::Waveform as Field>::Value;

/// Clock select type of timer `R`.
pub type ClockOf<R> = <<R as TimerRegs>::ClockSelect as Field>::Value;

/// Timer configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimerConfig<W, C> {
    pub waveform: W,
    pub clock: C,
    pub compare_a: CompareOutput,
    pub compare_b: CompareOutput,
    pub overflow_interrupt: bool,
}

impl<W, C> TimerConfig<W, C> {
    /// Outputs disconnected, no interrupts.
    pub const fn new(waveform: W, clock: C) -> Self {
        Self {
            waveform,
            clock,
            compare_a: CompareOutput::DISCONNECTED,
            compare_b: CompareOutput::DISCONNECTED,
            overflow_interrupt: false,
        }
    }
}

/// Timer/counter driver.
pub struct Timer<R> {
    _regs: PhantomData<R>,
}

impl<R: TimerRegs> Timer<R> {
    pub const fn new() -> Self {
        Self { _regs: PhantomData }
    }

    /// Stop the timer, apply `config`, zero the counter and start the clock.
    pub fn init(&mut self, config: TimerConfig<WaveformOf<R>, ClockOf<R>>) {
        self.stop();
        self.set_compare_output_a(config.compare_a);
        self.set_compare_output_b(config.compare_b);
        self.set_waveform(config.waveform);
        if config.overflow_interrupt {
            self.enable_overflow_interrupt();
        } else {
            self.disable_overflow_interrupt();
        }
        self.set_counter(<R::Value as RegValue>::from_u16(0));
        self.set_clock(config.clock);

        log::debug!(
            "timer: mode {:?}, clock {:?}, outputs {:?}/{:?}",
            config.waveform,
            config.clock,
            config.compare_a,
            config.compare_b
        );
    }

    pub fn set_waveform(&mut self, mode: WaveformOf<R>) {
        R::Waveform::write(mode);
    }

    pub fn waveform(&self) -> WaveformOf<R> {
        R::Waveform::read()
    }

    /// Select the clock source; any value but `STOPPED` runs the counter.
    pub fn set_clock(&mut self, clock: ClockOf<R>) {
        R::ClockSelect::write(clock);
    }

    pub fn clock(&self) -> ClockOf<R> {
        R::ClockSelect::read()
    }

    /// Remove the clock source.
    pub fn stop(&mut self) {
        R::ClockSelect::write(FieldValue::from_bits(0));
    }

    pub fn set_compare_output_a(&mut self, mode: CompareOutput) {
        BitGroup::<R::Tccra, COMA_LO, COMA_HI, CompareOutput>::write(mode);
    }

    pub fn set_compare_output_b(&mut self, mode: CompareOutput) {
        BitGroup::<R::Tccra, COMB_LO, COMB_HI, CompareOutput>::write(mode);
    }

    pub fn counter(&self) -> R::Value {
        R::Tcnt::read()
    }

    pub fn set_counter(&mut self, value: R::Value) {
        R::Tcnt::write(value);
    }

    pub fn compare_a(&self) -> R::Value {
        R::Ocra::read()
    }

    pub fn set_compare_a(&mut self, value: R::Value) {
        R::Ocra::write(value);
    }

    pub fn compare_b(&self) -> R::Value {
        R::Ocrb::read()
    }

    pub fn set_compare_b(&mut self, value: R::Value) {
        R::Ocrb::write(value);
    }

    pub fn enable_overflow_interrupt(&mut self) {
        Bit::<R::Timsk, TOIE>::set();
    }

    pub fn disable_overflow_interrupt(&mut self) {
        Bit::<R::Timsk, TOIE>::clear();
    }

    pub fn enable_compare_a_interrupt(&mut self) {
        Bit::<R::Timsk, OCIEA>::set();
    }

    pub fn disable_compare_a_interrupt(&mut self) {
        Bit::<R::Timsk, OCIEA>::clear();
    }

    pub fn enable_compare_b_interrupt(&mut self) {
        Bit::<R::Timsk, OCIEB>::set();
    }

    pub fn disable_compare_b_interrupt(&mut self) {
        Bit::<R::Timsk, OCIEB>::clear();
    }

    /// Whether the counter has overflowed since the flag was last cleared.
    pub fn overflowed(&self) -> bool {
        Bit::<R::Tifr, TOV>::read()
    }

    pub fn clear_overflow(&mut self) {
        Bit::<R::Tifr, TOV>::acknowledge();
    }

    pub fn compare_a_matched(&self) -> bool {
        Bit::<R::Tifr, OCFA>::read()
    }

    pub fn clear_compare_a(&mut self) {
        Bit::<R::Tifr, OCFA>::acknowledge();
    }

    pub fn compare_b_matched(&self) -> bool {
        Bit::<R::Tifr, OCFB>::read()
    }

    pub fn clear_compare_b(&mut self) {
        Bit::<R::Tifr, OCFB>::acknowledge();
    }
}

impl<R: CaptureRegs> Timer<R> {
    pub fn input_capture(&self) -> R::Value {
        R::Icr::read()
    }

    /// Set TOP for the ICR1-based waveform modes.
    pub fn set_input_capture(&mut self, value: R::Value) {
        R::Icr::write(value);
    }

    /// Capture on the rising edge of ICP1 instead of the falling one.
    pub fn set_capture_rising_edge(&mut self, rising: bool) {
        Bit::<R::Tccrb, ICES>::write(rising);
    }

    /// Filter ICP1 over four samples before capturing.
    pub fn set_noise_canceler(&mut self, enabled: bool) {
        Bit::<R::Tccrb, ICNC>::write(enabled);
    }

    pub fn enable_capture_interrupt(&mut self) {
        Bit::<R::Timsk, ICIE>::set();
    }

    pub fn disable_capture_interrupt(&mut self) {
        Bit::<R::Timsk, ICIE>::clear();
    }

    pub fn captured(&self) -> bool {
        Bit::<R::Tifr, ICF>::read()
    }

    pub fn clear_capture(&mut self) {
        Bit::<R::Tifr, ICF>::acknowledge();
    }
}

impl<R: TimerRegs> Default for Timer<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! sim_timer8 {
        ($name:ident, $clock:ty) => {
            common::register! {
                Tccra: u8 = 0;
                Tccrb: u8 = 0;
                Tcnt: u8 = 0x7F;
                Ocra: u8 = 0;
                Ocrb: u8 = 0;
                Timsk: u8 = 0;
                Tifr: u8 = 0;
            }

            struct $name;

            impl TimerRegs for $name {
                type Value = u8;
                type Tccra = Tccra;
                type Tccrb = Tccrb;
                type Tcnt = Tcnt;
                type Ocra = Ocra;
                type Ocrb = Ocrb;
                type Timsk = Timsk;
                type Tifr = Tifr;
                type ClockSelect = ClockSelectField<Tccrb, $clock>;
                type Waveform = Wgm8<Tccra, Tccrb>;
            }
        };
    }

    macro_rules! sim_timer16 {
        ($name:ident) => {
            common::register! {
                Tccra: u8 = 0;
                Tccrb: u8 = 0;
                Tcnt: u16 = 0x1234;
                Ocra: u16 = 0;
                Ocrb: u16 = 0;
                Icr: u16 = 0;
                Timsk: u8 = 0;
                Tifr: u8 = 0;
            }

            struct $name;

            impl TimerRegs for $name {
                type Value = u16;
                type Tccra = Tccra;
                type Tccrb = Tccrb;
                type Tcnt = Tcnt;
                type Ocra = Ocra;
                type Ocrb = Ocrb;
                type Timsk = Timsk;
                type Tifr = Tifr;
                type ClockSelect = ClockSelectField<Tccrb, Prescaler>;
                type Waveform = Wgm16<Tccra, Tccrb>;
            }

            impl CaptureRegs for $name {
                type Icr = Icr;
            }
        };
    }

    #[test]
    fn eight_bit_fast_pwm() {
        sim_timer8!(T0, Prescaler);
        let mut timer = Timer::<T0>::new();

        timer.init(TimerConfig {
            compare_a: CompareOutput::CLEAR,
            overflow_interrupt: true,
            ..TimerConfig::new(Waveform8::FAST_PWM_OCRA, Prescaler::DIV_64)
        });
        assert_eq!(Tccra::read(), 0b1000_0011);
        assert_eq!(Tccrb::read(), 0b0000_1011);
        assert_eq!(Timsk::read(), 0b0000_0001);
        assert_eq!(Tcnt::read(), 0);
        assert_eq!(timer.waveform(), Waveform8::FAST_PWM_OCRA);
        assert_eq!(timer.clock(), Prescaler::DIV_64);
    }

    #[test]
    fn stop_keeps_waveform() {
        sim_timer8!(T0, Prescaler);
        let mut timer = Timer::<T0>::new();

        timer.init(TimerConfig::new(Waveform8::CTC, Prescaler::DIV_1024));
        timer.stop();
        assert_eq!(timer.clock(), Prescaler::STOPPED);
        assert_eq!(timer.waveform(), Waveform8::CTC);
        assert_eq!(Tccra::read(), 0b10);
    }

    #[test]
    fn timer2_prescaler_ladder() {
        sim_timer8!(T2, Prescaler2);
        let mut timer = Timer::<T2>::new();

        timer.set_clock(Prescaler2::DIV_128);
        assert_eq!(Tccrb::read(), 0b101);
        assert_eq!(timer.clock(), Prescaler2::DIV_128);
    }

    #[test]
    fn counter_and_compare_registers() {
        sim_timer8!(T0, Prescaler);
        let mut timer = Timer::<T0>::new();

        assert_eq!(timer.counter(), 0x7F);
        timer.set_counter(3);
        timer.set_compare_a(200);
        timer.set_compare_b(100);
        assert_eq!(timer.counter(), 3);
        assert_eq!(timer.compare_a(), 200);
        assert_eq!(timer.compare_b(), 100);
    }

    #[test]
    fn interrupt_enables_and_flags() {
        sim_timer8!(T0, Prescaler);
        let mut timer = Timer::<T0>::new();

        timer.enable_compare_a_interrupt();
        timer.enable_compare_b_interrupt();
        timer.enable_overflow_interrupt();
        assert_eq!(Timsk::read(), 0b111);
        timer.disable_compare_b_interrupt();
        timer.disable_compare_a_interrupt();
        assert_eq!(Timsk::read(), 0b001);

        Tifr::write(0b111);
        assert!(timer.overflowed());
        assert!(timer.compare_a_matched());
        assert!(timer.compare_b_matched());
        timer.clear_compare_a();
        assert_eq!(Tifr::read(), 0b010);
    }

    #[test]
    fn sixteen_bit_mode_reaches_control_b() {
        sim_timer16!(T1);
        let mut timer = Timer::<T1>::new();

        timer.init(TimerConfig {
            compare_b: CompareOutput::SET,
            ..TimerConfig::new(Waveform16::FAST_PWM_ICR, Prescaler::DIV_8)
        });
        assert_eq!(Tccra::read(), 0b0011_0010);
        assert_eq!(Tccrb::read(), 0b0001_1010);
        assert_eq!(timer.counter(), 0);

        timer.set_waveform(Waveform16::CTC_OCRA);
        assert_eq!(Tccra::read(), 0b0011_0000);
        assert_eq!(Tccrb::read(), 0b0000_1010);
    }

    #[test]
    fn input_capture_unit() {
        sim_timer16!(T1);
        let mut timer = Timer::<T1>::new();

        timer.set_input_capture(39_999);
        assert_eq!(timer.input_capture(), 39_999);

        timer.set_noise_canceler(true);
        timer.set_capture_rising_edge(true);
        assert_eq!(Tccrb::read(), 0b1100_0000);
        assert_eq!(Tccra::read(), 0);

        timer.enable_capture_interrupt();
        assert_eq!(Timsk::read(), 0b0010_0000);
        Tifr::write(0b0010_0001);
        assert!(timer.captured());
        timer.clear_capture();
        assert_eq!(Tifr::read(), 0b0010_0000);
    }
}
