//! External interrupt pins (INT0, INT1).
//!
//! The two lines share `EICRA`, `EIMSK` and `EIFR` with their bits at
//! different positions, so a line is described by the field types it owns
//! rather than by registers.

use core::marker::PhantomData;

use common::field_enum;
use common::reg::{Field, Flag};

use super::gpio::IoPin;
use crate::hal::gpio::EdgeDetect;

field_enum! {
    /// Interrupt sense control (`ISCn1:0`).
    pub struct SenseControl: 2 {
        /// Low level keeps requesting while it lasts.
        LOW_LEVEL = 0b00,
        ANY_CHANGE = 0b01,
        FALLING = 0b10,
        RISING = 0b11,
    }
}

impl From<EdgeDetect> for SenseControl {
    fn from(edge: EdgeDetect) -> Self {
        match edge {
            EdgeDetect::Rising => SenseControl::RISING,
            EdgeDetect::Falling => SenseControl::FALLING,
            EdgeDetect::Both => SenseControl::ANY_CHANGE,
        }
    }
}

/// Fields and pin belonging to one external interrupt line.
pub trait ExtIntLine {
    /// `ISCn1:0` in `EICRA`.
    type Sense: Field<Value = SenseControl>;
    /// `INTn` in `EIMSK`.
    type Enable: Flag;
    /// `INTFn` in `EIFR`.
    type Pending: Flag;
    /// The pin the line samples.
    type Pin: IoPin;
}

/// External interrupt driver.
pub struct ExtInt<L> {
    _line: PhantomData<L>,
}

impl<L: ExtIntLine> ExtInt<L> {
    pub const fn new() -> Self {
        Self { _line: PhantomData }
    }

    /// Make the pin an input, set the sense control and clear any stale
    /// request. The line is left disabled.
    pub fn init(&mut self, sense: SenseControl) {
        L::Enable::clear();
        L::Pin::set_as_input();
        L::Sense::write(sense);
        L::Pending::acknowledge();
        log::debug!("exint: sense {:?}", sense);
    }

    pub fn set_sense(&mut self, sense: SenseControl) {
        L::Sense::write(sense);
    }

    pub fn sense(&self) -> SenseControl {
        L::Sense::read()
    }

    pub fn enable(&mut self) {
        L::Enable::set();
    }

    pub fn disable(&mut self) {
        L::Enable::clear();
    }

    pub fn is_enabled(&self) -> bool {
        L::Enable::read()
    }

    /// Whether a request is latched. Low level sensing never latches.
    pub fn is_pending(&self) -> bool {
        L::Pending::read()
    }

    pub fn clear_pending(&mut self) {
        L::Pending::acknowledge();
    }
}

impl<L: ExtIntLine> Default for ExtInt<L> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripheral::gpio::{Pin, tests::sim_port};
    use common::reg::{Bit, BitGroup, Register};

    /// Declare the shared registers plus one line per `Name = n`, laid out
    /// like INTn.
    macro_rules! sim_exint {
        ($($line:ident = $n:literal),+) => {
            sim_port!(PortD);

            common::register! {
                Eicra: u8 = 0;
                Eimsk: u8 = 0;
                Eifr: u8 = 0;
            }

            $(
                struct $line;

                impl ExtIntLine for $line {
                    type Sense = BitGroup<Eicra, { 2 * $n }, { 2 * $n + 1 }, SenseControl>;
                    type Enable = Bit<Eimsk, $n>;
                    type Pending = Bit<Eifr, $n>;
                    type Pin = Pin<PortD, { 2 + $n }>;
                }
            )+
        };
    }

    #[test]
    fn init_configures_pin_and_sense() {
        sim_exint!(Int0 = 0);
        let mut int0 = ExtInt::<Int0>::new();

        SimDdr::write(0xFF);
        Eimsk::write(0b01);
        Eifr::write(0b11);
        int0.init(SenseControl::FALLING);
        assert_eq!(SimDdr::read(), 0b1111_1011);
        assert_eq!(Eicra::read(), 0b10);
        assert_eq!(Eimsk::read(), 0);
        assert_eq!(Eifr::read(), 0b01);
        assert!(!int0.is_enabled());
    }

    #[test]
    fn lines_do_not_interfere() {
        sim_exint!(Int0 = 0, Int1 = 1);
        let mut int0 = ExtInt::<Int0>::new();
        let mut int1 = ExtInt::<Int1>::new();

        int0.set_sense(SenseControl::RISING);
        int1.set_sense(EdgeDetect::Both.into());
        assert_eq!(Eicra::read(), 0b0111);
        assert_eq!(int1.sense(), SenseControl::ANY_CHANGE);

        int1.enable();
        assert_eq!(Eimsk::read(), 0b10);
        int0.enable();
        int1.disable();
        assert_eq!(Eimsk::read(), 0b01);
    }

    #[test]
    fn pending_flag() {
        sim_exint!(Int1 = 1);
        let mut int1 = ExtInt::<Int1>::new();

        Eifr::write(0b10);
        assert!(int1.is_pending());
        int1.clear_pending();
        assert_eq!(Eifr::read(), 0b10);
    }
}
