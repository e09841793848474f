//! USART clock divisor selection.
//!
//! The USART derives its bit clock from the CPU clock through a divisor
//! register and samples each bit either 16 times (single speed) or 8 times
//! (double speed). For a requested rate both modes are evaluated, each with
//! the divisor rounded to the nearest integer, and the mode whose achieved
//! rate deviates least from the request wins. Ties go to single speed,
//! which samples more and tolerates more receiver drift.
//!
//! Everything here is `const fn`; with constant inputs the whole search
//! folds away:
//!
//! ```
//! use common::baud::{BaudSettings, SpeedMode};
//!
//! const UART: BaudSettings = BaudSettings::new(16_000_000, 9600);
//! assert_eq!(UART.divisor, 103);
//! assert_eq!(UART.mode, SpeedMode::Single);
//! ```
//!
//! Inputs are never rejected. A zero rate or a rate the clock cannot reach
//! produces a divisor of 0 and a large error rather than a failure. A rate
//! too slow for the 12-bit divisor register gets [`MAX_DIVISOR`] and the
//! error that divisor actually produces.

/// Largest value the 12-bit baud rate register holds.
pub const MAX_DIVISOR: u16 = 0x0FFF;

/// Receiver sampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedMode {
    /// 16 clock ticks per bit.
    Single,
    /// 8 clock ticks per bit (`U2X` set).
    Double,
}

impl SpeedMode {
    /// Clock ticks per transmitted bit.
    pub const fn ticks_per_bit(self) -> u32 {
        match self {
            SpeedMode::Single => 16,
            SpeedMode::Double => 8,
        }
    }

    /// Value of the `U2X` flag for this mode.
    pub const fn is_double(self) -> bool {
        matches!(self, SpeedMode::Double)
    }
}

/// Divisor register value and sampling mode for a requested rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaudSettings {
    /// Value for the baud rate register.
    pub divisor: u16,
    /// Sampling mode; double speed means the `U2X` flag is set.
    pub mode: SpeedMode,
    /// Relative deviation of the achieved rate, in parts per thousand.
    pub error_permille: u32,
}

impl BaudSettings {
    /// Pick the divisor and mode closest to `baud` for a `clock_hz` clock.
    pub const fn new(clock_hz: u32, baud: u32) -> Self {
        let single = error_permille(clock_hz, baud, SpeedMode::Single);
        let double = error_permille(clock_hz, baud, SpeedMode::Double);

        let mode = if double < single {
            SpeedMode::Double
        } else {
            SpeedMode::Single
        };

        Self {
            divisor: divisor(clock_hz, baud, mode),
            mode,
            error_permille: if double < single { double } else { single },
        }
    }

    /// Rate actually produced by these settings.
    pub const fn actual_rate(self, clock_hz: u32) -> u32 {
        actual_rate(clock_hz, self.divisor, self.mode)
    }
}

/// Divisor rounded to the nearest integer for one sampling mode.
///
/// Computes `(F + B * ticks / 2) / (B * ticks) - 1`, saturating at 0 and at
/// [`MAX_DIVISOR`].
pub const fn divisor(clock_hz: u32, baud: u32, mode: SpeedMode) -> u16 {
    let step = baud as u64 * mode.ticks_per_bit() as u64;
    if step == 0 {
        return 0;
    }

    let n = ((clock_hz as u64 + step / 2) / step).saturating_sub(1);
    if n > MAX_DIVISOR as u64 {
        MAX_DIVISOR
    } else {
        n as u16
    }
}

/// Rate produced by `divisor` in the given mode: `F / (ticks * (N + 1))`.
pub const fn actual_rate(clock_hz: u32, divisor: u16, mode: SpeedMode) -> u32 {
    clock_hz / (mode.ticks_per_bit() * (divisor as u32 + 1))
}

/// Deviation of the achieved rate from `baud` in parts per thousand.
///
/// The larger of the two rates is divided by the smaller, so the result is
/// a magnitude. Saturates at `u32::MAX` when either rate is zero.
pub const fn error_permille(clock_hz: u32, baud: u32, mode: SpeedMode) -> u32 {
    let achieved = actual_rate(clock_hz, divisor(clock_hz, baud, mode), mode) as u64;
    let requested = baud as u64;

    if achieved == 0 || requested == 0 {
        return u32::MAX;
    }

    let ratio = if achieved > requested {
        achieved * 1000 / requested
    } else {
        requested * 1000 / achieved
    };

    let error = ratio - 1000;
    if error > u32::MAX as u64 {
        u32::MAX
    } else {
        error as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const F_CPU: u32 = 16_000_000;

    #[test]
    fn nine_thousand_six_hundred_prefers_single_speed() {
        let s = BaudSettings::new(F_CPU, 9600);
        assert_eq!(s.mode, SpeedMode::Single);
        assert_eq!(s.divisor, 103);
        assert_eq!(s.error_permille, 1);
        assert_eq!(s.actual_rate(F_CPU), 9615);
    }

    #[test]
    fn double_speed_reaches_the_same_error_at_9600() {
        // 207 in double speed lands on exactly the same rate; the tie keeps
        // single speed.
        assert_eq!(divisor(F_CPU, 9600, SpeedMode::Double), 207);
        assert_eq!(
            error_permille(F_CPU, 9600, SpeedMode::Double),
            error_permille(F_CPU, 9600, SpeedMode::Single)
        );
    }

    #[test]
    fn high_rate_picks_the_smaller_error() {
        let single = error_permille(F_CPU, 115_200, SpeedMode::Single);
        let double = error_permille(F_CPU, 115_200, SpeedMode::Double);
        assert_eq!(divisor(F_CPU, 115_200, SpeedMode::Single), 8);
        assert_eq!(divisor(F_CPU, 115_200, SpeedMode::Double), 16);
        assert_eq!(single, 36);
        assert_eq!(double, 21);

        let s = BaudSettings::new(F_CPU, 115_200);
        assert_eq!(s.mode, SpeedMode::Double);
        assert_eq!(s.divisor, 16);
        assert_eq!(s.error_permille, double);
    }

    #[test]
    fn exact_rate_ties_to_single() {
        let s = BaudSettings::new(F_CPU, 250_000);
        assert_eq!(s.error_permille, 0);
        assert_eq!(s.mode, SpeedMode::Single);
        assert_eq!(s.divisor, 3);
    }

    #[test]
    fn evaluates_at_compile_time() {
        const S: BaudSettings = BaudSettings::new(8_000_000, 57_600);
        const _: () = assert!(S.divisor == 16);
        assert_eq!(S.mode, SpeedMode::Double);
        assert_eq!(S.error_permille, 21);
    }

    #[test]
    fn pathological_inputs_do_not_panic() {
        let zero = BaudSettings::new(F_CPU, 0);
        assert_eq!(zero.divisor, 0);
        assert_eq!(zero.error_permille, u32::MAX);
        assert_eq!(zero.mode, SpeedMode::Single);

        let too_fast = BaudSettings::new(F_CPU, 2_000_000);
        assert_eq!(too_fast.divisor, 0);
        assert_eq!(too_fast.mode, SpeedMode::Double);

        let no_clock = BaudSettings::new(0, 9600);
        assert_eq!(no_clock.divisor, 0);
        assert_eq!(no_clock.error_permille, u32::MAX);

        assert_eq!(divisor(u32::MAX, 1, SpeedMode::Double), MAX_DIVISOR);
    }

    #[test]
    fn slow_rate_is_capped_to_register_width() {
        // 200 baud would need 4999 in single speed and 9999 in double speed
        let s = BaudSettings::new(F_CPU, 200);
        assert_eq!(s.divisor, MAX_DIVISOR);
        assert_eq!(s.mode, SpeedMode::Single);
        assert_eq!(s.actual_rate(F_CPU), 244);
        assert_eq!(s.error_permille, 220);
        assert_eq!(error_permille(F_CPU, 200, SpeedMode::Double), 1440);
    }

    #[test]
    fn largest_reachable_divisor_is_exact() {
        // 16 MHz / (16 * 4096) is 244.14 baud
        assert_eq!(divisor(F_CPU, 244, SpeedMode::Single), MAX_DIVISOR);
        assert_eq!(divisor(F_CPU, 245, SpeedMode::Single), 4081);
    }
}
