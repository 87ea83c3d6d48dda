//! Timing types for refresh rates.

use std::time::Duration;

/// A frequency in cycles per second.
///
/// Used for monitor refresh rates, where fractional rates (59.94 Hz) are
/// common enough that an integer would lose information.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Hertz(pub f64);

impl Hertz {
    pub fn from_period(period: Duration) -> Self {
        Self(1.0 / period.as_secs_f64())
    }

    pub fn to_period(self) -> Duration {
        Duration::from_secs_f64(1.0 / self.0)
    }
}

impl From<Hertz> for Duration {
    fn from(hertz: Hertz) -> Self {
        hertz.to_period()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_round_trip() {
        let rate = Hertz(60.0);
        let period = rate.to_period();

        assert_eq!(period, Duration::from_secs_f64(1.0 / 60.0));
        assert!((Hertz::from_period(period).0 - 60.0).abs() < 1e-9);
    }

    #[test]
    fn fractional_rate() {
        let ntsc = Hertz(59.94);
        let period = ntsc.to_period();

        assert!((period.as_secs_f64() - 0.016683).abs() < 1e-5);
    }
}
