//! Daily cost trend detection

use serde::{Deserialize, Serialize};

use crate::ranking::percentage_of;

/// Latest day must exceed the average by this factor to be flagged
pub const TREND_MULTIPLIER: f64 = 1.5;

/// Comparison of the most recent day against the period average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSignal {
    pub average: f64,
    pub latest: f64,
    /// `latest / average`, 0 when the average is 0
    pub ratio: f64,
    pub exceeded: bool,
}

impl TrendSignal {
    /// How far the latest day sits above (or below) the average, in percent
    pub fn deviation_percent(&self) -> f64 {
        percentage_of(self.latest - self.average, self.average)
    }
}

/// Compare the last of `daily_totals` (ascending by date) to their mean.
///
/// Returns `None` for fewer than two data points.
pub fn detect_trend(daily_totals: &[f64]) -> Option<TrendSignal> {
    if daily_totals.len() < 2 {
        return None;
    }

    let average = daily_totals.iter().sum::<f64>() / daily_totals.len() as f64;
    let latest = *daily_totals.last()?;
    let ratio = if average == 0.0 { 0.0 } else { latest / average };

    Some(TrendSignal {
        average,
        latest,
        ratio,
        exceeded: latest > average * TREND_MULTIPLIER,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_signal_below_two_points() {
        assert!(detect_trend(&[]).is_none());
        assert!(detect_trend(&[42.0]).is_none());
    }

    #[test]
    fn test_trend_not_exceeded() {
        let signal = detect_trend(&[4.0, 9.0]).unwrap();
        assert_eq!(signal.average, 6.5);
        assert_eq!(signal.latest, 9.0);
        assert!((signal.ratio - 1.3846).abs() < 1e-4);
        assert!(!signal.exceeded);
    }

    #[test]
    fn test_trend_exceeded() {
        let signal = detect_trend(&[1.0, 1.0, 1.0, 10.0]).unwrap();
        assert_eq!(signal.average, 3.25);
        assert!(signal.exceeded);
        assert!(signal.deviation_percent() > 200.0);
    }

    #[test]
    fn test_exactly_at_multiplier_is_not_exceeded() {
        // average 4.0, latest 6.0 == 4.0 * 1.5
        let signal = detect_trend(&[2.0, 4.0, 6.0]).unwrap();
        assert_eq!(signal.average, 4.0);
        assert!(!signal.exceeded);
    }

    #[test]
    fn test_zero_average() {
        let signal = detect_trend(&[0.0, 0.0]).unwrap();
        assert_eq!(signal.ratio, 0.0);
        assert_eq!(signal.deviation_percent(), 0.0);
        assert!(!signal.exceeded);
    }
}
