//! Best/worst-case bands around expected weekly values.
//!
//! The band widens linearly with horizon and the worst case never drops below
//! zero. Values too large to widen collapse onto the expected value.

use crate::domain::forecast::{Forecast, WeeklyAmount};
use crate::policy::{BAND_BASE_VARIANCE, BAND_GROWTH_PER_WEEK};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub best_case: Decimal,
    pub worst_case: Decimal,
}

/// Band for `expected` at `week_index` weeks into the horizon.
pub fn generate(expected: Decimal, week_index: u32) -> Band {
    let variance = band_variance(expected, week_index).unwrap_or_else(|| {
        tracing::warn!(%expected, week_index, "band variance overflowed; no spread");
        Decimal::ZERO
    });

    let worst_case = expected.saturating_sub(variance).max(Decimal::ZERO);
    // Negative expected values would otherwise put best below the clamped worst.
    let best_case = expected.saturating_add(variance).max(worst_case);

    Band {
        best_case,
        worst_case,
    }
}

fn band_variance(expected: Decimal, week_index: u32) -> Option<Decimal> {
    let uncertainty_factor = Decimal::from(week_index)
        .checked_mul(BAND_GROWTH_PER_WEEK)?
        .checked_add(Decimal::ONE)?;
    expected
        .abs()
        .checked_mul(BAND_BASE_VARIANCE)?
        .checked_mul(uncertainty_factor)
}

pub fn weekly_amount(week_number: u32, expected: Decimal, week_index: u32) -> WeeklyAmount {
    let band = generate(expected, week_index);
    WeeklyAmount {
        week_number,
        expected,
        best_case: band.best_case,
        worst_case: band.worst_case,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekBands {
    pub week_number: u32,
    pub cash_in: WeeklyAmount,
    pub cash_out: WeeklyAmount,
    pub ending_balance: WeeklyAmount,
}

/// Bands for every week of the forecast, indexed by position in the horizon.
pub fn forecast_bands(forecast: &Forecast) -> Vec<WeekBands> {
    forecast
        .weeks
        .iter()
        .enumerate()
        .map(|(i, week)| {
            let index = u32::try_from(i).unwrap_or(u32::MAX);
            WeekBands {
                week_number: week.week_number,
                cash_in: weekly_amount(week.week_number, week.cash_in, index),
                cash_out: weekly_amount(week.week_number, week.cash_out, index),
                ending_balance: weekly_amount(week.week_number, week.ending_balance, index),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::ForecastWeek;
    use rust_decimal_macros::dec;

    #[test]
    fn week_zero_uses_base_variance() {
        let band = generate(dec!(1000), 0);
        assert_eq!(band.best_case, dec!(1150));
        assert_eq!(band.worst_case, dec!(850));
    }

    #[test]
    fn band_widens_with_horizon() {
        // factor = 1 + 10 * 0.02 = 1.2, variance = 1000 * 0.15 * 1.2 = 180
        let band = generate(dec!(1000), 10);
        assert_eq!(band.best_case, dec!(1180));
        assert_eq!(band.worst_case, dec!(820));
    }

    #[test]
    fn worst_case_is_clamped_at_zero() {
        let band = generate(dec!(100), 300);
        assert_eq!(band.worst_case, Decimal::ZERO);
        assert!(band.best_case > dec!(100));
    }

    #[test]
    fn bounds_hold_for_any_expected_value() {
        for expected in [dec!(-5000), dec!(-1), dec!(0), dec!(0.01), dec!(250), dec!(1000000)] {
            let mut previous_spread = None;
            for week in 0..60 {
                let band = generate(expected, week);
                assert!(band.worst_case >= Decimal::ZERO);
                assert!(band.best_case >= band.worst_case);

                let spread = band.best_case - band.worst_case;
                if let Some(prev) = previous_spread {
                    assert!(spread >= prev, "spread shrank at week {week} for {expected}");
                }
                previous_spread = Some(spread);
            }
        }
    }

    #[test]
    fn extreme_values_saturate_instead_of_failing() {
        let near_max = Decimal::MAX - dec!(1);
        let band = generate(near_max, 0);
        assert_eq!(band.best_case, Decimal::MAX);
        assert!(band.worst_case > Decimal::ZERO);
        assert!(band.worst_case < near_max);

        // variance itself overflows far out on the horizon
        let band = generate(Decimal::MAX, u32::MAX);
        assert_eq!(band.best_case, Decimal::MAX);
        assert_eq!(band.worst_case, Decimal::MAX);

        let band = generate(Decimal::MIN, u32::MAX);
        assert_eq!(band.worst_case, Decimal::ZERO);
        assert_eq!(band.best_case, Decimal::ZERO);
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(generate(dec!(1234.56), 7), generate(dec!(1234.56), 7));
    }

    #[test]
    fn forecast_bands_follow_week_position() {
        let forecast = Forecast {
            weeks: vec![
                ForecastWeek {
                    week_number: 0,
                    cash_in: dec!(1000),
                    cash_out: dec!(500),
                    ending_balance: dec!(2000),
                    ..Default::default()
                },
                ForecastWeek {
                    week_number: 1,
                    cash_in: dec!(1000),
                    cash_out: dec!(500),
                    ending_balance: dec!(2500),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let bands = forecast_bands(&forecast);
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].cash_in.best_case, dec!(1150));
        // factor 1.02 -> variance 153
        assert_eq!(bands[1].cash_in.best_case, dec!(1153));
        assert_eq!(bands[1].cash_out.worst_case, dec!(423.5));
        assert_eq!(bands[1].ending_balance.expected, dec!(2500));
    }
}
