//! Data series behind the break-even chart.
//!
//! The chart plots total cost (`fixed + variable × units`) and total revenue
//! (`price × units`) from zero up to twice the break-even volume, so the
//! crossing sits in the middle. Rendering is left to the caller; this module
//! only produces the points.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::UnitEconomics;

/// Number of samples used when the caller has no preference.
pub const DEFAULT_MAX_POINTS: usize = 200;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChartError {
    /// A chart needs at least its first and last point.
    #[error("chart needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("break-even units must be non-negative, got {0}")]
    NegativeBreakEven(Decimal),

    /// The unit axis or an amount does not fit the supported range.
    #[error("chart range is too large for break-even units {0}")]
    OutOfRange(Decimal),
}

/// One sample on the unit axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub units: u64,
    pub total_cost: Decimal,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakEvenChart {
    pub fixed_costs: Decimal,
    pub unit_economics: UnitEconomics,
    pub break_even_units: Decimal,
    pub points: Vec<ChartPoint>,
}

impl BreakEvenChart {
    /// Samples cost and revenue for units `0..=floor(2 × break_even_units)`.
    ///
    /// When the range holds more than `max_points` whole units the axis is
    /// strided evenly; the final unit is always included.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use profit_core::UnitEconomics;
    /// use profit_core::calculations::BreakEvenChart;
    ///
    /// let unit = UnitEconomics { price_per_unit: dec!(50), variable_cost_per_unit: dec!(30) };
    /// let chart = BreakEvenChart::build(dec!(80000), unit, dec!(4000), 9).unwrap();
    ///
    /// assert_eq!(chart.points.len(), 9);
    /// assert_eq!(chart.points[4].units, 4000);
    /// assert_eq!(chart.points[4].total_cost, chart.points[4].total_revenue);
    /// ```
    pub fn build(
        fixed_costs: Decimal,
        unit_economics: UnitEconomics,
        break_even_units: Decimal,
        max_points: usize,
    ) -> Result<Self, ChartError> {
        if max_points < 2 {
            return Err(ChartError::TooFewPoints(max_points));
        }
        if break_even_units < Decimal::ZERO {
            return Err(ChartError::NegativeBreakEven(break_even_units));
        }

        let last = break_even_units
            .checked_mul(Decimal::TWO)
            .and_then(|v| v.floor().to_u64())
            .ok_or(ChartError::OutOfRange(break_even_units))?;

        let step = Self::step(last, max_points);
        let mut units: Vec<u64> = (0..=last).step_by(step).collect();
        if units.last() != Some(&last) {
            units.push(last);
        }

        let points = units
            .into_iter()
            .map(|u| Self::point(fixed_costs, &unit_economics, u))
            .collect::<Option<Vec<_>>>()
            .ok_or(ChartError::OutOfRange(break_even_units))?;

        Ok(Self {
            fixed_costs,
            unit_economics,
            break_even_units,
            points,
        })
    }

    /// Total cost at the break-even volume, where the break-even marker is
    /// labelled.
    pub fn break_even_cost(&self) -> Option<Decimal> {
        self.unit_economics
            .variable_cost_per_unit
            .checked_mul(self.break_even_units)?
            .checked_add(self.fixed_costs)
    }

    fn step(
        last: u64,
        max_points: usize,
    ) -> usize {
        let slots = (max_points - 1) as u64;
        if last < max_points as u64 {
            1
        } else {
            usize::try_from(last.div_ceil(slots)).unwrap_or(usize::MAX)
        }
    }

    fn point(
        fixed_costs: Decimal,
        unit: &UnitEconomics,
        units: u64,
    ) -> Option<ChartPoint> {
        let volume = Decimal::from(units);
        let total_cost = unit
            .variable_cost_per_unit
            .checked_mul(volume)?
            .checked_add(fixed_costs)?;
        let total_revenue = unit.price_per_unit.checked_mul(volume)?;

        Some(ChartPoint {
            units,
            total_cost,
            total_revenue,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn unit() -> UnitEconomics {
        UnitEconomics {
            price_per_unit: dec!(50),
            variable_cost_per_unit: dec!(30),
        }
    }

    #[test]
    fn build_covers_zero_to_twice_break_even() {
        let chart = BreakEvenChart::build(dec!(100), unit(), dec!(5), 100).unwrap();

        let units: Vec<u64> = chart.points.iter().map(|p| p.units).collect();
        assert_eq!(units, (0..=10).collect::<Vec<_>>());
    }

    #[test]
    fn build_starts_at_fixed_costs_and_zero_revenue() {
        let chart = BreakEvenChart::build(dec!(80000), unit(), dec!(4000), 50).unwrap();

        let first = chart.points[0];
        assert_eq!(first.units, 0);
        assert_eq!(first.total_cost, dec!(80000));
        assert_eq!(first.total_revenue, dec!(0));
    }

    #[test]
    fn build_lines_cross_at_break_even() {
        let chart = BreakEvenChart::build(dec!(80000), unit(), dec!(4000), 8001).unwrap();

        let crossing = chart
            .points
            .iter()
            .find(|p| p.units == 4000)
            .expect("break-even unit should be sampled");
        assert_eq!(crossing.total_cost, dec!(200000));
        assert_eq!(crossing.total_revenue, dec!(200000));
        assert_eq!(chart.points.len(), 8001);
    }

    #[test]
    fn build_strides_long_ranges_and_keeps_last_unit() {
        let chart = BreakEvenChart::build(dec!(80000), unit(), dec!(4000), 200).unwrap();

        assert!(chart.points.len() <= 200);
        assert_eq!(chart.points.last().map(|p| p.units), Some(8000));
    }

    #[test]
    fn build_appends_last_unit_when_stride_misses_it() {
        // last = 10, step = ceil(10 / 3) = 4 → 0, 4, 8, then 10
        let chart = BreakEvenChart::build(dec!(100), unit(), dec!(5), 4).unwrap();

        let units: Vec<u64> = chart.points.iter().map(|p| p.units).collect();
        assert_eq!(units, vec![0, 4, 8, 10]);
    }

    #[test]
    fn build_floors_fractional_break_even() {
        // 2 × 2.75 = 5.5 → units 0..=5
        let chart = BreakEvenChart::build(dec!(55), unit(), dec!(2.75), 100).unwrap();

        assert_eq!(chart.points.last().map(|p| p.units), Some(5));
    }

    #[test]
    fn build_with_zero_break_even_has_single_point() {
        let chart = BreakEvenChart::build(dec!(0), unit(), dec!(0), 10).unwrap();

        assert_eq!(chart.points.len(), 1);
    }

    #[test]
    fn build_rejects_too_few_points() {
        assert_eq!(
            BreakEvenChart::build(dec!(100), unit(), dec!(5), 1),
            Err(ChartError::TooFewPoints(1))
        );
    }

    #[test]
    fn build_rejects_negative_break_even() {
        assert_eq!(
            BreakEvenChart::build(dec!(100), unit(), dec!(-5), 10),
            Err(ChartError::NegativeBreakEven(dec!(-5)))
        );
    }

    #[test]
    fn build_rejects_unrepresentable_range() {
        assert!(matches!(
            BreakEvenChart::build(dec!(100), unit(), Decimal::MAX, 10),
            Err(ChartError::OutOfRange(_))
        ));
    }

    #[test]
    fn break_even_cost_is_fixed_plus_variable() {
        let chart = BreakEvenChart::build(dec!(80000), unit(), dec!(4000), 10).unwrap();

        assert_eq!(chart.break_even_cost(), Some(dec!(200000)));
    }
}
