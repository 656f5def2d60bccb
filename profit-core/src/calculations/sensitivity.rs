//! What-if analysis on break-even inputs.
//!
//! Each input is scaled by a percentage change (`new = old × (1 + pct/100)`)
//! and break-even is recomputed from the adjusted values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::apply_percent_change;
use super::profitability::{AnalysisError, CalculationError, break_even};
use crate::models::{AnalysisInput, BreakEven, UnitEconomics};

/// Percentage changes to apply; `10` means +10 %, `-5` means −5 %.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityChanges {
    pub price_change_pct: Decimal,
    pub variable_cost_change_pct: Decimal,
    pub fixed_cost_change_pct: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub fixed_costs: Decimal,
    pub unit_economics: UnitEconomics,
    pub break_even: BreakEven,
}

/// Recomputes break-even after applying `changes`.
///
/// # Errors
///
/// * [`AnalysisError::Input`] when a change of -100 % or more drives an
///   adjusted value below zero.
/// * [`AnalysisError::Calculation`] with
///   [`CalculationError::InvalidPricing`] when the adjusted price no longer
///   exceeds the adjusted variable cost, or
///   [`CalculationError::Overflow`] when an adjusted value does not fit.
///
/// ```
/// use rust_decimal_macros::dec;
/// use profit_core::UnitEconomics;
/// use profit_core::calculations::{SensitivityChanges, analyze_sensitivity};
///
/// let unit = UnitEconomics { price_per_unit: dec!(50), variable_cost_per_unit: dec!(30) };
/// let changes = SensitivityChanges { price_change_pct: dec!(10), ..Default::default() };
///
/// let result = analyze_sensitivity(dec!(80000), unit, changes).unwrap();
///
/// assert_eq!(result.unit_economics.price_per_unit, dec!(55));
/// assert_eq!(result.break_even.units, dec!(3200));
/// ```
pub fn analyze_sensitivity(
    fixed_costs: Decimal,
    unit_economics: UnitEconomics,
    changes: SensitivityChanges,
) -> Result<SensitivityResult, AnalysisError> {
    let adjusted = UnitEconomics {
        price_per_unit: apply_percent_change(
            unit_economics.price_per_unit,
            changes.price_change_pct,
        )
        .ok_or(CalculationError::Overflow("adjusted price per unit"))?,
        variable_cost_per_unit: apply_percent_change(
            unit_economics.variable_cost_per_unit,
            changes.variable_cost_change_pct,
        )
        .ok_or(CalculationError::Overflow("adjusted variable cost per unit"))?,
    };
    let adjusted_fixed = apply_percent_change(fixed_costs, changes.fixed_cost_change_pct)
        .ok_or(CalculationError::Overflow("adjusted fixed costs"))?;

    AnalysisInput {
        fixed_costs: adjusted_fixed,
        unit_economics: Some(adjusted),
        ..Default::default()
    }
    .validate()?;

    let break_even = break_even(adjusted_fixed, &adjusted)?;

    Ok(SensitivityResult {
        fixed_costs: adjusted_fixed,
        unit_economics: adjusted,
        break_even,
    })
}
