//! Profitability and break-even calculations.
//!
//! Every function here is pure: results depend only on the arguments, and
//! calling them in any order or any number of times gives the same answer.
//!
//! | Metric             | Formula                                         |
//! |--------------------|-------------------------------------------------|
//! | Gross profit       | revenue − cost of goods sold                    |
//! | Operating profit   | gross profit − operating expenses               |
//! | Net profit         | operating profit − interest − taxes             |
//! | Margin             | profit ÷ revenue × 100                          |
//! | Break-even units   | fixed costs ÷ (price − variable cost per unit)  |
//! | Break-even revenue | break-even units × price                        |
//!
//! Arithmetic is exact [`Decimal`] arithmetic. Operations that would
//! overflow return [`CalculationError::Overflow`] rather than panicking.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use profit_core::{AnalysisInput, UnitEconomics};
//! use profit_core::calculations::ProfitabilityAnalysis;
//!
//! let input = AnalysisInput {
//!     revenue: dec!(500000),
//!     cogs: dec!(300000),
//!     operating_expenses: dec!(100000),
//!     interest: dec!(15000),
//!     taxes: dec!(25000),
//!     fixed_costs: dec!(80000),
//!     unit_economics: Some(UnitEconomics {
//!         price_per_unit: dec!(50),
//!         variable_cost_per_unit: dec!(30),
//!     }),
//! };
//!
//! let result = ProfitabilityAnalysis::analyze(&input).unwrap();
//!
//! assert_eq!(result.net_profit, dec!(60000));
//! assert_eq!(result.gross_margin, dec!(40));
//! assert_eq!(result.break_even.unwrap().units, dec!(4000));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{AnalysisInput, AnalysisResult, BreakEven, InputError, UnitEconomics};

/// Errors raised by the profitability formulas.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalculationError {
    /// A margin was requested against zero revenue.
    #[error("revenue is zero; profit margin is undefined")]
    DivisionByZero,

    /// Break-even requires each unit to sell above its variable cost.
    #[error(
        "price per unit ({price_per_unit}) must exceed variable cost per unit ({variable_cost_per_unit})"
    )]
    InvalidPricing {
        price_per_unit: Decimal,
        variable_cost_per_unit: Decimal,
    },

    /// The result does not fit in a [`Decimal`].
    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

/// Errors from a complete [`ProfitabilityAnalysis`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Calculation(#[from] CalculationError),
}

/// Revenue minus cost of goods sold.
///
/// ```
/// use rust_decimal_macros::dec;
/// use profit_core::calculations::profitability::gross_profit;
///
/// assert_eq!(gross_profit(dec!(500000), dec!(300000)), Ok(dec!(200000)));
/// ```
pub fn gross_profit(
    revenue: Decimal,
    cogs: Decimal,
) -> Result<Decimal, CalculationError> {
    revenue
        .checked_sub(cogs)
        .ok_or(CalculationError::Overflow("gross profit"))
}

/// Gross profit minus operating expenses.
pub fn operating_profit(
    gross_profit: Decimal,
    operating_expenses: Decimal,
) -> Result<Decimal, CalculationError> {
    gross_profit
        .checked_sub(operating_expenses)
        .ok_or(CalculationError::Overflow("operating profit"))
}

/// Operating profit minus interest and taxes.
pub fn net_profit(
    operating_profit: Decimal,
    interest: Decimal,
    taxes: Decimal,
) -> Result<Decimal, CalculationError> {
    operating_profit
        .checked_sub(interest)
        .and_then(|v| v.checked_sub(taxes))
        .ok_or(CalculationError::Overflow("net profit"))
}

/// Profit as a percentage of revenue.
///
/// # Errors
///
/// * [`CalculationError::DivisionByZero`] when `revenue` is zero.
/// * [`CalculationError::Overflow`] when the percentage does not fit.
///
/// ```
/// use rust_decimal_macros::dec;
/// use profit_core::calculations::profitability::profit_margin;
/// use profit_core::calculations::CalculationError;
///
/// assert_eq!(profit_margin(dec!(200000), dec!(500000)), Ok(dec!(40.0)));
/// assert_eq!(
///     profit_margin(dec!(1), dec!(0)),
///     Err(CalculationError::DivisionByZero)
/// );
/// ```
pub fn profit_margin(
    profit: Decimal,
    revenue: Decimal,
) -> Result<Decimal, CalculationError> {
    if revenue.is_zero() {
        return Err(CalculationError::DivisionByZero);
    }

    profit
        .checked_div(revenue)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(CalculationError::Overflow("profit margin"))
}

/// Units that must be sold for contribution to cover fixed costs.
///
/// # Errors
///
/// * [`CalculationError::InvalidPricing`] when `price_per_unit` does not
///   exceed `variable_cost_per_unit`; break-even is then unreachable.
/// * [`CalculationError::Overflow`] when the quotient does not fit.
///
/// ```
/// use rust_decimal_macros::dec;
/// use profit_core::calculations::profitability::break_even_units;
///
/// assert_eq!(break_even_units(dec!(80000), dec!(50), dec!(30)), Ok(dec!(4000)));
/// ```
pub fn break_even_units(
    fixed_costs: Decimal,
    price_per_unit: Decimal,
    variable_cost_per_unit: Decimal,
) -> Result<Decimal, CalculationError> {
    if price_per_unit <= variable_cost_per_unit {
        return Err(CalculationError::InvalidPricing {
            price_per_unit,
            variable_cost_per_unit,
        });
    }

    let contribution = price_per_unit
        .checked_sub(variable_cost_per_unit)
        .ok_or(CalculationError::Overflow("contribution margin"))?;

    fixed_costs
        .checked_div(contribution)
        .ok_or(CalculationError::Overflow("break-even units"))
}

/// Revenue earned at the break-even volume.
pub fn break_even_revenue(
    break_even_units: Decimal,
    price_per_unit: Decimal,
) -> Result<Decimal, CalculationError> {
    break_even_units
        .checked_mul(price_per_unit)
        .ok_or(CalculationError::Overflow("break-even revenue"))
}

/// Break-even units and revenue for the given unit economics.
pub fn break_even(
    fixed_costs: Decimal,
    unit: &UnitEconomics,
) -> Result<BreakEven, CalculationError> {
    let units = break_even_units(
        fixed_costs,
        unit.price_per_unit,
        unit.variable_cost_per_unit,
    )?;
    let revenue = break_even_revenue(units, unit.price_per_unit)?;

    if fixed_costs.is_zero() {
        warn!("Fixed costs are zero; break-even is reached at zero units");
    }

    Ok(BreakEven {
        contribution_margin: unit.price_per_unit - unit.variable_cost_per_unit,
        units,
        revenue,
    })
}

/// Runs the full profitability pipeline for one [`AnalysisInput`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfitabilityAnalysis;

impl ProfitabilityAnalysis {
    /// Validates `input` and computes every metric.
    ///
    /// Break-even is included only when the input carries unit economics.
    ///
    /// # Errors
    ///
    /// * [`AnalysisError::Input`] for negative values.
    /// * [`AnalysisError::Calculation`] for zero revenue, a price at or below
    ///   variable cost, or overflow.
    pub fn analyze(input: &AnalysisInput) -> Result<AnalysisResult, AnalysisError> {
        input.validate()?;

        let gross_profit = gross_profit(input.revenue, input.cogs)?;
        let operating_profit = operating_profit(gross_profit, input.operating_expenses)?;
        let net_profit = net_profit(operating_profit, input.interest, input.taxes)?;

        let gross_margin = profit_margin(gross_profit, input.revenue)?;
        let operating_margin = profit_margin(operating_profit, input.revenue)?;
        let net_margin = profit_margin(net_profit, input.revenue)?;

        if net_profit < Decimal::ZERO {
            warn!(
                net_profit = %net_profit,
                revenue = %input.revenue,
                "Net profit is negative; business is operating at a loss"
            );
        }

        let break_even = input
            .unit_economics
            .as_ref()
            .map(|unit| break_even(input.fixed_costs, unit))
            .transpose()?;

        debug!(
            gross_profit = %gross_profit,
            net_profit = %net_profit,
            net_margin = %net_margin,
            has_break_even = break_even.is_some(),
            "Profitability analysis complete"
        );

        Ok(AnalysisResult {
            gross_profit,
            operating_profit,
            net_profit,
            gross_margin,
            operating_margin,
            net_margin,
            break_even,
        })
    }
}
