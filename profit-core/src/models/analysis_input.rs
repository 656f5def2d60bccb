use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while turning user-entered values into an [`AnalysisInput`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// A field could not be read as a number.
    #[error("{field} must be a valid number, got '{input}'")]
    Parse { field: String, input: String },

    /// A required field was left empty.
    #[error("{field} is required")]
    Missing { field: String },

    /// A field that must be non-negative was below zero.
    #[error("{field} cannot be negative, got {value}")]
    NegativeValue { field: String, value: Decimal },
}

/// Per-unit pricing used for break-even analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitEconomics {
    pub price_per_unit: Decimal,
    pub variable_cost_per_unit: Decimal,
}

/// Financial figures entered by the user for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub revenue: Decimal,
    pub cogs: Decimal,
    pub operating_expenses: Decimal,
    pub interest: Decimal,
    pub taxes: Decimal,
    pub fixed_costs: Decimal,

    /// Break-even is only computed when this is present.
    pub unit_economics: Option<UnitEconomics>,
}

impl AnalysisInput {
    /// Named values in form order, including unit economics when present.
    pub fn fields(&self) -> Vec<(&'static str, Decimal)> {
        let mut fields = vec![
            ("revenue", self.revenue),
            ("cogs", self.cogs),
            ("operating_expenses", self.operating_expenses),
            ("interest", self.interest),
            ("taxes", self.taxes),
            ("fixed_costs", self.fixed_costs),
        ];
        if let Some(unit) = &self.unit_economics {
            fields.push(("price_per_unit", unit.price_per_unit));
            fields.push(("variable_cost_per_unit", unit.variable_cost_per_unit));
        }
        fields
    }

    /// Checks that every value is non-negative.
    ///
    /// Reports the first offending field in [`fields`](Self::fields) order.
    /// A zero revenue passes here; it is rejected later when a margin is
    /// computed.
    ///
    /// # Errors
    ///
    /// [`InputError::NegativeValue`] naming the field.
    pub fn validate(&self) -> Result<(), InputError> {
        match self
            .fields()
            .into_iter()
            .find(|(_, value)| *value < Decimal::ZERO)
        {
            Some((field, value)) => Err(InputError::NegativeValue {
                field: field.to_string(),
                value,
            }),
            None => Ok(()),
        }
    }
}
