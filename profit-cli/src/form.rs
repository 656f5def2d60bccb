use std::fmt;

use profit_core::{AnalysisInput, InputError, UnitEconomics};

use crate::utils::{parse_decimal, parse_optional_decimal, parse_required_decimal};

/// Every problem found in one form submission, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormErrors(pub Vec<InputError>);

impl fmt::Display for FormErrors {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

/// Raw text entered for an analysis, before parsing.
///
/// `revenue` and `cogs` are required. The other amounts default to zero.
/// Price per unit and variable cost per unit must be given together; when
/// both are empty no break-even is computed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisForm {
    pub revenue: String,
    pub cogs: String,
    pub operating_expenses: String,
    pub interest: String,
    pub taxes: String,
    pub fixed_costs: String,
    pub price_per_unit: String,
    pub variable_cost_per_unit: String,
}

impl AnalysisForm {
    /// Parses the form into an [`AnalysisInput`].
    ///
    /// Parse errors are collected for every field before giving up, so the
    /// user sees all of them at once. Negative values are checked only after
    /// every field parsed.
    pub fn parse(&self) -> Result<AnalysisInput, FormErrors> {
        let mut errors = Vec::new();

        let revenue = keep(&mut errors, parse_required_decimal("revenue", &self.revenue));
        let cogs = keep(&mut errors, parse_required_decimal("cogs", &self.cogs));
        let operating_expenses = keep(
            &mut errors,
            parse_decimal("operating_expenses", &self.operating_expenses),
        );
        let interest = keep(&mut errors, parse_decimal("interest", &self.interest));
        let taxes = keep(&mut errors, parse_decimal("taxes", &self.taxes));
        let fixed_costs = keep(&mut errors, parse_decimal("fixed_costs", &self.fixed_costs));
        let price = keep(
            &mut errors,
            parse_optional_decimal("price_per_unit", &self.price_per_unit),
        );
        let variable = keep(
            &mut errors,
            parse_optional_decimal("variable_cost_per_unit", &self.variable_cost_per_unit),
        );

        let unit_economics = match (price, variable) {
            (Some(Some(price_per_unit)), Some(Some(variable_cost_per_unit))) => {
                Some(UnitEconomics {
                    price_per_unit,
                    variable_cost_per_unit,
                })
            }
            (Some(Some(_)), Some(None)) => {
                errors.push(InputError::Missing {
                    field: "variable_cost_per_unit".to_string(),
                });
                None
            }
            (Some(None), Some(Some(_))) => {
                errors.push(InputError::Missing {
                    field: "price_per_unit".to_string(),
                });
                None
            }
            _ => None,
        };

        let (
            Some(revenue),
            Some(cogs),
            Some(operating_expenses),
            Some(interest),
            Some(taxes),
            Some(fixed_costs),
        ) = (revenue, cogs, operating_expenses, interest, taxes, fixed_costs)
        else {
            return Err(FormErrors(errors));
        };
        if !errors.is_empty() {
            return Err(FormErrors(errors));
        }

        let input = AnalysisInput {
            revenue,
            cogs,
            operating_expenses,
            interest,
            taxes,
            fixed_costs,
            unit_economics,
        };
        input.validate().map_err(|e| FormErrors(vec![e]))?;
        Ok(input)
    }
}

fn keep<T>(
    errors: &mut Vec<InputError>,
    result: Result<T, InputError>,
) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}
