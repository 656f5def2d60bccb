use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Break-even figures derived from unit economics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakEven {
    /// Price per unit minus variable cost per unit.
    pub contribution_margin: Decimal,
    /// Units that must be sold to cover fixed costs.
    pub units: Decimal,
    /// `units × price_per_unit`.
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub gross_profit: Decimal,
    pub operating_profit: Decimal,
    pub net_profit: Decimal,

    // Margins, as percentages of revenue
    pub gross_margin: Decimal,
    pub operating_margin: Decimal,
    pub net_margin: Decimal,

    /// Present only when the input carried unit economics.
    pub break_even: Option<BreakEven>,
}
