//! Profitability calculations.
//!
//! [`profitability`] holds the closed-form metric functions and the
//! end-to-end [`ProfitabilityAnalysis`]. [`chart`] and [`sensitivity`] build
//! on the break-even figures.

pub mod chart;
pub mod common;
pub mod profitability;
pub mod sensitivity;

pub use chart::{BreakEvenChart, ChartError, ChartPoint};
pub use profitability::{AnalysisError, CalculationError, ProfitabilityAnalysis};
pub use sensitivity::{SensitivityChanges, SensitivityResult, analyze_sensitivity};
