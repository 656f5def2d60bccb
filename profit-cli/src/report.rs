//! Plain-text rendering of results for the terminal.
//!
//! Amounts are rounded half-up to two places here and nowhere else.

use std::fmt;

use profit_core::calculations::SensitivityResult;
use profit_core::{AnalysisResult, BreakEven, ResultRecord};

use crate::utils::{format_currency, format_percent, format_quantity, opt_currency_display};

pub struct AnalysisReport<'a>(pub &'a AnalysisResult);

impl fmt::Display for AnalysisReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let r = self.0;
        writeln!(f, "Gross profit:        {}", format_currency(r.gross_profit))?;
        writeln!(f, "Operating profit:    {}", format_currency(r.operating_profit))?;
        writeln!(f, "Net profit:          {}", format_currency(r.net_profit))?;
        writeln!(f, "Gross margin:        {}", format_percent(r.gross_margin))?;
        writeln!(f, "Operating margin:    {}", format_percent(r.operating_margin))?;
        write!(f, "Net margin:          {}", format_percent(r.net_margin))?;
        match &r.break_even {
            Some(be) => write!(f, "\n{}", BreakEvenReport(be)),
            None => write!(f, "\nBreak-even:          — (no unit economics)"),
        }
    }
}

pub struct BreakEvenReport<'a>(pub &'a BreakEven);

impl fmt::Display for BreakEvenReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let be = self.0;
        writeln!(
            f,
            "Contribution margin: {}",
            format_currency(be.contribution_margin)
        )?;
        writeln!(f, "Break-even units:    {}", format_quantity(be.units))?;
        write!(f, "Break-even revenue:  {}", format_currency(be.revenue))
    }
}

/// A stored record: its inputs followed by the full analysis.
pub struct RecordReport<'a>(pub &'a ResultRecord);

impl fmt::Display for RecordReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let record = self.0;
        writeln!(
            f,
            "Record {} ({} UTC)",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        for (field, value) in record.input.fields() {
            writeln!(f, "  {field:<24}{}", format_currency(value))?;
        }
        write!(f, "{}", AnalysisReport(&record.result))
    }
}

/// One line per record, newest first as given.
pub struct HistoryReport<'a>(pub &'a [ResultRecord]);

impl fmt::Display for HistoryReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "No analyses recorded yet.");
        }

        write!(
            f,
            "{:>5}  {:<19}  {:>16}  {:>16}  {:>9}  {:>14}  {:>16}",
            "ID", "Created (UTC)", "Revenue", "Net profit", "Net %", "BEP units", "BEP revenue"
        )?;
        for record in self.0 {
            let break_even = record.result.break_even.as_ref();
            write!(
                f,
                "\n{:>5}  {:<19}  {:>16}  {:>16}  {:>9}  {:>14}  {:>16}",
                record.id,
                record.created_at.format("%Y-%m-%d %H:%M:%S"),
                format_currency(record.input.revenue),
                format_currency(record.result.net_profit),
                format_percent(record.result.net_margin),
                break_even
                    .map(|be| format_quantity(be.units))
                    .unwrap_or_else(|| "—".to_string()),
                opt_currency_display(break_even.map(|be| be.revenue)),
            )?;
        }
        Ok(())
    }
}

pub struct SensitivityReport<'a> {
    pub base: &'a BreakEven,
    pub adjusted: &'a SensitivityResult,
}

impl fmt::Display for SensitivityReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let adj = self.adjusted;
        writeln!(
            f,
            "Adjusted price per unit:    {}",
            format_currency(adj.unit_economics.price_per_unit)
        )?;
        writeln!(
            f,
            "Adjusted variable cost:     {}",
            format_currency(adj.unit_economics.variable_cost_per_unit)
        )?;
        writeln!(
            f,
            "Adjusted fixed costs:       {}",
            format_currency(adj.fixed_costs)
        )?;
        writeln!(
            f,
            "Break-even units:           {} (was {})",
            format_quantity(adj.break_even.units),
            format_quantity(self.base.units)
        )?;
        write!(
            f,
            "Break-even revenue:         {} (was {})",
            format_currency(adj.break_even.revenue),
            format_currency(self.base.revenue)
        )
    }
}
