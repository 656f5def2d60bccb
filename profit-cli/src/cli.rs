use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::form::AnalysisForm;

/// Business profitability analyzer.
///
/// Computes profit, margins and break-even from a few figures and keeps
/// every analysis in a local database.
#[derive(Debug, Parser)]
#[command(name = "profitability", version)]
pub struct Cli {
    /// Database backend to use.
    #[arg(long, global = true, default_value = "sqlite")]
    pub backend: String,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `profitability.db`) or `:memory:`.
    #[arg(long, global = true, default_value = "profitability.db")]
    pub db: String,

    /// Log filter, e.g. `debug` or `profit_core=trace`. Overrides `RUST_LOG`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze one set of figures and record the result.
    Analyze(AnalyzeArgs),

    /// List every recorded analysis, newest first.
    History {
        /// Write the history to this CSV file instead of printing it.
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show one recorded analysis.
    Show {
        /// Record id as listed by `history`.
        id: i64,
    },

    /// Recompute break-even after percentage changes to price and costs.
    Sensitivity(SensitivityArgs),

    /// Analyze every row of a CSV file.
    Import {
        file: PathBuf,

        /// Do not record the results.
        #[arg(long)]
        no_save: bool,
    },
}

/// Amounts are taken as text so they accept `$` and thousands separators.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub revenue: String,

    /// Cost of goods sold.
    #[arg(long, allow_hyphen_values = true)]
    pub cogs: String,

    #[arg(long, allow_hyphen_values = true, default_value = "")]
    pub operating_expenses: String,

    #[arg(long, allow_hyphen_values = true, default_value = "")]
    pub interest: String,

    #[arg(long, allow_hyphen_values = true, default_value = "")]
    pub taxes: String,

    #[arg(long, allow_hyphen_values = true, default_value = "")]
    pub fixed_costs: String,

    /// Enables break-even analysis together with `--variable-cost`.
    #[arg(long, allow_hyphen_values = true, default_value = "")]
    pub price_per_unit: String,

    /// Variable cost per unit.
    #[arg(long, allow_hyphen_values = true, default_value = "")]
    pub variable_cost: String,

    /// Do not record the result.
    #[arg(long)]
    pub no_save: bool,

    /// Write the break-even chart series to this CSV file.
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// Maximum number of chart samples.
    #[arg(long, default_value_t = profit_core::calculations::chart::DEFAULT_MAX_POINTS)]
    pub chart_points: usize,
}

impl AnalyzeArgs {
    pub fn to_form(&self) -> AnalysisForm {
        AnalysisForm {
            revenue: self.revenue.clone(),
            cogs: self.cogs.clone(),
            operating_expenses: self.operating_expenses.clone(),
            interest: self.interest.clone(),
            taxes: self.taxes.clone(),
            fixed_costs: self.fixed_costs.clone(),
            price_per_unit: self.price_per_unit.clone(),
            variable_cost_per_unit: self.variable_cost.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct SensitivityArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub fixed_costs: String,

    #[arg(long, allow_hyphen_values = true)]
    pub price_per_unit: String,

    /// Variable cost per unit.
    #[arg(long, allow_hyphen_values = true)]
    pub variable_cost: String,

    /// Percentage change in price, e.g. `10` or `-5`.
    #[arg(long, allow_hyphen_values = true, default_value = "0")]
    pub price_change: String,

    #[arg(long, allow_hyphen_values = true, default_value = "0")]
    pub variable_cost_change: String,

    #[arg(long, allow_hyphen_values = true, default_value = "0")]
    pub fixed_cost_change: String,
}
