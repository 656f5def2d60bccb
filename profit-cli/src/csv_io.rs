//! CSV import of analysis inputs and CSV export of history and chart data.
//!
//! ## Import format
//!
//! Headers are matched by name, so column order does not matter. Cells are
//! parsed like form fields: surrounding whitespace, a leading `$` and
//! thousands separators are accepted.
//!
//! | Column                   | Required | Notes                          |
//! |--------------------------|----------|--------------------------------|
//! | `revenue`                | yes      |                                |
//! | `cogs`                   | yes      | cost of goods sold             |
//! | `operating_expenses`     | no       | empty or absent means 0        |
//! | `interest`               | no       | empty or absent means 0        |
//! | `taxes`                  | no       | empty or absent means 0        |
//! | `fixed_costs`            | no       | empty or absent means 0        |
//! | `price_per_unit`         | no       | give both or neither           |
//! | `variable_cost_per_unit` | no       | give both or neither           |
//!
//! ```csv
//! revenue,cogs,operating_expenses,interest,taxes,fixed_costs,price_per_unit,variable_cost_per_unit
//! 500000,300000,100000,15000,25000,80000,50,30
//! 120000,90000,20000,,,,,
//! ```
//!
//! A structurally broken file (bad quoting, ragged rows, missing required
//! header) fails as a whole. A row whose values are invalid is reported on
//! its own so the rest of the file can still be analyzed.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use profit_core::calculations::ChartPoint;
use profit_core::{AnalysisInput, ResultRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::form::{AnalysisForm, FormErrors};

#[derive(Debug, Deserialize)]
struct CsvRow {
    revenue: String,
    cogs: String,
    operating_expenses: Option<String>,
    interest: Option<String>,
    taxes: Option<String>,
    fixed_costs: Option<String>,
    price_per_unit: Option<String>,
    variable_cost_per_unit: Option<String>,
}

impl CsvRow {
    fn into_form(self) -> AnalysisForm {
        AnalysisForm {
            revenue: self.revenue,
            cogs: self.cogs,
            operating_expenses: self.operating_expenses.unwrap_or_default(),
            interest: self.interest.unwrap_or_default(),
            taxes: self.taxes.unwrap_or_default(),
            fixed_costs: self.fixed_costs.unwrap_or_default(),
            price_per_unit: self.price_per_unit.unwrap_or_default(),
            variable_cost_per_unit: self.variable_cost_per_unit.unwrap_or_default(),
        }
    }
}

/// Errors that stop an import before any row is analyzed.
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    /// The CSV is structurally invalid or lacks a required column.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One data row of an import file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedRow {
    /// 1-based data row number (the header is row 0).
    pub row: usize,
    pub input: Result<AnalysisInput, FormErrors>,
}

/// Parses CSV text into one [`ImportedRow`] per data row, in file order.
///
/// # Errors
///
/// [`CsvLoadError::Parse`] when the CSV is structurally invalid or a
/// required column is missing.
pub fn load_from_str(input: &str) -> Result<Vec<ImportedRow>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            Ok(ImportedRow {
                row: idx + 1,
                input: row.into_form().parse(),
            })
        })
        .collect()
}

/// Reads `path` and delegates to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<Vec<ImportedRow>, CsvLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CsvLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents)
}

/// Flat layout of a [`ResultRecord`] for export.
#[derive(Debug, Serialize)]
struct HistoryCsvRow {
    id: i64,
    created_at: DateTime<Utc>,
    revenue: Decimal,
    cogs: Decimal,
    operating_expenses: Decimal,
    interest: Decimal,
    taxes: Decimal,
    fixed_costs: Decimal,
    price_per_unit: Option<Decimal>,
    variable_cost_per_unit: Option<Decimal>,
    gross_profit: Decimal,
    operating_profit: Decimal,
    net_profit: Decimal,
    gross_margin: Decimal,
    operating_margin: Decimal,
    net_margin: Decimal,
    contribution_margin: Option<Decimal>,
    break_even_units: Option<Decimal>,
    break_even_revenue: Option<Decimal>,
}

impl From<&ResultRecord> for HistoryCsvRow {
    fn from(record: &ResultRecord) -> Self {
        let input = &record.input;
        let result = &record.result;
        let unit = input.unit_economics.as_ref();
        let be = result.break_even.as_ref();
        Self {
            id: record.id,
            created_at: record.created_at,
            revenue: input.revenue,
            cogs: input.cogs,
            operating_expenses: input.operating_expenses,
            interest: input.interest,
            taxes: input.taxes,
            fixed_costs: input.fixed_costs,
            price_per_unit: unit.map(|u| u.price_per_unit),
            variable_cost_per_unit: unit.map(|u| u.variable_cost_per_unit),
            gross_profit: result.gross_profit,
            operating_profit: result.operating_profit,
            net_profit: result.net_profit,
            gross_margin: result.gross_margin,
            operating_margin: result.operating_margin,
            net_margin: result.net_margin,
            contribution_margin: be.map(|b| b.contribution_margin),
            break_even_units: be.map(|b| b.units),
            break_even_revenue: be.map(|b| b.revenue),
        }
    }
}

/// Column order of [`HistoryCsvRow`].
const HISTORY_HEADER: [&str; 19] = [
    "id",
    "created_at",
    "revenue",
    "cogs",
    "operating_expenses",
    "interest",
    "taxes",
    "fixed_costs",
    "price_per_unit",
    "variable_cost_per_unit",
    "gross_profit",
    "operating_profit",
    "net_profit",
    "gross_margin",
    "operating_margin",
    "net_margin",
    "contribution_margin",
    "break_even_units",
    "break_even_revenue",
];

const CHART_HEADER: [&str; 3] = ["units", "total_cost", "total_revenue"];

/// A writer that does not infer headers from the first serialized row, so
/// the header is present even when no rows follow.
fn writer_with_header<W: Write>(
    writer: W,
    header: &[&str],
) -> Result<csv::Writer<W>, csv::Error> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(header)?;
    Ok(csv)
}

/// Writes `records` with a header row. Values are unrounded.
pub fn write_history<W: Write>(
    writer: W,
    records: &[ResultRecord],
) -> Result<(), csv::Error> {
    let mut csv = writer_with_header(writer, &HISTORY_HEADER)?;
    for record in records {
        csv.serialize(HistoryCsvRow::from(record))?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the chart series as `units,total_cost,total_revenue`.
pub fn write_chart<W: Write>(
    writer: W,
    points: &[ChartPoint],
) -> Result<(), csv::Error> {
    let mut csv = writer_with_header(writer, &CHART_HEADER)?;
    for point in points {
        csv.serialize(point)?;
    }
    csv.flush()?;
    Ok(())
}
