use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use profit_core::calculations::profitability::break_even;
use profit_core::calculations::{
    AnalysisError, BreakEvenChart, CalculationError, ChartError, ProfitabilityAnalysis,
    SensitivityChanges, SensitivityResult, analyze_sensitivity,
};
use profit_core::db::{DbConfig, RepositoryRegistry};
use profit_core::{
    AnalysisInput, AnalysisResult, BreakEven, NewResultRecord, RepositoryError, ResultRepository,
    UnitEconomics,
};
use profit_db_sqlite::SqliteRepositoryFactory;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cli::SensitivityArgs;
use crate::csv_io::{self, ImportedRow};
use crate::form::{AnalysisForm, FormErrors};
use crate::utils::parse_required_decimal;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input:\n{0}")]
    Input(#[from] FormErrors),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Calculation(#[from] CalculationError),

    #[error("chart not written: {0}")]
    Chart(#[from] ChartExportError),

    #[error("result not saved: {0}")]
    Storage(#[from] RepositoryError),
}

#[derive(Debug, Error)]
pub enum ChartExportError {
    #[error(transparent)]
    Build(#[from] ChartError),

    #[error("cannot create '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Every storage backend this binary knows about.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Opens the record store for `backend` at `connection_string`.
pub async fn open_repository(
    backend: &str,
    connection_string: &str,
) -> Result<Box<dyn ResultRepository>, RepositoryError> {
    let config = DbConfig {
        backend: backend.to_string(),
        connection_string: connection_string.to_string(),
    };
    debug!(backend = %config.backend, db = %config.connection_string, "opening record store");
    build_registry().create(&config).await
}

/// Parses the form and runs the calculator. Touches no storage.
pub fn analyze(form: &AnalysisForm) -> Result<(AnalysisInput, AnalysisResult), AppError> {
    let input = form.parse()?;
    let result = ProfitabilityAnalysis::analyze(&input)?;
    Ok((input, result))
}

/// Appends one analysis to the store and returns its id.
pub async fn record(
    repo: &dyn ResultRepository,
    input: AnalysisInput,
    result: AnalysisResult,
) -> Result<i64, RepositoryError> {
    let id = repo.append(NewResultRecord::new(input, result)).await?;
    info!(id, "analysis recorded");
    Ok(id)
}

/// Chart series for an analysis, or `None` when it has no break-even.
pub fn break_even_chart(
    input: &AnalysisInput,
    result: &AnalysisResult,
    max_points: usize,
) -> Result<Option<BreakEvenChart>, ChartError> {
    let (Some(unit), Some(be)) = (input.unit_economics, result.break_even) else {
        return Ok(None);
    };
    BreakEvenChart::build(input.fixed_costs, unit, be.units, max_points).map(Some)
}

/// Writes the chart series for an analysis to `path`.
///
/// Returns the number of points written, or `None` when the analysis has no
/// break-even and nothing was written.
pub fn export_chart(
    input: &AnalysisInput,
    result: &AnalysisResult,
    path: &Path,
    max_points: usize,
) -> Result<Option<usize>, ChartExportError> {
    let Some(chart) = break_even_chart(input, result, max_points)? else {
        return Ok(None);
    };
    let file = File::create(path).map_err(|source| ChartExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    csv_io::write_chart(BufWriter::new(file), &chart.points)?;
    Ok(Some(chart.points.len()))
}

/// Outcome of the side effects that follow a displayed analysis.
#[derive(Debug)]
pub struct Followups {
    /// `None` when no store was given.
    pub saved: Option<Result<i64, RepositoryError>>,
    /// `None` when no chart was requested.
    pub chart: Option<Result<Option<usize>, ChartExportError>>,
}

/// Records the analysis, then writes the optional chart.
///
/// The record is appended before the chart is attempted, and a failure of
/// either step does not skip the other.
pub async fn finish_analysis(
    repo: Option<&dyn ResultRepository>,
    input: &AnalysisInput,
    result: &AnalysisResult,
    chart: Option<&Path>,
    max_points: usize,
) -> Followups {
    let saved = match repo {
        Some(repo) => Some(record(repo, input.clone(), result.clone()).await),
        None => None,
    };
    let chart = chart.map(|path| {
        let written = export_chart(input, result, path, max_points);
        if let Err(e) = &written {
            warn!(path = %path.display(), "chart not written: {}", e);
        }
        written
    });
    Followups { saved, chart }
}

/// Base break-even and the break-even after the requested changes.
pub fn sensitivity(args: &SensitivityArgs) -> Result<(BreakEven, SensitivityResult), AppError> {
    let mut errors = Vec::new();
    let mut field = |name: &str, raw: &str| {
        parse_required_decimal(name, raw)
            .map_err(|e| errors.push(e))
            .ok()
    };

    let fixed_costs = field("fixed_costs", &args.fixed_costs);
    let price_per_unit = field("price_per_unit", &args.price_per_unit);
    let variable_cost_per_unit = field("variable_cost_per_unit", &args.variable_cost);
    let price_change_pct = field("price_change", &args.price_change);
    let variable_cost_change_pct = field("variable_cost_change", &args.variable_cost_change);
    let fixed_cost_change_pct = field("fixed_cost_change", &args.fixed_cost_change);

    let (
        Some(fixed_costs),
        Some(price_per_unit),
        Some(variable_cost_per_unit),
        Some(price_change_pct),
        Some(variable_cost_change_pct),
        Some(fixed_cost_change_pct),
    ) = (
        fixed_costs,
        price_per_unit,
        variable_cost_per_unit,
        price_change_pct,
        variable_cost_change_pct,
        fixed_cost_change_pct,
    )
    else {
        return Err(FormErrors(errors).into());
    };

    let base_input = AnalysisInput {
        fixed_costs,
        unit_economics: Some(UnitEconomics {
            price_per_unit,
            variable_cost_per_unit,
        }),
        ..Default::default()
    };
    base_input
        .validate()
        .map_err(|e| FormErrors(vec![e]))?;

    let unit = UnitEconomics {
        price_per_unit,
        variable_cost_per_unit,
    };
    let base = break_even(fixed_costs, &unit)?;
    let adjusted = analyze_sensitivity(
        fixed_costs,
        unit,
        SensitivityChanges {
            price_change_pct,
            variable_cost_change_pct,
            fixed_cost_change_pct,
        },
    )?;
    Ok((base, adjusted))
}

/// Why one imported row produced no stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    /// Rows that computed successfully, with their data row number.
    pub analyzed: Vec<(usize, AnalysisResult)>,
    pub saved: usize,
    pub failures: Vec<ImportFailure>,
}

impl fmt::Display for ImportFailure {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.reason)
    }
}

/// Analyzes every row and, when `repo` is given, records each success.
///
/// A bad row or a failed write is noted in the summary and the import
/// moves on to the next row.
pub async fn import(
    repo: Option<&dyn ResultRepository>,
    rows: Vec<ImportedRow>,
) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for ImportedRow { row, input } in rows {
        let computed = input
            .map_err(AppError::from)
            .and_then(|input| {
                let result = ProfitabilityAnalysis::analyze(&input)?;
                Ok((input, result))
            });
        let (input, result) = match computed {
            Ok(pair) => pair,
            Err(e) => {
                warn!(row, "skipping row: {}", e);
                summary.failures.push(ImportFailure {
                    row,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        summary.analyzed.push((row, result.clone()));
        if let Some(repo) = repo {
            match record(repo, input, result).await {
                Ok(_) => summary.saved += 1,
                Err(e) => summary.failures.push(ImportFailure {
                    row,
                    reason: AppError::from(e).to_string(),
                }),
            }
        }
    }

    info!(
        analyzed = summary.analyzed.len(),
        saved = summary.saved,
        failed = summary.failures.len(),
        "import finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use profit_core::InputError;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::csv_io::load_from_str;

    fn form(
        revenue: &str,
        cogs: &str,
    ) -> AnalysisForm {
        AnalysisForm {
            revenue: revenue.to_string(),
            cogs: cogs.to_string(),
            ..Default::default()
        }
    }

    fn full_form() -> AnalysisForm {
        AnalysisForm {
            operating_expenses: "100000".to_string(),
            interest: "15000".to_string(),
            taxes: "25000".to_string(),
            fixed_costs: "80000".to_string(),
            price_per_unit: "50".to_string(),
            variable_cost_per_unit: "30".to_string(),
            ..form("500000", "300000")
        }
    }

    fn sensitivity_args(
        price_change: &str,
        variable_cost_change: &str,
    ) -> SensitivityArgs {
        SensitivityArgs {
            fixed_costs: "80000".to_string(),
            price_per_unit: "50".to_string(),
            variable_cost: "30".to_string(),
            price_change: price_change.to_string(),
            variable_cost_change: variable_cost_change.to_string(),
            fixed_cost_change: "0".to_string(),
        }
    }

    async fn memory_repo() -> Box<dyn ResultRepository> {
        open_repository("sqlite", ":memory:")
            .await
            .expect("in-memory store should open")
    }

    #[test]
    fn registry_offers_sqlite() {
        assert_eq!(build_registry().available_backends(), vec!["sqlite"]);
    }

    #[tokio::test]
    async fn unknown_backend_is_configuration_error() {
        let result = open_repository("postgres", "whatever").await;

        assert!(matches!(result, Err(RepositoryError::Configuration(_))));
    }

    #[test]
    fn analyze_computes_full_result() {
        let (_, result) = analyze(&full_form()).expect("should analyze");

        assert_eq!(result.gross_profit, dec!(200000));
        assert_eq!(result.net_profit, dec!(60000));
        assert_eq!(result.gross_margin, dec!(40));
        let be = result.break_even.expect("break-even present");
        assert_eq!(be.units, dec!(4000));
        assert_eq!(be.revenue, dec!(200000));
    }

    #[test]
    fn analyze_reports_form_errors() {
        match analyze(&form("abc", "1")) {
            Err(AppError::Input(errors)) => assert_eq!(errors.0.len(), 1),
            other => panic!("expected Input error, got {other:?}"),
        }
    }

    #[test]
    fn analyze_zero_revenue_is_division_by_zero() {
        match analyze(&form("0", "0")) {
            Err(AppError::Analysis(AnalysisError::Calculation(
                CalculationError::DivisionByZero,
            ))) => {}
            other => panic!("expected DivisionByZero, got {other:?}"),
        }
    }

    #[test]
    fn analyze_price_below_variable_cost_is_invalid_pricing() {
        let form = AnalysisForm {
            price_per_unit: "30".to_string(),
            variable_cost_per_unit: "30".to_string(),
            ..full_form()
        };

        assert!(matches!(
            analyze(&form),
            Err(AppError::Analysis(AnalysisError::Calculation(
                CalculationError::InvalidPricing { .. }
            )))
        ));
    }

    #[tokio::test]
    async fn record_then_history_returns_record_first() {
        let repo = memory_repo().await;
        let (input, result) = analyze(&form("1000", "400")).expect("should analyze");
        record(&*repo, input.clone(), result.clone())
            .await
            .expect("first append");
        let (input2, result2) = analyze(&full_form()).expect("should analyze");

        let id = record(&*repo, input2.clone(), result2.clone())
            .await
            .expect("second append");

        let all = repo.list_all().await.expect("should list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].input, input2);
        assert_eq!(all[0].result, result2);
        assert_eq!(all[1].input, input);
    }

    #[tokio::test]
    async fn record_on_closed_store_fails_after_compute() {
        let repo = memory_repo().await;
        let (input, result) = analyze(&full_form()).expect("compute works without storage");
        repo.close().await;

        let err = record(&*repo, input, result).await.expect_err("store is closed");

        assert!(matches!(err, RepositoryError::Database(_)));
    }

    #[test]
    fn chart_for_break_even_analysis() {
        let (input, result) = analyze(&full_form()).expect("should analyze");

        let chart = break_even_chart(&input, &result, 9)
            .expect("chart should build")
            .expect("chart present");

        assert_eq!(chart.points.len(), 9);
        assert_eq!(chart.points[4].units, 4000);
        assert_eq!(chart.points[4].total_cost, chart.points[4].total_revenue);
    }

    #[tokio::test]
    async fn chart_failure_still_records_the_analysis() {
        let repo = memory_repo().await;
        let (input, result) = analyze(&full_form()).expect("should analyze");

        let followups = finish_analysis(
            Some(&*repo),
            &input,
            &result,
            Some(Path::new("/nonexistent-dir/chart.csv")),
            50,
        )
        .await;

        assert!(matches!(followups.saved, Some(Ok(_))));
        assert!(matches!(followups.chart, Some(Err(ChartExportError::Io { .. }))));
        let records = repo.list_all().await.expect("should list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].result, result);
    }

    #[tokio::test]
    async fn chart_build_failure_still_records_the_analysis() {
        let repo = memory_repo().await;
        let (input, result) = analyze(&full_form()).expect("should analyze");

        // Fewer than two points cannot form a chart.
        let followups = finish_analysis(
            Some(&*repo),
            &input,
            &result,
            Some(Path::new("/nonexistent-dir/chart.csv")),
            1,
        )
        .await;

        assert!(matches!(
            followups.chart,
            Some(Err(ChartExportError::Build(ChartError::TooFewPoints(1))))
        ));
        assert_eq!(repo.list_all().await.expect("should list").len(), 1);
    }

    #[tokio::test]
    async fn finish_analysis_without_store_or_chart_does_nothing() {
        let (input, result) = analyze(&form("1000", "400")).expect("should analyze");

        let followups = finish_analysis(None, &input, &result, None, 50).await;

        assert!(followups.saved.is_none());
        assert!(followups.chart.is_none());
    }

    #[test]
    fn export_chart_skips_analysis_without_break_even() {
        let (input, result) = analyze(&form("1000", "400")).expect("should analyze");

        let written = export_chart(&input, &result, Path::new("/nonexistent-dir/chart.csv"), 50);

        assert!(matches!(written, Ok(None)));
    }

    #[test]
    fn no_chart_without_unit_economics() {
        let (input, result) = analyze(&form("1000", "400")).expect("should analyze");

        assert_eq!(break_even_chart(&input, &result, 50), Ok(None));
    }

    #[test]
    fn sensitivity_without_changes_matches_base() {
        let (base, adjusted) = sensitivity(&sensitivity_args("0", "0")).expect("should compute");

        assert_eq!(base.units, dec!(4000));
        assert_eq!(adjusted.break_even, base);
    }

    #[test]
    fn sensitivity_price_increase_lowers_break_even() {
        let (_, adjusted) = sensitivity(&sensitivity_args("10", "0")).expect("should compute");

        assert_eq!(adjusted.unit_economics.price_per_unit, dec!(55));
        assert_eq!(adjusted.break_even.units, dec!(3200));
    }

    #[test]
    fn sensitivity_collects_parse_errors() {
        let args = SensitivityArgs {
            fixed_costs: "lots".to_string(),
            ..sensitivity_args("x", "0")
        };

        match sensitivity(&args) {
            Err(AppError::Input(errors)) => assert_eq!(errors.0.len(), 2),
            other => panic!("expected Input error, got {other:?}"),
        }
    }

    #[test]
    fn sensitivity_rejects_negative_base_values() {
        let args = SensitivityArgs {
            variable_cost: "-1".to_string(),
            ..sensitivity_args("0", "0")
        };

        match sensitivity(&args) {
            Err(AppError::Input(errors)) => assert_eq!(
                errors.0,
                vec![InputError::NegativeValue {
                    field: "variable_cost_per_unit".to_string(),
                    value: dec!(-1),
                }]
            ),
            other => panic!("expected Input error, got {other:?}"),
        }
    }

    #[test]
    fn sensitivity_change_that_inverts_pricing_fails() {
        let result = sensitivity(&sensitivity_args("0", "70"));

        assert!(matches!(
            result,
            Err(AppError::Analysis(AnalysisError::Calculation(
                CalculationError::InvalidPricing { .. }
            )))
        ));
    }

    #[test]
    fn sensitivity_change_below_minus_hundred_percent_fails() {
        let args = SensitivityArgs {
            fixed_cost_change: "-200".to_string(),
            ..sensitivity_args("0", "0")
        };

        match sensitivity(&args) {
            Err(AppError::Analysis(AnalysisError::Input(InputError::NegativeValue {
                field,
                ..
            }))) => assert_eq!(field, "fixed_costs"),
            other => panic!("expected NegativeValue, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn import_records_good_rows_and_reports_bad_ones() {
        let repo = memory_repo().await;
        let rows = load_from_str(
            "\
revenue,cogs,fixed_costs,price_per_unit,variable_cost_per_unit
1000,400,,,
0,0,,,
500000,300000,80000,50,30
oops,1,,,
",
        )
        .expect("structure is valid");

        let summary = import(Some(&*repo), rows).await;

        assert_eq!(summary.analyzed.len(), 2);
        assert_eq!(summary.saved, 2);
        assert_eq!(
            summary.failures.iter().map(|f| f.row).collect::<Vec<_>>(),
            vec![2, 4]
        );
        assert_eq!(repo.list_all().await.expect("should list").len(), 2);
    }

    #[tokio::test]
    async fn import_without_store_only_analyzes() {
        let rows = load_from_str("revenue,cogs\n1000,400\n2000,500\n").expect("valid");

        let summary = import(None, rows).await;

        assert_eq!(summary.analyzed.len(), 2);
        assert_eq!(summary.saved, 0);
        assert!(summary.failures.is_empty());
    }

    #[tokio::test]
    async fn import_notes_storage_failures_per_row() {
        let repo = memory_repo().await;
        repo.close().await;
        let rows = load_from_str("revenue,cogs\n1000,400\n").expect("valid");

        let summary = import(Some(&*repo), rows).await;

        assert_eq!(summary.analyzed.len(), 1);
        assert_eq!(summary.saved, 0);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].reason.starts_with("result not saved"));
    }
}
