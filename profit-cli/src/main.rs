use std::fs::File;
use std::io::BufWriter;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use profit_cli::app::{self, AppError};
use profit_cli::cli::{AnalyzeArgs, Cli, Command};
use profit_cli::report::{AnalysisReport, HistoryReport, RecordReport, SensitivityReport};
use profit_cli::{csv_io, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logging = logging::init();

    let cli = Cli::parse();
    if let Some(level) = &cli.log_level {
        logging.set_level(level)?;
    }
    if let Some(path) = &cli.log_file {
        logging.log_to_file(path)?;
    }
    debug!(?cli, "starting");

    let outcome = run(&cli).await;
    logging.close_file();
    outcome
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Analyze(args) => analyze(cli, args).await,
        Command::History { csv } => {
            let repo = app::open_repository(&cli.backend, &cli.db).await?;
            let records = repo.list_all().await;
            repo.close().await;
            let records = records?;

            match csv {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("cannot create '{}'", path.display()))?;
                    csv_io::write_history(BufWriter::new(file), &records)?;
                    println!("Wrote {} records to {}", records.len(), path.display());
                }
                None => println!("{}", HistoryReport(&records)),
            }
            Ok(())
        }
        Command::Show { id } => {
            let repo = app::open_repository(&cli.backend, &cli.db).await?;
            let record = repo.get(*id).await;
            repo.close().await;
            let record = record.with_context(|| format!("cannot load record {id}"))?;

            println!("{}", RecordReport(&record));
            Ok(())
        }
        Command::Sensitivity(args) => {
            let (base, adjusted) = app::sensitivity(args)?;
            println!(
                "{}",
                SensitivityReport {
                    base: &base,
                    adjusted: &adjusted,
                }
            );
            Ok(())
        }
        Command::Import { file, no_save } => {
            let rows = csv_io::load_from_file(file)?;
            let repo = if *no_save {
                None
            } else {
                Some(app::open_repository(&cli.backend, &cli.db).await?)
            };

            let summary = app::import(repo.as_deref(), rows).await;
            if let Some(repo) = &repo {
                repo.close().await;
            }

            for (row, result) in &summary.analyzed {
                println!("Row {row}:\n{}\n", AnalysisReport(result));
            }
            for failure in &summary.failures {
                eprintln!("{failure}");
            }
            println!(
                "Analyzed {} rows, saved {}, failed {}",
                summary.analyzed.len(),
                summary.saved,
                summary.failures.len()
            );
            if summary.failures.is_empty() {
                Ok(())
            } else {
                anyhow::bail!("{} rows failed", summary.failures.len())
            }
        }
    }
}

async fn analyze(
    cli: &Cli,
    args: &AnalyzeArgs,
) -> anyhow::Result<()> {
    let (input, result) = app::analyze(&args.to_form())?;
    println!("{}", AnalysisReport(&result));

    // The result is already on screen; saving and charting fail independently.
    let opened = if args.no_save {
        None
    } else {
        Some(app::open_repository(&cli.backend, &cli.db).await)
    };
    let repo = match &opened {
        Some(Ok(repo)) => Some(&**repo),
        _ => None,
    };
    let followups = app::finish_analysis(
        repo,
        &input,
        &result,
        args.chart.as_deref(),
        args.chart_points,
    )
    .await;
    if let Some(repo) = repo {
        repo.close().await;
    }

    let saved = match opened {
        Some(Err(e)) => Some(Err(e)),
        _ => followups.saved,
    };
    let saved = match saved.transpose() {
        Ok(id) => {
            if let Some(id) = id {
                println!("Saved as record {id}");
            }
            Ok(())
        }
        Err(e) => Err(AppError::from(e)),
    };

    let charted = match followups.chart.transpose() {
        Ok(Some(Some(count))) => {
            if let Some(path) = &args.chart {
                println!("Wrote {count} chart points to {}", path.display());
            }
            Ok(())
        }
        Ok(Some(None)) => {
            eprintln!("No break-even to chart; pass --price-per-unit and --variable-cost");
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => Err(AppError::from(e)),
    };

    match (saved, charted) {
        (Err(store), Err(chart)) => {
            eprintln!("{chart}");
            Err(store.into())
        }
        (Err(e), _) | (_, Err(e)) => Err(e.into()),
        (Ok(()), Ok(())) => Ok(()),
    }
}
