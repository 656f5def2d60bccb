use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use profit_core::{
    AnalysisInput, AnalysisResult, BreakEven, NewResultRecord, RepositoryError, ResultRecord,
    ResultRepository, UnitEconomics,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

const SELECT_COLUMNS: &str = "SELECT id, revenue, cogs, operating_expenses, interest, taxes,
        fixed_costs, price_per_unit, variable_costs,
        gross_profit, operating_profit, net_profit,
        gross_margin, operating_margin, profit_margin,
        contribution_margin, break_even_units, break_even_revenue,
        created_at
     FROM analysis_results";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, creating the file when missing.
    ///
    /// Accepts a bare path (`profitability.db`), a sqlx URL
    /// (`sqlite:profitability.db`) or `:memory:`. The pool holds a single
    /// connection so writes are strictly sequential.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;

        debug!(database = database_url, "opened sqlite database");
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ResultRecord, RepositoryError> {
    let price_per_unit = get_optional_decimal(row, "price_per_unit")?;
    let variable_costs = get_optional_decimal(row, "variable_costs")?;
    let unit_economics = match (price_per_unit, variable_costs) {
        (Some(price_per_unit), Some(variable_cost_per_unit)) => Some(UnitEconomics {
            price_per_unit,
            variable_cost_per_unit,
        }),
        (None, None) => None,
        _ => {
            return Err(RepositoryError::Database(
                "price_per_unit and variable_costs must both be set or both be NULL".to_string(),
            ));
        }
    };

    let break_even_units = get_optional_decimal(row, "break_even_units")?;
    let break_even_revenue = get_optional_decimal(row, "break_even_revenue")?;
    let break_even = match (break_even_units, break_even_revenue) {
        (Some(units), Some(revenue)) => Some(BreakEven {
            contribution_margin: get_decimal(row, "contribution_margin")?,
            units,
            revenue,
        }),
        (None, None) => None,
        _ => {
            return Err(RepositoryError::Database(
                "break_even_units and break_even_revenue must both be set or both be NULL"
                    .to_string(),
            ));
        }
    };

    Ok(ResultRecord {
        id: row.try_get("id").map_err(db_err)?,
        input: AnalysisInput {
            revenue: get_decimal(row, "revenue")?,
            cogs: get_decimal(row, "cogs")?,
            operating_expenses: get_decimal(row, "operating_expenses")?,
            interest: get_decimal(row, "interest")?,
            taxes: get_decimal(row, "taxes")?,
            fixed_costs: get_decimal(row, "fixed_costs")?,
            unit_economics,
        },
        result: AnalysisResult {
            gross_profit: get_decimal(row, "gross_profit")?,
            operating_profit: get_decimal(row, "operating_profit")?,
            net_profit: get_decimal(row, "net_profit")?,
            gross_margin: get_decimal(row, "gross_margin")?,
            operating_margin: get_decimal(row, "operating_margin")?,
            net_margin: get_decimal(row, "profit_margin")?,
            break_even,
        },
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

#[async_trait]
impl ResultRepository for SqliteRepository {
    async fn append(
        &self,
        record: NewResultRecord,
    ) -> Result<i64, RepositoryError> {
        let NewResultRecord { input, result } = record;
        let unit = input.unit_economics;
        let break_even = result.break_even;

        let inserted = sqlx::query(
            "INSERT INTO analysis_results (
                revenue, cogs, operating_expenses, interest, taxes, fixed_costs,
                price_per_unit, variable_costs,
                gross_profit, operating_profit, net_profit,
                gross_margin, operating_margin, profit_margin,
                contribution_margin, break_even_units, break_even_revenue,
                created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(decimal_to_text(input.revenue))
        .bind(decimal_to_text(input.cogs))
        .bind(decimal_to_text(input.operating_expenses))
        .bind(decimal_to_text(input.interest))
        .bind(decimal_to_text(input.taxes))
        .bind(decimal_to_text(input.fixed_costs))
        .bind(unit.map(|u| decimal_to_text(u.price_per_unit)))
        .bind(unit.map(|u| decimal_to_text(u.variable_cost_per_unit)))
        .bind(decimal_to_text(result.gross_profit))
        .bind(decimal_to_text(result.operating_profit))
        .bind(decimal_to_text(result.net_profit))
        .bind(decimal_to_text(result.gross_margin))
        .bind(decimal_to_text(result.operating_margin))
        .bind(decimal_to_text(result.net_margin))
        .bind(break_even.map(|b| decimal_to_text(b.contribution_margin)))
        .bind(break_even.map(|b| decimal_to_text(b.units)))
        .bind(break_even.map(|b| decimal_to_text(b.revenue)))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = inserted.last_insert_rowid();
        info!(id, "appended analysis result");
        Ok(id)
    }

    async fn get(
        &self,
        id: i64,
    ) -> Result<ResultRecord, RepositoryError> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_record(&row)
    }

    async fn list_all(&self) -> Result<Vec<ResultRecord>, RepositoryError> {
        let rows = sqlx::query(&format!("{} ORDER BY id DESC", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        debug!(count = rows.len(), "listed analysis results");
        rows.iter().map(row_to_record).collect()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
