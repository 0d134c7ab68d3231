use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tds_core::{
    RateCondition, RateSlab, RepositoryError, SectionRepository, TdsSection, ThresholdType,
};
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

const MEMORY: &str = ":memory:";

const SECTION_COLUMNS: &str = "code, description, threshold, threshold_note, company_rate,
    individual_rate, no_pan_rate, company_rate_note, individual_rate_note,
    is_property_section, tds_on_excess";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, creating the file if it does not exist.
    ///
    /// Accepts a bare path (`tds.db`), a sqlx URL (`sqlite://tds.db`) or
    /// `:memory:`. In-memory databases are pinned to a single connection so
    /// every query sees the same data.
    pub async fn new(database_url: &str) -> Result<Self> {
        let in_memory = database_url == MEMORY || database_url == "sqlite::memory:";

        let connected = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await
        } else {
            let options = SqliteConnectOptions::from_str(database_url)
                .with_context(|| format!("Invalid database path: {}", database_url))?
                .create_if_missing(true);
            SqlitePoolOptions::new().connect_with(options).await
        };
        let pool =
            connected.with_context(|| format!("Failed to connect to database: {}", database_url))?;

        info!(database = database_url, "opened sqlite database");
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

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;

            debug!(file = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn load_children(
        &self,
        code: Option<&str>,
    ) -> Result<Children, RepositoryError> {
        let filter = if code.is_some() {
            "WHERE section_code = ?"
        } else {
            ""
        };

        let mut children = Children::default();

        let rows = bind_code(
            &format!(
                "SELECT section_code, name, threshold, threshold_note
                 FROM tds_section_threshold_type {filter} ORDER BY section_code, position"
            ),
            code,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        for row in &rows {
            children
                .threshold_types
                .entry(section_key(row)?)
                .or_default()
                .push(ThresholdType {
                    name: row.try_get("name").map_err(db_error)?,
                    threshold: get_decimal(row, "threshold")?,
                    threshold_note: row.try_get("threshold_note").map_err(db_error)?,
                });
        }

        let rows = bind_code(
            &format!(
                "SELECT section_code, description, rate
                 FROM tds_section_slab {filter} ORDER BY section_code, position"
            ),
            code,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        for row in &rows {
            children
                .slabs
                .entry(section_key(row)?)
                .or_default()
                .push(RateSlab {
                    description: row.try_get("description").map_err(db_error)?,
                    rate: get_decimal(row, "rate")?,
                });
        }

        let rows = bind_code(
            &format!(
                "SELECT section_code, condition, rate
                 FROM tds_section_condition {filter} ORDER BY section_code, position"
            ),
            code,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        for row in &rows {
            children
                .conditions
                .entry(section_key(row)?)
                .or_default()
                .push(RateCondition {
                    condition: row.try_get("condition").map_err(db_error)?,
                    rate: get_decimal(row, "rate")?,
                });
        }

        Ok(children)
    }
}

/// Slabs, threshold types and conditions keyed by uppercased section code.
#[derive(Default)]
struct Children {
    threshold_types: HashMap<String, Vec<ThresholdType>>,
    slabs: HashMap<String, Vec<RateSlab>>,
    conditions: HashMap<String, Vec<RateCondition>>,
}

impl Children {
    fn attach(
        &mut self,
        section: &mut TdsSection,
    ) {
        let key = section.code.to_uppercase();
        section.threshold_types = self.threshold_types.remove(&key).unwrap_or_default();
        section.slabs = self.slabs.remove(&key).unwrap_or_default();
        section.conditions = self.conditions.remove(&key).unwrap_or_default();
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn bind_code<'q>(
    sql: &'q str,
    code: Option<&'q str>,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    let query = sqlx::query(sql);
    match code {
        Some(code) => query.bind(code),
        None => query,
    }
}

fn section_key(row: &SqliteRow) -> Result<String, RepositoryError> {
    row.try_get::<String, _>("section_code")
        .map(|code| code.to_uppercase())
        .map_err(db_error)
}

fn row_to_section(row: &SqliteRow) -> Result<TdsSection, RepositoryError> {
    Ok(TdsSection {
        code: row.try_get("code").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        threshold: get_optional_decimal(row, "threshold")?,
        threshold_note: row.try_get("threshold_note").map_err(db_error)?,
        company_rate: get_optional_decimal(row, "company_rate")?,
        individual_rate: get_optional_decimal(row, "individual_rate")?,
        no_pan_rate: get_decimal(row, "no_pan_rate")?,
        company_rate_note: row.try_get("company_rate_note").map_err(db_error)?,
        individual_rate_note: row.try_get("individual_rate_note").map_err(db_error)?,
        is_property_section: row.try_get("is_property_section").map_err(db_error)?,
        tds_on_excess: row.try_get("tds_on_excess").map_err(db_error)?,
        slabs: Vec::new(),
        threshold_types: Vec::new(),
        conditions: Vec::new(),
    })
}

async fn delete_children(
    tx: &mut Transaction<'_, Sqlite>,
    code: &str,
) -> Result<(), RepositoryError> {
    for table in [
        "tds_section_threshold_type",
        "tds_section_slab",
        "tds_section_condition",
    ] {
        sqlx::query(&format!("DELETE FROM {table} WHERE section_code = ?"))
            .bind(code)
            .execute(&mut **tx)
            .await
            .map_err(db_error)?;
    }
    Ok(())
}

#[async_trait]
impl SectionRepository for SqliteRepository {
    async fn list_sections(&self) -> Result<Vec<TdsSection>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SECTION_COLUMNS} FROM tds_section ORDER BY sort_order, code"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut children = self.load_children(None).await?;

        rows.iter()
            .map(|row| {
                let mut section = row_to_section(row)?;
                children.attach(&mut section);
                Ok(section)
            })
            .collect()
    }

    async fn get_section(
        &self,
        code: &str,
    ) -> Result<TdsSection, RepositoryError> {
        let code = code.trim();
        let row = sqlx::query(&format!(
            "SELECT {SECTION_COLUMNS} FROM tds_section WHERE code = ?"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        let mut section = row_to_section(&row)?;
        self.load_children(Some(code))
            .await?
            .attach(&mut section);
        Ok(section)
    }

    async fn upsert_section(
        &self,
        section: &TdsSection,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            "INSERT INTO tds_section (
                code, sort_order, description, threshold, threshold_note, company_rate,
                individual_rate, no_pan_rate, company_rate_note, individual_rate_note,
                is_property_section, tds_on_excess
             ) VALUES (
                ?, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM tds_section),
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
             )
             ON CONFLICT (code) DO UPDATE SET
                description = excluded.description,
                threshold = excluded.threshold,
                threshold_note = excluded.threshold_note,
                company_rate = excluded.company_rate,
                individual_rate = excluded.individual_rate,
                no_pan_rate = excluded.no_pan_rate,
                company_rate_note = excluded.company_rate_note,
                individual_rate_note = excluded.individual_rate_note,
                is_property_section = excluded.is_property_section,
                tds_on_excess = excluded.tds_on_excess",
        )
        .bind(&section.code)
        .bind(&section.description)
        .bind(section.threshold.map(decimal_to_text))
        .bind(&section.threshold_note)
        .bind(section.company_rate.map(decimal_to_text))
        .bind(section.individual_rate.map(decimal_to_text))
        .bind(decimal_to_text(section.no_pan_rate))
        .bind(&section.company_rate_note)
        .bind(&section.individual_rate_note)
        .bind(section.is_property_section)
        .bind(section.tds_on_excess)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        delete_children(&mut tx, &section.code).await?;

        for (position, t) in section.threshold_types.iter().enumerate() {
            sqlx::query(
                "INSERT INTO tds_section_threshold_type
                    (section_code, position, name, threshold, threshold_note)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&section.code)
            .bind(position as i64)
            .bind(&t.name)
            .bind(decimal_to_text(t.threshold))
            .bind(&t.threshold_note)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        for (position, slab) in section.slabs.iter().enumerate() {
            sqlx::query(
                "INSERT INTO tds_section_slab (section_code, position, description, rate)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&section.code)
            .bind(position as i64)
            .bind(&slab.description)
            .bind(decimal_to_text(slab.rate))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        for (position, c) in section.conditions.iter().enumerate() {
            sqlx::query(
                "INSERT INTO tds_section_condition (section_code, position, condition, rate)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&section.code)
            .bind(position as i64)
            .bind(&c.condition)
            .bind(decimal_to_text(c.rate))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn delete_section(
        &self,
        code: &str,
    ) -> Result<(), RepositoryError> {
        let code = code.trim();
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        delete_children(&mut tx, code).await?;

        let result = sqlx::query("DELETE FROM tds_section WHERE code = ?")
            .bind(code)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }
}
