// src/core/database.rs
//! SQLite persistence for job postings and per-user recommendation caches

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::types::{Job, JobError, JobStatus, NewJob};
use crate::utils::normalize_job_type;

// ===== Core Database Connection Management =====

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database file and run migrations
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| {
                format!("Failed to connect to database: {}", database_path.display())
            })?;

        info!(
            "Database connection established: {}",
            database_path.display()
        );

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                employer_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                job_type TEXT NOT NULL,
                location TEXT NOT NULL,
                address TEXT NOT NULL,
                salary TEXT,
                status TEXT NOT NULL DEFAULT 'open',
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_employer ON jobs(employer_id);")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS recommendations (
                user_id TEXT PRIMARY KEY,
                radius_km REAL NOT NULL,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}

// ===== Job Repository =====

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: String,
    employer_id: String,
    title: String,
    description: String,
    job_type: String,
    location: String,
    address: String,
    salary: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = JobError;

    fn try_from(row: JobRow) -> std::result::Result<Self, Self::Error> {
        Ok(Job {
            status: JobStatus::from_str(&row.status)?,
            id: row.id,
            employer_id: row.employer_id,
            title: row.title,
            description: row.description,
            job_type: row.job_type,
            location: row.location,
            address: row.address,
            salary: row.salary,
            created_at: row.created_at,
        })
    }
}

const JOB_COLUMNS: &str =
    "id, employer_id, title, description, job_type, location, address, salary, status, created_at";

pub struct JobRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JobRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, employer_id: &str, posting: &NewJob) -> Result<Job> {
        posting.validate()?;

        let job = Job {
            id: Uuid::new_v4().to_string(),
            employer_id: employer_id.to_string(),
            title: posting.title.trim().to_string(),
            description: posting.description.trim().to_string(),
            job_type: normalize_job_type(posting.job_type.as_deref()),
            location: posting.encoded_location()?,
            address: posting.address.trim().to_string(),
            salary: posting.salary.clone(),
            status: JobStatus::Open,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO jobs (id, employer_id, title, description, job_type, location, address, salary, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.employer_id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.job_type)
        .bind(&job.location)
        .bind(&job.address)
        .bind(&job.salary)
        .bind(job.status.as_str())
        .bind(job.created_at)
        .execute(self.pool)
        .await
        .context("Failed to insert job")?;

        info!(
            "Created job {} ({}) for employer {}",
            job.id, job.title, employer_id
        );
        Ok(job)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs WHERE id = ?",
            JOB_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Job::try_from).transpose()?)
    }

    /// All jobs, newest first
    pub async fn list_all(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs ORDER BY created_at DESC",
            JOB_COLUMNS
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Job::try_from(row).map_err(anyhow::Error::from))
            .collect()
    }

    pub async fn list_open(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs WHERE status = 'open' ORDER BY created_at DESC",
            JOB_COLUMNS
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Job::try_from(row).map_err(anyhow::Error::from))
            .collect()
    }

    /// Open or close a posting; only its employer may do so
    pub async fn set_status(&self, id: &str, employer_id: &str, status: JobStatus) -> Result<Job> {
        let mut job = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;

        if job.employer_id != employer_id {
            return Err(JobError::NotOwner(id.to_string()).into());
        }

        sqlx::query("UPDATE jobs SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(self.pool)
            .await?;

        info!("Job {} is now {}", id, status);
        job.status = status;
        Ok(job)
    }
}

// ===== Recommendation Cache =====

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CachedRecommendations {
    pub user_id: String,
    pub radius_km: f64,
    pub payload: String,
    pub updated_at: DateTime<Utc>,
}

pub struct RecommendationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RecommendationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Replace the cached recommendations of `user_id`
    pub async fn save(&self, user_id: &str, radius_km: f64, payload: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recommendations (user_id, radius_km, payload, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                radius_km = excluded.radius_km,
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(radius_km)
        .bind(payload)
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .context("Failed to cache recommendations")?;

        Ok(())
    }

    pub async fn load(&self, user_id: &str) -> Result<Option<CachedRecommendations>> {
        let cached = sqlx::query_as::<_, CachedRecommendations>(
            r#"
            SELECT user_id, radius_km, payload, updated_at
            FROM recommendations
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(cached)
    }

    pub async fn clear(&self, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recommendations WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
