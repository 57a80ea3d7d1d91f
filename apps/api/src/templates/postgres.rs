//! PostgreSQL-backed `TemplateRepository`. Schema: `migrations/0001_templates.sql`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::document::DocumentKind;
use crate::models::template::{PerformanceRecord, Template, TemplateAggregates, TemplateVersion};
use crate::templates::repository::TemplateRepository;

// ────────────────────────────────────────────────────────────────────────────
// Row types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct TemplateRow {
    id: String,
    kind: String,
    name: String,
    keywords: Vec<String>,
    role_categories: Vec<String>,
    usage_count: i64,
    success_rate: f64,
    average_score: f64,
    last_used: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for Template {
    type Error = AppError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let kind: DocumentKind = row
            .kind
            .parse()
            .map_err(|e: String| AppError::Internal(anyhow::anyhow!("template {}: {e}", row.id)))?;
        Ok(Template {
            id: row.id,
            kind,
            name: row.name,
            keywords: row.keywords,
            role_categories: row.role_categories,
            usage_count: row.usage_count,
            success_rate: row.success_rate,
            average_score: row.average_score,
            last_used: row.last_used,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct VersionRow {
    template_id: String,
    version: i32,
    content: String,
    performance_score: Option<f64>,
    notes: String,
    created_at: DateTime<Utc>,
}

impl From<VersionRow> for TemplateVersion {
    fn from(row: VersionRow) -> Self {
        TemplateVersion {
            template_id: row.template_id,
            version: row.version,
            content: row.content,
            performance_score: row.performance_score,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PerformanceRow {
    id: Uuid,
    template_id: String,
    job_title: String,
    company: String,
    overall_score: f64,
    keyword_score: f64,
    format_score: f64,
    structure_score: f64,
    success: bool,
    recorded_at: DateTime<Utc>,
}

impl From<PerformanceRow> for PerformanceRecord {
    fn from(row: PerformanceRow) -> Self {
        PerformanceRecord {
            id: row.id,
            template_id: row.template_id,
            job_title: row.job_title,
            company: row.company,
            overall_score: row.overall_score,
            keyword_score: row.keyword_score,
            format_score: row.format_score,
            structure_score: row.structure_score,
            success: row.success,
            recorded_at: row.recorded_at,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Repository
// ────────────────────────────────────────────────────────────────────────────

pub struct PgTemplateRepository {
    pool: PgPool,
}

impl PgTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    async fn insert_template(&self, template: &Template, content: &str, notes: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO templates
                (id, kind, name, keywords, role_categories, usage_count,
                 success_rate, average_score, last_used, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, 0, 0, 0, NULL, TRUE, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&template.id)
        .bind(template.kind.as_str())
        .bind(&template.name)
        .bind(&template.keywords)
        .bind(&template.role_categories)
        .bind(template.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            sqlx::query(
                r#"
                INSERT INTO template_versions (template_id, version, content, performance_score, notes, created_at)
                VALUES ($1, 1, $2, NULL, $3, $4)
                "#,
            )
            .bind(&template.id)
            .bind(content)
            .bind(notes)
            .bind(template.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn get_template(&self, id: &str) -> Result<Option<Template>, AppError> {
        sqlx::query_as::<_, TemplateRow>("SELECT * FROM templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Template::try_from)
            .transpose()
    }

    async fn list_templates(&self, kind: Option<DocumentKind>) -> Result<Vec<Template>, AppError> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            "SELECT * FROM templates WHERE ($1::TEXT IS NULL OR kind = $1) ORDER BY id",
        )
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Template::try_from).collect()
    }

    async fn latest_version(&self, id: &str) -> Result<Option<TemplateVersion>, AppError> {
        Ok(sqlx::query_as::<_, VersionRow>(
            "SELECT * FROM template_versions WHERE template_id = $1 ORDER BY version DESC LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(TemplateVersion::from))
    }

    async fn versions(&self, id: &str) -> Result<Vec<TemplateVersion>, AppError> {
        Ok(sqlx::query_as::<_, VersionRow>(
            "SELECT * FROM template_versions WHERE template_id = $1 ORDER BY version ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TemplateVersion::from)
        .collect())
    }

    async fn append_version(
        &self,
        id: &str,
        content: &str,
        performance_score: Option<f64>,
        notes: &str,
    ) -> Result<TemplateVersion, AppError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serialises version assignment across processes too.
        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM templates WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("Template {id} not found")));
        }

        let current_max: Option<i32> =
            sqlx::query_scalar("SELECT MAX(version) FROM template_versions WHERE template_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        let next = current_max.unwrap_or(0) + 1;

        let row = sqlx::query_as::<_, VersionRow>(
            r#"
            INSERT INTO template_versions (template_id, version, content, performance_score, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(content)
        .bind(performance_score)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn prune_versions(&self, id: &str, keep: usize) -> Result<u64, AppError> {
        // Keeping at least one version means MAX(version) never goes backwards.
        let keep = keep.max(1) as i64;
        let result = sqlx::query(
            r#"
            DELETE FROM template_versions
            WHERE template_id = $1
              AND version NOT IN (
                  SELECT version FROM template_versions
                  WHERE template_id = $1
                  ORDER BY version DESC
                  LIMIT $2
              )
            "#,
        )
        .bind(id)
        .bind(keep)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn append_performance(&self, record: &PerformanceRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO template_performance
                (id, template_id, job_title, company, overall_score, keyword_score,
                 format_score, structure_score, success, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id)
        .bind(&record.template_id)
        .bind(&record.job_title)
        .bind(&record.company)
        .bind(record.overall_score)
        .bind(record.keyword_score)
        .bind(record.format_score)
        .bind(record.structure_score)
        .bind(record.success)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn performance_records(&self, id: &str) -> Result<Vec<PerformanceRecord>, AppError> {
        Ok(sqlx::query_as::<_, PerformanceRow>(
            "SELECT * FROM template_performance WHERE template_id = $1 ORDER BY recorded_at ASC, id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(PerformanceRecord::from)
        .collect())
    }

    async fn write_aggregates(&self, id: &str, aggregates: &TemplateAggregates) -> Result<(), AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE templates
            SET usage_count = $2, success_rate = $3, average_score = $4, last_used = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(aggregates.usage_count)
        .bind(aggregates.success_rate)
        .bind(aggregates.average_score)
        .bind(aggregates.last_used)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::NotFound(format!("Template {id} not found")));
        }
        Ok(())
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<bool, AppError> {
        let updated = sqlx::query("UPDATE templates SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(updated == 1)
    }
}
