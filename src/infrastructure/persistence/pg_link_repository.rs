//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, LinkPatch, LinkTarget, NewClick, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::{RepositoryError, map_sqlx_error};

const LINK_COLUMNS: &str = "id, code, long_url, permanent, created_at, deleted_at";

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    code: String,
    long_url: String,
    permanent: bool,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Link {
            id: row.id,
            code: row.code,
            long_url: row.long_url,
            permanent: row.permanent,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// PostgreSQL repository for links and their clicks.
///
/// Soft-deleted rows keep their code, so [`LinkRepository::exists`] still
/// reports them while [`LinkRepository::lookup`] does not.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn exists(&self, code: &str) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM links WHERE code = $1)")
                .bind(code)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn lookup(&self, code: &str) -> Result<Option<LinkTarget>, RepositoryError> {
        let row: Option<(String, bool)> = sqlx::query_as(
            "SELECT long_url, permanent FROM links WHERE code = $1 AND deleted_at IS NULL",
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|(url, permanent)| LinkTarget { url, permanent }))
    }

    async fn create(&self, new_link: NewLink) -> Result<Link, RepositoryError> {
        let row: LinkRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO links (code, long_url, permanent)
            VALUES ($1, $2, $3)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(&new_link.code)
        .bind(&new_link.long_url)
        .bind(new_link.permanent)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error(e, &new_link.code))?;

        Ok(row.into())
    }

    async fn update(&self, code: &str, patch: LinkPatch) -> Result<Option<Link>, RepositoryError> {
        let row: Option<LinkRow> = sqlx::query_as(&format!(
            r#"
            UPDATE links
            SET long_url = COALESCE($2, long_url),
                permanent = COALESCE($3, permanent)
            WHERE code = $1 AND deleted_at IS NULL
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(patch.url)
        .bind(patch.permanent)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn soft_delete(&self, code: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE links SET deleted_at = NOW() WHERE code = $1 AND deleted_at IS NULL",
        )
        .bind(code)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_click(&self, click: NewClick) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO link_clicks (link_id, clicked_at, user_agent, referer, ip)
            SELECT id, $2, $3, $4, $5 FROM links WHERE code = $1
            "#,
        )
        .bind(&click.code)
        .bind(click.clicked_at)
        .bind(click.user_agent)
        .bind(click.referer)
        .bind(click.ip)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(code = %click.code, "Click for unknown code dropped");
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
