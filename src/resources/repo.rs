use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    model::{NewResource, Resource},
    repo_types::{KindColumns, ResourceRow},
};
use crate::{
    error::{AppError, AppResult},
    pagination::Page,
};

/// Resource persistence. Listing, search and tag filters all
/// take the owner explicitly and never return other users' rows.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Resource>;
    async fn get_by_owner(&self, owner_id: Uuid, page: Page) -> AppResult<(Vec<Resource>, i64)>;
    async fn create(&self, resource: NewResource) -> AppResult<Resource>;
    /// Persists every field except the owner, which is fixed at creation.
    async fn update(&self, resource: &Resource) -> AppResult<Resource>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    async fn search(
        &self,
        text: &str,
        owner_id: Uuid,
        page: Page,
    ) -> AppResult<(Vec<Resource>, i64)>;
    async fn get_by_tags(
        &self,
        tags: &[String],
        owner_id: Uuid,
        page: Page,
    ) -> AppResult<(Vec<Resource>, i64)>;
}

#[derive(Clone)]
pub struct PgResourceStore {
    db: PgPool,
}

impl PgResourceStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const RESOURCE_COLUMNS: &str = "id, user_id, title, kind, url, category, language, \
     code_content, description, tags, created_at, updated_at";

fn not_found() -> AppError {
    AppError::NotFound("resource not found".into())
}

/// A unique violation is the per-owner URL index. A foreign-key violation
/// means the owner was deleted while its token is still live.
fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AppError::Conflict("you already saved this url".into());
        }
        if db.is_foreign_key_violation() {
            return AppError::Unauthenticated("user not found".into());
        }
    }
    AppError::from(e)
}

fn into_resources(rows: Vec<ResourceRow>) -> AppResult<Vec<Resource>> {
    rows.into_iter().map(Resource::try_from).collect()
}

/// Escapes LIKE metacharacters so user text matches literally.
fn like_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[async_trait]
impl ResourceStore for PgResourceStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Resource> {
        sqlx::query_as::<_, ResourceRow>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(not_found)?
        .try_into()
    }

    async fn get_by_owner(&self, owner_id: Uuid, page: Page) -> AppResult<(Vec<Resource>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE user_id = $1")
            .bind(owner_id)
            .fetch_one(&self.db)
            .await?;
        let rows = sqlx::query_as::<_, ResourceRow>(&format!(
            r#"
            SELECT {RESOURCE_COLUMNS}
            FROM resources
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;
        Ok((into_resources(rows)?, total))
    }

    async fn create(&self, resource: NewResource) -> AppResult<Resource> {
        let cols = KindColumns::from(&resource.kind);
        sqlx::query_as::<_, ResourceRow>(&format!(
            r#"
            INSERT INTO resources
                (user_id, title, kind, url, category, language, code_content, description, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {RESOURCE_COLUMNS}
            "#
        ))
        .bind(resource.owner_id)
        .bind(&resource.title)
        .bind(cols.kind)
        .bind(cols.url)
        .bind(cols.category)
        .bind(cols.language)
        .bind(cols.code_content)
        .bind(&resource.description)
        .bind(&resource.tags)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?
        .try_into()
    }

    async fn update(&self, resource: &Resource) -> AppResult<Resource> {
        let cols = KindColumns::from(&resource.kind);
        sqlx::query_as::<_, ResourceRow>(&format!(
            r#"
            UPDATE resources
               SET title = $2, kind = $3, url = $4, category = $5, language = $6,
                   code_content = $7, description = $8, tags = $9, updated_at = now()
             WHERE id = $1
            RETURNING {RESOURCE_COLUMNS}
            "#
        ))
        .bind(resource.id)
        .bind(&resource.title)
        .bind(cols.kind)
        .bind(cols.url)
        .bind(cols.category)
        .bind(cols.language)
        .bind(cols.code_content)
        .bind(&resource.description)
        .bind(&resource.tags)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)?
        .ok_or_else(not_found)?
        .try_into()
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let res = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    async fn search(
        &self,
        text: &str,
        owner_id: Uuid,
        page: Page,
    ) -> AppResult<(Vec<Resource>, i64)> {
        let pattern = like_pattern(text);
        const FILTER: &str = "user_id = $1 AND (title ILIKE $2 OR description ILIKE $2 \
             OR url ILIKE $2 OR code_content ILIKE $2)";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM resources WHERE {FILTER}"))
                .bind(owner_id)
                .bind(&pattern)
                .fetch_one(&self.db)
                .await?;
        let rows = sqlx::query_as::<_, ResourceRow>(&format!(
            r#"
            SELECT {RESOURCE_COLUMNS}
            FROM resources
            WHERE {FILTER}
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(owner_id)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;
        Ok((into_resources(rows)?, total))
    }

    async fn get_by_tags(
        &self,
        tags: &[String],
        owner_id: Uuid,
        page: Page,
    ) -> AppResult<(Vec<Resource>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE user_id = $1 AND tags @> $2")
                .bind(owner_id)
                .bind(tags)
                .fetch_one(&self.db)
                .await?;
        let rows = sqlx::query_as::<_, ResourceRow>(&format!(
            r#"
            SELECT {RESOURCE_COLUMNS}
            FROM resources
            WHERE user_id = $1 AND tags @> $2
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(owner_id)
        .bind(tags)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;
        Ok((into_resources(rows)?, total))
    }
}
