use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{KindFields, Resource, ResourceKind};
use crate::error::AppError;

/// Flat row as stored; the table's CHECK constraint keeps the payload columns
/// consistent with `kind`.
#[derive(Debug, FromRow)]
pub struct ResourceRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub kind: String,
    pub url: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub code_content: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = AppError;

    fn try_from(r: ResourceRow) -> Result<Self, Self::Error> {
        let kind = ResourceKind::build(
            &r.kind,
            KindFields {
                url: r.url,
                category: r.category,
                language: r.language,
                code_content: r.code_content,
            },
        )
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("corrupt resource row {}: {e}", r.id))
        })?;
        Ok(Resource {
            id: r.id,
            owner_id: r.user_id,
            title: r.title,
            kind,
            description: r.description,
            tags: r.tags,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Column values for the payload, in `kind, url, category, language,
/// code_content` order.
pub struct KindColumns<'a> {
    pub kind: &'static str,
    pub url: Option<&'a str>,
    pub category: Option<&'static str>,
    pub language: Option<&'a str>,
    pub code_content: Option<&'a str>,
}

impl<'a> From<&'a ResourceKind> for KindColumns<'a> {
    fn from(k: &'a ResourceKind) -> Self {
        match k {
            ResourceKind::Link { url, category } => KindColumns {
                kind: "link",
                url: Some(url.as_str()),
                category: Some(category.as_str()),
                language: None,
                code_content: None,
            },
            ResourceKind::Code {
                language,
                code_content,
            } => KindColumns {
                kind: "code",
                url: None,
                category: None,
                language: Some(language.as_str()),
                code_content: Some(code_content.as_str()),
            },
        }
    }
}
