//! Resource domain types. The payload is an enum, so a link can never carry a
//! code body and vice versa; every constructor validates its inputs.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;
pub const TAGS_MAX: usize = 10;
pub const TAG_LEN_MAX: usize = 30;
pub const LANGUAGE_MIN: usize = 2;
pub const LANGUAGE_MAX: usize = 20;
pub const CODE_MAX: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkCategory {
    Github,
    Article,
    Tool,
    Other,
}

impl LinkCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkCategory::Github => "github",
            LinkCategory::Article => "article",
            LinkCategory::Tool => "tool",
            LinkCategory::Other => "other",
        }
    }
}

impl FromStr for LinkCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(LinkCategory::Github),
            "article" => Ok(LinkCategory::Article),
            "tool" => Ok(LinkCategory::Tool),
            "other" => Ok(LinkCategory::Other),
            other => Err(AppError::validation(format!(
                "invalid category '{other}': expected github, article, tool or other"
            ))),
        }
    }
}

impl fmt::Display for LinkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload. Serializes flat, with a `type` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResourceKind {
    Link {
        url: String,
        category: LinkCategory,
    },
    Code {
        language: String,
        code_content: String,
    },
}

/// Loose, possibly partial payload fields as they arrive from a request or a
/// merge. [`ResourceKind::build`] turns them into a valid payload or refuses.
#[derive(Debug, Default, Clone)]
pub struct KindFields {
    pub url: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub code_content: Option<String>,
}

impl ResourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Link { .. } => "link",
            ResourceKind::Code { .. } => "code",
        }
    }

    pub fn build(kind: &str, fields: KindFields) -> AppResult<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "link" => {
                let url = required(fields.url, "url is required for link resources")?;
                let category = required(
                    fields.category,
                    "category is required for link resources",
                )?;
                Ok(ResourceKind::Link {
                    url: validate_url(url.trim())?,
                    category: category.parse()?,
                })
            }
            "code" => {
                let language = required(
                    fields.language,
                    "language is required for code resources",
                )?;
                let code_content = required(
                    fields.code_content,
                    "code content is required for code resources",
                )?;
                let language = language.trim().to_string();
                let len = language.chars().count();
                if !(LANGUAGE_MIN..=LANGUAGE_MAX).contains(&len) {
                    return Err(AppError::validation(format!(
                        "language must be between {LANGUAGE_MIN} and {LANGUAGE_MAX} characters"
                    )));
                }
                if code_content.chars().count() > CODE_MAX {
                    return Err(AppError::validation(format!(
                        "code content must be at most {CODE_MAX} characters"
                    )));
                }
                Ok(ResourceKind::Code {
                    language,
                    code_content,
                })
            }
            "" => Err(AppError::validation("type is required")),
            other => Err(AppError::validation(format!(
                "invalid resource type '{other}': expected link or code"
            ))),
        }
    }

    /// The current payload as loose fields, for merging with an update.
    pub fn to_fields(&self) -> KindFields {
        match self {
            ResourceKind::Link { url, category } => KindFields {
                url: Some(url.clone()),
                category: Some(category.as_str().to_string()),
                ..Default::default()
            },
            ResourceKind::Code {
                language,
                code_content,
            } => KindFields {
                language: Some(language.clone()),
                code_content: Some(code_content.clone()),
                ..Default::default()
            },
        }
    }
}

fn required(value: Option<String>, msg: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::validation(msg))
}

fn validate_url(raw: &str) -> AppResult<String> {
    let parsed = url::Url::parse(raw)
        .map_err(|_| AppError::validation(format!("invalid url: {raw}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(AppError::validation("url must be an absolute http(s) url"));
    }
    Ok(raw.to_string())
}

pub fn validate_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    let len = title.chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&len) {
        return Err(AppError::validation(format!(
            "title must be between {TITLE_MIN} and {TITLE_MAX} characters"
        )));
    }
    Ok(title.to_string())
}

pub fn validate_description(description: &str) -> AppResult<String> {
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(AppError::validation(format!(
            "description must be at most {DESCRIPTION_MAX} characters"
        )));
    }
    Ok(description.to_string())
}

pub fn validate_tags(tags: Vec<String>) -> AppResult<Vec<String>> {
    if tags.len() > TAGS_MAX {
        return Err(AppError::validation(format!(
            "at most {TAGS_MAX} tags are allowed"
        )));
    }
    tags.into_iter()
        .map(|t| {
            let t = t.trim().to_string();
            let len = t.chars().count();
            if len == 0 || len > TAG_LEN_MAX {
                return Err(AppError::validation(format!(
                    "tags must be between 1 and {TAG_LEN_MAX} characters"
                )));
            }
            Ok(t)
        })
        .collect()
}

/// A stored resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub id: Uuid,
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    pub title: String,
    #[serde(flatten)]
    pub kind: ResourceKind,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A validated resource about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource {
    pub owner_id: Uuid,
    pub title: String,
    pub kind: ResourceKind,
    pub description: String,
    pub tags: Vec<String>,
}
