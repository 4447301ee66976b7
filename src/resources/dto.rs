use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Default, Deserialize)]
pub struct CreateResourceRequest {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub url: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub language: Option<String>,
    pub code_content: Option<String>,
}

/// Partial update. Absent or blank strings keep the stored value; `tags`
/// replaces the stored list whenever it is present.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateResourceRequest {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub language: Option<String>,
    pub code_content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagsQuery {
    pub tags: Option<String>,
}

/// Accepts either a JSON array (`["rust","web"]`) or a comma list (`rust,web`).
pub fn parse_tags(raw: Option<&str>) -> AppResult<Vec<String>> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(AppError::validation("tags query parameter is required"));
    }
    let tags: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw)
            .map_err(|e| AppError::validation(format!("invalid tags: {e}")))?
    } else {
        raw.split(',').map(String::from).collect()
    };
    let tags: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        return Err(AppError::validation("tags query parameter is required"));
    }
    Ok(tags)
}
