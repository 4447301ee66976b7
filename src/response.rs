use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::pagination::Page;

/// The `{success, message?, data?, error?}` envelope every endpoint answers with.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Envelope for list endpoints: the regular envelope plus paging info.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    #[serde(flatten)]
    pub response: ApiResponse<Vec<T>>,
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
    pub total: i64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: Page, total: i64, message: impl Into<String>) -> Self {
        Self {
            response: ApiResponse::ok(items, message),
            page: page.page,
            page_size: page.page_size,
            total,
        }
    }
}

impl<T: Serialize> IntoResponse for PaginatedResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_omits_data_and_message() {
        let json = serde_json::to_value(ApiResponse::<()>::failure("nope")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "error": "nope" }));
    }

    #[test]
    fn paginated_envelope_is_flat() {
        let page = Page::new(Some(2), Some(5));
        let json =
            serde_json::to_value(PaginatedResponse::new(vec![1, 2], page, 7, "listed")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "listed");
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["page"], 2);
        assert_eq!(json["pageSize"], 5);
        assert_eq!(json["total"], 7);
    }
}
