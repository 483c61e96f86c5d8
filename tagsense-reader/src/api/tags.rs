//! Paginated tag listing
//!
//! Tags are served most recent read first.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tagsense_common::TagRecord;

use super::{ApiError, ApiResponse, AppState};
use crate::pagination::{calculate_pagination, DEFAULT_PAGE_SIZE};

/// Query parameters for the tag listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagsQuery {
    /// Page number (1-indexed); values below 1 mean page 1
    #[serde(default = "default_page")]
    pub page: i64,

    /// Tags per page; above the maximum is clamped, below 1 is rejected
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub current_page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct TagPage {
    pub tags: Vec<TagRecord>,
    pub pagination: PaginationInfo,
}

/// GET /api/rfid/tags?page=&pageSize=
pub async fn get_recent_tags(
    State(state): State<AppState>,
    Query(query): Query<TagsQuery>,
) -> Result<Json<ApiResponse<TagPage>>, ApiError> {
    if query.page_size < 1 {
        return Err(ApiError::BadRequest(format!(
            "pageSize must be at least 1, got {}",
            query.page_size
        )));
    }

    let tags = state.controller.recent_tags().await;
    let total_items = tags.len() as i64;
    let pagination = calculate_pagination(total_items, query.page, query.page_size);

    Ok(Json(ApiResponse::success(TagPage {
        tags: pagination.apply(tags),
        pagination: PaginationInfo {
            current_page: pagination.page,
            page_size: pagination.page_size,
            total_items,
            total_pages: pagination.total_pages,
        },
    })))
}
