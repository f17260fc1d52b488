//! Usage handler: how many analyses an owner created over a trailing window.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_store_error, parse_uuid, ApiError, ApiResponse, AppState, ResponseMeta};

const DEFAULT_USAGE_DAYS: i64 = 30;
const MAX_USAGE_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
pub(super) struct UsageQuery {
    pub owner_id: Option<String>,
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UsageData {
    pub owner_id: Uuid,
    pub days: i64,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub analyses_created: i64,
}

/// GET /api/v1/usage: analyses an owner created in the trailing window.
pub(super) async fn get_usage(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<ApiResponse<UsageData>>, ApiError> {
    let rid = &req_id.0;

    let raw_owner = query
        .owner_id
        .as_deref()
        .ok_or_else(|| ApiError::new(rid, "bad_request", "owner_id is required"))?;
    let owner_id = parse_uuid(rid, "owner_id", raw_owner)?;
    let days = query
        .days
        .unwrap_or(DEFAULT_USAGE_DAYS)
        .clamp(1, MAX_USAGE_DAYS);

    let to = Utc::now();
    let from = to - TimeDelta::days(days);

    let analyses_created = state
        .store
        .count_analyses_created_between(owner_id, from, to)
        .await
        .map_err(|e| map_store_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: UsageData {
            owner_id,
            days,
            from,
            to,
            analyses_created,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
