//! Analysis handlers: create, history, status, and the aggregated report.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use listingseo_core::{AnalysisFilter, AnalysisPage, AnalysisStatus, Marketplace, NewAnalysis};
use listingseo_engine::{build_report, AnalysisReport, QueueError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_store_error, normalize_limit, parse_uuid, ApiError, ApiResponse, AppState, ResponseMeta,
};

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateAnalysisRequest {
    pub owner_id: Uuid,
    pub product_name: String,
    pub product_description: Option<String>,
    pub product_features: Option<String>,
    pub category: Option<String>,
    pub target_platform: String,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateAnalysisResponse {
    pub id: Uuid,
    pub status: AnalysisStatus,
}

#[derive(Debug, Deserialize)]
pub(super) struct AnalysisListQuery {
    pub owner_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalysisStatusView {
    pub id: Uuid,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Blank optional text is stored as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn validation_error(req_id: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(req_id, "validation_error", message)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/analyses: store a pending analysis and queue it for processing.
pub(super) async fn create_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateAnalysisRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreateAnalysisResponse>>), ApiError> {
    let rid = &req_id.0;

    let marketplace = Marketplace::from_str(&body.target_platform).map_err(|_| {
        validation_error(
            rid,
            format!(
                "targetPlatform must be 'amazon', 'flipkart', or 'meesho', got '{}'",
                body.target_platform
            ),
        )
    })?;

    let new = NewAnalysis {
        owner_id: body.owner_id,
        product_name: body.product_name.trim().to_owned(),
        product_description: non_blank(body.product_description),
        product_features: non_blank(body.product_features),
        category: non_blank(body.category),
        marketplace,
    };
    new.validate().map_err(|e| validation_error(rid, e.to_string()))?;

    let analysis = state
        .store
        .create_analysis(&new)
        .await
        .map_err(|e| map_store_error(rid.clone(), &e))?;

    // The row stays `pending` if the queue rejects it; the stale-pending sweep
    // resubmits it later.
    match state.queue.submit(analysis.id) {
        Ok(()) => {
            tracing::info!(analysis_id = %analysis.id, %marketplace, "analysis queued");
        }
        Err(QueueError::Full) => {
            tracing::warn!(analysis_id = %analysis.id, "workflow queue full; left pending for sweep");
        }
        Err(QueueError::Closed) => {
            tracing::error!(analysis_id = %analysis.id, "workflow queue closed; left pending for sweep");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CreateAnalysisResponse {
                id: analysis.id,
                status: analysis.status,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/analyses: history, newest first.
pub(super) async fn list_analyses(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AnalysisListQuery>,
) -> Result<Json<ApiResponse<AnalysisPage>>, ApiError> {
    let rid = &req_id.0;

    let owner_id = query
        .owner_id
        .as_deref()
        .map(|raw| parse_uuid(rid, "owner_id", raw))
        .transpose()?;
    let status = query
        .status
        .as_deref()
        .map(|raw| {
            AnalysisStatus::from_str(raw)
                .map_err(|_| ApiError::new(rid, "bad_request", format!("unknown status '{raw}'")))
        })
        .transpose()?;

    let filter = AnalysisFilter {
        owner_id,
        status,
        limit: normalize_limit(query.limit),
        offset: query.offset.unwrap_or(0).max(0),
    };
    let page = state
        .store
        .list_analyses(&filter)
        .await
        .map_err(|e| map_store_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: page,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/analyses/{id}/status
pub(super) async fn get_analysis_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<AnalysisStatusView>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_uuid(rid, "id", &raw_id)?;

    let analysis = state
        .store
        .get_analysis(id)
        .await
        .map_err(|e| map_store_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("analysis {id} not found")))?;

    Ok(Json(ApiResponse {
        data: AnalysisStatusView {
            id: analysis.id,
            status: analysis.status,
            created_at: analysis.created_at,
            completed_at: analysis.completed_at,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/analyses/{id}: the aggregated report.
pub(super) async fn get_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<AnalysisReport>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_uuid(rid, "id", &raw_id)?;

    let report = build_report(
        state.store.as_ref(),
        &state.engine.trends,
        &state.engine.trends_geo,
        id,
    )
    .await
    .map_err(|e| map_store_error(rid.clone(), &e))?
    .ok_or_else(|| ApiError::new(rid, "not_found", format!("analysis {id} not found")))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}
