//! Report re-runs, queue progress, and tracked-prompt removal.
//!
//! Writes here are single fire-and-forget statements; progress is read by
//! clients polling the queue counter (5-second interval, 1-hour ceiling,
//! per the long-poll policy in `sovdb_pipeline::poll`).

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, resolve_brand, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct RerunBody {
    pub brand: String,
}

#[derive(Debug, Serialize)]
pub(super) struct QueueCreated {
    pub public_id: Uuid,
    pub status: String,
    pub prompts_total: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct QueueProgress {
    pub public_id: Uuid,
    pub status: String,
    pub prompts_completed: i32,
    pub prompts_total: i32,
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct PromptDeleted {
    pub id: i64,
    pub deleted: bool,
}

pub(super) async fn rerun(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RerunBody>,
) -> Result<Json<ApiResponse<QueueCreated>>, ApiError> {
    let brand = resolve_brand(&state, &req_id.0, &body.brand).await?;

    let prompts_total = sovdb_db::count_active_prompts(&state.pool, brand.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let run = sovdb_db::enqueue_report_run(
        &state.pool,
        brand.id,
        "rerun",
        i32::try_from(prompts_total).unwrap_or(i32::MAX),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(brand = %brand.slug, queue_public_id = %run.public_id, "report re-run enqueued");

    Ok(Json(ApiResponse {
        data: QueueCreated {
            public_id: run.public_id,
            status: run.status,
            prompts_total: run.prompts_total,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn queue_progress(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<QueueProgress>>, ApiError> {
    let run = sovdb_db::get_queue_run(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("unknown queue run: {public_id}"),
            )
        })?;

    Ok(Json(ApiResponse {
        data: QueueProgress {
            public_id: run.public_id,
            status: run.status,
            prompts_completed: run.prompts_completed,
            prompts_total: run.prompts_total,
            error_message: run.error_message,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_prompt(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PromptDeleted>>, ApiError> {
    let deleted = sovdb_db::deactivate_prompt(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if !deleted {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("unknown or already deleted prompt: {id}"),
        ));
    }

    Ok(Json(ApiResponse {
        data: PromptDeleted { id, deleted },
        meta: ResponseMeta::new(req_id.0),
    }))
}
