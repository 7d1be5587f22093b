//! Admin login and the forensic operations page.
//!
//! Login verifies the password server-side and issues a short-lived
//! session token; the forensic endpoint sits behind the session
//! middleware and never trusts anything client-held beyond the token.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{token_digest, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const CITATION_TRACE_LIMIT: i64 = 50;
const SCHEDULING_QUEUE_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub(super) struct LoginBody {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct LoginData {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ForensicData {
    pub storage_health: Vec<StorageHealthItem>,
    pub session_matrix: Vec<SessionMatrixItem>,
    pub citation_trace: Vec<CitationTraceItem>,
    pub scheduling_queue: Vec<SchedulingQueueItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct StorageHealthItem {
    pub table_name: String,
    pub row_count: i64,
    pub duplicate_keys: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct SessionMatrixItem {
    pub brand_slug: String,
    pub queued: i64,
    pub running: i64,
    pub succeeded: i64,
    pub failed: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct CitationTraceItem {
    pub report_date: NaiveDate,
    pub brand_slug: String,
    pub prompt_text: Option<String>,
    pub url: String,
    pub domain: String,
    pub category: String,
    pub cited_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct SchedulingQueueItem {
    pub public_id: Uuid,
    pub brand_slug: String,
    pub status: String,
    pub trigger_source: String,
    pub prompts_total: i32,
    pub prompts_completed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginBody>,
) -> Result<Json<ApiResponse<LoginData>>, ApiError> {
    if !state.admin.login_enabled() {
        return Err(ApiError::new(
            req_id.0,
            "unavailable",
            "admin login is not configured",
        ));
    }

    if !state.admin.verify_password(&body.password) {
        tracing::warn!(request_id = %req_id.0, "admin login rejected");
        return Err(ApiError::new(
            req_id.0,
            "unauthorized",
            "invalid credentials",
        ));
    }

    let token = new_session_token();
    let session = sovdb_db::create_admin_session(
        &state.pool,
        &token_digest(&token),
        state.admin.session_ttl_secs,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(session_id = session.id, "admin session issued");

    Ok(Json(ApiResponse {
        data: LoginData {
            token,
            expires_at: session.expires_at,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn forensic(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ForensicData>>, ApiError> {
    let (storage, matrix, trace, queue) = tokio::try_join!(
        sovdb_db::storage_health(&state.pool),
        sovdb_db::session_matrix(&state.pool),
        sovdb_db::citation_trace(&state.pool, CITATION_TRACE_LIMIT),
        sovdb_db::scheduling_queue(&state.pool, SCHEDULING_QUEUE_LIMIT),
    )
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = ForensicData {
        storage_health: storage
            .into_iter()
            .map(|row| StorageHealthItem {
                table_name: row.table_name,
                row_count: row.row_count,
                duplicate_keys: row.duplicate_keys,
            })
            .collect(),
        session_matrix: matrix
            .into_iter()
            .map(|row| SessionMatrixItem {
                brand_slug: row.brand_slug,
                queued: row.queued,
                running: row.running,
                succeeded: row.succeeded,
                failed: row.failed,
            })
            .collect(),
        citation_trace: trace
            .into_iter()
            .map(|row| CitationTraceItem {
                report_date: row.report_date,
                brand_slug: row.brand_slug,
                prompt_text: row.prompt_text,
                url: row.url,
                domain: row.domain,
                category: row.category,
                cited_at: row.cited_at,
            })
            .collect(),
        scheduling_queue: queue
            .into_iter()
            .map(|row| SchedulingQueueItem {
                public_id: row.public_id,
                brand_slug: row.brand_slug,
                status: row.status,
                trigger_source: row.trigger_source,
                prompts_total: row.prompts_total,
                prompts_completed: row.prompts_completed,
                error_message: row.error_message,
                created_at: row.created_at,
                started_at: row.started_at,
            })
            .collect(),
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// 256 bits of randomness, hex-encoded. Only the digest is persisted.
fn new_session_token() -> String {
    let bytes: [u8; 32] = rand::random();
    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_tokens_are_64_hex_chars_and_unique() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
