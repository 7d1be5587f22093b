mod admin;
mod citations;
mod onboarding;
mod reports;
mod samples;
mod visibility;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sovdb_core::CompetitorRecord;
use sovdb_llm::CompletionClient;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_admin_session, AdminSessionGuard, AdminState,
    RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub competitors: Arc<Vec<CompetitorRecord>>,
    pub llm: Option<Arc<CompletionClient>>,
    pub admin: AdminState,
}

/// The `{data, meta}` envelope every dashboard read returns.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

/// The `{error, meta}` counterpart; the `code` picks the HTTP status.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Query shape shared by the dashboard read endpoints.
#[derive(Debug, Deserialize)]
pub(super) struct BrandRangeQuery {
    pub brand: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Resolves the requested range, defaulting to the trailing 30 days.
pub(super) fn resolve_range(query: &BrandRangeQuery) -> (NaiveDate, NaiveDate) {
    let to = query.to.unwrap_or_else(|| Utc::now().date_naive());
    let from = query.from.unwrap_or(to - ChronoDuration::days(29));
    (from, to)
}

/// Loads an active brand by slug or produces the widget-facing 404.
pub(super) async fn resolve_brand(
    state: &AppState,
    request_id: &str,
    slug: &str,
) -> Result<sovdb_db::BrandRow, ApiError> {
    match sovdb_db::get_brand_by_slug(&state.pool, slug).await {
        Ok(Some(brand)) => Ok(brand),
        Ok(None) => Err(ApiError::new(
            request_id.to_owned(),
            "not_found",
            format!("unknown brand: {slug}"),
        )),
        Err(e) => Err(map_db_error(request_id.to_owned(), &e)),
    }
}

pub(super) fn map_db_error(request_id: String, error: &sovdb_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-admin-token"),
        ])
}

fn limited_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/visibility/share-of-voice",
            get(visibility::share_of_voice),
        )
        .route("/api/v1/visibility/trend", get(visibility::trend))
        .route("/api/v1/visibility/narrative", get(visibility::narrative))
        .route("/api/v1/citations/categories", get(citations::categories))
        .route(
            "/api/v1/citations/category-summary",
            get(citations::category_summary),
        )
        .route("/api/v1/citations/top-domains", get(citations::top_domains))
        .route("/api/v1/reports/rerun", post(reports::rerun))
        .route(
            "/api/v1/reports/queue/{public_id}",
            get(reports::queue_progress),
        )
        .route("/api/v1/prompts/{id}", delete(reports::delete_prompt))
        .route(
            "/api/v1/onboarding/create-brand",
            post(onboarding::create_brand),
        )
        .route(
            "/api/v1/onboarding/analyze-website",
            post(onboarding::analyze_website),
        )
        .route(
            "/api/v1/onboarding/generate-prompts",
            post(onboarding::generate_prompts),
        )
        .route(
            "/api/v1/onboarding/improve-prompts",
            post(onboarding::improve_prompts),
        )
        .route(
            "/api/v1/onboarding/complete-final",
            post(onboarding::complete_final),
        )
        .route("/api/v1/admin/login", post(admin::login))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

fn admin_router(guard: AdminSessionGuard) -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/forensic", post(admin::forensic))
        .layer(axum::middleware::from_fn_with_state(
            guard,
            require_admin_session,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let guard = AdminSessionGuard {
        pool: state.pool.clone(),
    };
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(limited_router(rate_limit))
        .merge(admin_router(guard))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let (code, data) = match sovdb_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            HealthData {
                status: "ok",
                database: "ok",
            },
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthData {
                    status: "degraded",
                    database: "unavailable",
                },
            )
        }
    };

    (
        code,
        Json(ApiResponse {
            data,
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::NaiveDate;

    use tower::ServiceExt;

    fn test_competitors() -> Vec<CompetitorRecord> {
        vec![
            CompetitorRecord {
                name: "Northwind Analytics".to_string(),
                website: None,
                color: "#2563eb".to_string(),
            },
            CompetitorRecord {
                name: "Acme Insights".to_string(),
                website: None,
                color: "#16a34a".to_string(),
            },
        ]
    }

    fn test_app(pool: PgPool) -> Router {
        let admin = AdminState::from_config(Some("test-password"), 1_800, true).expect("admin");
        let state = AppState {
            pool,
            competitors: Arc::new(test_competitors()),
            llm: None,
            admin,
        };
        build_app(state, default_rate_limit_state())
    }

    async fn seed_brand(pool: &PgPool, slug: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO brands (name, slug, website, is_active) \
             VALUES ($1, $2, $3, true) RETURNING id",
        )
        .bind(format!("Brand {slug}"))
        .bind(slug)
        .bind(format!("https://{slug}.example.com"))
        .fetch_one(pool)
        .await
        .expect("seed_brand failed")
    }

    async fn seed_report(
        pool: &PgPool,
        brand_id: i64,
        date: NaiveDate,
        score: &str,
        breakdown: serde_json::Value,
    ) {
        sqlx::query(
            "INSERT INTO reports (brand_id, report_date, status, visibility_score, entity_breakdown) \
             VALUES ($1, $2, 'completed', $3::numeric, $4)",
        )
        .bind(brand_id)
        .bind(date)
        .bind(score)
        .bind(breakdown)
        .execute(pool)
        .await
        .expect("seed_report failed");
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        (status, json)
    }

    async fn post_json(
        app: Router,
        uri: &str,
        body: serde_json::Value,
        admin_token: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = admin_token {
            builder = builder.header("x-admin-token", token);
        }
        let response = app
            .oneshot(
                builder
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json parse");
        (status, json)
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_unavailable_maps_to_503() {
        let response = ApiError::new("req-1", "unavailable", "llm not configured").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn resolve_range_defaults_to_trailing_30_days() {
        let query = BrandRangeQuery {
            brand: "acme".to_string(),
            from: None,
            to: Some(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()),
        };
        let (from, to) = resolve_range(&query);
        assert_eq!(to, NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        assert_eq!(from, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn share_of_voice_returns_sample_for_empty_brand(pool: PgPool) {
        seed_brand(&pool, "empty-brand").await;

        let (status, json) = get_json(
            test_app(pool),
            "/api/v1/visibility/share-of-voice?brand=empty-brand",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["is_sample"], true);
        let items = json["data"]["items"].as_array().expect("items array");
        assert!(!items.is_empty(), "sample dataset must not be empty");
        let total: i64 = items.iter().map(|i| i["value"].as_i64().unwrap()).sum();
        assert_eq!(total, 100, "sample slices must sum to 100");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn share_of_voice_uses_live_data_and_dedupes_days(pool: PgPool) {
        let brand_id = seed_brand(&pool, "live-brand").await;
        let day = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        // Duplicate rows for the same day: the 71.20 row must win.
        seed_report(
            &pool,
            brand_id,
            day,
            "71.20",
            serde_json::json!({"Brand live-brand": 24, "Northwind Analytics": 8}),
        )
        .await;
        seed_report(
            &pool,
            brand_id,
            day,
            "68.90",
            serde_json::json!({"Brand live-brand": 2, "Northwind Analytics": 90}),
        )
        .await;

        let (status, json) = get_json(
            test_app(pool),
            "/api/v1/visibility/share-of-voice?brand=live-brand&from=2025-01-01&to=2025-01-31",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["is_sample"], false);
        let items = json["data"]["items"].as_array().expect("items array");
        assert_eq!(items[0]["name"], "Brand live-brand", "brand slice first");
        assert_eq!(items[0]["value"], 75, "24 of 32 mentions");
        let total: i64 = items.iter().map(|i| i["value"].as_i64().unwrap()).sum();
        assert_eq!(total, 100);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn share_of_voice_unknown_brand_is_404(pool: PgPool) {
        let (status, json) = get_json(
            test_app(pool),
            "/api/v1/visibility/share-of-voice?brand=ghost",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn trend_returns_deduped_daily_scores(pool: PgPool) {
        let brand_id = seed_brand(&pool, "trend-brand").await;
        let day = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        seed_report(&pool, brand_id, day, "71.20", serde_json::json!({})).await;
        seed_report(&pool, brand_id, day, "68.90", serde_json::json!({})).await;
        seed_report(
            &pool,
            brand_id,
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            "64.00",
            serde_json::json!({}),
        )
        .await;

        let (status, json) = get_json(
            test_app(pool),
            "/api/v1/visibility/trend?brand=trend-brand&from=2025-01-01&to=2025-01-31",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["is_sample"], false);
        let items = json["data"]["items"].as_array().expect("items array");
        assert_eq!(items.len(), 2, "duplicate day collapsed");
        assert_eq!(items[0]["date"], "2025-01-05");
        assert_eq!(items[0]["score"], "71.20");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn narrative_without_llm_is_unavailable(pool: PgPool) {
        seed_brand(&pool, "narrative-brand").await;
        let (status, json) = get_json(
            test_app(pool),
            "/api/v1/visibility/narrative?brand=narrative-brand",
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["code"], "unavailable");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn citation_categories_fall_back_to_sample(pool: PgPool) {
        seed_brand(&pool, "cat-brand").await;
        let (status, json) =
            get_json(test_app(pool), "/api/v1/citations/categories?brand=cat-brand").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["is_sample"], true);
        let total: i64 = json["data"]["items"]
            .as_array()
            .expect("items")
            .iter()
            .map(|i| i["value"].as_i64().unwrap())
            .sum();
        assert_eq!(total, 100);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn admin_login_then_forensic_round_trip(pool: PgPool) {
        seed_brand(&pool, "forensic-route-brand").await;

        let app = test_app(pool.clone());
        let (status, json) = post_json(
            app,
            "/api/v1/admin/login",
            serde_json::json!({"password": "test-password"}),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = json["data"]["token"].as_str().expect("token").to_string();

        let app = test_app(pool);
        let (status, json) = post_json(
            app,
            "/api/v1/admin/forensic",
            serde_json::json!({}),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["data"]["storage_health"].is_array());
        assert!(json["data"]["session_matrix"].is_array());
        assert!(json["data"]["citation_trace"].is_array());
        assert!(json["data"]["scheduling_queue"].is_array());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn forensic_rejects_missing_and_bogus_tokens(pool: PgPool) {
        let app = test_app(pool.clone());
        let (status, _) =
            post_json(app, "/api/v1/admin/forensic", serde_json::json!({}), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let app = test_app(pool);
        let (status, _) = post_json(
            app,
            "/api/v1/admin/forensic",
            serde_json::json!({}),
            Some("not-a-real-token"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn admin_login_rejects_wrong_password(pool: PgPool) {
        let (status, json) = post_json(
            test_app(pool),
            "/api/v1/admin/login",
            serde_json::json!({"password": "wrong"}),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "unauthorized");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn onboarding_create_brand_succeeds_then_conflicts(pool: PgPool) {
        let app = test_app(pool.clone());
        let (status, json) = post_json(
            app,
            "/api/v1/onboarding/create-brand",
            serde_json::json!({"name": "Fresh Brand", "website": "https://fresh.example.com"}),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["brand_slug"], "fresh-brand");

        let app = test_app(pool);
        let (status, json) = post_json(
            app,
            "/api/v1/onboarding/create-brand",
            serde_json::json!({"name": "Fresh Brand"}),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["success"], false);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn rerun_enqueues_and_progress_is_readable(pool: PgPool) {
        seed_brand(&pool, "rerun-brand").await;

        let app = test_app(pool.clone());
        let (status, json) = post_json(
            app,
            "/api/v1/reports/rerun",
            serde_json::json!({"brand": "rerun-brand"}),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let public_id = json["data"]["public_id"].as_str().expect("public_id");
        assert_eq!(json["data"]["status"], "queued");

        let app = test_app(pool);
        let (status, json) =
            get_json(app, &format!("/api/v1/reports/queue/{public_id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["prompts_completed"], 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn deleting_unknown_prompt_is_404(pool: PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/prompts/999999")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
