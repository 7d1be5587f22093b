//! Multi-step brand onboarding.
//!
//! Every endpoint takes a JSON body and answers with the flat
//! `{success, ...}` envelope the setup wizard consumes, or
//! `{success: false, error}` with an appropriate status.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sovdb_core::slugify;
use sovdb_db::DbError;
use sovdb_llm::LlmError;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::AppState;

const DEFAULT_PROMPT_COUNT: usize = 10;
const MAX_PROMPT_COUNT: usize = 25;

#[derive(Debug, Serialize)]
pub(super) struct OnboardingFailure {
    success: bool,
    error: String,
    #[serde(skip)]
    status: StatusCode,
}

impl OnboardingFailure {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            status,
        }
    }
}

impl IntoResponse for OnboardingFailure {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

fn llm_failure(request_id: &str, step: &str, error: &LlmError) -> OnboardingFailure {
    tracing::error!(request_id, step, error = %error, "onboarding LLM call failed");
    match error {
        LlmError::MissingApiKey => OnboardingFailure::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "the completion API is not configured",
        ),
        _ => OnboardingFailure::new(
            StatusCode::BAD_GATEWAY,
            format!("{step} failed; try again"),
        ),
    }
}

fn db_failure(request_id: &str, error: &DbError) -> OnboardingFailure {
    tracing::error!(request_id, error = %error, "onboarding database call failed");
    OnboardingFailure::new(StatusCode::INTERNAL_SERVER_ERROR, "storage error; try again")
}

fn is_unique_violation(error: &DbError) -> bool {
    matches!(
        error,
        DbError::Sqlx(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505")
    )
}

/// Loads the brand for an onboarding step or produces the step failure.
async fn load_brand(
    state: &AppState,
    request_id: &str,
    slug: &str,
) -> Result<sovdb_db::BrandRow, OnboardingFailure> {
    match sovdb_db::get_brand_by_slug(&state.pool, slug).await {
        Ok(Some(brand)) => Ok(brand),
        Ok(None) => Err(OnboardingFailure::new(
            StatusCode::NOT_FOUND,
            format!("unknown brand: {slug}"),
        )),
        Err(e) => Err(db_failure(request_id, &e)),
    }
}

fn require_llm(state: &AppState) -> Result<std::sync::Arc<sovdb_llm::CompletionClient>, OnboardingFailure> {
    state.llm.clone().ok_or_else(|| {
        OnboardingFailure::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "the completion API is not configured",
        )
    })
}

// ---------------------------------------------------------------------------
// Step 1: create-brand
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateBrandBody {
    pub name: String,
    pub website: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateBrandResponse {
    success: bool,
    brand_public_id: Uuid,
    brand_slug: String,
}

pub(super) async fn create_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateBrandBody>,
) -> Result<Json<CreateBrandResponse>, OnboardingFailure> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(OnboardingFailure::new(
            StatusCode::BAD_REQUEST,
            "brand name must be non-empty",
        ));
    }

    let slug = slugify(name);
    if slug.is_empty() {
        return Err(OnboardingFailure::new(
            StatusCode::BAD_REQUEST,
            "brand name must contain at least one alphanumeric character",
        ));
    }

    let brand = sovdb_db::create_brand(&state.pool, name, &slug, body.website.as_deref())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                OnboardingFailure::new(
                    StatusCode::CONFLICT,
                    format!("a brand with slug '{slug}' already exists"),
                )
            } else {
                db_failure(&req_id.0, &e)
            }
        })?;

    Ok(Json(CreateBrandResponse {
        success: true,
        brand_public_id: brand.public_id,
        brand_slug: brand.slug,
    }))
}

// ---------------------------------------------------------------------------
// Step 2: analyze-website
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeWebsiteBody {
    pub brand: String,
    /// Overrides the stored website when provided.
    pub website: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyzeWebsiteResponse {
    success: bool,
    description: String,
    keywords: Vec<String>,
}

pub(super) async fn analyze_website(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AnalyzeWebsiteBody>,
) -> Result<Json<AnalyzeWebsiteResponse>, OnboardingFailure> {
    let llm = require_llm(&state)?;
    let brand = load_brand(&state, &req_id.0, &body.brand).await?;

    let website = body
        .website
        .or_else(|| brand.website.clone())
        .ok_or_else(|| {
            OnboardingFailure::new(
                StatusCode::BAD_REQUEST,
                "no website on record; provide one to analyze",
            )
        })?;

    let analysis = llm
        .analyze_website(&brand.name, &website)
        .await
        .map_err(|e| llm_failure(&req_id.0, "website analysis", &e))?;

    sovdb_db::update_brand_analysis(&state.pool, brand.id, &analysis.description, &analysis.keywords)
        .await
        .map_err(|e| db_failure(&req_id.0, &e))?;

    Ok(Json(AnalyzeWebsiteResponse {
        success: true,
        description: analysis.description,
        keywords: analysis.keywords,
    }))
}

// ---------------------------------------------------------------------------
// Step 3: generate-prompts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct GeneratePromptsBody {
    pub brand: String,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct PromptItem {
    pub id: i64,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub(super) struct GeneratePromptsResponse {
    success: bool,
    prompts: Vec<PromptItem>,
}

pub(super) async fn generate_prompts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<GeneratePromptsBody>,
) -> Result<Json<GeneratePromptsResponse>, OnboardingFailure> {
    let llm = require_llm(&state)?;
    let brand = load_brand(&state, &req_id.0, &body.brand).await?;

    let count = body
        .count
        .unwrap_or(DEFAULT_PROMPT_COUNT)
        .clamp(1, MAX_PROMPT_COUNT);
    let description = brand.description.clone().unwrap_or_else(|| brand.name.clone());

    let texts = llm
        .generate_prompts(&brand.name, &description, count)
        .await
        .map_err(|e| llm_failure(&req_id.0, "prompt generation", &e))?;

    if texts.is_empty() {
        return Err(OnboardingFailure::new(
            StatusCode::BAD_GATEWAY,
            "prompt generation returned nothing usable; try again",
        ));
    }

    let rows = sovdb_db::insert_prompts(&state.pool, brand.id, &texts)
        .await
        .map_err(|e| db_failure(&req_id.0, &e))?;

    Ok(Json(GeneratePromptsResponse {
        success: true,
        prompts: rows
            .into_iter()
            .map(|row| PromptItem {
                id: row.id,
                text: row.text,
            })
            .collect(),
    }))
}

// ---------------------------------------------------------------------------
// Step 4: improve-prompts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ImprovePromptsBody {
    pub brand: String,
    pub prompts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ImprovePromptsResponse {
    success: bool,
    prompts: Vec<String>,
}

pub(super) async fn improve_prompts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ImprovePromptsBody>,
) -> Result<Json<ImprovePromptsResponse>, OnboardingFailure> {
    let llm = require_llm(&state)?;
    let brand = load_brand(&state, &req_id.0, &body.brand).await?;

    if body.prompts.is_empty() {
        return Err(OnboardingFailure::new(
            StatusCode::BAD_REQUEST,
            "provide at least one prompt to improve",
        ));
    }

    let improved = llm
        .improve_prompts(&brand.name, &body.prompts)
        .await
        .map_err(|e| llm_failure(&req_id.0, "prompt improvement", &e))?;

    if improved.is_empty() {
        return Err(OnboardingFailure::new(
            StatusCode::BAD_GATEWAY,
            "prompt improvement returned nothing usable; try again",
        ));
    }

    Ok(Json(ImprovePromptsResponse {
        success: true,
        prompts: improved,
    }))
}

// ---------------------------------------------------------------------------
// Step 5: complete-final
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CompleteFinalBody {
    pub brand: String,
    #[serde(default)]
    pub answers: Value,
}

#[derive(Debug, Serialize)]
pub(super) struct CompleteFinalResponse {
    success: bool,
    queue_public_id: Uuid,
}

pub(super) async fn complete_final(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CompleteFinalBody>,
) -> Result<Json<CompleteFinalResponse>, OnboardingFailure> {
    let brand = load_brand(&state, &req_id.0, &body.brand).await?;

    let answers = if body.answers.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        body.answers
    };

    sovdb_db::complete_onboarding(&state.pool, brand.id, &answers)
        .await
        .map_err(|e| db_failure(&req_id.0, &e))?;

    let prompts_total = sovdb_db::count_active_prompts(&state.pool, brand.id)
        .await
        .map_err(|e| db_failure(&req_id.0, &e))?;

    let run = sovdb_db::enqueue_report_run(
        &state.pool,
        brand.id,
        "onboarding",
        i32::try_from(prompts_total).unwrap_or(i32::MAX),
    )
    .await
    .map_err(|e| db_failure(&req_id.0, &e))?;

    tracing::info!(
        brand = %brand.slug,
        queue_public_id = %run.public_id,
        "onboarding completed; first report run enqueued"
    );

    Ok(Json(CompleteFinalResponse {
        success: true,
        queue_public_id: run.public_id,
    }))
}
