//! # API REST
//!
//! REST API implementation for the EHR summary service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS, request tracing)
//!
//! Uses `api-shared` for wire bodies and `summary-core` for all summarisation logic.

#![warn(rust_2018_idioms)]

use api_shared::{
    GenerationUnavailableBody, HealthRes, HealthService, InvalidJsonBody, ValidationFailedBody,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use summary_core::summary_types::{
    Audience, FocusArea, Priority, ProblemStatus, SummaryLength, TimeFrame, UrgencyLevel,
};
use summary_core::{
    ActionableItem, Allergy, ClinicalFinding, CustomizationParameters, EhrSnapshot, FieldError,
    FieldErrorKind, MedicalProblem, Medication, MedicationsAndAllergies, PatientOverview,
    PendingItem, StructuredSummary, SummarizeRequest, SummaryEngine, SummaryError,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Holds the summary engine shared by every request handler.
#[derive(Clone, Debug)]
pub struct AppState {
    engine: Arc<SummaryEngine>,
}

impl AppState {
    pub fn new(engine: SummaryEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, summarize),
    components(schemas(
        HealthRes,
        SummarizeRequest,
        EhrSnapshot,
        CustomizationParameters,
        StructuredSummary,
        PatientOverview,
        MedicalProblem,
        MedicationsAndAllergies,
        Medication,
        Allergy,
        ClinicalFinding,
        ActionableItem,
        PendingItem,
        SummaryLength,
        TimeFrame,
        FocusArea,
        Audience,
        UrgencyLevel,
        ProblemStatus,
        Priority,
        FieldError,
        FieldErrorKind,
        InvalidJsonBody,
        ValidationFailedBody,
        GenerationUnavailableBody,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI, permissive CORS and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/summarize", post(summarize))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/summarize",
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "Structured summary", body = StructuredSummary),
        (status = 400, description = "Body is not JSON", body = InvalidJsonBody),
        (status = 422, description = "Field-level validation errors", body = ValidationFailedBody),
        (status = 503, description = "Narrative generation unavailable, safe to retry", body = GenerationUnavailableBody)
    )
)]
/// Summarise an EHR snapshot
///
/// Validates the whole request before any work is done. Every field problem is returned at once
/// with status 422. A generation failure returns 503 with an opaque `error_id`; the detail is only
/// written to the server log under the same id.
#[axum::debug_handler]
async fn summarize(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(raw) = match body {
        Ok(json) => json,
        Err(rejection) => {
            tracing::debug!("Rejected summarize body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(InvalidJsonBody::new(rejection.body_text())),
            )
                .into_response();
        }
    };

    match state.engine.summarize_raw(&raw).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(SummaryError::Validation(errors)) => {
            tracing::debug!("Summarize validation failed: {}", errors);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationFailedBody::from(errors)),
            )
                .into_response()
        }
        Err(e) => {
            let error_id = uuid::Uuid::new_v4().to_string();
            tracing::error!(error_id = %error_id, "Summarize error: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(GenerationUnavailableBody::new(error_id)),
            )
                .into_response()
        }
    }
}
