//! HTTP handlers module
//!
//! One handler module per resource, wired into a single axum router.
//! Handlers follow a uniform pattern: run the operation, convert domain
//! errors into a JSON error payload with the matching status code.

pub mod auth;
pub mod cep;
pub mod certificates;
pub mod courses;
pub mod documents;
pub mod processes;
pub mod registrations;
pub mod steps;
pub mod units;

use std::sync::Arc;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tracing::error;

use crate::config::Settings;
use crate::database::DatabaseService;
use crate::middleware::{logging::track_requests, RateLimitService};
use crate::services::ServiceFactory;
use crate::utils::errors::AdmissioError;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Settings,
    pub db: DatabaseService,
    pub services: ServiceFactory,
    pub validate_limiter: RateLimitService,
}

impl AppState {
    pub fn new(settings: Settings, db: DatabaseService, services: ServiceFactory) -> Self {
        let validate_limiter =
            RateLimitService::new(settings.features.validate_rate_limit_per_minute);
        Self { settings, db, services, validate_limiter }
    }
}

/// Error wrapper mapping domain errors onto HTTP responses
#[derive(Debug)]
pub struct ApiError(pub AdmissioError);

impl From<AdmissioError> for ApiError {
    fn from(error: AdmissioError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.0;

        let (status, message) = if error.is_not_found() {
            (StatusCode::NOT_FOUND, error.to_string())
        } else if error.is_validation() {
            (StatusCode::BAD_REQUEST, error.to_string())
        } else {
            match &error {
                AdmissioError::Authentication(_) => (StatusCode::UNAUTHORIZED, error.to_string()),
                AdmissioError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, error.to_string()),
                _ => {
                    error!(error = %error, "Request failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
                }
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/auth/login", post(auth::login))
        .route("/api/cep/:cep", get(cep::lookup_cep))
        .route("/api/courses", get(courses::list_courses).post(courses::create_course))
        .route(
            "/api/courses/:id",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/api/units", get(units::list_units).post(units::create_unit))
        .route(
            "/api/units/:id",
            get(units::get_unit).put(units::update_unit).delete(units::delete_unit),
        )
        .route("/api/processes", get(processes::list_processes).post(processes::create_process))
        .route(
            "/api/processes/:id",
            get(processes::get_process)
                .put(processes::update_process)
                .delete(processes::delete_process),
        )
        .route("/api/processes/:id/steps", get(processes::list_process_steps))
        .route("/api/steps", post(steps::create_step))
        .route(
            "/api/steps/:id",
            get(steps::get_step).put(steps::update_step).delete(steps::delete_step),
        )
        .route("/api/steps/:id/fields", get(steps::list_fields).post(steps::create_field))
        .route(
            "/api/steps/:id/documents",
            get(steps::list_step_documents).post(steps::create_step_document),
        )
        .route(
            "/api/steps/:id/evaluations",
            get(steps::list_evaluations).post(steps::create_evaluation),
        )
        .route("/api/fields/:id", put(steps::update_field).delete(steps::delete_field))
        .route(
            "/api/step-documents/:id",
            put(steps::update_step_document).delete(steps::delete_step_document),
        )
        .route(
            "/api/evaluations/:id",
            put(steps::update_evaluation).delete(steps::delete_evaluation),
        )
        .route(
            "/api/evaluations/:id/modules",
            get(steps::list_modules).post(steps::create_module),
        )
        .route(
            "/api/evaluations/:id/questions",
            get(steps::list_questions).post(steps::create_question),
        )
        .route(
            "/api/registrations",
            get(registrations::list_registrations).post(registrations::create_registration),
        )
        .route(
            "/api/registrations/:id",
            get(registrations::get_registration).put(registrations::update_registration),
        )
        .route(
            "/api/registrations/:id/data",
            get(registrations::list_registration_data).post(registrations::save_registration_data),
        )
        .route("/api/registrations/:id/documents", get(registrations::list_registration_documents))
        .route(
            "/api/registrations/:id/documents/:doc_id",
            put(registrations::review_registration_document),
        )
        .route(
            "/api/registrations/:id/evaluations",
            get(registrations::list_registration_evaluations)
                .post(registrations::submit_registration_evaluation),
        )
        .route("/api/registrations/:id/contract", post(registrations::generate_registration_contract))
        .route("/api/documents", post(documents::upload_document))
        .route("/api/certificates", get(certificates::list_certificates))
        .route("/api/certificates/generate", post(certificates::generate_certificate))
        .route("/api/certificates/:id", get(certificates::get_certificate))
        .route("/api/certificates/:id/download", get(certificates::download_certificate))
        .route("/api/certificates/validate/:code", get(certificates::validate_certificate))
        .route(
            "/api/certificates/configs",
            get(certificates::get_certificate_config).post(certificates::upsert_certificate_config),
        )
        .route("/api/certificates/configs/upload", post(certificates::upload_certificate_background))
        .layer(axum::middleware::from_fn(track_requests))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
