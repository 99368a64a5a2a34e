//! HTTP handlers in two security tiers: public/ needs no authentication
//! (token-secured signatory and letter-view pages), protected/ sits behind
//! the JWT middleware and receives the caller's Identity as an extension.

pub mod protected;
pub mod public;

use std::sync::Arc;

use axum::middleware::from_fn;
use axum::routing::{get, patch, post};
use axum::Router;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::store::{Page, Store};
use crate::middleware::jwt_auth_middleware;
use crate::services::institution::InstitutionService;
use crate::services::letter::LetterService;
use crate::services::person::PersonService;
use crate::services::signature::SignatureService;
use crate::services::submission::SubmissionService;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn submissions(&self) -> SubmissionService {
        SubmissionService::new(self.store.clone())
    }

    pub fn signatures(&self) -> SignatureService {
        SignatureService::new(self.store.clone())
    }

    pub fn letters(&self) -> LetterService {
        LetterService::new(self.store.clone())
    }

    pub fn institutions(&self) -> InstitutionService {
        InstitutionService::new(self.store.clone())
    }

    pub fn people(&self) -> PersonService {
        PersonService::new(self.store.clone())
    }
}

/// Listing payload with the pre-pagination total.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> From<Page<T>> for Paged<T> {
    fn from(page: Page<T>) -> Self {
        Self { items: page.data, total: page.total }
    }
}

/// The full application router.
pub fn app(state: AppState) -> Router {
    let config = crate::config::config();

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        .merge(protected_routes())
        .with_state(state);

    if config.security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/sign/:token", get(public::signature::get))
        .route("/sign/:id/mark", post(public::signature::post))
        .route("/letters/:token", get(public::letter::get))
}

fn protected_routes() -> Router<AppState> {
    use protected::{institution, letter, person, submission};

    Router::new()
        .route("/api/submissions", get(submission::list))
        .route("/api/submissions/student", post(submission::create_student))
        .route("/api/submissions/general", post(submission::create_general))
        .route(
            "/api/submissions/:id",
            get(submission::get).patch(submission::update).delete(submission::remove),
        )
        .route("/api/submissions/:id/verify", post(submission::verify))
        .route("/api/submissions/:id/status", patch(submission::change_status))
        .route("/api/submissions/:id/carbon-copy", patch(submission::set_carbon_copy))
        .route("/api/submissions/:id/attachments", post(submission::add_attachment))
        .route("/api/submissions/:id/print", get(submission::print))
        .route("/api/submissions/:id/signatures", get(submission::signatures))
        .route("/api/signatures/:id/reset", post(submission::reset_signature))
        .route("/api/letters", get(letter::list).post(letter::create))
        .route("/api/letters/:id", get(letter::get))
        .route("/api/letterheads", post(letter::create_letterhead))
        .route("/api/letterheads/:id", get(letter::get_letterhead))
        .route("/api/institutions", get(institution::list).post(institution::create))
        .route("/api/institutions/:id", get(institution::get))
        .route("/api/officials", post(person::create_official))
        .route("/api/students", post(person::create_student))
        .route("/api/personnel", post(person::create_personnel))
        .layer(from_fn(jwt_auth_middleware))
}

async fn root() -> axum::Json<Value> {
    axum::Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> axum::Json<Value> {
    axum::Json(json!({ "status": "ok" }))
}
