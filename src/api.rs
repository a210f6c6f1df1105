//! REST endpoints for sessions, onboarding, dashboards, transactions and
//! the enterprise portal.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::business::model::NewTransaction;
use crate::error::{Error, InvalidInputError};
use crate::hub::Hub;
use crate::identity::{AnonymousIdentityProvider, IdentityProvider};
use crate::onboarding::StepFields;
use crate::session::SessionError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
}

/// Build the Axum router with every API route.
pub fn api_routes(hub: Arc<Hub>) -> Router {
    let state = AppState { hub };

    Router::new()
        .route("/health", get(health))
        .route("/api/identity", post(open_session))
        .route("/api/session/{identity}", get(get_session))
        .route("/api/session/{identity}/welcome", post(back_to_welcome))
        .route("/api/session/{identity}/enterprise", post(enter_enterprise))
        .route("/api/session/{identity}/sign-out", post(sign_out))
        .route("/api/onboarding/{identity}/start", post(start_onboarding))
        .route("/api/onboarding/{identity}/step", post(apply_step))
        .route("/api/onboarding/{identity}/submit", post(submit))
        .route("/api/business/{identity}", get(get_business))
        .route("/api/dashboard/{identity}", get(get_dashboard))
        .route(
            "/api/business/{identity}/transactions",
            get(list_transactions).post(add_transaction),
        )
        .route("/api/business/{identity}/health", get(health_report))
        .route("/api/enterprise/overview", get(enterprise_overview))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JSON body extractor whose rejections come back as the API's
/// `{"error": ...}` body with a 400.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| InvalidInputError::Body(rejection.body_text()))?;
        Ok(Self(value))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotOnboarded { .. } | Error::Session(SessionError::Unknown(_)) => {
                StatusCode::NOT_FOUND
            }
            Error::Session(SessionError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            Error::Persistence(_) | Error::Identity(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }

        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "nceda-hub"
    }))
}

// ── Sessions ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct OpenSessionRequest {
    /// Identity from a previous visit, if the client kept one.
    #[serde(default)]
    identity: Option<String>,
}

/// The body is optional; an empty one mints a new identity.
async fn open_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, Error> {
    let req: OpenSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        OpenSessionRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| InvalidInputError::Body(e.to_string()))?
    };

    let returning = req.identity.filter(|id| !id.trim().is_empty());
    let provider: Arc<dyn IdentityProvider> = match returning {
        Some(identity) => Arc::new(AnonymousIdentityProvider::resume(identity)),
        None => Arc::new(AnonymousIdentityProvider::new()),
    };
    let session = state.hub.open_session(provider).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.hub.session(&identity).await?))
}

async fn back_to_welcome(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.hub.back_to_welcome(&identity).await?))
}

async fn sign_out(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.hub.sign_out(&identity).await?))
}

async fn enter_enterprise(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.hub.enter_enterprise(&identity).await?))
}

// ── Onboarding ──────────────────────────────────────────────────────────

async fn start_onboarding(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.hub.start_onboarding(&identity).await?))
}

async fn apply_step(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    ApiJson(fields): ApiJson<StepFields>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.hub.apply_step(&identity, fields).await?))
}

async fn submit(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let record = state.hub.submit(&identity).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

// ── Business & dashboard ────────────────────────────────────────────────

async fn get_business(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.hub.business(&identity).await?))
}

async fn get_dashboard(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.hub.dashboard(&identity).await?))
}

async fn list_transactions(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.hub.transactions(&identity).await?))
}

async fn add_transaction(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    ApiJson(tx): ApiJson<NewTransaction>,
) -> Result<impl IntoResponse, Error> {
    let record = state.hub.add_transaction(&identity, tx).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn health_report(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.hub.health_report(&identity).await?))
}

// ── Enterprise ──────────────────────────────────────────────────────────

async fn enterprise_overview(State(state): State<AppState>) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.hub.enterprise_overview().await?))
}
