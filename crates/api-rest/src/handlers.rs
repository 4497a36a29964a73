use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
};
use chitfund_core::{
    DirectoryCallbacks, DraftField, DraftRecord, FieldErrors, NestedField, OnboardingError,
    OnboardingWizard, StepOutcome, SubmitOutcome, SubscriberId, SubscriberQuery,
    SubscriberRecord, SubscriberStats, WizardStatus, WizardStep,
};
use serde::{Deserialize, Serialize};

use crate::error::{api_error, ApiError};
use crate::sessions::{SessionStore, Wizard};
use crate::AppState;

// ============================================================================
// RESPONSE BODIES
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Snapshot of one onboarding session.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRes {
    pub session_id: String,
    pub step: WizardStep,
    pub step_number: u8,
    pub step_title: String,
    pub status: WizardStatus,
    pub draft: DraftRecord,
    pub errors: FieldErrors,
}

impl SessionRes {
    fn of(session_id: &str, wizard: &Wizard) -> Self {
        let step = wizard.step();
        Self {
            session_id: session_id.to_string(),
            step,
            step_number: step.number(),
            step_title: step.title().to_string(),
            status: wizard.status(),
            draft: wizard.draft().clone(),
            errors: wizard.errors().clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRes {
    pub advanced: bool,
    pub session: SessionRes,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRes {
    /// Present when the record was stored.
    pub subscriber_id: Option<SubscriberId>,
    pub session: SessionRes,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagReq {
    pub tag: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagRes {
    /// Whether the tag set changed.
    pub changed: bool,
    pub session: SessionRes,
}

// ============================================================================
// SUBSCRIBERS
// ============================================================================

/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
pub(crate) async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Chit fund REST API is alive".into(),
    })
}

/// List subscribers matching the query string
///
/// Every query parameter is optional: `text`, `status`, `kycStatus`, `branch`,
/// `membershipType`. With none given, all subscribers are returned in stored order.
///
/// # Errors
/// Returns `500 Internal Server Error` if the record store cannot be read.
#[axum::debug_handler]
pub(crate) async fn list_subscribers(
    State(state): State<AppState>,
    Query(query): Query<SubscriberQuery>,
) -> Result<Json<Vec<SubscriberRecord>>, ApiError> {
    state
        .directory
        .search(&query)
        .map(Json)
        .map_err(|e| api_error("List subscribers", &e))
}

#[axum::debug_handler]
pub(crate) async fn subscriber_stats(
    State(state): State<AppState>,
) -> Result<Json<SubscriberStats>, ApiError> {
    state
        .directory
        .stats()
        .map(Json)
        .map_err(|e| api_error("Subscriber stats", &e))
}

/// Read one stored subscriber
///
/// # Errors
/// - `400 Bad Request` if `id` is not a subscriber id
/// - `404 Not Found` if no such subscriber is stored
#[axum::debug_handler]
pub(crate) async fn get_subscriber(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<SubscriberRecord>, ApiError> {
    let id: SubscriberId = id
        .parse()
        .map_err(|e| api_error("Get subscriber", &OnboardingError::from(e)))?;
    state
        .directory
        .get(&id)
        .map(Json)
        .map_err(|e| api_error("Get subscriber", &e))
}

// ============================================================================
// ONBOARDING SESSIONS
// ============================================================================

/// Open a new onboarding session at step 1 with an empty draft
#[axum::debug_handler]
pub(crate) async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionRes>), ApiError> {
    let wizard = OnboardingWizard::new(
        state.context.clone(),
        DirectoryCallbacks::new(state.directory.clone()),
    );
    let (id, handle) = state.sessions.insert(wizard)?;
    let id = id.to_string();

    SessionStore::run(&handle, "Create session", |w| Ok(SessionRes::of(&id, w)))
        .map(|res| (StatusCode::CREATED, Json(res)))
}

#[axum::debug_handler]
pub(crate) async fn get_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<SessionRes>, ApiError> {
    state
        .sessions
        .with_session("Get session", &id, |w| Ok(SessionRes::of(&id, w)))
        .map(Json)
}

/// Replace one top-level draft field
///
/// Body: `{"field": "firstName", "value": "Anita"}`. Clears that field's error entry.
/// Edits to a closed session are ignored.
#[axum::debug_handler]
pub(crate) async fn set_field(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(update): Json<DraftField>,
) -> Result<Json<SessionRes>, ApiError> {
    state
        .sessions
        .with_session("Set field", &id, |w| {
            w.set_field(update);
            Ok(SessionRes::of(&id, w))
        })
        .map(Json)
}

/// Replace one key of a nested sub-record
///
/// Body: `{"group": "nominee", "update": {"field": "name", "value": "Ravi"}}`.
#[axum::debug_handler]
pub(crate) async fn set_nested_field(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(update): Json<NestedField>,
) -> Result<Json<SessionRes>, ApiError> {
    state
        .sessions
        .with_session("Set nested field", &id, |w| {
            w.set_nested_field(update);
            Ok(SessionRes::of(&id, w))
        })
        .map(Json)
}

#[axum::debug_handler]
pub(crate) async fn add_tag(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<TagReq>,
) -> Result<Json<TagRes>, ApiError> {
    state
        .sessions
        .with_session("Add tag", &id, |w| {
            let changed = w.add_tag(&req.tag);
            Ok(TagRes {
                changed,
                session: SessionRes::of(&id, w),
            })
        })
        .map(Json)
}

#[axum::debug_handler]
pub(crate) async fn remove_tag(
    State(state): State<AppState>,
    AxumPath((id, tag)): AxumPath<(String, String)>,
) -> Result<Json<TagRes>, ApiError> {
    state
        .sessions
        .with_session("Remove tag", &id, |w| {
            let changed = w.remove_tag(&tag);
            Ok(TagRes {
                changed,
                session: SessionRes::of(&id, w),
            })
        })
        .map(Json)
}

/// Validate the current step and advance
///
/// A failed validation is not an HTTP error: the response has `advanced: false` and the
/// session's `errors` map lists each missing field.
///
/// # Errors
/// Returns `409 Conflict` if the session is already submitted or cancelled.
#[axum::debug_handler]
pub(crate) async fn next_step(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<StepRes>, ApiError> {
    state
        .sessions
        .with_session("Next step", &id, |w| {
            let advanced = matches!(w.next()?, StepOutcome::Advanced { .. });
            Ok(StepRes {
                advanced,
                session: SessionRes::of(&id, w),
            })
        })
        .map(Json)
}

#[axum::debug_handler]
pub(crate) async fn previous_step(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<SessionRes>, ApiError> {
    state
        .sessions
        .with_session("Previous step", &id, |w| {
            w.previous()?;
            Ok(SessionRes::of(&id, w))
        })
        .map(Json)
}

/// Submit the session's draft as a new subscriber
///
/// # Errors
/// - `400 Bad Request` before the final step
/// - `409 Conflict` if the session is closed
/// - `500 Internal Server Error` if the record cannot be stored; the session stays open
///
/// Storing the record writes the subscriber file, so it runs on the blocking pool while
/// holding only this session's lock.
#[axum::debug_handler]
pub(crate) async fn submit(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<SubmitRes>, ApiError> {
    const CONTEXT: &str = "Submit onboarding";
    let handle = state.sessions.handle(CONTEXT, &id)?;

    tokio::task::spawn_blocking(move || {
        SessionStore::run(&handle, CONTEXT, |w| {
            let subscriber_id = match w.submit()? {
                SubmitOutcome::Completed(subscriber_id) => Some(subscriber_id),
                SubmitOutcome::Blocked(_) => None,
            };
            Ok(SubmitRes {
                subscriber_id,
                session: SessionRes::of(&id, w),
            })
        })
    })
    .await
    .map_err(|e| {
        tracing::error!("{} task failed: {}", CONTEXT, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    })?
    .map(Json)
}

/// Cancel the session and discard its draft
#[axum::debug_handler]
pub(crate) async fn cancel(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<SessionRes>, ApiError> {
    state
        .sessions
        .with_session("Cancel onboarding", &id, |w| {
            w.cancel()?;
            Ok(SessionRes::of(&id, w))
        })
        .map(Json)
}
