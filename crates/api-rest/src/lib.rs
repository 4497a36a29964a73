//! # API REST
//!
//! REST API implementation for chit fund subscriber onboarding.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Onboarding sessions, one wizard per session, held in memory
//! - REST-specific concerns (JSON serialization, CORS, status code mapping)
//!
//! All business rules live in `chitfund-core`.

#![warn(rust_2018_idioms)]

mod error;
mod handlers;
mod sessions;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use chitfund_core::{
    CoreConfig, OnboardingContext, OnboardingResult, StaticIdentity, SubscriberDirectory,
};
use tower_http::cors::CorsLayer;

pub use handlers::{HealthRes, SessionRes, StepRes, SubmitRes, TagReq, TagRes};
pub use sessions::{DEFAULT_CLOSED_TTL, DEFAULT_IDLE_TTL};
use sessions::SessionStore;

/// Application state for the REST API server
///
/// Shared by every handler: the subscriber directory, the onboarding context (actor and
/// id generator) and the open onboarding sessions.
#[derive(Clone)]
pub struct AppState {
    directory: Arc<SubscriberDirectory>,
    context: OnboardingContext,
    sessions: Arc<SessionStore>,
}

impl AppState {
    /// Builds state over `directory`, stamping records with the configured default actor.
    ///
    /// Subscriber ids resume after the highest id already stored.
    pub fn new(cfg: &CoreConfig, directory: Arc<SubscriberDirectory>) -> OnboardingResult<Self> {
        let context = OnboardingContext::resuming_after(
            Arc::new(StaticIdentity::new(cfg.default_actor().clone())),
            directory.last_issued_id()?,
        );
        Ok(Self {
            directory,
            context,
            sessions: Arc::new(SessionStore::default()),
        })
    }

    /// Replaces the session store with one using the given expiry times.
    ///
    /// `idle_ttl` bounds how long an open session may go untouched; `closed_ttl` how long a
    /// submitted or cancelled session stays readable.
    pub fn with_session_ttls(mut self, idle_ttl: Duration, closed_ttl: Duration) -> Self {
        self.sessions = Arc::new(SessionStore::new(idle_ttl, closed_ttl));
        self
    }
}

/// The REST router with all routes and a permissive CORS layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/subscribers", get(handlers::list_subscribers))
        .route("/subscribers/stats", get(handlers::subscriber_stats))
        .route("/subscribers/:id", get(handlers::get_subscriber))
        .route("/onboarding", post(handlers::create_session))
        .route(
            "/onboarding/:id",
            get(handlers::get_session).delete(handlers::cancel),
        )
        .route("/onboarding/:id/field", put(handlers::set_field))
        .route("/onboarding/:id/nested", put(handlers::set_nested_field))
        .route("/onboarding/:id/tags", post(handlers::add_tag))
        .route("/onboarding/:id/tags/:tag", delete(handlers::remove_tag))
        .route("/onboarding/:id/next", post(handlers::next_step))
        .route("/onboarding/:id/previous", post(handlers::previous_step))
        .route("/onboarding/:id/submit", post(handlers::submit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chitfund_core::config::actor_from_env_values;
    use chitfund_core::{
        ChangeNotifier, InMemoryRepository, NonEmptyText, WizardStatus, WizardStep,
    };
    use http_body_util::BodyExt;
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<SubscriberDirectory>) {
        app_with(|state| state)
    }

    fn app_with(tune: impl FnOnce(AppState) -> AppState) -> (Router, Arc<SubscriberDirectory>) {
        let cfg = CoreConfig::new(
            PathBuf::from("unused"),
            NonEmptyText::new("subscribers.json").unwrap(),
            actor_from_env_values(Some("Desk Agent".into()), Some("Agent".into())).unwrap(),
        )
        .unwrap();
        let directory = Arc::new(SubscriberDirectory::new(
            Arc::new(InMemoryRepository::new()),
            ChangeNotifier::default(),
        ));
        let state = AppState::new(&cfg, directory.clone()).unwrap();
        (router(tune(state)), directory)
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn call_json<T: DeserializeOwned>(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> T {
        let (status, bytes) = call(app, method, uri, body).await;
        assert!(status.is_success(), "{} {} returned {}", method, uri, status);
        serde_json::from_slice(&bytes).expect("response should be JSON")
    }

    async fn set(app: &Router, session: &str, field: &str, value: &str) {
        let _: SessionRes = call_json(
            app,
            "PUT",
            &format!("/onboarding/{}/field", session),
            Some(json!({ "field": field, "value": value })),
        )
        .await;
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = app();
        let res: HealthRes = call_json(&app, "GET", "/health", None).await;
        assert!(res.ok);
    }

    #[tokio::test]
    async fn full_onboarding_over_http() {
        let (app, directory) = app();

        let (status, bytes) = call(&app, "POST", "/onboarding", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let session: SessionRes = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(session.step, WizardStep::PersonalInfo);
        let id = session.session_id;

        // Step 1 blocked with all five errors.
        let step: StepRes = call_json(&app, "POST", &format!("/onboarding/{}/next", id), None).await;
        assert!(!step.advanced);
        assert_eq!(step.session.errors.len(), 5);

        set(&app, &id, "firstName", "Anita").await;
        set(&app, &id, "lastName", "Desai").await;
        set(&app, &id, "email", "a@x.com").await;
        set(&app, &id, "phone", "+911234567890").await;
        set(&app, &id, "dateOfBirth", "1992-12-05").await;

        let step: StepRes = call_json(&app, "POST", &format!("/onboarding/{}/next", id), None).await;
        assert!(step.advanced);
        assert_eq!(step.session.step, WizardStep::Membership);

        set(&app, &id, "membershipType", "Individual").await;
        set(&app, &id, "branch", "Bangalore Main").await;

        let _: SessionRes = call_json(
            &app,
            "PUT",
            &format!("/onboarding/{}/nested", id),
            Some(json!({ "group": "nominee", "update": { "field": "name", "value": "Ravi Desai" } })),
        )
        .await;
        let tag: TagRes = call_json(
            &app,
            "POST",
            &format!("/onboarding/{}/tags", id),
            Some(json!({ "tag": " vip " })),
        )
        .await;
        assert!(tag.changed);
        assert!(tag.session.draft.tags.contains("vip"));

        // Submit before the final step is a client error.
        let (status, _) = call(&app, "POST", &format!("/onboarding/{}/submit", id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for _ in 0..4 {
            let _: StepRes = call_json(&app, "POST", &format!("/onboarding/{}/next", id), None).await;
        }

        let submitted: SubmitRes =
            call_json(&app, "POST", &format!("/onboarding/{}/submit", id), None).await;
        let subscriber_id = submitted.subscriber_id.expect("submit should store a record");
        assert_eq!(submitted.session.status, WizardStatus::Completed);

        let stored = directory.get(&subscriber_id).unwrap();
        assert_eq!(stored.details.nominee.name, "Ravi Desai");
        assert_eq!(stored.audit.created_by.as_str(), "Desk Agent");

        let listed: Vec<Value> = call_json(&app, "GET", "/subscribers?text=anita", None).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["subscriberId"], json!(subscriber_id.to_string()));

        let one: Value =
            call_json(&app, "GET", &format!("/subscribers/{}", subscriber_id), None).await;
        assert_eq!(one["branch"], json!("Bangalore Main"));

        // Closed session: transitions conflict.
        let (status, _) = call(&app, "POST", &format!("/onboarding/{}/next", id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn cancel_discards_draft() {
        let (app, directory) = app();
        let session: SessionRes = call_json(&app, "POST", "/onboarding", None).await;
        let id = session.session_id;
        set(&app, &id, "firstName", "Anita").await;

        let cancelled: SessionRes =
            call_json(&app, "DELETE", &format!("/onboarding/{}", id), None).await;

        assert_eq!(cancelled.status, WizardStatus::Cancelled);
        assert!(cancelled.draft.first_name.is_empty());
        assert!(directory.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_sessions_expire() {
        let (app, _) = app_with(|state| state.with_session_ttls(DEFAULT_IDLE_TTL, Duration::ZERO));
        let closed: SessionRes = call_json(&app, "POST", "/onboarding", None).await;
        let open: SessionRes = call_json(&app, "POST", "/onboarding", None).await;

        // The cancel response itself still carries the final status.
        let cancelled: SessionRes = call_json(
            &app,
            "DELETE",
            &format!("/onboarding/{}", closed.session_id),
            None,
        )
        .await;
        assert_eq!(cancelled.status, WizardStatus::Cancelled);

        let (status, _) = call(
            &app,
            "GET",
            &format!("/onboarding/{}", closed.session_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let still: SessionRes =
            call_json(&app, "GET", &format!("/onboarding/{}", open.session_id), None).await;
        assert_eq!(still.status, WizardStatus::Editing);
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let (app, _) = app_with(|state| state.with_session_ttls(Duration::ZERO, DEFAULT_CLOSED_TTL));
        let session: SessionRes = call_json(&app, "POST", "/onboarding", None).await;

        let (status, _) = call(
            &app,
            "POST",
            &format!("/onboarding/{}/next", session.session_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let (app, _) = app();

        let (status, _) = call(&app, "GET", "/onboarding/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            "GET",
            "/onboarding/0123456789abcdef0123456789abcdef",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, "GET", "/subscribers/SUB42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, "GET", "/subscribers/42", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stats_over_empty_store() {
        let (app, _) = app();
        let stats: Value = call_json(&app, "GET", "/subscribers/stats", None).await;
        assert_eq!(stats["total"], json!(0));
        assert_eq!(stats["averageCreditScore"], Value::Null);
    }
}
