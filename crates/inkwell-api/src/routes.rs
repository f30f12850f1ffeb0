//! Router assembly and shared state.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use inkwell_core::Storage;

use crate::config::DEFAULT_MAX_BODY_BYTES;
use crate::handlers::{accounts, health_check, notes, templates};
use crate::services::{AccountService, NoteService, TemplateService};

/// Generates UUIDv7 request IDs for `x-request-id`.
#[derive(Clone, Copy)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState<S> {
    pub notes: NoteService<S>,
    pub templates: TemplateService<S>,
    pub accounts: AccountService<S>,
}

impl<S: Storage + Clone> AppState<S> {
    pub fn new(storage: S) -> Self {
        Self {
            notes: NoteService::new(storage.clone()),
            templates: TemplateService::new(storage.clone()),
            accounts: AccountService::new(storage),
        }
    }
}

/// Layers applied around the API routes.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub allowed_origins: Vec<HeaderValue>,
    pub max_body_bytes: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            allowed_origins: vec![HeaderValue::from_static(
                crate::config::DEFAULT_ALLOWED_ORIGINS,
            )],
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Build the application router.
pub fn router<S: Storage + Clone + 'static>(state: AppState<S>, options: RouterOptions) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Notes
        .route(
            "/api/notes",
            get(notes::list_notes::<S>).post(notes::create_note::<S>),
        )
        .route(
            "/api/notes/:id",
            get(notes::get_note::<S>)
                .put(notes::update_note::<S>)
                .delete(notes::delete_note::<S>),
        )
        .route("/api/notes/:id/publish", post(notes::publish_note::<S>))
        .route("/api/notes/:id/unpublish", post(notes::unpublish_note::<S>))
        // Templates
        .route(
            "/api/templates",
            get(templates::list_templates::<S>).post(templates::create_template::<S>),
        )
        .route(
            "/api/templates/:id",
            get(templates::get_template::<S>)
                .put(templates::update_template::<S>)
                .delete(templates::delete_template::<S>),
        )
        // Accounts
        .route("/api/accounts/auth", post(accounts::sign_in::<S>))
        .route("/api/accounts/:id", get(accounts::get_account::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(options.allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(options.max_body_bytes))
        .with_state(state)
}
