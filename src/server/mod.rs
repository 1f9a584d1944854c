//! HTTP surface
//!
//! JSON in, JSON out. Write routes go through the change pipeline and need
//! the API key; read routes go straight to the base branch.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod response;

use crate::auth::API_KEY_HEADER;
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::store::ContentStore;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use handlers::{documents, health, tenants};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

pub use error::ApiError;

/// Timeout for outbound fetches that do not go through the store
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Shared state of all handlers
#[derive(Clone)]
pub struct AppState {
    /// Document store
    pub store: Arc<dyn ContentStore>,
    /// Gateway configuration
    pub config: Arc<GatewayConfig>,
    /// Client for template fetches
    pub http: reqwest::Client,
}

impl AppState {
    /// State around a store and configuration
    pub fn new(store: Arc<dyn ContentStore>, config: GatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(concat!("oscal-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            store,
            config: Arc::new(config),
            http,
        })
    }
}

fn cors_layer(allow_origin: &str) -> Result<CorsLayer> {
    let origin = if allow_origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        let value = HeaderValue::from_str(allow_origin.trim())
            .map_err(|e| Error::Config(format!("invalid ALLOW_ORIGIN {allow_origin:?}: {e}")))?;
        AllowOrigin::exact(value)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .max_age(Duration::from_secs(600)))
}

#[allow(clippy::needless_pass_by_value)]
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = message, "handler panicked");
    ApiError::from(Error::Internal(message.to_string())).into_response()
}

async fn not_found() -> ApiError {
    Error::NotFound("no such route".to_string()).into()
}

/// Build the router with every route and middleware
pub fn build_router(state: AppState) -> Result<Router> {
    let cors = cors_layer(&state.config.allow_origin)?;

    let api = Router::new()
        .route("/healthz", get(health::health))
        .route("/templates/ssp", get(health::ssp_template_route))
        .route(
            "/tenants/:org",
            get(tenants::get_tenant)
                .put(tenants::update_tenant)
                .delete(tenants::delete_tenant),
        )
        .route("/tenants/:org/init", post(tenants::init_tenant))
        .route("/tenants/:org/save", put(tenants::save_draft))
        .route("/tenants/:org/merge", post(tenants::merge))
        .route("/tenants/:org/procedures", get(documents::list_procedures))
        .route(
            "/tenants/:org/procedures/:proc",
            get(documents::read_ssp).put(documents::write_ssp),
        )
        .route("/tenants/:org/profiles", get(documents::list_profiles))
        .route(
            "/tenants/:org/profiles/:id",
            get(documents::read_profile).put(documents::write_profile),
        )
        .route("/tenants/:org/ropa", get(documents::list_processes))
        .route(
            "/tenants/:org/ropa/:id",
            get(documents::read_process).put(documents::write_process),
        )
        .route("/ropa/:org", get(documents::read_ropa))
        .route(
            "/ssp/:org/:proc",
            get(documents::read_ssp).post(documents::write_ssp),
        );

    Ok(Router::new()
        .route("/healthz", get(health::health))
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
