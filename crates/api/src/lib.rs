mod config;

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use sift_observability::AppMetrics;
use sift_strategy::SiftStack;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use config::ServiceConfig;

const SERVICE_NAME: &str = "sift";
const MAX_BODY_BYTES: usize = 64 * 1024;
const EXTRACTION_SOURCE_HEADER: &str = "x-extraction-source";

#[derive(Clone)]
pub struct ApiState {
    pub stack: SiftStack,
    pub metrics: Arc<AppMetrics>,
    pub allow_empty_text: bool,
    pub allowed_origins: Arc<Vec<String>>,
}

impl ApiState {
    pub fn new(stack: SiftStack, config: &ServiceConfig) -> Self {
        Self {
            stack,
            metrics: AppMetrics::shared(),
            allow_empty_text: config.allow_empty_text,
            allowed_origins: Arc::new(config.allowed_origins.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    openai_enabled: bool,
    strategy: &'static str,
    timestamp_utc: String,
    metrics: sift_observability::MetricsSnapshot,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

pub fn build_app(config: &ServiceConfig) -> Result<Router> {
    let stack = SiftStack::load(&config.delegate)?;
    Ok(build_router(ApiState::new(stack, config)))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/classify", post(classify))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        // Outermost last: the id must be set before it can be propagated.
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "message": "Text Classification API is running",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "classify": "/classify",
                "health": "/health"
            }
        })),
    )
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        openai_enabled: state.stack.delegate_enabled,
        strategy: state.stack.strategy.name(),
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn classify(
    State(state): State<ApiState>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    state.metrics.inc_request();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            state.metrics.inc_rejected();
            return validation_error(rejection.status(), rejection.body_text());
        }
    };

    if request.text.is_empty() && !state.allow_empty_text {
        state.metrics.inc_rejected();
        return validation_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "text must not be empty".to_string(),
        );
    }

    let extraction = state.stack.strategy.extract(&request.text).await;
    state.metrics.record_source(extraction.source);
    state.metrics.observe_latency(started.elapsed());
    info!(
        source = extraction.source.as_str(),
        found = extraction.result.found_fields(),
        "classified text"
    );

    let mut response = (StatusCode::OK, Json(extraction.result)).into_response();
    response.headers_mut().insert(
        HeaderName::from_static(EXTRACTION_SOURCE_HEADER),
        HeaderValue::from_static(extraction.source.as_str()),
    );
    response
}

fn validation_error(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ErrorBody {
            error: "validation_error",
            message,
        }),
    )
        .into_response()
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "internal_error",
            message: "Classification failed".to_string(),
        }),
    )
        .into_response()
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        layer.allow_origin(AnyOrigin)
    } else {
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}
