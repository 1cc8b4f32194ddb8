//! HTTP API routes.

use super::schema::{HealthResponse, SentimentRequest, SentimentResponse, HEALTH_MESSAGE};
use super::SentimentService;
use crate::error::{Result, SentimentError};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Front-end development servers allowed to call the API cross-origin.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:5173"];

/// Build the application router.
pub fn build_router(service: SentimentService) -> Router {
    Router::new()
        // Health check
        .route("/", get(read_root))
        // Analysis; request text has no size limit
        .route(
            "/analyze-sentiment/",
            post(analyze_sentiment).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/analyze-sentiment",
            post(analyze_sentiment).layer(DefaultBodyLimit::disable()),
        )
        .with_state(service)
}

/// CORS policy: only the listed origins, any method and header, credentials
/// allowed. Methods and headers are mirrored because wildcards cannot be
/// combined with credentials.
pub fn cors_layer<S: AsRef<str>>(origins: &[S]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin.as_ref()).map_err(|e| {
                SentimentError::Config(format!("invalid CORS origin {:?}: {e}", origin.as_ref()))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// The full application: routes, CORS and request tracing.
pub fn app<S: AsRef<str>>(service: SentimentService, allowed_origins: &[S]) -> Result<Router> {
    Ok(build_router(service)
        .layer(cors_layer(allowed_origins)?)
        .layer(TraceLayer::new_for_http()))
}

// ============ Health Check ============

async fn read_root() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: HEALTH_MESSAGE.to_string(),
    })
}

// ============ Analysis ============

/// A request body refused before inference. Always answered with 422.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRequest(pub String);

impl IntoResponse for InvalidRequest {
    fn into_response(self) -> Response {
        tracing::debug!(reason = %self.0, "rejected analysis request");
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": self.0 })),
        )
            .into_response()
    }
}

/// `application/json` or any `application/*+json` subtype.
fn is_json_content_type(value: &HeaderValue) -> bool {
    let Ok(value) = value.to_str() else {
        return false;
    };
    let mime = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    match mime.split_once('/') {
        Some(("application", subtype)) => subtype == "json" || subtype.ends_with("+json"),
        _ => false,
    }
}

/// Decodes an analysis body. A missing `Content-Type` is read as JSON; an
/// explicit non-JSON one is refused. Every decode failure is a 422.
pub fn parse_request(
    content_type: Option<&HeaderValue>,
    body: &[u8],
) -> std::result::Result<SentimentRequest, InvalidRequest> {
    if let Some(value) = content_type {
        if !is_json_content_type(value) {
            return Err(InvalidRequest(format!(
                "expected a JSON body, got content type {value:?}"
            )));
        }
    }
    serde_json::from_slice(body).map_err(|e| InvalidRequest(format!("invalid request body: {e}")))
}

async fn analyze_sentiment(
    State(service): State<SentimentService>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Json<SentimentResponse>, InvalidRequest> {
    let payload = parse_request(headers.get(header::CONTENT_TYPE), &body)?;
    Ok(Json(service.analyze(payload.text).await.into_response()))
}
