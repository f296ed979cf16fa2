//! Tracking handlers: open pixel, click redirect, explicit ingestion.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ClickParams, OpenParams, RecordEventRequest, RecordEventResponse};
use crate::app_state::AppState;
use crate::domain::{CampaignId, EventType};
use crate::error::{ErrorResponse, TrackerError};

/// Transparent 1×1 PNG served by the open-tracking pixel.
pub const PIXEL_PNG: [u8; 70] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x64, 0x60, 0xf8, 0x5f,
    0x0f, 0x00, 0x02, 0x87, 0x01, 0x80, 0xeb, 0x47, 0xba, 0x92, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45,
    0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// `GET /track/open`: Record an open and serve the tracking pixel.
///
/// The pixel is returned whether or not the campaign exists, so the email
/// always renders.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidRequest`] if `campaignId` or `email` is
/// missing; no event is recorded in that case.
#[utoipa::path(
    get,
    path = "/api/v1/track/open",
    tag = "Tracking",
    summary = "Open-tracking pixel",
    description = "Records an `opened` event and returns a transparent 1x1 PNG with caching disabled.",
    params(OpenParams),
    responses(
        (status = 200, description = "Tracking pixel", content_type = "image/png"),
        (status = 400, description = "Missing campaignId or email", body = ErrorResponse),
    )
)]
pub async fn open_pixel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<OpenParams>,
) -> Result<impl IntoResponse, TrackerError> {
    let campaign_id = required(params.campaign_id, "campaignId")?;
    let email = required(params.email, "email")?;
    let campaign_id = CampaignId::parse(&campaign_id)?;

    let _ = state
        .tracking_service
        .track_open(campaign_id, email, client_ip(&headers))
        .await;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        PIXEL_PNG.as_slice(),
    ))
}

/// `GET /track/click`: Record a click and redirect to the destination.
///
/// Any missing parameter, or a destination that is not an absolute
/// `http`/`https` URL, redirects to the configured fallback without
/// recording anything.
#[utoipa::path(
    get,
    path = "/api/v1/track/click",
    tag = "Tracking",
    summary = "Click-tracking redirect",
    description = "Records a `clicked` event carrying the destination in `metadata.clickedUrl`, then redirects to it.",
    params(ClickParams),
    responses(
        (status = 307, description = "Redirect to the destination or the fallback location"),
    )
)]
pub async fn click_redirect(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ClickParams>,
) -> Redirect {
    let parsed = parse_click(params);

    match parsed {
        Ok((campaign_id, email, url)) => {
            let _ = state
                .tracking_service
                .track_click(campaign_id, email, &url, client_ip(&headers))
                .await;
            Redirect::temporary(&url)
        }
        Err(e) => {
            tracing::debug!(error = %e, "click not tracked; redirecting to fallback");
            Redirect::temporary(&state.click_fallback_url)
        }
    }
}

/// `POST /track/events`: Record an explicit event.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidRequest`] on malformed JSON or a missing
/// required field, and [`TrackerError::InvalidEventType`] on an unknown
/// `eventType`.
#[utoipa::path(
    post,
    path = "/api/v1/track/events",
    tag = "Tracking",
    summary = "Record an email event",
    description = "Appends an event to the campaign log. The campaign does not have to exist yet. `timestamp` defaults to the current time.",
    request_body = RecordEventRequest,
    responses(
        (status = 200, description = "Event recorded", body = RecordEventResponse),
        (status = 400, description = "Missing field or invalid event type", body = ErrorResponse),
    )
)]
pub async fn record_event(
    State(state): State<AppState>,
    payload: Result<Json<RecordEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, TrackerError> {
    let Json(req) = payload.map_err(|e| TrackerError::InvalidRequest(e.body_text()))?;

    let campaign_id = CampaignId::parse(&required(req.campaign_id, "campaignId")?)?;
    let event_type: EventType = required(req.event_type, "eventType")?.parse()?;
    let email = required(req.email, "email")?;

    let event = state
        .tracking_service
        .record_event(
            campaign_id,
            event_type,
            email,
            req.timestamp,
            req.metadata.unwrap_or_default(),
        )
        .await;

    Ok(Json(RecordEventResponse {
        success: true,
        event_id: event.id,
    }))
}

/// Tracking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/track/open", get(open_pixel))
        .route("/track/click", get(click_redirect))
        .route("/track/events", post(record_event))
}

/// Validates click parameters, returning `(campaign, email, destination)`.
fn parse_click(params: ClickParams) -> Result<(CampaignId, String, String), TrackerError> {
    let campaign_id = CampaignId::parse(&required(params.campaign_id, "campaignId")?)?;
    let email = required(params.email, "email")?;
    let url = required(params.url, "url")?;
    if !is_redirectable(&url) {
        return Err(TrackerError::InvalidRequest(format!("unsupported url: {url}")));
    }
    Ok((campaign_id, email, url))
}

/// Unwraps a required string field, treating blank values as missing.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, TrackerError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(TrackerError::missing(field)),
    }
}

/// First hop of `X-Forwarded-For`, if present.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Only absolute `http`/`https` destinations that are also valid
/// `Location` header values are followed. `Url::parse` silently drops or
/// escapes control characters, so the raw string is checked separately.
fn is_redirectable(raw: &str) -> bool {
    HeaderValue::from_str(raw).is_ok()
        && url::Url::parse(raw)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use tower::ServiceExt;

    use super::*;
    use crate::config::TrackerConfig;

    const PIXEL_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn setup() -> (AppState, Router) {
        let state = crate::build_state(&TrackerConfig::default());
        let app = crate::app(state.clone());
        (state, app)
    }

    fn cid(raw: &str) -> CampaignId {
        let Ok(id) = CampaignId::parse(raw) else {
            panic!("valid id");
        };
        id
    }

    async fn send(app: Router, request: Request<Body>) -> axum::response::Response {
        let Ok(response) = app.oneshot(request).await else {
            panic!("router is infallible");
        };
        response
    }

    fn get(uri: &str) -> Request<Body> {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("valid request");
        };
        request
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        let Ok(request) = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
        else {
            panic!("valid request");
        };
        request
    }

    #[tokio::test]
    async fn pixel_serves_fixed_png_for_unknown_campaign() {
        let (state, app) = setup();
        let response = send(app, get("/api/v1/track/open?campaignId=c1&email=a%40b.com")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("image/png")
        );
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some("no-cache, no-store, must-revalidate")
        );

        let Ok(body) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("readable body");
        };
        let Ok(expected) = STANDARD.decode(PIXEL_BASE64) else {
            panic!("valid base64");
        };
        assert_eq!(body.as_ref(), expected.as_slice());
        assert_eq!(PIXEL_PNG.as_slice(), expected.as_slice());

        let events = state.tracking_service.store().events(&cid("c1")).await;
        assert_eq!(events.len(), 1);
        assert!(events.iter().all(|e| e.event_type == EventType::Opened));
        assert!(events.iter().all(|e| e.user_agent() == Some("Email Client")));
    }

    #[tokio::test]
    async fn pixel_without_email_is_rejected() {
        let (state, app) = setup();
        let response = send(app, get("/api/v1/track/open?campaignId=c1")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.tracking_service.store().event_count(&cid("c1")).await, 0);
    }

    #[tokio::test]
    async fn click_records_and_redirects() {
        let (state, app) = setup();
        let response = send(
            app,
            get("/api/v1/track/click?campaignId=c1&email=a%40b.com&url=https%3A%2F%2Fx.com"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some("https://x.com")
        );

        let events = state.tracking_service.store().events(&cid("c1")).await;
        assert_eq!(events.len(), 1);
        assert!(events.iter().all(|e| e.event_type == EventType::Clicked));
        assert!(events.iter().all(|e| e.clicked_url() == Some("https://x.com")));
    }

    #[tokio::test]
    async fn click_with_missing_url_falls_back() {
        let (state, app) = setup();
        let response = send(app, get("/api/v1/track/click?campaignId=c1&email=a%40b.com")).await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some("/")
        );
        assert_eq!(state.tracking_service.store().event_count(&cid("c1")).await, 0);
    }

    #[tokio::test]
    async fn click_with_control_characters_falls_back() {
        for url in ["https%3A%2F%2Fx.com%2Fa%0Ab", "https%3A%2F%2Fx.com%2Fa%01b"] {
            let (state, app) = setup();
            let uri = format!("/api/v1/track/click?campaignId=c1&email=a%40b.com&url={url}");
            let response = send(app, get(&uri)).await;

            assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
            assert_eq!(
                response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
                Some("/")
            );
            assert_eq!(state.tracking_service.store().event_count(&cid("c1")).await, 0);
        }
    }

    #[tokio::test]
    async fn click_with_missing_campaign_falls_back() {
        let (state, app) = setup();
        let response = send(
            app,
            get("/api/v1/track/click?email=a%40b.com&url=https%3A%2F%2Fx.com"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some("/")
        );
        assert!(state.tracking_service.store().events(&cid("c1")).await.is_empty());
    }

    #[tokio::test]
    async fn pixel_without_campaign_is_rejected() {
        let (state, app) = setup();
        let response = send(app, get("/api/v1/track/open?email=a%40b.com")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.tracking_service.list_campaigns().await.is_empty());
        assert_eq!(state.tracking_service.store().orphan_log_count().await, 0);
    }

    #[tokio::test]
    async fn pixel_with_blank_campaign_is_rejected() {
        let (state, app) = setup();
        let response = send(app, get("/api/v1/track/open?campaignId=%20%20&email=a%40b.com")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.tracking_service.store().orphan_log_count().await, 0);
    }

    #[tokio::test]
    async fn explicit_event_is_recorded() {
        let (state, app) = setup();
        let response = send(
            app,
            post_json(
                "/api/v1/track/events",
                r#"{"campaignId":"c1","eventType":"delivered","email":"a@b.com","metadata":{"ip":"10.0.0.1"}}"#,
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let Ok(body) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("readable body");
        };
        let Ok(json) = serde_json::from_slice::<serde_json::Value>(&body) else {
            panic!("json body");
        };
        assert_eq!(json.get("success"), Some(&serde_json::Value::Bool(true)));

        let events = state.tracking_service.store().events(&cid("c1")).await;
        assert_eq!(events.len(), 1);
        assert!(
            events
                .iter()
                .all(|e| Some(e.id.as_str()) == json.get("eventId").and_then(|v| v.as_str()))
        );
    }

    #[tokio::test]
    async fn explicit_event_missing_email_is_rejected() {
        let (state, app) = setup();
        let response = send(
            app,
            post_json(
                "/api/v1/track/events",
                r#"{"campaignId":"c1","eventType":"sent"}"#,
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let Ok(body) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("readable body");
        };
        let Ok(json) = serde_json::from_slice::<serde_json::Value>(&body) else {
            panic!("json body");
        };
        assert_eq!(json.get("success"), Some(&serde_json::Value::Bool(false)));
        assert_eq!(
            json.pointer("/error/code").and_then(|v| v.as_u64()),
            Some(1001)
        );
        assert_eq!(state.tracking_service.store().event_count(&cid("c1")).await, 0);
    }

    #[tokio::test]
    async fn explicit_event_with_unknown_type_is_rejected() {
        let (_state, app) = setup();
        let response = send(
            app,
            post_json(
                "/api/v1/track/events",
                r#"{"campaignId":"c1","eventType":"forwarded","email":"a@b.com"}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn required_rejects_blank() {
        assert!(required(None, "email").is_err());
        assert!(required(Some("  ".to_string()), "email").is_err());
        assert!(matches!(required(Some("a@b.com".to_string()), "email"), Ok(v) if v == "a@b.com"));
    }

    #[test]
    fn redirectable_urls() {
        assert!(is_redirectable("https://x.com"));
        assert!(is_redirectable("http://listing.example/home?id=4"));
        assert!(!is_redirectable("javascript:alert(1)"));
        assert!(!is_redirectable("/relative/path"));
        assert!(!is_redirectable("https://x.com/a\nb"));
        assert!(!is_redirectable("https://x.com/a\u{1}b"));
    }

    #[test]
    fn client_ip_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
        assert!(client_ip(&HeaderMap::new()).is_none());
    }
}
