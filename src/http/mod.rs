mod routes;
mod types;

use crate::config::HTTPConfig;
use crate::http::routes::*;
use crate::http::types::HttpError;
use crate::line::dispatch::EventDispatcher;
use crate::line::signature::SignatureVerifier;
use crate::TracingReloadHandle;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

#[derive(Clone)]
pub struct HttpState {
    pub dispatcher: EventDispatcher,
    pub verifier: SignatureVerifier,
    pub tracing_reload: TracingReloadHandle,
}

async fn auth_middleware(
    axum::extract::State(expected_token): axum::extract::State<String>,
    headers: axum::http::HeaderMap,
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<axum::response::Response, HttpError> {
    let auth_header = headers.get("authorization").ok_or(HttpError {
        status: StatusCode::UNAUTHORIZED,
        message: "Missing authorization header".to_string(),
    })?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| HttpError::bad_request("Invalid authorization header"))?;

    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();
    if token != expected_token {
        return Err(HttpError {
            status: StatusCode::UNAUTHORIZED,
            message: "Invalid token".to_string(),
        });
    }

    Ok(next.run(request).await)
}

pub fn create_app(
    config: &HTTPConfig,
    dispatcher: EventDispatcher,
    verifier: SignatureVerifier,
    tracing_reload: TracingReloadHandle,
) -> axum::Router {
    let mut router = axum::Router::new()
        .route(&config.callback_path, post(line_callback))
        .route("/sys/version", get(sys_version));

    // Runtime log level changes are only exposed behind the admin token.
    match &config.admin_token {
        Some(token) => {
            debug!("Adding authenticated /sys/set-log-level route!");
            let admin = axum::Router::new()
                .route("/sys/set-log-level", post(sys_set_log_level))
                .route_layer(axum::middleware::from_fn_with_state(
                    token.clone(),
                    auth_middleware,
                ));
            router = router.merge(admin);
        }
        None => debug!("No admin token configured, /sys/set-log-level is disabled"),
    }

    let router = router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static("x-version"),
                HeaderValue::from_static(crate::VERSION),
            )),
    );

    let state = HttpState {
        dispatcher,
        verifier,
        tracing_reload,
    };
    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::dispatch::tests::{text_event, RecordingReplier};
    use crate::reply::types::OutboundMessage;
    use crate::reply::{FallbackPolicy, ReplySelector};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use tracing_subscriber::{reload, EnvFilter, Registry};

    const SECRET: &str = "test-channel-secret";

    struct Harness {
        app: axum::Router,
        replier: Arc<RecordingReplier>,
        verifier: SignatureVerifier,
        _filter_layer: reload::Layer<EnvFilter, Registry>,
    }

    fn harness(admin_token: Option<&str>) -> Harness {
        let config = HTTPConfig {
            admin_token: admin_token.map(str::to_string),
            ..HTTPConfig::default()
        };
        let replier = Arc::new(RecordingReplier::default());
        let dispatcher = EventDispatcher::new(
            ReplySelector::new(FallbackPolicy::Static),
            replier.clone(),
        );
        let verifier = SignatureVerifier::new(SECRET).unwrap();
        let (filter_layer, reload_handle) =
            reload::Layer::<EnvFilter, Registry>::new(EnvFilter::new("info"));

        Harness {
            app: create_app(&config, dispatcher, verifier.clone(), reload_handle),
            replier,
            verifier,
            _filter_layer: filter_layer,
        }
    }

    fn callback_request(body: &str, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/callback")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header("x-line-signature", signature);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_signed_callback_replies() {
        let harness = harness(None);
        let body = json!({
            "destination": "U0000",
            "events": [text_event("token-1", "carousel")]
        })
        .to_string();
        let signature = harness.verifier.sign(body.as_bytes());

        let (status, json) = send(&harness.app, callback_request(&body, Some(&signature))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({ "success": true, "response": { "received": 1, "replied": 1 } })
        );

        let sent = harness.replier.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "token-1");
        assert!(matches!(sent[0].1, OutboundMessage::Carousel { .. }));
    }

    #[tokio::test]
    async fn test_invalid_signature_never_replies() {
        let harness = harness(None);
        let body = json!({ "events": [text_event("token-1", "hello")] }).to_string();
        let other_signature = SignatureVerifier::new("wrong-secret")
            .unwrap()
            .sign(body.as_bytes());

        for signature in [None, Some("%%%"), Some(other_signature.as_str())] {
            let (status, json) = send(&harness.app, callback_request(&body, signature)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "signature {signature:?}");
            assert_eq!(json["success"], json!(false));
        }

        assert!(harness.replier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_verification_ping_and_bad_body() {
        let harness = harness(None);

        let body = r#"{"destination":"U0000","events":[]}"#;
        let signature = harness.verifier.sign(body.as_bytes());
        let (status, json) = send(&harness.app, callback_request(body, Some(&signature))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], json!({ "received": 0, "replied": 0 }));

        let body = r#"{"destination":"U0000"}"#;
        let signature = harness.verifier.sign(body.as_bytes());
        let (status, _) = send(&harness.app, callback_request(body, Some(&signature))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(harness.replier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_version_route() {
        let harness = harness(None);
        let request = Request::get("/sys/version").body(Body::empty()).unwrap();
        let response = harness.app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-version").unwrap(),
            crate::VERSION
        );
    }

    #[tokio::test]
    async fn test_set_log_level_requires_admin_token() {
        let request = || {
            Request::post("/sys/set-log-level")
                .header("content-type", "application/json")
                .header("authorization", "Bearer admin-secret")
                .body(Body::from(r#"{"level":"debug"}"#))
                .unwrap()
        };

        // Not mounted at all without a configured token.
        let disabled = harness(None);
        let response = disabled.app.clone().oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let enabled = harness(Some("admin-secret"));
        let (status, json) = send(&enabled.app, request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], json!(true));

        let unauthenticated = Request::post("/sys/set-log-level")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"level":"debug"}"#))
            .unwrap();
        let (status, _) = send(&enabled.app, unauthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let wrong_token = Request::post("/sys/set-log-level")
            .header("content-type", "application/json")
            .header("authorization", "Bearer nope")
            .body(Body::from(r#"{"level":"debug"}"#))
            .unwrap();
        let (status, _) = send(&enabled.app, wrong_token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
