//! Webhook ingress. One route, three header/signature gates, and a hard rule:
//! the response to a modal submission goes out immediately while the publish
//! work runs on a detached task.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use postbridge_discord::gateway::{Gateway, GatewayError, GatewayOutcome};
use tracing::warn;

use crate::pipeline::SubmissionPipeline;

const SIGNATURE_HEADER: &str = "x-signature-ed25519";
const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub pipeline: Arc<SubmissionPipeline>,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/interactions", post(interactions)).with_state(state)
}

async fn interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some((signature, timestamp)) = signature_headers(&headers) else {
        warn!(event_name = "ingress.http.missing_headers", "signature headers absent");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    match state.gateway.handle(&body, signature, timestamp) {
        Ok(GatewayOutcome::Reply(response)) => Json(response).into_response(),
        Ok(GatewayOutcome::Deferred { response, job }) => {
            let pipeline = state.pipeline.clone();
            tokio::spawn(async move { pipeline.run(job).await });
            Json(response).into_response()
        }
        Err(GatewayError::Signature(error)) => {
            warn!(
                event_name = "ingress.http.signature_rejected",
                error = %error,
                "request signature rejected"
            );
            StatusCode::UNAUTHORIZED.into_response()
        }
        Err(GatewayError::Decode(error)) => {
            warn!(
                event_name = "ingress.http.decode_rejected",
                error = %error,
                "request body rejected"
            );
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

fn signature_headers(headers: &HeaderMap) -> Option<(&str, &str)> {
    let signature = headers.get(SIGNATURE_HEADER)?.to_str().ok()?;
    let timestamp = headers.get(TIMESTAMP_HEADER)?.to_str().ok()?;
    Some((signature, timestamp))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use ed25519_dalek::{Signer, SigningKey};
    use postbridge_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use tower::util::ServiceExt;

    use super::*;
    use crate::bootstrap::bootstrap_with_config;

    const TIMESTAMP: &str = "1700000000";

    struct Harness {
        signing: SigningKey,
        router: Router,
    }

    impl Harness {
        async fn new() -> Self {
            let signing = SigningKey::from_bytes(&[42u8; 32]);
            let config = AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    discord_public_key: Some(hex::encode(signing.verifying_key().to_bytes())),
                    discord_application_id: Some("app-1".to_string()),
                    discord_authorized_user_id: Some("U100".to_string()),
                    github_token: Some("ghp_test".to_string()),
                    github_repo: Some("octocat/site".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .expect("valid config");

            let app = bootstrap_with_config(config).await.expect("bootstrap");
            let router = router(AppState { gateway: app.gateway, pipeline: app.pipeline });
            Self { signing, router }
        }

        fn signed_request(&self, body: &str) -> Request<Body> {
            let mut message = TIMESTAMP.as_bytes().to_vec();
            message.extend_from_slice(body.as_bytes());
            let signature = hex::encode(self.signing.sign(&message).to_bytes());

            Request::post("/interactions")
                .header(SIGNATURE_HEADER, signature)
                .header(TIMESTAMP_HEADER, TIMESTAMP)
                .header("content-type", "application/json")
                .body(Body::from(body.to_owned()))
                .expect("request")
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn ping_is_answered_with_pong() {
        let harness = Harness::new().await;
        let request = harness
            .signed_request(r#"{"type":1,"id":"i1","token":"t","application_id":"app-1"}"#);

        let response = harness.router.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["type"], 1);
    }

    #[tokio::test]
    async fn missing_signature_headers_are_unauthorized() {
        let harness = Harness::new().await;
        let request = Request::post("/interactions")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"type":1,"id":"i1","token":"t","application_id":"app-1"}"#))
            .expect("request");

        let response = harness.router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forged_signature_is_unauthorized() {
        let harness = Harness::new().await;
        let request = Request::post("/interactions")
            .header(SIGNATURE_HEADER, hex::encode([0u8; 64]))
            .header(TIMESTAMP_HEADER, TIMESTAMP)
            .header("content-type", "application/json")
            .body(Body::from(r#"{"type":1,"id":"i1","token":"t","application_id":"app-1"}"#))
            .expect("request");

        let response = harness.router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn validly_signed_garbage_is_a_bad_request() {
        let harness = Harness::new().await;
        let request = harness.signed_request("{not json");

        let response = harness.router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn authorized_command_opens_a_modal() {
        let harness = Harness::new().await;
        let request = harness.signed_request(
            r#"{"type":2,"id":"i1","token":"t","application_id":"app-1",
                "member":{"user":{"id":"U100"}},
                "data":{"name":"post","options":[{"name":"kind","value":"note"}]}}"#,
        );

        let response = harness.router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["type"], 9);
        assert_eq!(payload["data"]["custom_id"], "post:note");
    }
}
