//! Events API endpoint.
//!
//! Every request must carry a valid Slack signature. Once verified, every
//! well-formed delivery is acknowledged with `{"success": true}`, whatever
//! its handler did; Slack only needs to know it arrived.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use super::{run_detached, success, verify_signature};
use crate::error::AppError;
use crate::slack::InboundEvent;
use crate::state::AppState;

/// Handle an Events API delivery.
#[instrument(skip_all)]
pub async fn handle_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    verify_signature(&state, &headers, &body)?;

    let event = InboundEvent::parse(&body).map_err(|e| {
        warn!(error = %e, "Malformed event payload");
        AppError::BadRequest(e.to_string())
    })?;

    match event {
        InboundEvent::UrlVerification { challenge } => {
            info!("Answering URL verification challenge");
            Ok(Json(json!({ "challenge": challenge })).into_response())
        }
        InboundEvent::InteractiveMessage(payload) => {
            let cleanup = state.cleanup().clone();
            let result =
                run_detached(async move { cleanup.handle_button_submit(&payload).await }).await?;
            if let Err(e) = result {
                warn!(error = %e, "Rejected interactive message");
            }
            Ok(success())
        }
        InboundEvent::AppMention { event_id, event } => {
            let cleanup = state.cleanup().clone();
            let id = event_id.clone();
            let result =
                run_detached(async move { cleanup.handle_mention(&id, &event).await }).await?;
            match result {
                Ok(outcome) => debug!(event_id = %event_id, ?outcome, "Mention handled"),
                Err(e) => error!(event_id = %event_id, error = %e, "Mention handler failed"),
            }
            Ok(success())
        }
        InboundEvent::Ignored { kind } => {
            debug!(kind = %kind, "Ignoring event");
            Ok(success())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use cleanup_reminder_core::ClusterKey;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::routes::test_support::{harness, read_body, signed, unsigned};

    const JSON: &str = "application/json";

    fn mention(event_id: &str) -> String {
        json!({
            "type": "event_callback",
            "event_id": event_id,
            "event": {
                "type": "app_mention",
                "channel": "C123",
                "user": "U1",
                "text": "<@UBOT> clusters?",
                "ts": "1699999999.000001"
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn url_verification_echoes_challenge() {
        let h = harness(false);
        let body = json!({"type": "url_verification", "challenge": "abc123"}).to_string();

        let response = h.app.oneshot(signed("/", JSON, &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&read_body(response).await).unwrap();
        assert_eq!(body, json!({"challenge": "abc123"}));
    }

    #[tokio::test]
    async fn url_verification_without_challenge_is_bad_request() {
        let h = harness(false);
        let body = json!({"type": "url_verification"}).to_string();

        let response = h.app.oneshot(signed("/", JSON, &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unsigned_request_is_rejected_without_side_effects() {
        let h = harness(false);

        let response = h
            .app
            .oneshot(unsigned("/", JSON, &mention("Ev1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = serde_json::from_str(&read_body(response).await).unwrap();
        assert_eq!(body, json!({"error": "invalid request signature"}));
        assert!(h.chat.posted.lock().unwrap().is_empty());
        assert_eq!(*h.clusters.list_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn tampered_body_is_rejected() {
        let h = harness(false);
        let mut request = signed("/", JSON, &mention("Ev1"));
        *request.body_mut() = axum::body::Body::from(mention("Ev2"));

        let response = h.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn mention_posts_once_per_event_id() {
        let h = harness(false);

        for _ in 0..2 {
            let response = h
                .app
                .clone()
                .oneshot(signed("/", JSON, &mention("Ev1")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(read_body(response).await, r#"{"success":true}"#);
        }

        let posted = h.chat.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].channel, "C123");
    }

    #[tokio::test]
    async fn mention_completes_after_slack_stops_waiting() {
        let h = harness(false);
        *h.clusters.list_delay.lock().unwrap() = Some(Duration::from_millis(200));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            h.app.clone().oneshot(signed("/", JSON, &mention("Ev1"))),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(h.chat.posted.lock().unwrap().len(), 1);

        *h.clusters.list_delay.lock().unwrap() = None;
        let redelivery = h
            .app
            .oneshot(signed("/", JSON, &mention("Ev1")))
            .await
            .unwrap();
        assert_eq!(redelivery.status(), StatusCode::OK);
        assert_eq!(h.chat.posted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mention_failure_is_still_acknowledged() {
        let h = harness(false);
        *h.chat.fail_post.lock().unwrap() = true;

        let response = h
            .app
            .oneshot(signed("/", JSON, &mention("Ev1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn other_events_are_acknowledged_and_ignored() {
        let h = harness(false);
        let bodies = [
            json!({"type": "event_callback", "event_id": "Ev9", "event": {"type": "message", "channel": "C1"}}),
            json!({"type": "app_rate_limited"}),
        ];

        for body in bodies {
            let response = h
                .app
                .clone()
                .oneshot(signed("/", JSON, &body.to_string()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert!(h.chat.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_json_body_is_bad_request() {
        let h = harness(false);

        let response = h.app.oneshot(signed("/", JSON, "not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn interactive_message_is_always_acknowledged() {
        let h = harness(false);
        let rejected = json!({
            "type": "interactive_message",
            "callback_id": "something_else",
            "actions": [{"name": "a", "value": "loc1/a", "type": "button"}],
            "channel": {"id": "C123"},
            "original_message": {"ts": "1700000000.000100"}
        })
        .to_string();

        let response = h.app.oneshot(signed("/", JSON, &rejected)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_body(response).await, r#"{"success":true}"#);
        assert!(h.clusters.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn interactive_message_deletes_cluster() {
        let h = harness(false);
        let click = json!({
            "type": "interactive_message",
            "callback_id": "delete_cluster",
            "actions": [{"name": "a", "value": "loc1/a", "type": "button"}],
            "channel": {"id": "C123"},
            "original_message": {"ts": "1700000000.000100"}
        })
        .to_string();

        let response = h.app.oneshot(signed("/", JSON, &click)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            h.clusters.deleted.lock().unwrap()[0].1,
            ClusterKey::new("loc1", "a")
        );
        assert_eq!(h.chat.updated.lock().unwrap().len(), 1);
    }
}
