//! Interactive message endpoint.
//!
//! Slack posts button clicks here as a form with a single `payload` field.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument, warn};

use super::{run_detached, success, verify_signature};
use crate::error::AppError;
use crate::slack::InboundEvent;
use crate::state::AppState;

/// Handle a button click.
///
/// Returns an empty 200 once the click was handled, or 400 if the payload
/// is not a usable delete-cluster click.
#[instrument(skip_all)]
pub async fn handle_interactive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    if state.verify_interactive() {
        verify_signature(&state, &headers, &body)?;
    }

    let event = InboundEvent::parse_interactive_form(&body).map_err(|e| {
        warn!(error = %e, "Malformed interactive payload");
        AppError::BadRequest(e.to_string())
    })?;

    match event {
        InboundEvent::InteractiveMessage(payload) => {
            let cleanup = state.cleanup().clone();
            run_detached(async move { cleanup.handle_button_submit(&payload).await }).await??;
            Ok(StatusCode::OK.into_response())
        }
        other => {
            debug!(event = ?other, "Ignoring interactive payload");
            Ok(success())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use cleanup_reminder_core::ClusterKey;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::routes::test_support::{harness, read_body, signed, unsigned};

    const FORM: &str = "application/x-www-form-urlencoded";

    fn form(payload: &serde_json::Value) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("payload", &payload.to_string())
            .finish()
    }

    fn click(callback_id: &str, value: &str) -> String {
        form(&json!({
            "type": "interactive_message",
            "callback_id": callback_id,
            "actions": [{"name": "a", "value": value, "type": "button"}],
            "channel": {"id": "C123", "name": "ops"},
            "original_message": {"ts": "1700000000.000100"},
            "user": {"id": "U1", "name": "operator"}
        }))
    }

    #[tokio::test]
    async fn click_deletes_cluster_and_returns_empty_ok() {
        let h = harness(false);

        let response = h
            .app
            .oneshot(unsigned("/interactive", FORM, &click("delete_cluster", "loc1/a")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_body(response).await, "");
        assert_eq!(
            h.clusters.deleted.lock().unwrap()[0].1,
            ClusterKey::new("loc1", "a")
        );

        let updated = h.chat.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].channel, "C123");
        assert_eq!(updated[0].ts.as_deref(), Some("1700000000.000100"));
    }

    #[tokio::test]
    async fn unknown_callback_is_bad_request() {
        let h = harness(false);

        let response = h
            .app
            .oneshot(unsigned("/interactive", FORM, &click("approve", "loc1/a")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(h.clusters.deleted.lock().unwrap().is_empty());
        assert!(h.chat.updated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_payload_field_is_bad_request() {
        let h = harness(false);

        let response = h
            .app
            .oneshot(unsigned("/interactive", FORM, "foo=bar"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn other_payload_types_are_acknowledged() {
        let h = harness(false);
        let body = form(&json!({"type": "block_actions", "actions": []}));

        let response = h
            .app
            .oneshot(unsigned("/interactive", FORM, &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_body(response).await, r#"{"success":true}"#);
    }

    #[tokio::test]
    async fn signature_required_when_enabled() {
        let h = harness(true);

        let response = h
            .app
            .clone()
            .oneshot(unsigned("/interactive", FORM, &click("delete_cluster", "loc1/a")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(h.clusters.deleted.lock().unwrap().is_empty());

        let response = h
            .app
            .oneshot(signed("/interactive", FORM, &click("delete_cluster", "loc1/a")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.clusters.deleted.lock().unwrap().len(), 1);
    }
}
