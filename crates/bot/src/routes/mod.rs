//! HTTP route handlers for Slack webhooks.
//!
//! | Path | Body | Auth |
//! |------|------|------|
//! | `/` | Events API JSON | Slack signature |
//! | `/interactive` | form, `payload=<json>` | optional Slack signature |

pub mod events;
pub mod interactive;

use axum::{
    Json, Router,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tracing::warn;

use crate::error::AppError;
use crate::slack::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::state::AppState;

/// Create the webhook routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(events::handle_event).post(events::handle_event))
        .route(
            "/interactive",
            get(interactive::handle_interactive).post(interactive::handle_interactive),
        )
}

/// The acknowledgement body Slack gets for handled and ignored deliveries.
fn success() -> Response {
    Json(json!({ "success": true })).into_response()
}

/// Run a handler on its own task.
///
/// The task finishes even if Slack gives up on the request and the request
/// future is dropped.
async fn run_detached<F>(future: F) -> Result<F::Output, AppError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(future)
        .await
        .map_err(|e| AppError::Internal(format!("handler task failed: {e}")))
}

/// Check the Slack signature headers against the raw body.
fn verify_signature(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), AppError> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    state
        .verifier()
        .verify_request(header(TIMESTAMP_HEADER), header(SIGNATURE_HEADER), body)
        .map_err(|e| {
            warn!(error = %e, "Rejected unsigned Slack request");
            AppError::invalid_signature()
        })
}


#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::run_detached;
    use crate::error::AppError;

    #[tokio::test]
    async fn detached_handler_returns_its_output() {
        let output = run_detached(async { 7 }).await;

        assert!(matches!(output, Ok(7)));
    }

    #[tokio::test]
    async fn panicking_handler_becomes_internal_error() {
        let result = run_detached(async {
            panic!("handler bug");
        })
        .await;

        let Err(err) = result else {
            panic!("expected an error");
        };
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
