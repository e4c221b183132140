use crate::errors::ServerError;
use crate::templates::components::error_panel;
use crate::templates::desktop_layout;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

pub type ResultResp = Result<Response, ServerError>;

/// Public message for an error. Storage details stay in the log.
fn public_message(err: &ServerError) -> String {
    match err {
        ServerError::NotFound => "Not Found".into(),
        ServerError::BadRequest(msg) | ServerError::Unauthorized(msg) => msg.clone(),
        ServerError::DbError(_) | ServerError::InternalError => "Internal Server Error".into(),
    }
}

fn log_error(err: &ServerError) {
    match err.status() {
        500 => tracing::error!(error = %err, "request failed"),
        _ => tracing::debug!(error = %err, "request rejected"),
    }
}

/// Convert a ServerError into an HTML error page
pub fn error_to_response(err: ServerError) -> Response {
    log_error(&err);
    let status = err.status();
    let page = desktop_layout(
        &format!("Error {status}"),
        false,
        error_panel(&format!("Error {status}"), &public_message(&err)),
    );

    build(status, "text/html; charset=utf-8", page.into_string())
}

/// Same as `error_to_response` for API callers: `{success: false, error}`.
pub fn json_error_response(err: ServerError) -> Response {
    log_error(&err);
    let body = json!({ "success": false, "error": public_message(&err) }).to_string();
    build(err.status(), "application/json", body)
}

fn build(status: u16, content_type: &str, body: String) -> Response {
    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", content_type)
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
