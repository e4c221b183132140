use crate::errors::ServerError;
use crate::responses::ResultResp;
use astra::{Body, ResponseBuilder};
use serde::Serialize;

pub fn json_response<T: Serialize + ?Sized>(status: u16, value: &T) -> ResultResp {
    json_response_with_cookie(status, value, None)
}

pub fn json_response_with_cookie<T: Serialize + ?Sized>(
    status: u16,
    value: &T,
    set_cookie: Option<&str>,
) -> ResultResp {
    let body = serde_json::to_string(value).map_err(|e| {
        tracing::error!(error = %e, "response serialization failed");
        ServerError::InternalError
    })?;

    let mut builder = ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json");
    if let Some(cookie) = set_cookie {
        builder = builder.header("Set-Cookie", cookie);
    }
    builder
        .body(Body::from(body))
        .map_err(|_| ServerError::InternalError)
}
