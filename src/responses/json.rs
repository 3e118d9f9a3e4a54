// responses/json.rs
use crate::errors::{ResultResp, ServerError};
use astra::{Body, ResponseBuilder};
use serde::Serialize;

/// Serialize `value` as the JSON body of a response with `status`.
pub fn json_response<T: Serialize>(status: u16, value: &T) -> ResultResp {
    let body = serde_json::to_vec(value).map_err(|_| ServerError::InternalError)?;

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body))
        .map_err(|_| ServerError::InternalError)
}

pub fn ok_json<T: Serialize>(value: &T) -> ResultResp {
    json_response(200, value)
}
