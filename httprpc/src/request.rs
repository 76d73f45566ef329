//! Inbound request decoding.
//!
//! Generated handlers pull each bound input from the request according to
//! their precomputed [`ParameterBinding`](httprpc_core::ParameterBinding):
//! path values through the route's template, query values from the URI,
//! and the body through whichever shape the binding selected. Every
//! failure here is the client's fault and surfaces as a 400-class
//! transported error.

use bytes::Bytes;
use http::{Request, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use httprpc_core::{
    BodyError, Form, HttpBody, JsonDecodeOptions, MessageSchema, PathTemplate, RawHeader,
    RawHttpRequest, TemplateError, TranscodeError, ValueError,
};

/// Errors raised while decoding an inbound request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Body(#[from] BodyError),
}

impl RequestError {
    /// Render this as the transported 400 the client will see.
    pub fn into_transportable(self) -> TranscodeError {
        tracing::warn!(error = %self, "request decode failed");
        TranscodeError::new(
            StatusCode::BAD_REQUEST,
            json!({ "message": self.to_string() }),
        )
    }
}

/// Extract path-bound values from the request path into a [`Form`].
pub fn path_form(template: &PathTemplate, path: &str) -> Result<Form, RequestError> {
    let values = template.extract(path)?;
    Ok(Form::from_path_values(&values))
}

/// Parse the request's query string into a [`Form`]. A missing query
/// string yields an empty form.
pub fn query_form<B>(request: &Request<B>) -> Form {
    Form::from_query(request.uri().query().unwrap_or_default())
}

/// Decode the JSON request body into a message. Used for both the
/// whole-message binding and a message-typed field binding (the caller
/// passes the field's message schema in the latter case).
pub fn decode_message<T: DeserializeOwned>(
    request: &Request<Bytes>,
    schema: &MessageSchema,
    options: &JsonDecodeOptions,
) -> Result<T, RequestError> {
    Ok(httprpc_core::decode_json(request.body(), schema, options)?)
}

/// Reconstruct an [`HttpBody`] payload from the request: bytes verbatim,
/// content type mirrored from the header.
pub fn decode_raw_body(request: &Request<Bytes>) -> HttpBody {
    httprpc_core::decode_raw_body(request.headers(), request.body())
}

/// Capture the whole inbound request as a [`RawHttpRequest`] envelope,
/// for RPCs that opt out of the transcoding rules entirely.
pub fn capture_raw_request(request: &Request<Bytes>) -> RawHttpRequest {
    let headers = request
        .headers()
        .iter()
        .map(|(key, value)| RawHeader {
            key: key.as_str().to_string(),
            value: String::from_utf8_lossy(value.as_bytes()).to_string(),
        })
        .collect();
    RawHttpRequest {
        method: request.method().as_str().to_string(),
        uri: request.uri().to_string(),
        headers,
        body: request.body().to_vec(),
    }
}
