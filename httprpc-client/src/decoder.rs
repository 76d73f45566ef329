//! Incoming response decoding.

use bytes::Bytes;
use http::Response;
use serde::de::DeserializeOwned;

use httprpc_core::{
    BodyError, HttpBody, JsonDecodeOptions, MessageSchema, RawHttpResponse, TransportableError,
};

/// Decode the JSON response body into a message.
pub fn decode_message<T: DeserializeOwned>(
    response: &Response<Bytes>,
    schema: &MessageSchema,
    options: &JsonDecodeOptions,
) -> Result<T, BodyError> {
    httprpc_core::decode_json(response.body(), schema, options)
}

/// Reconstruct an [`HttpBody`] payload from the response.
pub fn decode_raw_body(response: &Response<Bytes>) -> HttpBody {
    httprpc_core::decode_raw_body(response.headers(), response.body())
}

/// Reconstruct a [`RawHttpResponse`] envelope from the response: status,
/// reason phrase, full header multimap, raw body.
pub fn decode_raw_response(response: &Response<Bytes>) -> RawHttpResponse {
    httprpc_core::decode_raw_response(response.status(), response.headers(), response.body())
}

/// Check whether `response` transports an application error, constructing
/// one via `factory` when it does.
///
/// Only the reserved error header is consulted; an error response is
/// recognized regardless of status code, and a plain response is never
/// mistaken for one however unusual its status.
pub fn check_error(
    response: &Response<Bytes>,
    factory: &dyn Fn() -> Box<dyn TransportableError>,
) -> Option<Box<dyn TransportableError>> {
    httprpc_core::decode_error(
        response.status(),
        response.headers(),
        response.body(),
        factory,
    )
}
