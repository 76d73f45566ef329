//! Outgoing request encoding.

use bytes::Bytes;
use http::{HeaderValue, Request};
use serde::Serialize;

use httprpc_core::{
    BodyError, HttpBody, JsonEncodeOptions, MessageSchema, RawHttpRequest, JSON_CONTENT_TYPE,
};

/// Encode `message` as the JSON body of `request` and set the content type.
pub fn encode_message<T: Serialize>(
    request: &mut Request<Bytes>,
    message: &T,
    schema: &MessageSchema,
    options: &JsonEncodeOptions,
) -> Result<(), BodyError> {
    let body = httprpc_core::encode_json(message, schema, options)?;
    request.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    *request.body_mut() = body;
    Ok(())
}

/// Copy an [`HttpBody`] payload onto `request`: bytes verbatim, content
/// type mirrored into the header.
pub fn encode_raw_body(request: &mut Request<Bytes>, message: &HttpBody) -> Result<(), BodyError> {
    let body = httprpc_core::encode_raw_body(message, request.headers_mut())?;
    *request.body_mut() = body;
    Ok(())
}

/// Copy a [`RawHttpRequest`] envelope onto `request`: its header multimap
/// is appended and its body replaces the request body.
pub fn encode_raw_request(
    request: &mut Request<Bytes>,
    message: &RawHttpRequest,
) -> Result<(), BodyError> {
    let body = httprpc_core::encode_raw_request(message, request.headers_mut())?;
    *request.body_mut() = body;
    Ok(())
}
