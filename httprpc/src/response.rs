//! Outbound response encoding.

use bytes::Bytes;
use http::{HeaderName, HeaderValue, Response, StatusCode};
use serde::Serialize;

use httprpc_core::{
    BodyError, ErrorEnvelope, HttpBody, JsonEncodeOptions, MessageSchema, RawHttpResponse,
    TransportableError, JSON_CONTENT_TYPE,
};

/// Errors raised while encoding an outbound response.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error(transparent)]
    Body(#[from] BodyError),

    #[error("invalid response status {0}")]
    InvalidStatus(i32),
}

/// Encode `message` as the JSON body of `response` and set the content
/// type.
pub fn encode_message<T: Serialize>(
    response: &mut Response<Bytes>,
    message: &T,
    schema: &MessageSchema,
    options: &JsonEncodeOptions,
) -> Result<(), ResponseError> {
    let body = httprpc_core::encode_json(message, schema, options)?;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    *response.body_mut() = body;
    Ok(())
}

/// Copy an [`HttpBody`] payload onto `response`: bytes verbatim, content
/// type mirrored into the header.
pub fn encode_raw_body(
    response: &mut Response<Bytes>,
    message: &HttpBody,
) -> Result<(), ResponseError> {
    let body = httprpc_core::encode_raw_body(message, response.headers_mut())?;
    *response.body_mut() = body;
    Ok(())
}

/// Copy a [`RawHttpResponse`] envelope onto `response`: status, header
/// multimap, and raw body, bypassing the transcoding rules.
pub fn encode_raw_response(
    response: &mut Response<Bytes>,
    message: &RawHttpResponse,
) -> Result<(), ResponseError> {
    let status = u16::try_from(message.status)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or(ResponseError::InvalidStatus(message.status))?;
    *response.status_mut() = status;

    for header in &message.headers {
        let name: HeaderName = header
            .key
            .parse()
            .map_err(|_| BodyError::InvalidHeader(header.key.clone()))?;
        let value = HeaderValue::from_str(&header.value)
            .map_err(|_| BodyError::InvalidHeader(header.key.clone()))?;
        response.headers_mut().append(name, value);
    }

    *response.body_mut() = Bytes::from(message.body.clone());
    Ok(())
}

/// Render an error envelope as the HTTP response.
pub fn apply_envelope(envelope: ErrorEnvelope) -> Response<Bytes> {
    let mut response = Response::new(envelope.body);
    *response.status_mut() = envelope.status;
    *response.headers_mut() = envelope.headers;
    response
}

/// Encode `err` and render it as the HTTP response, reserved header
/// included.
pub fn write_error(err: &dyn TransportableError) -> Response<Bytes> {
    apply_envelope(httprpc_core::encode_error(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httprpc_core::{FieldSchema, FieldType, RawHeader, ScalarKind, TranscodeError, ERROR_HEADER};
    use serde_json::json;

    static PONG: MessageSchema = MessageSchema {
        full_name: "test.PongResponse",
        fields: &[FieldSchema {
            name: "message",
            json_name: "message",
            ty: FieldType::Scalar(ScalarKind::String),
            repeated: false,
        }],
    };

    #[derive(Serialize)]
    struct Pong {
        message: String,
    }

    #[test]
    fn test_encode_message_sets_body_and_content_type() {
        let mut response = Response::new(Bytes::new());
        let pong = Pong {
            message: "hi".to_string(),
        };
        encode_message(&mut response, &pong, &PONG, &JsonEncodeOptions::default()).unwrap();

        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );
        let v: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(v["message"], "hi");
    }

    #[test]
    fn test_encode_raw_response_envelope() {
        let mut response = Response::new(Bytes::new());
        let envelope = RawHttpResponse {
            status: 302,
            reason: "Found".to_string(),
            headers: vec![RawHeader {
                key: "location".to_string(),
                value: "/elsewhere".to_string(),
            }],
            body: b"moved".to_vec(),
        };
        encode_raw_response(&mut response, &envelope).unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get("location").unwrap(), "/elsewhere");
        assert_eq!(&response.body()[..], b"moved");
    }

    #[test]
    fn test_encode_raw_response_rejects_bad_status() {
        let mut response = Response::new(Bytes::new());
        let envelope = RawHttpResponse {
            status: 42,
            ..Default::default()
        };
        assert!(matches!(
            encode_raw_response(&mut response, &envelope),
            Err(ResponseError::InvalidStatus(42))
        ));
    }

    #[test]
    fn test_write_error_sets_marker_header() {
        let err = TranscodeError::new(StatusCode::IM_A_TEAPOT, json!({"k": "v"}))
            .with_header("x-test".parse().unwrap(), "1".parse().unwrap());
        let response = write_error(&err);

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers().get("x-test").unwrap(), "1");
        assert_eq!(
            response.headers().get(ERROR_HEADER).unwrap(),
            r#"["x-test"]"#
        );
    }
}
