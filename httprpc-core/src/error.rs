//! Application error transport.
//!
//! Errors cross the wire as ordinary HTTP responses plus one reserved
//! header ([`crate::ERROR_HEADER`]) whose value is the JSON-encoded array
//! of header names the error contributed. The reserved header's mere
//! presence is the sole error marker: the client never consults the HTTP
//! status code to decide whether a response transports an error.
//!
//! What an error can supply is an explicit, enumerated capability set
//! ([`ErrorCapabilities`]) resolved per error type, rather than ad hoc
//! runtime type inspection: encode reads status/headers/JSON body only
//! from errors that claim the matching capability, and decode populates
//! only the claimed setters.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;

use crate::{ERROR_HEADER, JSON_CONTENT_TYPE, PLAIN_TEXT_CONTENT_TYPE};

/// The capability set of a transportable error type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ErrorCapabilities {
    /// The error supplies (and accepts) an HTTP status code.
    pub has_status: bool,
    /// The error supplies (and accepts) HTTP headers.
    pub has_headers: bool,
    /// The error supplies (and accepts) a JSON body.
    pub has_json_body: bool,
}

impl ErrorCapabilities {
    pub const NONE: Self = Self {
        has_status: false,
        has_headers: false,
        has_json_body: false,
    };

    pub const ALL: Self = Self {
        has_status: true,
        has_headers: true,
        has_json_body: true,
    };
}

/// An application error that can travel over HTTP.
///
/// Getter/setter pairs are consulted only when the corresponding
/// capability is claimed; the defaults are inert.
pub trait TransportableError: std::error::Error + Send + Sync {
    fn capabilities(&self) -> ErrorCapabilities {
        ErrorCapabilities::NONE
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    fn json_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        Ok(Vec::new())
    }

    fn set_status_code(&mut self, _status: StatusCode) {}

    fn set_headers(&mut self, _headers: HeaderMap) {}

    fn set_json_body(&mut self, _body: &[u8]) -> Result<(), serde_json::Error> {
        Ok(())
    }
}

/// Constructs a fresh error instance for the client decoder to populate.
pub type ErrorFactory = std::sync::Arc<dyn Fn() -> Box<dyn TransportableError> + Send + Sync>;

/// The wire-level rendition of one failed call. Constructed per failure,
/// never persisted.
#[derive(Clone, Debug)]
pub struct ErrorEnvelope {
    pub status: StatusCode,
    /// Response headers, reserved header and content type included.
    pub headers: HeaderMap,
    /// The header names recorded in the reserved header, in merge order.
    pub header_keys: Vec<String>,
    pub body: Bytes,
    pub content_type: &'static str,
}

/// Encode an application error for the response.
///
/// Status defaults to 500 unless the error claims the status capability.
/// The body is the error's JSON rendition when claimed (falling back to
/// plain text if marshalling fails), otherwise its message text. Claimed
/// headers are merged and their names recorded; the reserved header is
/// always set, to `[]` when no headers were contributed.
pub fn encode_error(err: &dyn TransportableError) -> ErrorEnvelope {
    let caps = err.capabilities();

    let status = if caps.has_status {
        err.status_code()
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let (content_type, body) = if caps.has_json_body {
        match err.json_body() {
            Ok(body) => (JSON_CONTENT_TYPE, Bytes::from(body)),
            Err(marshal_err) => {
                tracing::warn!(error = %marshal_err, "error body marshal failed");
                (PLAIN_TEXT_CONTENT_TYPE, Bytes::from(err.to_string()))
            }
        }
    } else {
        (PLAIN_TEXT_CONTENT_TYPE, Bytes::from(err.to_string()))
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static(content_type),
    );

    let mut header_keys = Vec::new();
    if caps.has_headers {
        for (name, value) in &err.headers() {
            headers.append(name.clone(), value.clone());
            header_keys.push(name.as_str().to_string());
        }
    }

    let keys_json =
        serde_json::to_string(&header_keys).unwrap_or_else(|_| "[]".to_string());
    let marker = HeaderValue::from_str(&keys_json)
        .unwrap_or_else(|_| HeaderValue::from_static("[]"));
    headers.insert(
        HeaderName::from_static(ERROR_HEADER),
        marker,
    );

    ErrorEnvelope {
        status,
        headers,
        header_keys,
        body,
        content_type,
    }
}

/// Decode a response into an application error, if it transports one.
///
/// Returns `Some` if and only if the reserved header is present; the HTTP
/// status code is deliberately not consulted for this decision. The
/// constructed error is populated through whichever setter capabilities it
/// claims, re-reading exactly the header names listed in the reserved
/// header's JSON array.
pub fn decode_error(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    factory: &dyn Fn() -> Box<dyn TransportableError>,
) -> Option<Box<dyn TransportableError>> {
    let marker = headers.get(ERROR_HEADER)?;

    let mut err = factory();
    let caps = err.capabilities();

    if caps.has_status {
        err.set_status_code(status);
    }

    if caps.has_headers {
        match serde_json::from_slice::<Vec<String>>(marker.as_bytes()) {
            Ok(keys) => {
                let mut merged = HeaderMap::new();
                let mut seen = std::collections::HashSet::new();
                for key in keys {
                    if !seen.insert(key.clone()) {
                        continue;
                    }
                    let Ok(name) = HeaderName::try_from(key.as_str()) else {
                        continue;
                    };
                    for value in headers.get_all(&name) {
                        merged.append(name.clone(), value.clone());
                    }
                }
                err.set_headers(merged);
            }
            Err(unmarshal_err) => {
                tracing::warn!(error = %unmarshal_err, "error header key unmarshal failed");
            }
        }
    }

    if caps.has_json_body {
        if let Err(unmarshal_err) = err.set_json_body(body) {
            tracing::warn!(error = %unmarshal_err, "error body unmarshal failed");
        }
    }

    Some(err)
}

/// The default transportable error: a status code, headers, and an
/// arbitrary JSON body value. Claims all three capabilities.
#[derive(Clone, Debug)]
pub struct TranscodeError {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TranscodeError {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// An empty instance, for use as the client-side factory.
    pub fn empty() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, Value::Null)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }
}

impl Default for TranscodeError {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "http error, status code: {}, body: {}", self.status, self.body)
    }
}

impl std::error::Error for TranscodeError {}

impl TransportableError for TranscodeError {
    fn capabilities(&self) -> ErrorCapabilities {
        ErrorCapabilities::ALL
    }

    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn headers(&self) -> HeaderMap {
        self.headers.clone()
    }

    fn json_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.body)
    }

    fn set_status_code(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn set_headers(&mut self, headers: HeaderMap) {
        self.headers = headers;
    }

    fn set_json_body(&mut self, body: &[u8]) -> Result<(), serde_json::Error> {
        self.body = serde_json::from_slice(body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// An error exposing status and headers, but no JSON body.
    #[derive(Debug)]
    struct TeapotError;

    impl std::fmt::Display for TeapotError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "short and stout")
        }
    }

    impl std::error::Error for TeapotError {}

    impl TransportableError for TeapotError {
        fn capabilities(&self) -> ErrorCapabilities {
            ErrorCapabilities {
                has_status: true,
                has_headers: true,
                has_json_body: false,
            }
        }

        fn status_code(&self) -> StatusCode {
            StatusCode::IM_A_TEAPOT
        }

        fn headers(&self) -> HeaderMap {
            let mut headers = HeaderMap::new();
            headers.insert("x-test", "1".parse().unwrap());
            headers
        }
    }

    #[test]
    fn test_encode_plain_error_defaults_to_500() {
        #[derive(Debug)]
        struct Bare;
        impl std::fmt::Display for Bare {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "boom")
            }
        }
        impl std::error::Error for Bare {}
        impl TransportableError for Bare {}

        let envelope = encode_error(&Bare);
        assert_eq!(envelope.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope.content_type, PLAIN_TEXT_CONTENT_TYPE);
        assert_eq!(&envelope.body[..], b"boom");
        assert_eq!(envelope.headers.get(ERROR_HEADER).unwrap(), "[]");
    }

    #[test]
    fn test_encode_status_and_headers() {
        let envelope = encode_error(&TeapotError);
        assert_eq!(envelope.status, StatusCode::IM_A_TEAPOT);
        assert_eq!(envelope.headers.get("x-test").unwrap(), "1");
        assert_eq!(envelope.headers.get(ERROR_HEADER).unwrap(), r#"["x-test"]"#);
        assert_eq!(&envelope.body[..], b"short and stout");
        assert_eq!(envelope.content_type, PLAIN_TEXT_CONTENT_TYPE);
    }

    #[test]
    fn test_encode_json_body() {
        let err = TranscodeError::new(StatusCode::CONFLICT, json!({"reason": "busy"}));
        let envelope = encode_error(&err);
        assert_eq!(envelope.status, StatusCode::CONFLICT);
        assert_eq!(envelope.content_type, JSON_CONTENT_TYPE);
        let v: Value = serde_json::from_slice(&envelope.body).unwrap();
        assert_eq!(v["reason"], "busy");
    }

    #[test]
    fn test_decode_requires_marker_header_only() {
        let factory = || Box::new(TranscodeError::empty()) as Box<dyn TransportableError>;

        // A definitively failed response without the marker is not an error.
        let headers = HeaderMap::new();
        assert!(
            decode_error(StatusCode::BAD_GATEWAY, &headers, b"{}", &factory).is_none()
        );

        // A 200 with the marker is an error.
        let mut headers = HeaderMap::new();
        headers.insert(ERROR_HEADER, "[]".parse().unwrap());
        assert!(decode_error(StatusCode::OK, &headers, b"null", &factory).is_some());
    }

    #[test]
    fn test_encode_decode_idempotent() {
        let original = TranscodeError::new(StatusCode::IM_A_TEAPOT, json!({"k": "v"}))
            .with_header("x-test".parse().unwrap(), "1".parse().unwrap());
        let envelope = encode_error(&original);

        let factory = || Box::new(TranscodeError::empty()) as Box<dyn TransportableError>;
        let decoded = decode_error(
            envelope.status,
            &envelope.headers,
            &envelope.body,
            &factory,
        )
        .unwrap();

        assert_eq!(decoded.status_code(), StatusCode::IM_A_TEAPOT);
        let decoded_headers = decoded.headers();
        assert_eq!(decoded_headers.get("x-test").unwrap(), "1");
        assert_eq!(decoded_headers.len(), 1); // only the listed names
        let body = decoded.json_body().unwrap();
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v, json!({"k": "v"}));
    }

    #[test]
    fn test_decode_reads_only_listed_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ERROR_HEADER, r#"["x-a"]"#.parse().unwrap());
        headers.insert("x-a", "1".parse().unwrap());
        headers.insert("x-b", "2".parse().unwrap());

        let factory = || Box::new(TranscodeError::empty()) as Box<dyn TransportableError>;
        let decoded = decode_error(StatusCode::OK, &headers, b"null", &factory).unwrap();
        let decoded_headers = decoded.headers();
        assert!(decoded_headers.contains_key("x-a"));
        assert!(!decoded_headers.contains_key("x-b"));
    }
}
