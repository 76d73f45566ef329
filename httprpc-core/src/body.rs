//! Body encoding and decoding.
//!
//! The default body mapping is canonical JSON, driven by the message
//! schema: field-name casing, enum representation, 64-bit integer
//! stringification, and default-field emission are all configured through
//! [`JsonEncodeOptions`]/[`JsonDecodeOptions`], never hardcoded.
//!
//! Three reserved message shapes bypass JSON entirely:
//!
//! - [`HttpBody`]: raw bytes plus a content type mirrored into the
//!   content-type header
//! - [`RawHttpRequest`]: a full outgoing HTTP envelope (headers + body)
//! - [`RawHttpResponse`]: a full incoming HTTP envelope (status, reason,
//!   headers, body)

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{FieldSchema, FieldType, MessageSchema, ScalarKind};

/// Errors raised while encoding or decoding a body.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("body is not a JSON object")]
    NotAnObject,

    #[error("unknown field {0:?}")]
    UnknownField(String),

    #[error("invalid base64 in field {0:?}")]
    InvalidBase64(String),

    #[error("unknown enum value {value:?} for field {field:?}")]
    UnknownEnumValue { field: String, value: String },

    #[error("invalid integer literal {value:?} for field {field:?}")]
    InvalidInteger { field: String, value: String },

    #[error("invalid header {0:?}")]
    InvalidHeader(String),
}

/// JSON marshal settings, injected by the caller.
///
/// Defaults mirror the canonical proto-JSON mapping: lowerCamelCase field
/// names, default-valued fields omitted, enums as value names, and 64-bit
/// integers carried as strings.
#[derive(Clone, Copy, Debug)]
pub struct JsonEncodeOptions {
    /// Emit declared (snake_case) field names instead of JSON names.
    pub use_proto_names: bool,
    /// Emit scalar fields even when they hold their default value.
    pub emit_default_fields: bool,
    /// Emit enums as their integer value instead of their name.
    pub enums_as_integers: bool,
    /// Emit 64-bit integers as decimal strings.
    pub int64_as_string: bool,
}

impl Default for JsonEncodeOptions {
    fn default() -> Self {
        Self {
            use_proto_names: false,
            emit_default_fields: false,
            enums_as_integers: false,
            int64_as_string: true,
        }
    }
}

/// JSON unmarshal settings, injected by the caller.
///
/// Decode always accepts both declared and JSON field names, and both
/// string and integer enum values.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDecodeOptions {
    /// Skip unknown fields instead of failing.
    pub ignore_unknown_fields: bool,
}

/// Encode a message as a canonical JSON body.
pub fn encode_json<T: Serialize>(
    message: &T,
    schema: &MessageSchema,
    options: &JsonEncodeOptions,
) -> Result<Bytes, BodyError> {
    let value = serde_json::to_value(message)?;
    let value = encode_object(value, schema, options)?;
    Ok(Bytes::from(serde_json::to_vec(&value)?))
}

/// Decode a canonical JSON body into a message.
pub fn decode_json<T: DeserializeOwned>(
    body: &[u8],
    schema: &MessageSchema,
    options: &JsonDecodeOptions,
) -> Result<T, BodyError> {
    let value: Value = serde_json::from_slice(body)?;
    let value = decode_object(value, schema, options)?;
    Ok(serde_json::from_value(value)?)
}

fn encode_object(
    value: Value,
    schema: &MessageSchema,
    options: &JsonEncodeOptions,
) -> Result<Value, BodyError> {
    let Value::Object(mut map) = value else {
        return Err(BodyError::NotAnObject);
    };
    let mut out = Map::with_capacity(map.len());
    for field in schema.fields {
        let Some(value) = map.remove(field.name).or_else(|| map.remove(field.json_name))
        else {
            continue;
        };
        if value.is_null() {
            // Wrapper/message absence; never emitted.
            continue;
        }
        if !options.emit_default_fields && is_default(&value, field) {
            continue;
        }
        let value = if field.repeated {
            let Value::Array(items) = value else {
                return Err(BodyError::NotAnObject);
            };
            Value::Array(
                items
                    .into_iter()
                    .map(|item| encode_element(item, field, options))
                    .collect::<Result<_, _>>()?,
            )
        } else {
            encode_element(value, field, options)?
        };
        let key = if options.use_proto_names {
            field.name
        } else {
            field.json_name
        };
        out.insert(key.to_string(), value);
    }
    Ok(Value::Object(out))
}

fn encode_element(
    value: Value,
    field: &FieldSchema,
    options: &JsonEncodeOptions,
) -> Result<Value, BodyError> {
    match field.ty {
        FieldType::Scalar(kind) | FieldType::Wrapper(kind) => {
            encode_scalar(value, kind, field, options)
        }
        FieldType::Enum(schema) => {
            if options.enums_as_integers {
                return Ok(value);
            }
            match value.as_i64() {
                Some(n) => match schema.name_of(n as i32) {
                    Some(name) => Ok(Value::String(name.to_string())),
                    None => Ok(value),
                },
                None => Ok(value),
            }
        }
        FieldType::Message(inner) => encode_object(value, inner, options),
    }
}

fn encode_scalar(
    value: Value,
    kind: ScalarKind,
    field: &FieldSchema,
    options: &JsonEncodeOptions,
) -> Result<Value, BodyError> {
    match kind {
        ScalarKind::Int64 | ScalarKind::Uint64 if options.int64_as_string => {
            match &value {
                Value::Number(n) => Ok(Value::String(n.to_string())),
                _ => Ok(value),
            }
        }
        ScalarKind::Bytes => match value {
            // Byte fields serialize from Rust as arrays of numbers; the
            // canonical JSON form is standard base64.
            Value::Array(items) => {
                let bytes: Option<Vec<u8>> = items
                    .iter()
                    .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
                    .collect();
                match bytes {
                    Some(bytes) => Ok(Value::String(BASE64.encode(bytes))),
                    None => Err(BodyError::InvalidBase64(field.name.to_string())),
                }
            }
            other => Ok(other),
        },
        _ => Ok(value),
    }
}

// Default omission applies to plain scalars and enums only: a populated
// wrapper carries explicit presence even at zero, and message fields are
// only skipped when absent.
fn is_default(value: &Value, field: &FieldSchema) -> bool {
    if field.repeated {
        return matches!(value, Value::Array(items) if items.is_empty());
    }
    match field.ty {
        FieldType::Scalar(_) | FieldType::Enum(_) => match value {
            Value::Bool(b) => !*b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        },
        FieldType::Wrapper(_) | FieldType::Message(_) => false,
    }
}

fn decode_object(
    value: Value,
    schema: &MessageSchema,
    options: &JsonDecodeOptions,
) -> Result<Value, BodyError> {
    let Value::Object(map) = value else {
        return Err(BodyError::NotAnObject);
    };
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        let Some(field) = schema.field(&key) else {
            if options.ignore_unknown_fields {
                continue;
            }
            return Err(BodyError::UnknownField(key));
        };
        let value = if field.repeated {
            match value {
                Value::Array(items) => Value::Array(
                    items
                        .into_iter()
                        .map(|item| decode_element(item, field, options))
                        .collect::<Result<_, _>>()?,
                ),
                Value::Null => Value::Null,
                _ => return Err(BodyError::NotAnObject),
            }
        } else {
            decode_element(value, field, options)?
        };
        // Struct fields deserialize by declared name.
        out.insert(field.name.to_string(), value);
    }
    Ok(Value::Object(out))
}

fn decode_element(
    value: Value,
    field: &FieldSchema,
    options: &JsonDecodeOptions,
) -> Result<Value, BodyError> {
    if value.is_null() {
        return Ok(value);
    }
    match field.ty {
        FieldType::Scalar(kind) | FieldType::Wrapper(kind) => decode_scalar(value, kind, field),
        FieldType::Enum(schema) => match value {
            Value::String(name) => match schema.number_of(&name) {
                Some(number) => Ok(Value::from(number)),
                None => Err(BodyError::UnknownEnumValue {
                    field: field.name.to_string(),
                    value: name,
                }),
            },
            other => Ok(other),
        },
        FieldType::Message(inner) => decode_object(value, inner, options),
    }
}

fn decode_scalar(value: Value, kind: ScalarKind, field: &FieldSchema) -> Result<Value, BodyError> {
    match kind {
        ScalarKind::Int64 => match value {
            Value::String(s) => match s.parse::<i64>() {
                Ok(n) => Ok(Value::from(n)),
                Err(_) => Err(BodyError::InvalidInteger {
                    field: field.name.to_string(),
                    value: s,
                }),
            },
            other => Ok(other),
        },
        ScalarKind::Uint64 => match value {
            Value::String(s) => match s.parse::<u64>() {
                Ok(n) => Ok(Value::from(n)),
                Err(_) => Err(BodyError::InvalidInteger {
                    field: field.name.to_string(),
                    value: s,
                }),
            },
            other => Ok(other),
        },
        ScalarKind::Bytes => match value {
            Value::String(s) => match BASE64.decode(s.as_bytes()) {
                Ok(bytes) => Ok(Value::Array(bytes.into_iter().map(Value::from).collect())),
                Err(_) => Err(BodyError::InvalidBase64(field.name.to_string())),
            },
            other => Ok(other),
        },
        _ => Ok(value),
    }
}

// ============================================================================
// Raw passthrough shapes
// ============================================================================

/// Raw bytes with a content type; the escape hatch for opaque payloads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpBody {
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub data: Vec<u8>,
}

/// One HTTP header entry of a raw envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHeader {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// A full outgoing HTTP envelope, used when the transcoding rules are
/// insufficient to describe a request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHttpRequest {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub headers: Vec<RawHeader>,
    #[serde(default)]
    pub body: Vec<u8>,
}

/// A full incoming HTTP envelope, used for RPCs whose response shape
/// cannot be known statically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHttpResponse {
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub headers: Vec<RawHeader>,
    #[serde(default)]
    pub body: Vec<u8>,
}

/// Copy an [`HttpBody`] onto the wire: bytes verbatim, content type
/// mirrored into the content-type header.
pub fn encode_raw_body(message: &HttpBody, headers: &mut HeaderMap) -> Result<Bytes, BodyError> {
    if !message.content_type.is_empty() {
        let value = HeaderValue::from_str(&message.content_type)
            .map_err(|_| BodyError::InvalidHeader(message.content_type.clone()))?;
        headers.insert(http::header::CONTENT_TYPE, value);
    }
    Ok(Bytes::from(message.data.clone()))
}

/// Reconstruct an [`HttpBody`] from the wire.
pub fn decode_raw_body(headers: &HeaderMap, body: &[u8]) -> HttpBody {
    let content_type = headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    HttpBody {
        content_type,
        data: body.to_vec(),
    }
}

/// Copy a [`RawHttpRequest`] onto the wire: header multimap appended,
/// body verbatim.
pub fn encode_raw_request(
    message: &RawHttpRequest,
    headers: &mut HeaderMap,
) -> Result<Bytes, BodyError> {
    for header in &message.headers {
        let name: HeaderName = header
            .key
            .parse()
            .map_err(|_| BodyError::InvalidHeader(header.key.clone()))?;
        let value = HeaderValue::from_str(&header.value)
            .map_err(|_| BodyError::InvalidHeader(header.key.clone()))?;
        headers.append(name, value);
    }
    Ok(Bytes::from(message.body.clone()))
}

/// Reconstruct a [`RawHttpResponse`] from the wire: status, reason phrase,
/// the complete header multimap, and the raw body bytes.
pub fn decode_raw_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> RawHttpResponse {
    let raw_headers = headers
        .iter()
        .map(|(key, value)| RawHeader {
            key: key.as_str().to_string(),
            value: String::from_utf8_lossy(value.as_bytes()).to_string(),
        })
        .collect();
    RawHttpResponse {
        status: i32::from(status.as_u16()),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        headers: raw_headers,
        body: body.to_vec(),
    }
}
