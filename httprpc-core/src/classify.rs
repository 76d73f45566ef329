//! Field classification.
//!
//! Given a message schema, a compiled path template, and a body selector,
//! this module partitions the message's top-level fields into the sets that
//! travel in the URL path, the request body, and the query string. The
//! result is computed once when a route is built and reused for every
//! request; all failure modes here are construction-time errors.

use crate::schema::{FieldType, MessageSchema, RAW_BODY, RAW_REQUEST, RAW_RESPONSE};
use crate::template::PathTemplate;

/// Errors raised while classifying a message against a template.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    /// The body selector names a field the message does not declare.
    #[error("body selector {selector:?} does not match a field of {message}")]
    UnknownBodyField { message: String, selector: String },

    /// The body selector names a non-message field.
    #[error("body field {field:?} of {message} is not message-typed")]
    BodyFieldNotMessage { message: String, field: String },

    /// A template placeholder with no matching field.
    #[error("placeholder {name:?} does not match a field of {message}")]
    UnmatchedPlaceholder { message: String, name: String },

    /// A path-bound field that is not a singular scalar/wrapper/enum.
    #[error("path field {field:?} of {message} must be a singular scalar")]
    PathFieldNotScalar { message: String, field: String },
}

/// How the request (or response) body is populated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodyBinding {
    /// No body; every field arrives via path or query.
    None,
    /// The whole message is the JSON body.
    WholeMessage,
    /// One message-typed field is the JSON body.
    Field(String),
    /// The body is raw bytes with a mirrored content-type header
    /// (the `HttpBody` shape). `field` is `None` when the whole message
    /// is the raw shape.
    RawBody { field: Option<String> },
    /// The body is a full HTTP envelope (the `HttpRequest`/`HttpResponse`
    /// shapes); headers and raw bytes are copied directly.
    RawEnvelope { field: Option<String> },
}

/// The classification result for one RPC method.
///
/// Built once at server/client construction; read-only afterwards. Every
/// top-level field lands in exactly one of {path, body, query, unused}.
#[derive(Clone, Debug)]
pub struct ParameterBinding {
    pub body: BodyBinding,
    /// Path-bound field names, in template placeholder order.
    pub path_fields: Vec<String>,
    /// Query-bound field names, in declaration order.
    pub query_fields: Vec<String>,
    /// Message-typed fields reachable neither via body nor path.
    pub unused_fields: Vec<String>,
}

impl ParameterBinding {
    /// Classify `message` against `template` and the body selector.
    ///
    /// The selector is `""` for no body, `"*"` for the whole message, or
    /// the name of a message-typed field.
    pub fn classify(
        message: &MessageSchema,
        template: &PathTemplate,
        body_selector: &str,
    ) -> Result<Self, ClassifyError> {
        // Raw passthrough shapes short-circuit ordinary classification.
        if body_selector == "*" {
            if let Some(binding) = raw_binding(message.full_name, None) {
                return Ok(Self {
                    body: binding,
                    path_fields: Vec::new(),
                    query_fields: Vec::new(),
                    unused_fields: Vec::new(),
                });
            }
        }

        let mut body_field = None;
        let body = match body_selector {
            "" => BodyBinding::None,
            "*" => BodyBinding::WholeMessage,
            name => {
                let field =
                    message
                        .field(name)
                        .ok_or_else(|| ClassifyError::UnknownBodyField {
                            message: message.full_name.to_string(),
                            selector: name.to_string(),
                        })?;
                let FieldType::Message(inner) = field.ty else {
                    return Err(ClassifyError::BodyFieldNotMessage {
                        message: message.full_name.to_string(),
                        field: field.name.to_string(),
                    });
                };
                body_field = Some(field.name);
                raw_binding(inner.full_name, Some(field.name.to_string()))
                    .unwrap_or_else(|| BodyBinding::Field(field.name.to_string()))
            }
        };

        let mut path_fields = Vec::new();
        for (placeholder, _) in template.param_names() {
            let field =
                message
                    .field(placeholder)
                    .ok_or_else(|| ClassifyError::UnmatchedPlaceholder {
                        message: message.full_name.to_string(),
                        name: placeholder.to_string(),
                    })?;
            // Path segments are single strings by construction.
            if field.repeated || field.ty.is_message() {
                return Err(ClassifyError::PathFieldNotScalar {
                    message: message.full_name.to_string(),
                    field: field.name.to_string(),
                });
            }
            path_fields.push(field.name.to_string());
        }

        let mut query_fields = Vec::new();
        let mut unused_fields = Vec::new();
        if !matches!(body, BodyBinding::WholeMessage) {
            for field in message.fields {
                if path_fields.iter().any(|f| f == field.name) {
                    continue;
                }
                if body_field == Some(field.name) {
                    continue;
                }
                if field.ty.is_message() {
                    // Nested message fields are not reachable via query encoding.
                    unused_fields.push(field.name.to_string());
                } else {
                    query_fields.push(field.name.to_string());
                }
            }
        }

        Ok(Self {
            body,
            path_fields,
            query_fields,
            unused_fields,
        })
    }
}

fn raw_binding(full_name: &str, field: Option<String>) -> Option<BodyBinding> {
    match full_name {
        RAW_BODY => Some(BodyBinding::RawBody { field }),
        RAW_REQUEST | RAW_RESPONSE => Some(BodyBinding::RawEnvelope { field }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, ScalarKind};

    static NESTED: MessageSchema = MessageSchema {
        full_name: "test.Nested",
        fields: &[],
    };

    static RAW: MessageSchema = MessageSchema {
        full_name: RAW_BODY,
        fields: &[],
    };

    static GET_USER: MessageSchema = MessageSchema {
        full_name: "test.GetUserRequest",
        fields: &[
            FieldSchema {
                name: "id",
                json_name: "id",
                ty: FieldType::Scalar(ScalarKind::String),
                repeated: false,
            },
            FieldSchema {
                name: "verbose",
                json_name: "verbose",
                ty: FieldType::Scalar(ScalarKind::Bool),
                repeated: false,
            },
            FieldSchema {
                name: "tags",
                json_name: "tags",
                ty: FieldType::Scalar(ScalarKind::String),
                repeated: true,
            },
            FieldSchema {
                name: "detail",
                json_name: "detail",
                ty: FieldType::Message(&NESTED),
                repeated: false,
            },
            FieldSchema {
                name: "attachment",
                json_name: "attachment",
                ty: FieldType::Message(&RAW),
                repeated: false,
            },
        ],
    };

    fn template(raw: &str) -> PathTemplate {
        PathTemplate::parse(raw).unwrap()
    }

    #[test]
    fn test_classify_path_and_query() {
        let binding =
            ParameterBinding::classify(&GET_USER, &template("/v1/users/{id}"), "").unwrap();
        assert_eq!(binding.body, BodyBinding::None);
        assert_eq!(binding.path_fields, vec!["id"]);
        assert_eq!(binding.query_fields, vec!["verbose", "tags"]);
        assert_eq!(binding.unused_fields, vec!["detail", "attachment"]);
    }

    #[test]
    fn test_classify_whole_message_body() {
        let binding =
            ParameterBinding::classify(&GET_USER, &template("/v1/users/{id}"), "*").unwrap();
        assert_eq!(binding.body, BodyBinding::WholeMessage);
        assert_eq!(binding.path_fields, vec!["id"]);
        assert!(binding.query_fields.is_empty());
    }

    #[test]
    fn test_classify_field_body() {
        let binding =
            ParameterBinding::classify(&GET_USER, &template("/v1/users/{id}"), "detail").unwrap();
        assert_eq!(binding.body, BodyBinding::Field("detail".to_string()));
        assert_eq!(binding.query_fields, vec!["verbose", "tags"]);
        assert_eq!(binding.unused_fields, vec!["attachment"]);
    }

    #[test]
    fn test_classify_raw_body_field() {
        let binding =
            ParameterBinding::classify(&GET_USER, &template("/v1/users/{id}"), "attachment")
                .unwrap();
        assert_eq!(
            binding.body,
            BodyBinding::RawBody {
                field: Some("attachment".to_string())
            }
        );
    }

    #[test]
    fn test_classify_raw_whole_message() {
        let binding = ParameterBinding::classify(&RAW, &template("/v1/blob"), "*").unwrap();
        assert_eq!(binding.body, BodyBinding::RawBody { field: None });
    }

    #[test]
    fn test_classify_rejects_unknown_body_field() {
        assert!(matches!(
            ParameterBinding::classify(&GET_USER, &template("/v1/users/{id}"), "missing"),
            Err(ClassifyError::UnknownBodyField { .. })
        ));
    }

    #[test]
    fn test_classify_rejects_scalar_body_field() {
        assert!(matches!(
            ParameterBinding::classify(&GET_USER, &template("/v1/users/{id}"), "verbose"),
            Err(ClassifyError::BodyFieldNotMessage { .. })
        ));
    }

    #[test]
    fn test_classify_rejects_unmatched_placeholder() {
        assert!(matches!(
            ParameterBinding::classify(&GET_USER, &template("/v1/users/{nope}"), ""),
            Err(ClassifyError::UnmatchedPlaceholder { .. })
        ));
    }

    #[test]
    fn test_classify_rejects_repeated_path_field() {
        assert!(matches!(
            ParameterBinding::classify(&GET_USER, &template("/v1/users/{tags}"), ""),
            Err(ClassifyError::PathFieldNotScalar { .. })
        ));
    }

    #[test]
    fn test_classification_is_a_partition() {
        let binding =
            ParameterBinding::classify(&GET_USER, &template("/v1/users/{id}"), "detail").unwrap();
        let mut all: Vec<&str> = Vec::new();
        all.extend(binding.path_fields.iter().map(String::as_str));
        all.extend(binding.query_fields.iter().map(String::as_str));
        all.extend(binding.unused_fields.iter().map(String::as_str));
        if let BodyBinding::Field(f) = &binding.body {
            all.push(f);
        }
        all.sort_unstable();
        let mut declared: Vec<&str> = GET_USER.fields.iter().map(|f| f.name).collect();
        declared.sort_unstable();
        assert_eq!(all, declared);
    }
}
