//! Message schema model.
//!
//! Classification and JSON body mapping are both driven by a small,
//! statically describable schema: the set of top-level fields of a message,
//! each with its declared name, JSON name, and type. Generated code supplies
//! one [`MessageSchema`] per request/response message.

/// Scalar field kinds. Sint/sfixed and fixed variants share the plain
/// signed/unsigned kinds since their wire-string representation is identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
}

/// A named enum type with its value table, used to map between enum
/// value names and numbers in JSON bodies.
#[derive(Debug)]
pub struct EnumSchema {
    pub full_name: &'static str,
    pub values: &'static [(&'static str, i32)],
}

impl EnumSchema {
    /// Look up the name for a value number.
    pub fn name_of(&self, number: i32) -> Option<&'static str> {
        self.values
            .iter()
            .find(|(_, n)| *n == number)
            .map(|(name, _)| *name)
    }

    /// Look up the value number for a name.
    pub fn number_of(&self, name: &str) -> Option<i32> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, number)| *number)
    }
}

/// The type of a single field.
#[derive(Clone, Copy, Debug)]
pub enum FieldType {
    /// A plain scalar.
    Scalar(ScalarKind),
    /// A nullable wrapper around a scalar (`google.protobuf.*Value` style);
    /// represented in Rust as an `Option` of the scalar.
    Wrapper(ScalarKind),
    /// An enum, carried as its integer value in the message struct.
    Enum(&'static EnumSchema),
    /// A nested message field.
    Message(&'static MessageSchema),
}

impl FieldType {
    pub fn is_message(&self) -> bool {
        matches!(self, FieldType::Message(_))
    }
}

/// One top-level field of a message.
#[derive(Debug)]
pub struct FieldSchema {
    /// Declared (proto) field name, snake_case.
    pub name: &'static str,
    /// JSON name, typically lowerCamelCase.
    pub json_name: &'static str,
    pub ty: FieldType,
    pub repeated: bool,
}

/// Schema of a message: its full name and top-level fields.
#[derive(Debug)]
pub struct MessageSchema {
    pub full_name: &'static str,
    pub fields: &'static [FieldSchema],
}

impl MessageSchema {
    /// Find a field by declared name or JSON name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| f.name == name || f.json_name == name)
    }
}

/// Full name of the raw-bytes-with-content-type escape hatch shape.
pub const RAW_BODY: &str = "google.api.HttpBody";

/// Full name of the full-HTTP-request envelope shape (outgoing).
pub const RAW_REQUEST: &str = "google.rpc.HttpRequest";

/// Full name of the full-HTTP-response envelope shape (incoming).
pub const RAW_RESPONSE: &str = "google.rpc.HttpResponse";

#[cfg(test)]
mod tests {
    use super::*;

    static COLOR: EnumSchema = EnumSchema {
        full_name: "test.Color",
        values: &[("COLOR_UNSPECIFIED", 0), ("RED", 1), ("BLUE", 2)],
    };

    static MSG: MessageSchema = MessageSchema {
        full_name: "test.Msg",
        fields: &[
            FieldSchema {
                name: "user_id",
                json_name: "userId",
                ty: FieldType::Scalar(ScalarKind::String),
                repeated: false,
            },
            FieldSchema {
                name: "color",
                json_name: "color",
                ty: FieldType::Enum(&COLOR),
                repeated: false,
            },
        ],
    };

    #[test]
    fn test_field_lookup_by_either_name() {
        assert!(MSG.field("user_id").is_some());
        assert!(MSG.field("userId").is_some());
        assert!(MSG.field("missing").is_none());
    }

    #[test]
    fn test_enum_value_table() {
        assert_eq!(COLOR.name_of(1), Some("RED"));
        assert_eq!(COLOR.number_of("BLUE"), Some(2));
        assert_eq!(COLOR.name_of(9), None);
        assert_eq!(COLOR.number_of("GREEN"), None);
    }
}
