//! Scalar value conversion.
//!
//! Path and query values travel as strings. This module holds the single
//! conversion table between wire strings and typed field values: one
//! encode/decode pair per scalar kind, applied per element for repeated
//! fields, plus the wrapper variants that preserve explicit presence.
//!
//! Absence of a key is not distinguished from an explicit zero for
//! non-wrapper fields: a missing key decodes to the kind's zero value. A
//! key that is present with an empty value still participates and parses
//! the empty literal.

use std::collections::HashMap;

/// Errors raised while parsing a wire string into a typed value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("invalid {kind} literal {input:?} for key {key:?}")]
    Parse {
        kind: &'static str,
        input: String,
        key: String,
    },
}

impl ValueError {
    fn new(kind: &'static str, input: &str, key: &str) -> Self {
        Self::Parse {
            kind,
            input: input.to_string(),
            key: key.to_string(),
        }
    }
}

/// An ordered multimap of decoded query (or path) values.
///
/// Repeated values share one key and keep encounter order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Form {
    entries: Vec<(String, Vec<String>)>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a URL-encoded query string.
    pub fn from_query(query: &str) -> Self {
        let mut form = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            form.append(&key, &value);
        }
        form
    }

    /// Append one value under `key`, keeping encounter order.
    pub fn append(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, values)) => values.push(value.to_string()),
            None => self
                .entries
                .push((key.to_string(), vec![value.to_string()])),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// First value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values for `key`, in encounter order.
    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Re-encode as a URL query string, repeated values appended in order.
    pub fn to_query(&self) -> String {
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.entries {
            for value in values {
                out.append_pair(key, value);
            }
        }
        out.finish()
    }

    /// Build a form from path placeholder values, one value per key.
    pub fn from_path_values(values: &HashMap<String, String>) -> Self {
        let mut form = Self::new();
        for (key, value) in values {
            form.append(key, value);
        }
        form
    }
}

/// A scalar kind that can cross the wire as a string.
pub trait WireScalar: Sized + Default {
    /// Kind label used in parse errors.
    const KIND: &'static str;

    fn format_wire(&self) -> String;
    fn parse_wire(s: &str) -> Result<Self, WireParseError>;
}

/// Keyless parse failure; mapped to [`ValueError`] by the form getters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireParseError;

impl WireScalar for bool {
    const KIND: &'static str = "bool";

    fn format_wire(&self) -> String {
        if *self { "true" } else { "false" }.to_string()
    }

    fn parse_wire(s: &str) -> Result<Self, WireParseError> {
        match s {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err(WireParseError),
        }
    }
}

macro_rules! numeric_wire_scalar {
    ($ty:ty, $kind:literal) => {
        impl WireScalar for $ty {
            const KIND: &'static str = $kind;

            fn format_wire(&self) -> String {
                self.to_string()
            }

            fn parse_wire(s: &str) -> Result<Self, WireParseError> {
                s.parse().map_err(|_| WireParseError)
            }
        }
    };
}

numeric_wire_scalar!(i32, "int32");
numeric_wire_scalar!(i64, "int64");
numeric_wire_scalar!(u32, "uint32");
numeric_wire_scalar!(u64, "uint64");
numeric_wire_scalar!(f32, "float");
numeric_wire_scalar!(f64, "double");

impl WireScalar for String {
    const KIND: &'static str = "string";

    fn format_wire(&self) -> String {
        self.clone()
    }

    fn parse_wire(s: &str) -> Result<Self, WireParseError> {
        Ok(s.to_string())
    }
}

/// Decode a singular value; a missing key yields the kind's zero value.
pub fn get<T: WireScalar>(form: &Form, key: &str) -> Result<T, ValueError> {
    match form.get(key) {
        None => Ok(T::default()),
        Some(s) => T::parse_wire(s).map_err(|_| ValueError::new(T::KIND, s, key)),
    }
}

/// Decode a repeated value; one unparsable element fails the whole field.
pub fn get_slice<T: WireScalar>(form: &Form, key: &str) -> Result<Vec<T>, ValueError> {
    let Some(values) = form.values(key) else {
        return Ok(Vec::new());
    };
    values
        .iter()
        .map(|s| T::parse_wire(s).map_err(|_| ValueError::new(T::KIND, s, key)))
        .collect()
}

/// Decode a wrapper value; a missing key yields a wrapped zero, never null.
pub fn get_wrapped<T: WireScalar>(form: &Form, key: &str) -> Result<Option<T>, ValueError> {
    get(form, key).map(Some)
}

/// Decode a repeated wrapper value.
pub fn get_wrapped_slice<T: WireScalar>(
    form: &Form,
    key: &str,
) -> Result<Vec<Option<T>>, ValueError> {
    Ok(get_slice(form, key)?.into_iter().map(Some).collect())
}

/// Decode a singular enum value from its decimal number.
pub fn get_enum(form: &Form, key: &str) -> Result<i32, ValueError> {
    match form.get(key) {
        None => Ok(0),
        Some(s) => s
            .parse()
            .map_err(|_| ValueError::new("enum", s, key)),
    }
}

/// Decode a repeated enum value.
pub fn get_enum_slice(form: &Form, key: &str) -> Result<Vec<i32>, ValueError> {
    let Some(values) = form.values(key) else {
        return Ok(Vec::new());
    };
    values
        .iter()
        .map(|s| s.parse().map_err(|_| ValueError::new("enum", s, key)))
        .collect()
}

/// Encode a singular value to its wire string.
pub fn format_value<T: WireScalar>(value: &T) -> String {
    value.format_wire()
}

/// Encode a repeated value, one wire string per element.
pub fn format_slice<T: WireScalar>(values: &[T]) -> Vec<String> {
    values.iter().map(T::format_wire).collect()
}

/// Encode a signed integer in the given radix (2..=36).
pub fn format_int_radix(value: i64, radix: u32) -> String {
    if value < 0 {
        // i64::MIN has no positive counterpart; widen before negating.
        format!("-{}", format_uint_radix((value as i128).unsigned_abs() as u64, radix))
    } else {
        format_uint_radix(value as u64, radix)
    }
}

/// Encode an unsigned integer in the given radix (2..=36).
pub fn format_uint_radix(mut value: u64, radix: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    assert!((2..=36).contains(&radix), "radix must be in 2..=36");
    let radix = radix as u64;
    let mut buf = Vec::new();
    loop {
        buf.push(DIGITS[(value % radix) as usize]);
        value /= radix;
        if value == 0 {
            break;
        }
    }
    buf.reverse();
    String::from_utf8(buf).expect("radix digits are ascii")
}
