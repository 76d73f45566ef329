//! URL path templates.
//!
//! A template is a `/`-separated pattern whose segments are either literals,
//! single-segment placeholders, or catch-all placeholders that consume the
//! remainder of the path:
//!
//! - `{name}` binds exactly one path segment
//! - `{name...}` binds from that segment to the end of the path
//! - legacy forms `:name` and `*name` are accepted as equivalents, with
//!   `\:` escaping a literal colon inside a literal segment
//!
//! Templates are compiled once at construction time; every malformed
//! pattern is rejected here, never while serving a request.

use std::collections::{HashMap, HashSet};

use http::Method;

/// Errors raised while compiling a template or matching a concrete path.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Placeholder with no name, e.g. `{}` or a bare `:`.
    #[error("empty placeholder name in segment {0:?}")]
    EmptyName(String),

    /// More than one wildcard marker inside a single segment.
    #[error("segment {0:?} contains more than one wildcard marker")]
    MultipleWildcards(String),

    /// A wildcard marker that does not start its segment.
    #[error("wildcard must start its segment in {0:?}")]
    EmbeddedWildcard(String),

    /// `\` followed by anything other than `:`.
    #[error("invalid escape sequence in segment {0:?}")]
    InvalidEscape(String),

    /// `{` without a matching `}` at the end of the segment.
    #[error("unclosed placeholder in segment {0:?}")]
    UnclosedBrace(String),

    /// The same placeholder name used twice in one template.
    #[error("duplicate placeholder name {0:?}")]
    DuplicateName(String),

    /// A catch-all placeholder followed by more segments.
    #[error("catch-all placeholder {0:?} must be the last segment")]
    CatchAllNotLast(String),

    /// A concrete path that does not match the template shape.
    #[error("path {path:?} does not match template {template:?}")]
    MismatchedPath { template: String, path: String },

    /// A second registration of the same method/template pair.
    #[error("duplicate route {method} {template:?}")]
    DuplicateRoute { method: String, template: String },
}

/// One compiled template segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Matches exactly this string (escapes already resolved).
    Literal(String),
    /// Binds exactly one path segment to the named value.
    Param(String),
    /// Binds the remaining path suffix, embedded `/` included.
    CatchAll(String),
}

/// A compiled URL path template.
///
/// Built once from a template string, immutable afterwards, and shared by
/// all requests to that route.
#[derive(Clone, Debug)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template string.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut seen = HashSet::new();
        for part in template.split('/') {
            let segment = parse_segment(part)?;
            if let Segment::Param(name) | Segment::CatchAll(name) = &segment {
                if !seen.insert(name.clone()) {
                    return Err(TemplateError::DuplicateName(name.clone()));
                }
                if let Some(Segment::CatchAll(prev)) = segments.last() {
                    return Err(TemplateError::CatchAllNotLast(prev.clone()));
                }
            } else if let Some(Segment::CatchAll(prev)) = segments.last() {
                return Err(TemplateError::CatchAllNotLast(prev.clone()));
            }
            segments.push(segment);
        }
        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// The original template string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The compiled segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in appearance order, each tagged catch-all or not.
    pub fn param_names(&self) -> impl Iterator<Item = (&str, bool)> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Literal(_) => None,
            Segment::Param(name) => Some((name.as_str(), false)),
            Segment::CatchAll(name) => Some((name.as_str(), true)),
        })
    }

    /// Extract placeholder values from a concrete path.
    ///
    /// Walks both sequences segment by segment. A catch-all binds the
    /// remaining suffix of the path verbatim, without re-splitting on `/`.
    pub fn extract(&self, path: &str) -> Result<HashMap<String, String>, TemplateError> {
        let mismatch = || TemplateError::MismatchedPath {
            template: self.raw.clone(),
            path: path.to_string(),
        };
        let parts: Vec<&str> = path.split('/').collect();
        let mut values = HashMap::new();
        let mut idx = 0;
        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => {
                    if parts.get(idx) != Some(&lit.as_str()) {
                        return Err(mismatch());
                    }
                    idx += 1;
                }
                Segment::Param(name) => {
                    let part = parts.get(idx).ok_or_else(mismatch)?;
                    values.insert(name.clone(), (*part).to_string());
                    idx += 1;
                }
                Segment::CatchAll(name) => {
                    if idx >= parts.len() {
                        return Err(mismatch());
                    }
                    values.insert(name.clone(), parts[idx..].join("/"));
                    idx = parts.len();
                }
            }
        }
        if idx != parts.len() {
            return Err(mismatch());
        }
        Ok(values)
    }

    /// Substitute placeholder values back into the template.
    ///
    /// Values are inserted verbatim, with no additional escaping. An
    /// unresolved placeholder emits an empty segment.
    pub fn expand(&self, values: &HashMap<String, String>) -> String {
        let parts: Vec<&str> = self
            .segments
            .iter()
            .map(|s| match s {
                Segment::Literal(lit) => lit.as_str(),
                Segment::Param(name) | Segment::CatchAll(name) => {
                    values.get(name).map(String::as_str).unwrap_or("")
                }
            })
            .collect();
        parts.join("/")
    }
}

fn parse_segment(part: &str) -> Result<Segment, TemplateError> {
    if let Some(rest) = part.strip_prefix('{') {
        let Some(inner) = rest.strip_suffix('}') else {
            return Err(TemplateError::UnclosedBrace(part.to_string()));
        };
        let (name, catch_all) = match inner.strip_suffix("...") {
            Some(name) => (name, true),
            None => (inner, false),
        };
        return wildcard(part, name, catch_all);
    }
    if let Some(name) = part.strip_prefix(':') {
        return wildcard(part, name, false);
    }
    if let Some(name) = part.strip_prefix('*') {
        return wildcard(part, name, true);
    }
    // Literal segment: resolve `\:` escapes, reject stray wildcards.
    let mut lit = String::with_capacity(part.len());
    let mut chars = part.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(':') => lit.push(':'),
                _ => return Err(TemplateError::InvalidEscape(part.to_string())),
            },
            ':' | '*' => return Err(TemplateError::EmbeddedWildcard(part.to_string())),
            '{' | '}' => return Err(TemplateError::UnclosedBrace(part.to_string())),
            _ => lit.push(c),
        }
    }
    Ok(Segment::Literal(lit))
}

fn wildcard(part: &str, name: &str, catch_all: bool) -> Result<Segment, TemplateError> {
    if name.is_empty() {
        return Err(TemplateError::EmptyName(part.to_string()));
    }
    if name.contains([':', '*', '{', '}', '.', '/']) {
        return Err(TemplateError::MultipleWildcards(part.to_string()));
    }
    if catch_all {
        Ok(Segment::CatchAll(name.to_string()))
    } else {
        Ok(Segment::Param(name.to_string()))
    }
}

/// A registry of compiled routes, detecting duplicate registrations.
///
/// Registration is fallible rather than panicking: a second registration
/// of the same method/template pair returns [`TemplateError::DuplicateRoute`].
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<(Method, String), PathTemplate>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and register a route.
    pub fn register(
        &mut self,
        method: Method,
        template: &str,
    ) -> Result<&PathTemplate, TemplateError> {
        let key = (method.clone(), template.to_string());
        if self.routes.contains_key(&key) {
            return Err(TemplateError::DuplicateRoute {
                method: method.to_string(),
                template: template.to_string(),
            });
        }
        let compiled = PathTemplate::parse(template)?;
        Ok(self.routes.entry(key).or_insert(compiled))
    }

    /// Look up a previously registered route.
    pub fn get(&self, method: &Method, template: &str) -> Option<&PathTemplate> {
        self.routes.get(&(method.clone(), template.to_string()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
