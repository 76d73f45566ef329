//! Target resolution.
//!
//! Abstract client targets ("where is this service?") resolve to concrete
//! URLs through a scheme-keyed registry. Resolvers self-register at process
//! startup and are never removed; the registry is the only shared state
//! mutated after startup, so it sits behind a lock with many concurrent
//! readers and occasional writers.
//!
//! The registry is an explicit object. A process-wide instance with the
//! built-in resolvers is available via [`global`] and the free
//! [`resolve_target`], but callers can hold their own registry when they
//! need isolation (tests, multi-tenant processes).

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use url::Url;

/// Errors raised while resolving a target string.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The target does not parse as a URL at all.
    #[error("invalid target {target:?}: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    /// No resolver claims the target's scheme.
    #[error("unsupported scheme in target {target:?}")]
    UnsupportedScheme { target: String },

    /// A resolver was handed a URL outside its claimed scheme.
    #[error("resolver for scheme {scheme:?} cannot resolve {url}")]
    SchemeMismatch { scheme: String, url: Url },
}

/// Resolves a parsed target URL for one scheme.
pub trait Resolver: Send + Sync {
    /// The scheme this resolver claims. The empty string claims targets
    /// given without a scheme.
    fn scheme(&self) -> &str;

    fn resolve(&self, url: &Url) -> Result<Url, ResolveError>;
}

/// Scheme-keyed resolver registry. Register-only: entries are added at
/// startup and never removed; a later registration for the same scheme
/// replaces the earlier one.
pub struct ResolverRegistry {
    entries: RwLock<HashMap<String, Arc<dyn Resolver>>>,
}

impl ResolverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// A registry pre-populated with the built-in resolvers for `""`,
    /// `"http"`, and `"https"`.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(DefaultResolver::new()));
        registry.register(Arc::new(HttpResolver));
        registry.register(Arc::new(HttpsResolver));
        registry
    }

    pub fn register(&self, resolver: Arc<dyn Resolver>) {
        let scheme = resolver.scheme().to_string();
        tracing::debug!(scheme = %scheme, "registering resolver");
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(scheme, resolver);
    }

    pub fn lookup(&self, scheme: &str) -> Option<Arc<dyn Resolver>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(scheme).cloned()
    }

    /// Resolve `target` to a concrete URL.
    ///
    /// Precedence: a caller-supplied resolver whose claimed scheme matches
    /// the target's scheme wins over the registry entry for that scheme; a
    /// caller resolver with a different scheme is ignored. A scheme nobody
    /// claims fails with the original target attached.
    pub fn resolve_target(
        &self,
        caller: Option<&dyn Resolver>,
        target: &str,
    ) -> Result<Url, ResolveError> {
        let (scheme, url) = parse_target(target)?;

        if let Some(caller) = caller {
            if caller.scheme() == scheme {
                return caller.resolve(&url);
            }
        }

        match self.lookup(&scheme) {
            Some(resolver) => resolver.resolve(&url),
            None => Err(ResolveError::UnsupportedScheme {
                target: target.to_string(),
            }),
        }
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide registry, pre-populated with the built-ins.
pub fn global() -> &'static ResolverRegistry {
    static GLOBAL: LazyLock<ResolverRegistry> = LazyLock::new(ResolverRegistry::with_builtins);
    &GLOBAL
}

/// Resolve `target` against the process-wide registry.
pub fn resolve_target(caller: Option<&dyn Resolver>, target: &str) -> Result<Url, ResolveError> {
    global().resolve_target(caller, target)
}

/// Parse a target into its claimed scheme and a concrete URL.
///
/// `Url` cannot represent a scheme-less target, so targets like
/// `"127.0.0.1:8080"` are re-parsed with a provisional `http://` prefix
/// and reported under the empty scheme; the empty-scheme resolver decides
/// the final scheme.
fn parse_target(target: &str) -> Result<(String, Url), ResolveError> {
    match Url::parse(target) {
        Ok(url) => Ok((url.scheme().to_string(), url)),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let prefixed = format!("http://{target}");
            let url = Url::parse(&prefixed).map_err(|source| ResolveError::InvalidTarget {
                target: target.to_string(),
                source,
            })?;
            Ok((String::new(), url))
        }
        Err(source) => Err(ResolveError::InvalidTarget {
            target: target.to_string(),
            source,
        }),
    }
}

/// Built-in resolver for scheme-less targets: passes every component
/// through and substitutes a concrete scheme, `"http"` unless overridden.
pub struct DefaultResolver {
    http_scheme: String,
}

impl DefaultResolver {
    pub fn new() -> Self {
        Self {
            http_scheme: "http".to_string(),
        }
    }

    /// Override the scheme substituted into resolved URLs.
    pub fn with_scheme(scheme: impl Into<String>) -> Self {
        Self {
            http_scheme: scheme.into(),
        }
    }
}

impl Default for DefaultResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for DefaultResolver {
    fn scheme(&self) -> &str {
        ""
    }

    fn resolve(&self, url: &Url) -> Result<Url, ResolveError> {
        let mut out = url.clone();
        if out.scheme() != self.http_scheme {
            out.set_scheme(&self.http_scheme)
                .map_err(|_| ResolveError::SchemeMismatch {
                    scheme: self.http_scheme.clone(),
                    url: url.clone(),
                })?;
        }
        Ok(out)
    }
}

macro_rules! passthrough_resolver {
    ($name:ident, $scheme:literal) => {
        /// Built-in passthrough resolver: validates the scheme and copies
        /// every URL component through unchanged.
        pub struct $name;

        impl Resolver for $name {
            fn scheme(&self) -> &str {
                $scheme
            }

            fn resolve(&self, url: &Url) -> Result<Url, ResolveError> {
                if url.scheme() != $scheme {
                    return Err(ResolveError::SchemeMismatch {
                        scheme: $scheme.to_string(),
                        url: url.clone(),
                    });
                }
                Ok(url.clone())
            }
        }
    };
}

passthrough_resolver!(HttpResolver, "http");
passthrough_resolver!(HttpsResolver, "https");
