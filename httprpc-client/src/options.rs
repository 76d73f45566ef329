//! Client configuration and the resolved client handle.
//!
//! [`ClientOptions`] collects everything a generated client needs: the
//! transport invoker, JSON marshal/unmarshal settings, the error factory,
//! an ordered middleware list, and the validation knobs. [`Client::new`]
//! resolves the target and composes the middleware chain exactly once;
//! the resulting handle is immutable and cheap to share across calls.

use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, Uri};
use url::Url;

use httprpc_core::{
    BodyError, Chain, ErrorFactory, Invoker, JsonDecodeOptions, JsonEncodeOptions, Middleware,
    TranscodeError, TransportableError, Validatable, ValidationError,
};

use crate::decoder;
use crate::resolver::{self, ResolveError, Resolver};

/// Invoked when request validation fails, for side effects (logging,
/// metrics) only.
pub type ValidationCallback = Arc<dyn Fn(&ValidationError) + Send + Sync>;

/// Errors surfaced by a client call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no transport configured")]
    NoTransport,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Body(#[from] BodyError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid request uri {0:?}")]
    InvalidUri(String),

    /// The transport failed before a response was produced.
    #[error("transport: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server transported an application error.
    #[error("rpc: {0}")]
    Rpc(Box<dyn TransportableError>),
}

/// Builder-style configuration for [`Client`].
pub struct ClientOptions {
    transport: Option<Invoker<ClientError>>,
    encode: JsonEncodeOptions,
    decode: JsonDecodeOptions,
    error_factory: ErrorFactory,
    middlewares: Vec<Arc<dyn Middleware<ClientError>>>,
    fail_fast: bool,
    on_validation_error: Option<ValidationCallback>,
    resolver: Option<Arc<dyn Resolver>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            transport: None,
            encode: JsonEncodeOptions::default(),
            decode: JsonDecodeOptions::default(),
            error_factory: Arc::new(|| Box::new(TranscodeError::empty())),
            middlewares: Vec::new(),
            fail_fast: false,
            on_validation_error: None,
            resolver: None,
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The terminal invoker that actually performs HTTP I/O. Required.
    pub fn transport(mut self, transport: Invoker<ClientError>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn encode_options(mut self, options: JsonEncodeOptions) -> Self {
        self.encode = options;
        self
    }

    pub fn decode_options(mut self, options: JsonDecodeOptions) -> Self {
        self.decode = options;
        self
    }

    /// Factory for the application error type decoded from failed calls.
    pub fn error_factory(mut self, factory: ErrorFactory) -> Self {
        self.error_factory = factory;
        self
    }

    /// Append a middleware. The first middleware added is outermost.
    pub fn middleware(mut self, middleware: Arc<dyn Middleware<ClientError>>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Stop request validation at the first violation.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn on_validation_error(mut self, callback: ValidationCallback) -> Self {
        self.on_validation_error = Some(callback);
        self
    }

    /// A caller-level resolver consulted before the global registry when
    /// its claimed scheme matches the target.
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

/// An immutable client handle for one target.
pub struct Client {
    base_url: Url,
    invoker: Invoker<ClientError>,
    encode: JsonEncodeOptions,
    decode: JsonDecodeOptions,
    error_factory: ErrorFactory,
    fail_fast: bool,
    on_validation_error: Option<ValidationCallback>,
}

impl Client {
    /// Resolve `target` and compose the middleware chain around the
    /// transport. Both happen once here, never per call.
    pub fn new(target: &str, options: ClientOptions) -> Result<Self, ClientError> {
        let transport = options.transport.ok_or(ClientError::NoTransport)?;

        let caller = options.resolver.as_deref();
        let base_url = resolver::resolve_target(caller, target)?;

        let mut chain = Chain::new();
        for middleware in options.middlewares {
            chain.push(middleware);
        }
        let invoker = chain.compose(transport);

        Ok(Self {
            base_url,
            invoker,
            encode: options.encode,
            decode: options.decode,
            error_factory: options.error_factory,
            fail_fast: options.fail_fast,
            on_validation_error: options.on_validation_error,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn encode_options(&self) -> &JsonEncodeOptions {
        &self.encode
    }

    pub fn decode_options(&self) -> &JsonDecodeOptions {
        &self.decode
    }

    /// Build an absolute request URI from a path (with optional query)
    /// relative to the resolved base URL.
    pub fn request_uri(&self, path_and_query: &str) -> Result<Uri, ClientError> {
        let joined = self
            .base_url
            .join(path_and_query)
            .map_err(|_| ClientError::InvalidUri(path_and_query.to_string()))?;
        joined
            .as_str()
            .parse()
            .map_err(|_| ClientError::InvalidUri(joined.into()))
    }

    /// Validate a request message per the configured mode. A violation
    /// invokes the callback for side effects and then fails the call.
    pub fn validate<M: Validatable>(&self, message: &M) -> Result<(), ClientError> {
        if let Err(err) = message.validate(self.fail_fast) {
            if let Some(callback) = &self.on_validation_error {
                callback(&err);
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Run `request` through the composed chain and transport, then check
    /// the response for a transported application error.
    pub async fn call(&self, request: Request<Bytes>) -> Result<Response<Bytes>, ClientError> {
        tracing::debug!(method = %request.method(), uri = %request.uri(), "sending request");
        let response = (self.invoker)(request).await?;
        if let Some(err) = decoder::check_error(&response, &*self.error_factory) {
            return Err(ClientError::Rpc(err));
        }
        Ok(response)
    }
}
