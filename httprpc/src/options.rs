//! Server configuration.
//!
//! Mirrors the client configuration surface, with an error encoder in
//! place of the client's decoder/factory pair. Generated services consume
//! one [`ServerOptions`] at construction; everything derived from it
//! (middleware chain, route table, bindings) is built once and shared
//! read-only across requests.

use std::sync::Arc;

use bytes::Bytes;
use http::Response;

use httprpc_core::{
    Chain, ErrorEnvelope, Invoker, JsonDecodeOptions, JsonEncodeOptions, Middleware,
    TransportableError, ValidationError,
};

/// Invoked when request validation fails, for side effects only.
pub type ValidationCallback = Arc<dyn Fn(&ValidationError) + Send + Sync>;

/// Turns an application error into its wire envelope.
pub type ErrorEncoder = Arc<dyn Fn(&dyn TransportableError) -> ErrorEnvelope + Send + Sync>;

/// Builder-style server configuration, generic over the transport error
/// type of the host stack's handlers.
pub struct ServerOptions<E> {
    encode: JsonEncodeOptions,
    decode: JsonDecodeOptions,
    error_encoder: ErrorEncoder,
    middlewares: Chain<E>,
    fail_fast: bool,
    on_validation_error: Option<ValidationCallback>,
}

impl<E> Default for ServerOptions<E> {
    fn default() -> Self {
        Self {
            encode: JsonEncodeOptions::default(),
            decode: JsonDecodeOptions::default(),
            error_encoder: Arc::new(httprpc_core::encode_error),
            middlewares: Chain::new(),
            fail_fast: false,
            on_validation_error: None,
        }
    }
}

impl<E> ServerOptions<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode_options(mut self, options: JsonEncodeOptions) -> Self {
        self.encode = options;
        self
    }

    pub fn decode_options(mut self, options: JsonDecodeOptions) -> Self {
        self.decode = options;
        self
    }

    /// Replace the default error encoder.
    pub fn error_encoder(mut self, encoder: ErrorEncoder) -> Self {
        self.error_encoder = encoder;
        self
    }

    /// Append a middleware. The first middleware added is outermost.
    pub fn middleware(mut self, middleware: Arc<dyn Middleware<E>>) -> Self {
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

    pub fn json_encode(&self) -> &JsonEncodeOptions {
        &self.encode
    }

    pub fn json_decode(&self) -> &JsonDecodeOptions {
        &self.decode
    }

    pub fn is_fail_fast(&self) -> bool {
        self.fail_fast
    }

    pub fn validation_callback(&self) -> Option<&ValidationCallback> {
        self.on_validation_error.as_ref()
    }

    /// Compose the configured middleware chain around `terminal`. Called
    /// once per service at construction time.
    pub fn apply_middlewares(&self, terminal: Invoker<E>) -> Invoker<E> {
        self.middlewares.compose(terminal)
    }

    /// Encode `err` through the configured encoder and render it as the
    /// HTTP response.
    pub fn write_error(&self, err: &dyn TransportableError) -> Response<Bytes> {
        crate::response::apply_envelope((self.error_encoder)(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use httprpc_core::{TranscodeError, ERROR_HEADER};
    use serde_json::json;

    #[test]
    fn test_default_error_encoder_round_trip() {
        let options: ServerOptions<String> = ServerOptions::new();
        let err = TranscodeError::new(StatusCode::CONFLICT, json!({"reason": "busy"}));
        let response = options.write_error(&err);
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(response.headers().contains_key(ERROR_HEADER));
    }

    #[test]
    fn test_custom_error_encoder_applies() {
        // An encoder that hides internals behind a fixed envelope.
        let options: ServerOptions<String> =
            ServerOptions::new().error_encoder(Arc::new(|_err| {
                httprpc_core::encode_error(&TranscodeError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({"message": "try again later"}),
                ))
            }));
        let err = TranscodeError::new(StatusCode::IM_A_TEAPOT, json!({"secret": true}));
        let response = options.write_error(&err);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_apply_middlewares_composes_once() {
        use std::sync::Mutex;

        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        struct Tag {
            log: Arc<Mutex<Vec<&'static str>>>,
            name: &'static str,
        }
        impl Middleware<String> for Tag {
            fn wrap(&self, next: Invoker<String>) -> Invoker<String> {
                let log = self.log.clone();
                let name = self.name;
                Arc::new(move |req| {
                    log.lock().unwrap().push(name);
                    next(req)
                })
            }
        }

        let options: ServerOptions<String> = ServerOptions::new()
            .middleware(Arc::new(Tag {
                log: log.clone(),
                name: "outer",
            }))
            .middleware(Arc::new(Tag {
                log: log.clone(),
                name: "inner",
            }));

        let terminal: Invoker<String> =
            Arc::new(|_req| Box::pin(async { Ok(Response::new(Bytes::new())) }));
        let invoker = options.apply_middlewares(terminal);
        invoker(http::Request::new(Bytes::new())).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
    }
}
