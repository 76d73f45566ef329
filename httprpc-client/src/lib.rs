//! Client-side HTTP transcoding for httprpc.
//!
//! This crate turns typed RPC calls into plain HTTP requests and maps the
//! responses back, using the shared machinery in `httprpc-core`. It does
//! not perform HTTP I/O itself: the caller supplies a transport as an
//! [`Invoker`](httprpc_core::Invoker) (typically a thin wrapper over a
//! hyper/reqwest client), and everything here stays transport-agnostic.
//!
//! ## Modules
//!
//! - [`resolver`]: Scheme-keyed registry mapping abstract targets to URLs
//! - [`encoder`]: Outgoing request bodies (JSON and raw passthrough)
//! - [`decoder`]: Incoming response bodies and transported errors
//! - [`options`]: Client configuration and the resolved [`Client`] handle
//!
//! ## Example
//!
//! ```ignore
//! use httprpc_client::{Client, ClientOptions};
//!
//! let client = Client::new(
//!     "http://localhost:3000",
//!     ClientOptions::new().transport(my_transport),
//! )?;
//!
//! let mut request = http::Request::new(bytes::Bytes::new());
//! *request.uri_mut() = client.request_uri("/v1/users/42?verbose=true")?;
//! let response = client.call(request).await?;
//! ```

pub mod decoder;
pub mod encoder;
pub mod options;
pub mod resolver;

pub use decoder::{check_error, decode_message, decode_raw_body, decode_raw_response};
pub use encoder::{encode_message, encode_raw_body, encode_raw_request};
pub use options::{Client, ClientError, ClientOptions, ValidationCallback};
pub use resolver::{
    DefaultResolver, HttpResolver, HttpsResolver, ResolveError, Resolver, ResolverRegistry,
    resolve_target,
};

// Re-export the core types generated clients need.
pub use httprpc_core::{
    Chain, ErrorFactory, HttpBody, Invoker, JsonDecodeOptions, JsonEncodeOptions, Middleware,
    RawHttpRequest, RawHttpResponse, TranscodeError, TransportableError, Validatable,
    ValidationError,
};
