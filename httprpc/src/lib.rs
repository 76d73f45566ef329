//! Server-side HTTP transcoding for httprpc.
//!
//! This crate maps plain HTTP requests onto typed RPC handlers and typed
//! responses back onto HTTP, using the shared machinery in `httprpc-core`.
//! It performs no routing and no I/O of its own: the host stack matches a
//! request to a route and hands this crate an `http::Request<Bytes>`; a
//! finished `http::Response<Bytes>` comes back.
//!
//! ## Modules
//!
//! - [`request`]: Path/query/body extraction per the precomputed binding
//! - [`response`]: Response body encoding and error rendering
//! - [`validate`]: The request validation hook
//! - [`options`]: Server configuration consumed by generated services
//!
//! ## Example
//!
//! ```ignore
//! use httprpc::{request, response, ServerOptions};
//! use httprpc_core::{ParameterBinding, PathTemplate};
//!
//! // At construction: compile the route and classify the message.
//! let template = PathTemplate::parse("/v1/users/{id}")?;
//! let binding = ParameterBinding::classify(&GET_USER_SCHEMA, &template, "")?;
//!
//! // Per request: pull each bound input.
//! let path = request::path_form(&template, req.uri().path())?;
//! let query = request::query_form(&req);
//! ```

pub mod options;
pub mod request;
pub mod response;
pub mod validate;

pub use options::{ErrorEncoder, ServerOptions, ValidationCallback};
pub use request::RequestError;
pub use response::ResponseError;
pub use validate::validate_request;

// Re-export the core types generated services need.
pub use httprpc_core::{
    BodyBinding, Chain, ClassifyError, Form, HttpBody, Invoker, JsonDecodeOptions,
    JsonEncodeOptions, MessageSchema, Middleware, ParameterBinding, PathTemplate, RawHttpRequest,
    RawHttpResponse, RouteTable, TemplateError, TranscodeError, TransportableError, Validatable,
    ValidationError,
};
