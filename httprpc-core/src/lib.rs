//! Core transcoding engine for httprpc.
//!
//! This crate provides the shared machinery used by both the server
//! (`httprpc`) and client (`httprpc-client`) crates to map between
//! plain HTTP requests/responses and typed RPC messages.
//!
//! ## Modules
//!
//! - [`template`]: URL path templates with placeholder and catch-all segments
//! - [`schema`]: Message/field schema model driving classification and JSON mapping
//! - [`classify`]: Partitioning of message fields into path/body/query bindings
//! - [`value`]: Scalar and wrapper value conversion to/from wire strings
//! - [`body`]: Request/response body encoding, including raw passthrough shapes
//! - [`error`]: Application error transport over a reserved header
//! - [`chain`]: Ordered middleware composition shared by client and server
//! - [`validate`]: Message validation seam consumed by both sides

mod body;
mod chain;
mod classify;
mod error;
mod schema;
mod template;
mod validate;
mod value;

pub use body::*;
pub use chain::*;
pub use classify::*;
pub use error::*;
pub use schema::*;
pub use template::*;
pub use validate::*;
pub use value::*;

/// Content type emitted for JSON-encoded bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Content type emitted for plain-text error bodies.
pub const PLAIN_TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Reserved header carrying the JSON array of error header names.
///
/// Its presence on a response is the sole marker that the body transports
/// an application error rather than a normal payload.
pub const ERROR_HEADER: &str = "x-httprpc-error";

/// Append every value of `src` onto `tgt`, preserving existing entries.
pub fn copy_headers(tgt: &mut http::HeaderMap, src: &http::HeaderMap) {
    for (key, value) in src {
        tgt.append(key.clone(), value.clone());
    }
}
