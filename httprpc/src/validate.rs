//! Request validation hook.

use httprpc_core::{Validatable, ValidationError};

use crate::options::ValidationCallback;

/// Validate an inbound request message per the configured mode.
///
/// A violation invokes the callback for side effects only and then fails
/// the request; the callback cannot alter the outcome.
pub fn validate_request<M: Validatable>(
    message: &M,
    fail_fast: bool,
    callback: Option<&ValidationCallback>,
) -> Result<(), ValidationError> {
    if let Err(err) = message.validate(fail_fast) {
        if let Some(callback) = callback {
            callback(&err);
        }
        return Err(err);
    }
    Ok(())
}
