//! Signature validation of discovered methods.

use crate::error::{ChainError, ChainResult};
use crate::layer::LayerMethod;

/// Accepts a chain method only if it declares no result values.
///
/// Layers communicate through the Control Block and the continuation handle,
/// so any return value, including a `Result`, is rejected.
pub fn validate<C>(method: &LayerMethod<C>) -> ChainResult<()> {
    if method.results().is_empty() {
        return Ok(());
    }
    Err(ChainError::InvalidSignature {
        type_name: method.layer().type_name(),
        method: method.name().to_owned(),
        results: method.results().to_vec(),
    })
}
