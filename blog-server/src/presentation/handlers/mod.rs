pub mod auth;
pub mod follow;
pub mod posts;
pub mod system;

use actix_web::web::Bytes;
use serde::Serialize;

use crate::domain::error::DomainError;

/// Renders a page document into the body that gets sent (and cached).
pub(crate) fn render<T: Serialize>(page: &T) -> Result<Bytes, DomainError> {
    serde_json::to_vec(page)
        .map(Bytes::from)
        .map_err(|e| DomainError::Internal(format!("failed to render page: {e}")))
}
