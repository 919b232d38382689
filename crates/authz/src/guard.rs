use crate::{AuthzError, Result};

/// Allow the request only if `user_id` owns the resource.
///
/// Resources without a recorded owner are treated as owned by nobody.
pub fn ensure_owner(owner: Option<&str>, user_id: &str) -> Result<()> {
    match owner {
        Some(owner) if owner == user_id => Ok(()),
        _ => {
            tracing::debug!(owner = ?owner, user_id, "ownership check failed");
            Err(AuthzError::NotOwner)
        }
    }
}
