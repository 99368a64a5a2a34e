//! Business logic, one service per resource family. Handlers stay thin and
//! translate ServiceError into HTTP responses via ApiError.

pub mod files;
pub mod institution;
pub mod letter;
pub mod person;
pub mod signature;
pub mod submission;

use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::access::resolve_for_personnel;
use crate::database::store::{Store, StoreError};
use crate::types::Identity;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation { field: field.into(), message: message.into() }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Resolve the institution an institution-owned mutation targets. Admin
/// callers must name the institution explicitly; staff must hold write
/// permission, may only target institutions inside their resolved scope, and
/// default to their own institution when none is requested.
pub(crate) async fn write_target(
    store: &dyn Store,
    identity: &Identity,
    requested: Option<Uuid>,
) -> ServiceResult<Uuid> {
    if identity.is_admin() {
        return requested.ok_or_else(|| {
            ServiceError::validation("institutionId", "institution is required")
        });
    }
    let personnel = identity
        .personnel
        .as_ref()
        .ok_or_else(|| ServiceError::Forbidden("Staff role required".to_string()))?;
    let access = resolve_for_personnel(store, personnel).await?;
    if !access.can_write {
        return Err(ServiceError::Forbidden(
            "Your institution may not author resources".to_string(),
        ));
    }
    match requested {
        Some(id) if access.scope.allows(id) => Ok(id),
        Some(_) => {
            Err(ServiceError::Forbidden("Institution is outside your scope".to_string()))
        }
        None => Ok(access.institution_id),
    }
}

/// Opaque link token for public signature and letter-view URLs.
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Six digit verification code, zero padded.
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn tokens_are_unique_and_opaque() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }
}
