use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::types::{Identity, PersonnelRef, Role};

/// JWT claims for an authenticated caller. Credentials themselves are issued
/// and checked by the identity provider; this service only reads the resolved
/// identity out of the token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personnel_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(identity: &Identity) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: identity.user_id,
            role: identity.role,
            personnel_id: identity.personnel.map(|p| p.id),
            institution_id: identity.personnel.map(|p| p.institution_id),
            student_id: identity.student_id,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn into_identity(self) -> Identity {
        let personnel = match (self.personnel_id, self.institution_id) {
            (Some(id), Some(institution_id)) => Some(PersonnelRef { id, institution_id }),
            _ => None,
        };
        Identity { user_id: self.sub, role: self.role, personnel, student_id: self.student_id }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn issue_token(identity: &Identity) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &Claims::new(identity), &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_token(token: &str) -> Result<Claims, JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_identity() {
        let identity = Identity::personnel(
            Uuid::new_v4(),
            PersonnelRef { id: Uuid::new_v4(), institution_id: Uuid::new_v4() },
        );

        let token = issue_token(&identity).expect("dev config carries a secret");
        let claims = validate_token(&token).unwrap();
        let restored = claims.into_identity();

        assert_eq!(restored.user_id, identity.user_id);
        assert_eq!(restored.role, Role::Personnel);
        assert_eq!(restored.personnel, identity.personnel);
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(validate_token("not-a-jwt"), Err(JwtError::InvalidToken(_))));
    }
}
