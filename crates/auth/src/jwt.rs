//! Bearer token decoding (HS256).

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::claims::{validate_claims, JwtClaims, TokenValidationError};

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("malformed or badly signed token: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Turns a raw bearer token into trusted claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError>;
}

/// Shared-secret validator.
///
/// Expiry lives in the custom `issued_at`/`expires_at` claims, so the
/// registered `exp` check of the jwt library is switched off and
/// [`validate_claims`] does the time-window check instead.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};
    use pricebook_core::{TenantId, UserId};

    use crate::Role;

    fn mint(secret: &str, claims: &JwtClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn fresh_claims() -> JwtClaims {
        let now = Utc::now();
        JwtClaims {
            sub: UserId::new(),
            tenant_id: TenantId::new(),
            roles: vec![Role::new("admin")],
            issued_at: now - Duration::seconds(1),
            expires_at: now + Duration::minutes(10),
        }
    }

    #[test]
    fn decodes_token_signed_with_same_secret() {
        let claims = fresh_claims();
        let token = mint("s3cret", &claims);

        let decoded = Hs256JwtValidator::new("s3cret").validate(&token, Utc::now()).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = mint("other", &fresh_claims());
        let err = Hs256JwtValidator::new("s3cret").validate(&token, Utc::now()).unwrap_err();
        assert!(matches!(err, JwtError::Decode(_)));
    }

    #[test]
    fn rejects_expired_token() {
        let claims = fresh_claims();
        let token = mint("s3cret", &claims);
        let later = claims.expires_at + Duration::seconds(1);

        let err = Hs256JwtValidator::new("s3cret").validate(&token, later).unwrap_err();
        assert!(matches!(err, JwtError::Claims(TokenValidationError::Expired)));
    }
}
