use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::AppError;
use crate::state::AppState;

/// JWT payload: subject and validity window, nothing else.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// Signing and verification keys derived from the process-wide secret.
/// Rotating the secret invalidates every outstanding token.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig { secret, ttl_minutes } = state.config.jwt.clone();
        Self::new(&secret, ttl_minutes)
    }
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs((ttl_minutes as u64) * 60),
        }
    }

    /// Issues a signed bearer token for `user_id`, expiring `ttl` from now.
    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "token issued");
        Ok(token)
    }

    /// Verifies signature and expiry. The failure signal is uniform: a bad
    /// signature, garbled payload, or expired token all come back as
    /// `Unauthenticated` with no further detail.
    pub fn validate(&self, token: &str) -> Result<Uuid, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AppError::Unauthenticated)?;
        debug!(user_id = %data.claims.sub, "token verified");
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret", 60)
    }

    #[test]
    fn issue_and_validate_roundtrip() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("issue");
        assert_eq!(keys.validate(&token).expect("validate"), user_id);
    }

    #[test]
    fn subject_is_preserved_per_user() {
        let keys = keys();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let token_a = keys.issue(a).expect("issue a");
        let token_b = keys.issue(b).expect("issue b");
        assert_eq!(keys.validate(&token_a).unwrap(), a);
        assert_eq!(keys.validate(&token_b).unwrap(), b);
        assert_ne!(keys.validate(&token_a).unwrap(), b);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        // well past expiry, beyond the default validation leeway
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .expect("encode");
        let err = keys.validate(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtKeys::new("one-secret", 60)
            .issue(Uuid::new_v4())
            .expect("issue");
        let err = JwtKeys::new("other-secret", 60).validate(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let err = keys().validate("not-a-jwt").unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }
}
