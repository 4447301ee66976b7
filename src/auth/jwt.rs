use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{
    config::JwtConfig,
    error::{AppError, AppResult},
    state::AppState,
};

/// Lifetime of every issued token.
pub const TOKEN_TTL: Duration = Duration::hours(72);

/// Signs and verifies identity tokens. Built once from config at startup and
/// shared read-only through [`AppState`].
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> anyhow::Result<Self> {
        anyhow::ensure!(!secret.is_empty(), "jwt signing secret must not be empty");

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn from_config(cfg: &JwtConfig) -> anyhow::Result<Self> {
        Self::new(cfg.secret.as_bytes())
    }

    pub fn issue(&self, user_id: Uuid, email: &str, username: &str) -> AppResult<String> {
        self.issue_at(user_id, email, username, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        username: &str,
        issued_at: OffsetDateTime,
    ) -> AppResult<String> {
        let exp = (issued_at + TOKEN_TTL).unix_timestamp().max(0) as usize;
        let claims = Claims {
            user_id,
            email: email.to_string(),
            username: username.to_string(),
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("sign jwt")?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Checks signature and expiry. Any failure is reported as
    /// `Unauthenticated`; the underlying cause is only logged at debug.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            AppError::Unauthenticated("invalid or expired token".into())
        })?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::new(secret.as_bytes()).expect("keys")
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = make_keys("dev-secret");
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, "a@x.com", "alice").expect("issue");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn expiry_is_seventy_two_hours_out() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc();
        let token = keys.issue_at(Uuid::new_v4(), "a@x.com", "alice", now).unwrap();
        let claims = keys.verify(&token).unwrap();
        let expected = (now + Duration::hours(72)).unix_timestamp() as usize;
        assert_eq!(claims.exp, expected);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = make_keys("dev-secret");
        let issued = OffsetDateTime::now_utc() - Duration::hours(73);
        let token = keys.issue_at(Uuid::new_v4(), "a@x.com", "alice", issued).unwrap();
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn no_leeway_past_expiry() {
        let keys = make_keys("dev-secret");
        // expired 5 seconds ago, well inside the library's default 60s leeway
        let issued = OffsetDateTime::now_utc() - Duration::hours(72) - Duration::seconds(5);
        let token = keys.issue_at(Uuid::new_v4(), "a@x.com", "alice", issued).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let ours = make_keys("our-secret");
        let theirs = make_keys("their-secret");
        let token = theirs.issue(Uuid::new_v4(), "a@x.com", "alice").unwrap();
        let err = ours.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn malformed_token_is_rejected() {
        let keys = make_keys("dev-secret");
        for token in ["", "abc", "a.b.c", "Bearer x.y.z"] {
            assert!(keys.verify(token).is_err(), "accepted {token:?}");
        }
    }

    #[test]
    fn token_without_exp_is_rejected() {
        #[derive(serde::Serialize)]
        struct NoExp {
            user_id: Uuid,
            email: String,
            username: String,
        }
        let secret = "dev-secret";
        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoExp {
                user_id: Uuid::new_v4(),
                email: "a@x.com".into(),
                username: "alice".into(),
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        assert!(make_keys(secret).verify(&token).is_err());
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let secret = "dev-secret";
        let claims = Claims {
            user_id: Uuid::new_v4(),
            email: "a@x.com".into(),
            username: "alice".into(),
            exp: (OffsetDateTime::now_utc() + Duration::hours(1)).unix_timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        assert!(make_keys(secret).verify(&token).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(JwtKeys::new(b"").is_err());
    }
}
