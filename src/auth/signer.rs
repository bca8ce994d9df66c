//! Signed session cookie values.
//!
//! The cookie carries an HS256 token keyed by the configured secret. It names the
//! server-side session row and the user it belongs to; the row stays the source of
//! truth, so logout revokes a cookie even before its signature expires.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::MAX_SESSION_HOURS;

const ISSUER: &str = "penwell";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// User the session was issued to.
    pub uid: i64,
    /// Session token, matches `sessions.token`.
    pub sid: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

pub struct SessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionSigner {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn sign(
        &self,
        user_id: i64,
        session_token: &str,
        hours: u64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + TimeDelta::hours(hours.min(MAX_SESSION_HOURS) as i64);
        let claims = SessionClaims {
            uid: user_id,
            sid: session_token.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: ISSUER.to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// Claims of a well-signed, unexpired cookie value. Anything else is `None`.
    pub fn verify(&self, value: &str) -> Option<SessionClaims> {
        match decode::<SessionClaims>(value, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Rejected session cookie: {}", e);
                None
            }
        }
    }
}

/// Random 32-byte hex secret for runs without a configured key.
pub fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
