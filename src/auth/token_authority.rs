//! HS256 bearer token minting and verification.
//!
//! The service holds one shared admin key. Its SHA-256 digest is both the
//! value an issuing caller must reproduce and the HMAC key tokens are
//! signed with, so any holder of the admin key can verify a token offline.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::AuthError;
use crate::domain::Token;

/// Lifetime of a minted token. Long enough that producers never need to
/// re-issue.
const TOKEN_LIFETIME_DAYS: i64 = 365 * 10;

/// Registered JWT claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    iss: String,
    sub: String,
    aud: Vec<String>,
    iat: i64,
    exp: i64,
}

/// Mints and verifies bearer tokens scoped to a single user ID.
pub struct TokenAuthority {
    issuer: String,
    secret_digest: [u8; 32],
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenAuthority {
    /// Creates an authority for the service reachable at `public_url`,
    /// trusting `admin_key` as the shared secret.
    ///
    /// `public_url` is used verbatim as both issuer and audience.
    #[must_use]
    pub fn new(public_url: &str, admin_key: &str) -> Self {
        let secret_digest = digest(admin_key);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256];
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[public_url]);
        validation.set_audience(&[public_url]);

        Self {
            issuer: public_url.to_string(),
            secret_digest,
            encoding_key: EncodingKey::from_secret(&secret_digest),
            decoding_key: DecodingKey::from_secret(&secret_digest),
            validation,
        }
    }

    /// Returns the issuer (and audience) URL.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Mints a token for `user_id` if `presented_key` is the admin key.
    ///
    /// # Errors
    ///
    /// - [`AuthError::KeyMismatch`] if the key digest differs.
    /// - [`AuthError::EmptySubject`] if `user_id` is empty.
    /// - [`AuthError::Signing`] if the JWT cannot be encoded.
    pub fn mint(&self, user_id: &str, presented_key: &str) -> Result<Token, AuthError> {
        if digest(presented_key) != self.secret_digest {
            return Err(AuthError::KeyMismatch);
        }
        if user_id.is_empty() {
            return Err(AuthError::EmptySubject);
        }

        let now = Utc::now();
        let expires = now + Duration::days(TOKEN_LIFETIME_DAYS);
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            aud: vec![self.issuer.clone()],
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        let raw_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::Signing)?;

        Ok(Token {
            raw_token,
            issuer: claims.iss,
            subject: claims.sub,
            audience: claims.aud,
            issued_at: now.timestamp_millis(),
            expires_at: expires.timestamp_millis(),
        })
    }

    /// Verifies `token` and returns the user ID it is scoped to.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidToken`] for a bad signature, algorithm,
    ///   issuer, audience or expiry.
    /// - [`AuthError::EmptySubject`] if the subject claim is empty.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        if data.claims.sub.is_empty() {
            return Err(AuthError::EmptySubject);
        }
        Ok(data.claims.sub)
    }
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

fn digest(input: &str) -> [u8; 32] {
    Sha256::digest(input.as_bytes()).into()
}
