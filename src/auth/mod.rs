//! Token authority: bearer token minting and verification.
//!
//! Tokens are stateless HS256 JWTs. Nothing about an issued token is
//! persisted server-side; every request re-verifies the signature.

pub mod token_authority;

pub use token_authority::TokenAuthority;

/// Reasons a key or token was refused.
///
/// Callers at the HTTP boundary collapse every variant into one opaque
/// denial; the variant is only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The presented admin key does not match the configured secret.
    #[error("invalid key")]
    KeyMismatch,

    /// The token or the requested user ID has no subject.
    #[error("no subject")]
    EmptySubject,

    /// Signature, algorithm, issuer, audience or expiry check failed.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// The token could not be signed.
    #[error("signing token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}
