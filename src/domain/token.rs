//! Issued bearer token record.

use prost::Message;

/// A minted bearer token together with its decoded claims.
///
/// Returned by `POST /_issue` as a protobuf message so that the holder can
/// read the issuer, subject and audience without parsing the JWT itself.
/// Timestamps are epoch milliseconds.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct Token {
    /// Signed compact JWT presented in the `x-extension-jwt` header.
    #[prost(string, tag = "1")]
    pub raw_token: String,
    /// Issuing service URL.
    #[prost(string, tag = "2")]
    pub issuer: String,
    /// User ID the token is scoped to.
    #[prost(string, tag = "3")]
    pub subject: String,
    /// Services that accept the token.
    #[prost(string, repeated, tag = "4")]
    pub audience: Vec<String>,
    /// Issue time in epoch milliseconds.
    #[prost(int64, tag = "5")]
    pub issued_at: i64,
    /// Expiry time in epoch milliseconds.
    #[prost(int64, tag = "6")]
    pub expires_at: i64,
}
