//! Error type for the user pool client

use std::fmt;

use thiserror::Error;

/// Which of the session tokens an operation was looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Id,
    Access,
}

impl TokenKind {
    /// The `token_use` claim value expected for this kind
    pub fn token_use(self) -> &'static str {
        match self {
            TokenKind::Id => "id",
            TokenKind::Access => "access",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token_use())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The server demands a password rotation before issuing tokens
    #[error("password must be changed before authentication can complete")]
    ForceChangePassword { session: String },

    /// The server demands a software TOTP code. Carries the challenge
    /// session and the username echoed by the server, which a caller
    /// needs to resume the exchange.
    #[error("software token MFA code required to authenticate")]
    MfaRequired { session: String, username: String },

    /// JWT header, signature, audience, issuer or `token_use` mismatch
    #[error("could not verify the {kind} token: {reason}")]
    TokenVerification { kind: TokenKind, reason: String },

    /// The server returned a challenge outside the supported set
    #[error("the {0} challenge is not supported")]
    UnsupportedChallenge(String),

    /// `A mod N == 0` or `U == 0`; the session must be restarted
    #[error("SRP safety check failed: {0}")]
    SrpSafety(&'static str),

    /// The operation needs an access token but none is present
    #[error("an access token is required for this operation")]
    AccessTokenRequired,

    /// Device enrollment attempted without a server-issued group key,
    /// or when the device is already enrolled
    #[error("device registration disallowed: {0}")]
    DeviceRegistrationDisallowed(&'static str),

    /// Propagated from the RPC adapter
    #[error("transport: {0}")]
    Transport(String),

    /// The session was built with inconsistent or incomplete identity data
    #[error("invalid configuration: {0}")]
    Config(&'static str),

    /// The server reply is missing fields the protocol requires
    #[error("malformed server reply: {0}")]
    MalformedReply(String),
}

pub fn err_missing_param<T>(name: &str) -> Result<T, Error> {
    Err(Error::MalformedReply(format!(
        "missing challenge parameter {}",
        name
    )))
}
