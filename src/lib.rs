//!
//! Rust Cognito user pool client
//!
//! Authenticates users against an AWS Cognito user pool with a pure
//! rust SRP-6a engine, verifies the issued tokens against the pool's
//! published JWKS and exposes the pool's user and group operations
//! over a pluggable [`IdpClient`] trait.
//!

mod auth;
mod group;
pub mod jwt;
mod session;
mod user;

#[cfg(test)]
pub(crate) mod tests;

pub use crate::group::Group;
pub use crate::jwt::{Claims, Jwk, JwkSet, JWKS_ENV_VAR};
pub use crate::session::{Session, SessionBuilder};
pub use crate::user::User;

pub use rscognito_core::attributes::{AttrMap, AttributeValue};
pub use rscognito_core::{
    AuthFlow, AuthReply, AuthenticationResult, ChallengeName, CodeDeliveryDetails,
    CognitoAttribute, DeviceSecretVerifierConfig, Error, IdpClient, NewDeviceMetadata, RawGroup,
    RawUser, SignUpReply, SignUpRequest, TokenKind,
};
pub use rscognito_srp as srp;

/// Start configuring a session against a user pool
pub fn builder<S: Into<String>, T: Into<String>>(user_pool_id: S, client_id: T) -> SessionBuilder {
    SessionBuilder::new(user_pool_id, client_id)
}
