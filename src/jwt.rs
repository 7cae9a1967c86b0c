//! Token verification against the pool's published JSON Web Key Set

use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};

use rscognito_core::{Error, TokenKind};

/// Environment override carrying a serialized JWKS document; when
/// present it supersedes the well known fetch
pub const JWKS_ENV_VAR: &str = "COGNITO_JWKS";

/// A single RSA key from the pool's JWKS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub kty: String,
    pub n: String,
    pub e: String,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(rename = "use", default)]
    pub key_use: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// Claims the verifier inspects. Everything else stays available in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    pub sub: Option<String>,
    pub aud: Option<String>,
    pub iss: Option<String>,
    pub token_use: Option<String>,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

lazy_static! {
    /// One JWKS per pool for the process lifetime. Keys are long
    /// lived; the first population wins and is never refetched.
    static ref JWKS_CACHE: RwLock<HashMap<String, JwkSet>> = RwLock::new(HashMap::new());
}

fn verification_error(kind: TokenKind, reason: impl Into<String>) -> Error {
    Error::TokenVerification {
        kind,
        reason: reason.into(),
    }
}

/// Well known JWKS location for a pool
pub fn jwks_url(region: &str, user_pool_id: &str) -> String {
    format!(
        "https://cognito-idp.{}.amazonaws.com/{}/.well-known/jwks.json",
        region, user_pool_id
    )
}

fn fetch_jwks(region: &str, user_pool_id: &str) -> Result<JwkSet, Error> {
    if let Ok(doc) = env::var(JWKS_ENV_VAR) {
        debug!("loading JWKS from the {} environment override", JWKS_ENV_VAR);

        return serde_json::from_str(&doc)
            .map_err(|_| Error::Config("the JWKS environment override is not a valid document"));
    }

    let url = jwks_url(region, user_pool_id);
    debug!("fetching JWKS from {}", url);

    ureq::get(&url)
        .call()
        .map_err(|e| Error::Transport(e.to_string()))?
        .into_json()
        .map_err(|e| Error::Transport(e.to_string()))
}

/// The pool's JWKS, from the cache or populated on first use
fn pool_jwks(region: &str, user_pool_id: &str) -> Result<JwkSet, Error> {
    {
        let cache = JWKS_CACHE.read().expect("jwks cache lock");
        if let Some(set) = cache.get(user_pool_id) {
            return Ok(set.clone());
        }
    }

    let set = fetch_jwks(region, user_pool_id)?;

    let mut cache = JWKS_CACHE.write().expect("jwks cache lock");
    // A racing populator may have won; keep whatever landed first
    let set = cache
        .entry(user_pool_id.to_string())
        .or_insert(set)
        .clone();

    Ok(set)
}

#[cfg(test)]
pub(crate) fn seed_pool_jwks(user_pool_id: &str, set: JwkSet) {
    JWKS_CACHE
        .write()
        .expect("jwks cache lock")
        .insert(user_pool_id.to_string(), set);
}

/// Read the claims without checking the signature. Used for the
/// `token_use` precheck, the self consistency pins and `check_token`.
pub(crate) fn unverified_claims(token: &str, kind: TokenKind) -> Result<Claims, Error> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| verification_error(kind, e.to_string()))?;

    Ok(data.claims)
}

/// Verify a token end to end: kid lookup, `token_use`, RS256 signature,
/// expiry, and audience/issuer checked against the token's own claims
pub fn verify(
    region: &str,
    user_pool_id: &str,
    token: &str,
    kind: TokenKind,
) -> Result<Claims, Error> {
    let header = decode_header(token).map_err(|e| verification_error(kind, e.to_string()))?;
    let kid = header
        .kid
        .ok_or_else(|| verification_error(kind, "token header has no kid"))?;

    let unverified = unverified_claims(token, kind)?;
    if unverified.token_use.as_deref() != Some(kind.token_use()) {
        return Err(verification_error(
            kind,
            format!(
                "token_use is {:?}, expected {}",
                unverified.token_use,
                kind.token_use()
            ),
        ));
    }

    let jwks = pool_jwks(region, user_pool_id)?;
    let jwk = jwks
        .keys
        .iter()
        .find(|k| k.kid == kid)
        .ok_or_else(|| verification_error(kind, format!("no JWK published for kid {}", kid)))?;

    let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
        .map_err(|e| verification_error(kind, e.to_string()))?;

    let mut validation = Validation::new(Algorithm::RS256);
    if let Some(aud) = &unverified.aud {
        validation.set_audience(&[aud]);
    } else {
        // Access tokens carry no aud claim
        validation.validate_aud = false;
    }
    if let Some(iss) = &unverified.iss {
        validation.set_issuer(&[iss]);
    }

    let data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| verification_error(kind, e.to_string()))?;

    Ok(data.claims)
}
