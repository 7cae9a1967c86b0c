//! Digest, HMAC and HKDF primitives shared by the SRP computations

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rscognito_core::Error;
use sha2::{Digest, Sha256};

use crate::num::decode_hex;
use crate::INFO_BITS;

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 of raw bytes as lowercase hex, left padded with '0' to 64
/// characters. Downstream hashing concatenates these strings by
/// position, so the width must be fixed.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(data));
    format!("{:0>64}", digest)
}

/// SHA-256 over the bytes a hex string encodes. The decode step is
/// load bearing: hashing the ASCII hex digits produces wrong keys.
pub fn hex_hash(hex: &str) -> Result<String, Error> {
    Ok(sha256_hex(&decode_hex(hex)?))
}

pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// HKDF with a hardcoded single block expand keyed by [`INFO_BITS`];
/// output is fixed at 128 bits
pub fn hkdf(ikm: &[u8], salt: &[u8]) -> [u8; 16] {
    let prk = hmac_sha256(salt, ikm);

    let mut info = Vec::with_capacity(INFO_BITS.len() + 1);
    info.extend_from_slice(INFO_BITS);
    info.push(1);

    let t1 = hmac_sha256(&prk, &info);
    let mut out = [0u8; 16];
    out.copy_from_slice(&t1[..16]);
    out
}

/// `SECRET_HASH` auth parameter: HMAC of `username || client_id` under
/// the app client secret
pub fn secret_hash(username: &str, client_id: &str, client_secret: &str) -> String {
    let mut msg = Vec::with_capacity(username.len() + client_id.len());
    msg.extend_from_slice(username.as_bytes());
    msg.extend_from_slice(client_id.as_bytes());
    BASE64.encode(hmac_sha256(client_secret.as_bytes(), &msg))
}
