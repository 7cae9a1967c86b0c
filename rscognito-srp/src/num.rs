//! Big integer and hex string helpers with the exact padding rules the
//! service hashes depend on

use num_bigint::BigUint;
use rscognito_core::Error;

/// Parse a hex string into an unsigned big integer
pub fn hex_to_int(hex: &str) -> Result<BigUint, Error> {
    BigUint::parse_bytes(hex.as_bytes(), 16)
        .ok_or_else(|| Error::MalformedReply(format!("invalid hex integer: {:.24}", hex)))
}

/// Lowercase hex, no prefix, no leading zero digit
pub fn int_to_hex(n: &BigUint) -> String {
    format!("{:x}", n)
}

/// Decode a hex string into raw bytes
pub fn decode_hex(hex: &str) -> Result<Vec<u8>, Error> {
    hex::decode(hex).map_err(|e| Error::MalformedReply(format!("invalid hex string: {}", e)))
}

/// Pad a hex string for hashing:
/// an odd length gets a single leading '0'; an even length whose first
/// byte has the high bit set gets a leading "00" so the value cannot
/// be read as negative.
pub fn pad_hex(hex: &str) -> String {
    if hex.len() % 2 == 1 {
        format!("0{}", hex)
    } else if hex
        .chars()
        .next()
        .map(|c| "89ABCDEFabcdef".contains(c))
        .unwrap_or(false)
    {
        format!("00{}", hex)
    } else {
        hex.to_string()
    }
}

/// `pad_hex` over the hex form of a big integer
pub fn pad_hex_uint(n: &BigUint) -> String {
    pad_hex(&int_to_hex(n))
}
