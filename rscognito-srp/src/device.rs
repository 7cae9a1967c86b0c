//! Verifier generation for enrolling a trusted device

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::RngCore;
use rscognito_core::{DeviceSecretVerifierConfig, Error};

use crate::hash::{hex_hash, sha256_hex};
use crate::num::{decode_hex, hex_to_int, pad_hex_uint};
use crate::{G, N};

/// Secrets produced for a device enrollment: the password stays with
/// the client, the verifier config goes to the server
pub struct DeviceVerifier {
    pub device_password: String,
    pub verifier: DeviceSecretVerifierConfig,
}

/// Generate a random device password and the SRP verifier the server
/// will store for the DEVICE_SRP_AUTH flow
pub fn generate_verifier(
    device_group_key: &str,
    device_key: &str,
) -> Result<DeviceVerifier, Error> {
    let mut password = [0u8; 40];
    OsRng.fill_bytes(&mut password);

    let mut salt = [0u8; 16];
    OsRng.fill_bytes(&mut salt);

    generate_with(device_group_key, device_key, &password, &salt)
}

fn generate_with(
    device_group_key: &str,
    device_key: &str,
    password: &[u8; 40],
    salt: &[u8; 16],
) -> Result<DeviceVerifier, Error> {
    let device_password = BASE64.encode(password);

    let combined = format!("{}{}:{}", device_group_key, device_key, device_password);
    let combined_hash = sha256_hex(combined.as_bytes());

    let salt_hex = pad_hex_uint(&BigUint::from_bytes_be(salt));
    let x = hex_to_int(&hex_hash(&format!("{}{}", salt_hex, combined_hash))?)?;
    let verifier_hex = pad_hex_uint(&G.modpow(&x, &N));

    Ok(DeviceVerifier {
        device_password,
        verifier: DeviceSecretVerifierConfig {
            password_verifier: BASE64.encode(decode_hex(&verifier_hex)?),
            salt: BASE64.encode(decode_hex(&salt_hex)?),
        },
    })
}
