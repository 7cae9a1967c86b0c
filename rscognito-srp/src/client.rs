//! SRP client state and the challenge/response computations

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::RngCore;
use rscognito_core::{err_missing_param, Error};

use crate::hash::{hex_hash, hkdf, hmac_sha256, secret_hash, sha256_hex};
use crate::num::{decode_hex, hex_to_int, int_to_hex, pad_hex, pad_hex_uint};
use crate::{G, K, N};

/// Identity configuration for an SRP exchange
#[derive(Default, Clone)]
pub struct SrpConfig {
    pub pool_id: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub username: String,
    pub password: String,
    pub device_key: Option<String>,
    pub device_group_key: Option<String>,
    pub device_password: Option<String>,
}

/// SRP client state for one authentication attempt. The ephemeral
/// secret `a` lives only as long as this value; a new attempt needs a
/// new client.
pub struct SrpClient {
    conf: SrpConfig,
    a: BigUint,
    a_pub: BigUint,
}

/// Challenge timestamp in the exact shape the server verifies the
/// signature over. The day of month must not be zero padded.
pub fn challenge_timestamp(now: DateTime<Utc>) -> String {
    now.format("%a %b %-d %H:%M:%S UTC %Y").to_string()
}

/// `U = H(pad(A) || pad(B))`, combining client and server randomness
fn calculate_u(a_pub: &BigUint, b_pub: &BigUint) -> Result<BigUint, Error> {
    let digest = hex_hash(&format!("{}{}", pad_hex_uint(a_pub), pad_hex_uint(b_pub)))?;
    hex_to_int(&digest)
}

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str, Error> {
    match params.get(name) {
        Some(v) => Ok(v),
        None => err_missing_param(name),
    }
}

impl SrpClient {
    /// Create a client with a fresh ephemeral secret from the OS rng
    pub fn new(conf: SrpConfig) -> Result<Self, Error> {
        let mut seed = [0u8; 128];
        OsRng.fill_bytes(&mut seed);

        Self::with_seed(conf, &seed)
    }

    /// Create a client from a caller supplied ephemeral seed.
    /// `a` is the seed reduced mod N, `A = g^a mod N`.
    pub fn with_seed(conf: SrpConfig, seed: &[u8]) -> Result<Self, Error> {
        if !conf.pool_id.contains('_') {
            return Err(Error::Config("user pool id has no region prefix"));
        }

        let a = BigUint::from_bytes_be(seed) % &*N;
        let a_pub = G.modpow(&a, &N);

        if &a_pub % &*N == BigUint::default() {
            return Err(Error::SrpSafety("A mod N == 0"));
        }

        Ok(Self { conf, a, a_pub })
    }

    /// The pool id without its region prefix, as the server hashes it
    fn pool_short_id(&self) -> &str {
        match self.conf.pool_id.split_once('_') {
            Some((_, short)) => short,
            None => &self.conf.pool_id,
        }
    }

    /// Public ephemeral value as the `SRP_A` auth parameter
    pub fn a_pub_hex(&self) -> String {
        int_to_hex(&self.a_pub)
    }

    /// Parameters for the USER_SRP_AUTH initiate call, and for the
    /// DEVICE_SRP_AUTH challenge response
    pub fn auth_params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("USERNAME".to_string(), self.conf.username.clone());
        params.insert("SRP_A".to_string(), self.a_pub_hex());

        if let Some(secret) = &self.conf.client_secret {
            params.insert(
                "SECRET_HASH".to_string(),
                secret_hash(&self.conf.username, &self.conf.client_id, secret),
            );
        }
        if let Some(device_key) = &self.conf.device_key {
            params.insert("DEVICE_KEY".to_string(), device_key.clone());
        }

        params
    }

    /// Derive the 128 bit session key shared with the server.
    ///
    /// `identity` is `<pool-short-id><user-id>` on the password path and
    /// `<device-group-key><device-key>` on the device path; `secret` is
    /// the matching password.
    fn authentication_key(
        &self,
        identity: (&str, &str),
        secret: &str,
        b_pub: &BigUint,
        salt_hex: &str,
    ) -> Result<[u8; 16], Error> {
        let u = calculate_u(&self.a_pub, b_pub)?;
        if u == BigUint::default() {
            return Err(Error::SrpSafety("U == 0"));
        }

        let full_password = format!("{}{}:{}", identity.0, identity.1, secret);
        let password_hash = sha256_hex(full_password.as_bytes());

        let x = hex_to_int(&hex_hash(&format!("{}{}", pad_hex(salt_hex), password_hash))?)?;

        // S = (B - k * g^x) ^ (a + u * x) mod N. The subtraction can
        // go below zero, so shift by N before exponentiation.
        let g_pow_x = G.modpow(&x, &N);
        let interm = (&*K * &g_pow_x) % &*N;
        let b_red = b_pub % &*N;
        let base = if b_red > interm {
            (&b_red - &interm) % &*N
        } else {
            (&*N + &b_red - &interm) % &*N
        };
        let s = base.modpow(&(&self.a + &u * &x), &N);

        let ikm = decode_hex(&pad_hex_uint(&s))?;
        let salt = decode_hex(&pad_hex(&int_to_hex(&u)))?;

        Ok(hkdf(&ikm, &salt))
    }

    /// Sign the server secret block with the derived key
    fn claim_signature(
        &self,
        key: &[u8; 16],
        identity: (&str, &str),
        secret_block_b64: &str,
        timestamp: &str,
    ) -> Result<String, Error> {
        let secret_block = BASE64
            .decode(secret_block_b64)
            .map_err(|e| Error::MalformedReply(format!("invalid secret block: {}", e)))?;

        let mut msg = Vec::new();
        msg.extend_from_slice(identity.0.as_bytes());
        msg.extend_from_slice(identity.1.as_bytes());
        msg.extend_from_slice(&secret_block);
        msg.extend_from_slice(timestamp.as_bytes());

        Ok(BASE64.encode(hmac_sha256(key, &msg)))
    }

    /// Answer the PASSWORD_VERIFIER challenge
    pub fn process_challenge(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>, Error> {
        self.process_challenge_at(params, Utc::now())
    }

    pub fn process_challenge_at(
        &self,
        params: &HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<HashMap<String, String>, Error> {
        // The server may canonicalize the username, so every derived
        // value uses its USER_ID_FOR_SRP, not what the caller typed
        let user_id = param(params, "USER_ID_FOR_SRP")?;
        let salt_hex = param(params, "SALT")?;
        let srp_b_hex = param(params, "SRP_B")?;
        let secret_block = param(params, "SECRET_BLOCK")?;

        let b_pub = hex_to_int(srp_b_hex)?;
        let timestamp = challenge_timestamp(now);
        let identity = (self.pool_short_id(), user_id);

        let key =
            self.authentication_key(identity, &self.conf.password, &b_pub, salt_hex)?;
        let signature = self.claim_signature(&key, identity, secret_block, &timestamp)?;

        let mut response = HashMap::new();
        response.insert("TIMESTAMP".to_string(), timestamp);
        response.insert("USERNAME".to_string(), user_id.to_string());
        response.insert(
            "PASSWORD_CLAIM_SECRET_BLOCK".to_string(),
            secret_block.to_string(),
        );
        response.insert("PASSWORD_CLAIM_SIGNATURE".to_string(), signature);

        if let Some(secret) = &self.conf.client_secret {
            response.insert(
                "SECRET_HASH".to_string(),
                secret_hash(&self.conf.username, &self.conf.client_id, secret),
            );
        }
        if let Some(device_key) = &self.conf.device_key {
            response.insert("DEVICE_KEY".to_string(), device_key.clone());
        }

        Ok(response)
    }

    /// Answer the DEVICE_PASSWORD_VERIFIER challenge
    pub fn process_device_challenge(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>, Error> {
        self.process_device_challenge_at(params, Utc::now())
    }

    pub fn process_device_challenge_at(
        &self,
        params: &HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<HashMap<String, String>, Error> {
        let (device_key, device_group_key, device_password) = match (
            &self.conf.device_key,
            &self.conf.device_group_key,
            &self.conf.device_password,
        ) {
            (Some(k), Some(g), Some(p)) => (k.as_str(), g.as_str(), p.as_str()),
            _ => return Err(Error::Config("device credentials are not configured")),
        };

        let username = param(params, "USERNAME")?;
        let salt_hex = param(params, "SALT")?;
        let srp_b_hex = param(params, "SRP_B")?;
        let secret_block = param(params, "SECRET_BLOCK")?;

        let b_pub = hex_to_int(srp_b_hex)?;
        let timestamp = challenge_timestamp(now);
        let identity = (device_group_key, device_key);

        let key = self.authentication_key(identity, device_password, &b_pub, salt_hex)?;
        let signature = self.claim_signature(&key, identity, secret_block, &timestamp)?;

        let mut response = HashMap::new();
        response.insert("TIMESTAMP".to_string(), timestamp);
        response.insert("USERNAME".to_string(), username.to_string());
        response.insert(
            "PASSWORD_CLAIM_SECRET_BLOCK".to_string(),
            secret_block.to_string(),
        );
        response.insert("PASSWORD_CLAIM_SIGNATURE".to_string(), signature);
        response.insert("DEVICE_KEY".to_string(), device_key.to_string());

        if let Some(secret) = &self.conf.client_secret {
            response.insert(
                "SECRET_HASH".to_string(),
                secret_hash(username, &self.conf.client_id, secret),
            );
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // Deterministic ephemeral seed: the bytes 1..=128
    fn test_seed() -> Vec<u8> {
        (1..=128).collect()
    }

    fn test_conf() -> SrpConfig {
        SrpConfig {
            pool_id: "eu-west-1_DkVzYrIAz".to_string(),
            client_id: "client-abc".to_string(),
            username: "alice".to_string(),
            password: "correct horse battery staple".to_string(),
            ..Default::default()
        }
    }

    const TEST_A_HEX: &str = "ce00119aff3d209146734fd8a5754ea0972b6e30ad843f288552a8bb40c4ae757aef4cc842bb79dc35cf9439dd1d63bba10ef1c877282221c9f441fae286ddb0537d364de9bb37f0d525516605574ad06bc7918e4cd4e309ad5531b6c4e9b8361a09ad02bd307ab434f5e521c4f733aa507f8fde534e6c8cdfc7695f4ab19c533be45581df6ce0ad63f91e1a95699dbfedf73576caa59890de50861614a0dd4cc3177c64302fb1520b8b0f00d0fb8acee6de2e3431e1b8878bcfb5763bebda1cd408f5febc6d7578c0f781253fafc5092bbbf5d2435524d9785f03fca3b548b45eb7d04e12e387dd5904e07f770324a89dc76d554130b7ddced7a95f5b5213e74d0173ca4bddd7e31858b39ef4753897c96ef109497bd7c570a177ea05da873be036d2c1235e614e9c2f2ffd1deaed2280cae326413d8acf7e99a7f81e3113a057aa72f0650b6abf79f08d302966470a380236bca2e9a0ed56303c2342aff22e2214fffefa9049c5af9b4446a4166c3a723051b7cd1cb6eb93a6d3b47f9ea1ee";

    const TEST_SALT: &str = "fc1b7f046b4112aa15e0c3a8df1e4f40";

    const TEST_B_HEX: &str = "2b172dd2dbd2e9b7774cec5810e57cd025b6e620bc69ec17f9ed22f700bd56823b3081e62e6711579ebe26d9aa61b35bdd48f1006820ad8ae1355df620b79ceeede4634a8e9d853b24471d474c150b2dc35aa161a2621cd8fb7f0a568d84112d0faf9d0a50327723673c698acba96a08719fa4d9c6b53a9ead7c2a7a887661f07ea37d9a4fd7a794a40f29254efef9e948d1fb4ded97766842c93fc5b642d74fa311794aeec4a9be25da3e66f3effc89ee64c3c2615ef5de19f8d8832ccc804b546853f2d3a8a50402380b0bdd39d38dbca3a5755dec4f3c4f1f865f8817ddadcb686cc99e7027e02d5bfbed421754aebdee125a568c98e92ad2b6ca1dfa78d7d4bd0b7b3cda1a27ba1d42f39e82909376eb03c1cffb7fb0e5d125d879542c1ead9b0c9fa0b86ff4a5844c98af54de1ab62eb7db2b3903b7e4b2f8e5131eceaaa95a5735d3d96d59135cc7c116c2c63bd149b74b4bc8ff242e7bc1ca97a3c52318b39113412985a62ea54c249a9bfbb6ccaacb11056a106c01538124ebf9961b";

    const TEST_SECRET_BLOCK: &str = "AQIDBHNlY3JldC1ibG9ja//+";

    #[test]
    fn public_ephemeral_from_seed() {
        let cli = SrpClient::with_seed(test_conf(), &test_seed()).unwrap();
        assert_eq!(cli.a_pub_hex(), TEST_A_HEX);
    }

    #[test]
    fn auth_params_shape() {
        let mut conf = test_conf();
        conf.client_secret = Some("s3cret".to_string());
        conf.device_key = Some("dev-1".to_string());
        let cli = SrpClient::with_seed(conf, &test_seed()).unwrap();

        let params = cli.auth_params();
        assert_eq!(params["USERNAME"], "alice");
        assert_eq!(params["SRP_A"], TEST_A_HEX);
        assert_eq!(params["DEVICE_KEY"], "dev-1");
        assert!(params.contains_key("SECRET_HASH"));
    }

    #[test]
    fn auth_params_without_secret_or_device() {
        let cli = SrpClient::with_seed(test_conf(), &test_seed()).unwrap();
        let params = cli.auth_params();
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn password_challenge_signature() {
        let cli = SrpClient::with_seed(test_conf(), &test_seed()).unwrap();

        let mut params = HashMap::new();
        params.insert("USER_ID_FOR_SRP".to_string(), "alice".to_string());
        params.insert("SALT".to_string(), TEST_SALT.to_string());
        params.insert("SRP_B".to_string(), TEST_B_HEX.to_string());
        params.insert("SECRET_BLOCK".to_string(), TEST_SECRET_BLOCK.to_string());

        let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 7, 2).unwrap();
        let response = cli.process_challenge_at(&params, now).unwrap();

        assert_eq!(response["TIMESTAMP"], "Fri Jan 5 09:07:02 UTC 2024");
        assert_eq!(response["USERNAME"], "alice");
        assert_eq!(response["PASSWORD_CLAIM_SECRET_BLOCK"], TEST_SECRET_BLOCK);
        assert_eq!(
            response["PASSWORD_CLAIM_SIGNATURE"],
            "apCP336krMCR8jhGKaEEwnV29vRjWU2sOwjl4xG5Crg="
        );
    }

    #[test]
    fn derived_key_vector() {
        let cli = SrpClient::with_seed(test_conf(), &test_seed()).unwrap();
        let b_pub = hex_to_int(TEST_B_HEX).unwrap();

        let key = cli
            .authentication_key(("DkVzYrIAz", "alice"), &cli.conf.password, &b_pub, TEST_SALT)
            .unwrap();
        assert_eq!(hex::encode(key), "0fdab1b1d95782dba4dddd195f48401e");
    }

    #[test]
    fn device_challenge_signature() {
        let mut conf = test_conf();
        conf.device_group_key = Some("eu-west-1_grp-Abc123".to_string());
        conf.device_key = Some("eu-west-1_dev-456".to_string());
        conf.device_password = Some("ZGV2aWNlLXBhc3N3b3Jk".to_string());
        let cli = SrpClient::with_seed(conf, &test_seed()).unwrap();

        let mut params = HashMap::new();
        params.insert("USERNAME".to_string(), "alice".to_string());
        params.insert(
            "SALT".to_string(),
            "c316bec515ef231a8365da602ca44bd9".to_string(),
        );
        params.insert("SRP_B".to_string(), "19987b01afad8994fe74f435ba804817093d888148aac57777f3cdabd2746d3f1a476d1795f2482b2bb9412824b021d750dc8d408a58b31cb6c4b11a064504c8755c49f475b988bad375f3e66645f25e6f1e67c3dfd885dcc1222019e4a6f5691c825a38d179016505b1dfd4f1214f855347f68eb4a25c3d305eaea0c3466adc29988d38bc57ea5d8ab813424a889128afbf4436e05a2321f0e64875dea4452ff1e6b31c5a778474eb029ae9d66038700d6d49327adf641844482a05d86a4bbf9aba4c94b022620d7746eb8d903e6b6c4f3b5bd6d7f7f4fe86a8e606320a48775271dd262e070ff223142bb85cdbc1122fea73d4d26a933d9ac971c0ae9d0e3b30d940afe71dbfe981b437103f401ff3ced5362e26b6020cef8f3f22e7a27ab57faf04a92888a67c2ed8bfd6e932662a017eea1fcec96b921d4eeccbabb3ff03c7ae43796f787566a98dfc6b1a2147d2edf2d45e8233eb01c2eb903fca304cc05717abf857f2544f2f5c801147cac90c25681e5917e0e64ad5b9cdfaf8766e38".to_string());
        params.insert("SECRET_BLOCK".to_string(), TEST_SECRET_BLOCK.to_string());

        let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 7, 2).unwrap();
        let response = cli.process_device_challenge_at(&params, now).unwrap();

        assert_eq!(response["USERNAME"], "alice");
        assert_eq!(response["DEVICE_KEY"], "eu-west-1_dev-456");
        assert_eq!(
            response["PASSWORD_CLAIM_SIGNATURE"],
            "/3AAdaoV9+E/uzF6Po7bpvPKsgmg90tSFRGgDx5XwG4="
        );
    }

    #[test]
    fn device_challenge_requires_credentials() {
        let cli = SrpClient::with_seed(test_conf(), &test_seed()).unwrap();
        let err = cli
            .process_device_challenge(&HashMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_challenge_parameter() {
        let cli = SrpClient::with_seed(test_conf(), &test_seed()).unwrap();
        let err = cli.process_challenge(&HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::MalformedReply(_)));
    }

    #[test]
    fn pool_id_needs_region_prefix() {
        let mut conf = test_conf();
        conf.pool_id = "nounderscore".to_string();
        match SrpClient::with_seed(conf, &test_seed()) {
            Err(Error::Config(_)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn timestamp_dezeroes_day_only() {
        let t = Utc.with_ymd_and_hms(2024, 1, 5, 9, 7, 2).unwrap();
        assert_eq!(challenge_timestamp(t), "Fri Jan 5 09:07:02 UTC 2024");

        let t = Utc.with_ymd_and_hms(2023, 12, 25, 23, 59, 59).unwrap();
        assert_eq!(challenge_timestamp(t), "Mon Dec 25 23:59:59 UTC 2023");
    }

    #[test]
    fn fresh_ephemeral_passes_safety_check() {
        for _ in 0..8 {
            assert!(SrpClient::new(test_conf()).is_ok());
        }
    }
}
