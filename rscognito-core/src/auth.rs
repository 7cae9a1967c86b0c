//! Envelope types for the auth exchanges with the identity provider

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Authentication flow selector for `initiate_auth`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    UserSrpAuth,
    RefreshToken,
    AdminNoSrpAuth,
}

impl AuthFlow {
    pub fn name(self) -> &'static str {
        match self {
            AuthFlow::UserSrpAuth => "USER_SRP_AUTH",
            AuthFlow::RefreshToken => "REFRESH_TOKEN",
            AuthFlow::AdminNoSrpAuth => "ADMIN_NO_SRP_AUTH",
        }
    }
}

/// Challenges the client knows how to answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeName {
    PasswordVerifier,
    SoftwareTokenMfa,
    NewPasswordRequired,
    DeviceSrpAuth,
    DevicePasswordVerifier,
}

impl ChallengeName {
    pub fn name(self) -> &'static str {
        match self {
            ChallengeName::PasswordVerifier => "PASSWORD_VERIFIER",
            ChallengeName::SoftwareTokenMfa => "SOFTWARE_TOKEN_MFA",
            ChallengeName::NewPasswordRequired => "NEW_PASSWORD_REQUIRED",
            ChallengeName::DeviceSrpAuth => "DEVICE_SRP_AUTH",
            ChallengeName::DevicePasswordVerifier => "DEVICE_PASSWORD_VERIFIER",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "PASSWORD_VERIFIER" => Some(ChallengeName::PasswordVerifier),
            "SOFTWARE_TOKEN_MFA" => Some(ChallengeName::SoftwareTokenMfa),
            "NEW_PASSWORD_REQUIRED" => Some(ChallengeName::NewPasswordRequired),
            "DEVICE_SRP_AUTH" => Some(ChallengeName::DeviceSrpAuth),
            "DEVICE_PASSWORD_VERIFIER" => Some(ChallengeName::DevicePasswordVerifier),
            _ => None,
        }
    }
}

/// Reply shape shared by `initiate_auth` and `respond_to_auth_challenge`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AuthReply {
    pub challenge_name: Option<String>,
    pub challenge_parameters: HashMap<String, String>,
    pub session: Option<String>,
    pub authentication_result: Option<AuthenticationResult>,
}

impl AuthReply {
    /// The returned challenge, when it is one the client supports
    pub fn challenge(&self) -> Option<ChallengeName> {
        self.challenge_name
            .as_deref()
            .and_then(ChallengeName::from_name)
    }
}

/// Tokens issued at a terminal auth step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AuthenticationResult {
    pub id_token: String,
    pub access_token: String,
    /// Absent on the REFRESH_TOKEN flow, which does not rotate it
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub new_device_metadata: Option<NewDeviceMetadata>,
}

/// Issued when the pool tracks devices and this login is from a new one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NewDeviceMetadata {
    pub device_key: String,
    pub device_group_key: String,
}
