//! Client trait to abstract over the identity provider transports

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuthFlow, AuthReply, ChallengeName, Error};

/// A single `{Name, Value}` attribute as the user pool transports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CognitoAttribute {
    pub name: String,
    pub value: String,
}

impl CognitoAttribute {
    pub fn new<S: Into<String>, V: Into<String>>(name: S, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A user record as returned by the user pool, before attribute mapping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawUser {
    pub username: String,
    #[serde(alias = "UserAttributes")]
    pub attributes: Vec<CognitoAttribute>,
    pub enabled: Option<bool>,
    pub user_status: Option<String>,
}

/// A group record as returned by the user pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawGroup {
    pub group_name: String,
    pub description: Option<String>,
    pub role_arn: Option<String>,
    pub precedence: Option<i32>,
    pub creation_date: Option<DateTime<Utc>>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

/// Where a confirmation or verification code was sent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CodeDeliveryDetails {
    pub destination: Option<String>,
    pub delivery_medium: Option<String>,
    pub attribute_name: Option<String>,
}

/// SRP verifier and salt for enrolling a trusted device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceSecretVerifierConfig {
    pub password_verifier: String,
    pub salt: String,
}

/// Parameters for the sign up call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SignUpRequest {
    pub client_id: String,
    pub username: String,
    pub password: String,
    pub user_attributes: Vec<CognitoAttribute>,
    pub secret_hash: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SignUpReply {
    pub user_confirmed: bool,
    pub user_sub: String,
    pub code_delivery_details: Option<CodeDeliveryDetails>,
}

/// Operations the auth engine and the session issue against the
/// identity provider. Implementations own the concrete RPC framing;
/// the engine only depends on this surface.
pub trait IdpClient {
    fn initiate_auth(
        &mut self,
        client_id: &str,
        flow: AuthFlow,
        params: &HashMap<String, String>,
    ) -> Result<AuthReply, Error>;

    /// Server-side variant used by the ADMIN_NO_SRP_AUTH flow
    fn admin_initiate_auth(
        &mut self,
        user_pool_id: &str,
        client_id: &str,
        flow: AuthFlow,
        params: &HashMap<String, String>,
    ) -> Result<AuthReply, Error>;

    fn respond_to_auth_challenge(
        &mut self,
        client_id: &str,
        challenge: ChallengeName,
        responses: &HashMap<String, String>,
        session: Option<&str>,
    ) -> Result<AuthReply, Error>;

    fn sign_up(&mut self, req: &SignUpRequest) -> Result<SignUpReply, Error>;

    fn confirm_sign_up(
        &mut self,
        client_id: &str,
        username: &str,
        confirmation_code: &str,
        secret_hash: Option<&str>,
    ) -> Result<(), Error>;

    fn admin_confirm_sign_up(&mut self, user_pool_id: &str, username: &str) -> Result<(), Error>;

    fn get_user(&mut self, access_token: &str) -> Result<RawUser, Error>;

    fn admin_get_user(&mut self, user_pool_id: &str, username: &str) -> Result<RawUser, Error>;

    fn list_users(&mut self, user_pool_id: &str) -> Result<Vec<RawUser>, Error>;

    fn admin_create_user(
        &mut self,
        user_pool_id: &str,
        username: &str,
        temporary_password: &str,
        attributes: &[CognitoAttribute],
    ) -> Result<RawUser, Error>;

    fn update_user_attributes(
        &mut self,
        access_token: &str,
        attributes: &[CognitoAttribute],
    ) -> Result<(), Error>;

    fn admin_update_user_attributes(
        &mut self,
        user_pool_id: &str,
        username: &str,
        attributes: &[CognitoAttribute],
    ) -> Result<(), Error>;

    fn get_user_attribute_verification_code(
        &mut self,
        access_token: &str,
        attribute_name: &str,
    ) -> Result<(), Error>;

    fn verify_user_attribute(
        &mut self,
        access_token: &str,
        attribute_name: &str,
        code: &str,
    ) -> Result<(), Error>;

    fn forgot_password(
        &mut self,
        client_id: &str,
        username: &str,
        secret_hash: Option<&str>,
    ) -> Result<CodeDeliveryDetails, Error>;

    fn confirm_forgot_password(
        &mut self,
        client_id: &str,
        username: &str,
        confirmation_code: &str,
        password: &str,
        secret_hash: Option<&str>,
    ) -> Result<(), Error>;

    fn change_password(
        &mut self,
        access_token: &str,
        previous_password: &str,
        proposed_password: &str,
    ) -> Result<(), Error>;

    fn delete_user(&mut self, access_token: &str) -> Result<(), Error>;

    fn admin_delete_user(&mut self, user_pool_id: &str, username: &str) -> Result<(), Error>;

    fn global_sign_out(&mut self, access_token: &str) -> Result<(), Error>;

    fn get_group(&mut self, user_pool_id: &str, group_name: &str) -> Result<RawGroup, Error>;

    fn list_groups(&mut self, user_pool_id: &str) -> Result<Vec<RawGroup>, Error>;

    fn confirm_device(
        &mut self,
        access_token: &str,
        device_key: &str,
        verifier: &DeviceSecretVerifierConfig,
        device_name: &str,
    ) -> Result<(), Error>;

    fn update_device_status(
        &mut self,
        access_token: &str,
        device_key: &str,
        remembered: bool,
    ) -> Result<(), Error>;

    fn forget_device(&mut self, access_token: &str, device_key: &str) -> Result<(), Error>;
}
