//! The user pool session: identity configuration, token slots and the
//! operations a caller drives against the pool

use std::collections::HashMap;

use chrono::Utc;
use log::debug;

use rscognito_core::attributes::{self, AttrMap, AttributeValue};
use rscognito_core::{
    AuthFlow, AuthReply, AuthenticationResult, ChallengeName, CodeDeliveryDetails, Error,
    IdpClient, SignUpReply, SignUpRequest, TokenKind,
};
use rscognito_srp::{device, secret_hash, SrpConfig};

use crate::auth::SrpFlow;
use crate::jwt::{self, Claims};
use crate::{Group, User};

/// Configuration for opening a [`Session`]
#[derive(Default, Clone)]
pub struct SessionBuilder {
    user_pool_id: String,
    client_id: String,
    region: Option<String>,
    client_secret: Option<String>,
    username: Option<String>,
    id_token: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    device_key: Option<String>,
    device_group_key: Option<String>,
    device_password: Option<String>,
}

impl SessionBuilder {
    pub fn new<S: Into<String>, T: Into<String>>(user_pool_id: S, client_id: T) -> Self {
        Self {
            user_pool_id: user_pool_id.into(),
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    /// Username to authenticate as
    pub fn username<S: Into<String>>(&mut self, username: S) -> &mut Self {
        self.username = Some(username.into());
        self
    }

    /// App client secret, when the client is confidential. Enables the
    /// SECRET_HASH parameter on every call that accepts one.
    pub fn client_secret<S: Into<String>>(&mut self, secret: S) -> &mut Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Region override. Default: the pool id prefix before the '_'
    pub fn region<S: Into<String>>(&mut self, region: S) -> &mut Self {
        self.region = Some(region.into());
        self
    }

    /// Seed the session with tokens from an earlier authentication
    pub fn tokens<S: Into<String>>(&mut self, id: S, access: S, refresh: S) -> &mut Self {
        self.id_token = Some(id.into());
        self.access_token = Some(access.into());
        self.refresh_token = Some(refresh.into());
        self
    }

    /// Seed the session with remembered device state
    pub fn device<S: Into<String>>(
        &mut self,
        key: S,
        group_key: S,
        password: Option<String>,
    ) -> &mut Self {
        self.device_key = Some(key.into());
        self.device_group_key = Some(group_key.into());
        self.device_password = password;
        self
    }

    /// Open a session over the given client
    pub fn open<C: IdpClient>(&self, cli: C) -> Result<Session<C>, Error> {
        let region = match &self.region {
            Some(region) => region.clone(),
            None => match self.user_pool_id.split_once('_') {
                Some((region, _)) => region.to_string(),
                None => return Err(Error::Config("user pool id has no region prefix")),
            },
        };

        Ok(Session {
            cli,
            user_pool_id: self.user_pool_id.clone(),
            client_id: self.client_id.clone(),
            region,
            client_secret: self.client_secret.clone(),
            username: self.username.clone(),
            id_token: self.id_token.clone(),
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            token_type: None,
            device_key: self.device_key.clone(),
            device_group_key: self.device_group_key.clone(),
            device_password: self.device_password.clone(),
        })
    }
}

/// A per-user session against one user pool.
///
/// The session owns its SRP ephemeral state and its token slots and is
/// not meant to be shared between tasks without external serialization.
pub struct Session<C: IdpClient> {
    cli: C,
    user_pool_id: String,
    client_id: String,
    region: String,
    client_secret: Option<String>,
    username: Option<String>,
    id_token: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
    device_key: Option<String>,
    device_group_key: Option<String>,
    device_password: Option<String>,
}

impl<C: IdpClient> Session<C> {
    /// The underlying client, for calls outside this surface
    pub fn client(&self) -> &C {
        &self.cli
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.cli
    }

    fn require_username(&self) -> Result<&str, Error> {
        self.username
            .as_deref()
            .ok_or(Error::Config("session has no username"))
    }

    fn require_access_token(&self) -> Result<&str, Error> {
        self.access_token.as_deref().ok_or(Error::AccessTokenRequired)
    }

    fn secret_hash_for(&self, username: &str) -> Option<String> {
        self.client_secret
            .as_ref()
            .map(|secret| secret_hash(username, &self.client_id, secret))
    }

    fn srp_config(&self, password: &str) -> Result<SrpConfig, Error> {
        Ok(SrpConfig {
            pool_id: self.user_pool_id.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            username: self.require_username()?.to_string(),
            password: password.to_string(),
            device_key: self.device_key.clone(),
            device_group_key: self.device_group_key.clone(),
            device_password: self.device_password.clone(),
        })
    }

    /// Bind the tokens of a terminal auth reply into the session,
    /// verifying them first
    fn absorb(&mut self, reply: AuthReply) -> Result<(), Error> {
        let result = reply.authentication_result.ok_or_else(|| {
            Error::MalformedReply("reply carries no authentication result".to_string())
        })?;

        self.absorb_result(result)
    }

    fn absorb_result(&mut self, result: AuthenticationResult) -> Result<(), Error> {
        jwt::verify(
            &self.region,
            &self.user_pool_id,
            &result.id_token,
            TokenKind::Id,
        )?;
        jwt::verify(
            &self.region,
            &self.user_pool_id,
            &result.access_token,
            TokenKind::Access,
        )?;

        self.id_token = Some(result.id_token);
        self.access_token = Some(result.access_token);
        if let Some(refresh) = result.refresh_token {
            self.refresh_token = Some(refresh);
        }
        self.token_type = Some(result.token_type);

        if let Some(metadata) = result.new_device_metadata {
            debug!("recording new device metadata");
            self.device_key = Some(metadata.device_key);
            self.device_group_key = Some(metadata.device_group_key);
        }

        Ok(())
    }

    /// Authenticate with the SRP protocol
    pub fn authenticate(&mut self, password: &str) -> Result<(), Error> {
        let conf = self.srp_config(password)?;
        let reply = SrpFlow::new(&mut self.cli, conf)?.authenticate()?;

        self.absorb(reply)
    }

    /// Authenticate with the SRP protocol for a user enrolled in
    /// software token MFA
    pub fn authenticate_with_mfa(&mut self, password: &str, mfa_code: &str) -> Result<(), Error> {
        let conf = self.srp_config(password)?;
        let reply = SrpFlow::new(&mut self.cli, conf)?.authenticate_with_mfa(mfa_code)?;

        self.absorb(reply)
    }

    /// Answer a NEW_PASSWORD_REQUIRED demand by authenticating with the
    /// current password and rotating to the new one
    pub fn new_password_challenge(
        &mut self,
        password: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        let conf = self.srp_config(password)?;
        let reply = SrpFlow::new(&mut self.cli, conf)?.set_new_password(new_password)?;

        self.absorb(reply)
    }

    /// Resume an attempt that failed with [`Error::MfaRequired`],
    /// echoing the session and username the error carried
    pub fn respond_software_token_mfa(
        &mut self,
        session: &str,
        username: &str,
        mfa_code: &str,
    ) -> Result<(), Error> {
        let mut responses = HashMap::new();
        responses.insert("USERNAME".to_string(), username.to_string());
        responses.insert("SOFTWARE_TOKEN_MFA_CODE".to_string(), mfa_code.to_string());

        let reply = self.cli.respond_to_auth_challenge(
            &self.client_id,
            ChallengeName::SoftwareTokenMfa,
            &responses,
            Some(session),
        )?;

        self.absorb(reply)
    }

    /// Authenticate through the server side ADMIN_NO_SRP_AUTH flow,
    /// bypassing SRP entirely
    pub fn admin_authenticate(&mut self, password: &str) -> Result<(), Error> {
        let username = self.require_username()?.to_string();

        let mut params = HashMap::new();
        params.insert("USERNAME".to_string(), username.clone());
        params.insert("PASSWORD".to_string(), password.to_string());
        if let Some(hash) = self.secret_hash_for(&username) {
            params.insert("SECRET_HASH".to_string(), hash);
        }

        let reply = self.cli.admin_initiate_auth(
            &self.user_pool_id,
            &self.client_id,
            AuthFlow::AdminNoSrpAuth,
            &params,
        )?;

        self.absorb(reply)
    }

    /// Replace the access and id tokens through the REFRESH_TOKEN flow.
    /// The refresh token itself is not rotated.
    pub fn renew_access_token(&mut self) -> Result<(), Error> {
        let refresh = self
            .refresh_token
            .clone()
            .ok_or(Error::Config("session has no refresh token"))?;

        debug!("renewing the access token");

        let mut params = HashMap::new();
        params.insert("REFRESH_TOKEN".to_string(), refresh);
        if self.client_secret.is_some() {
            let username = self.require_username()?.to_string();
            if let Some(hash) = self.secret_hash_for(&username) {
                params.insert("SECRET_HASH".to_string(), hash);
            }
        }
        if let Some(device_key) = &self.device_key {
            params.insert("DEVICE_KEY".to_string(), device_key.clone());
        }

        let reply = self
            .cli
            .initiate_auth(&self.client_id, AuthFlow::RefreshToken, &params)?;

        self.absorb(reply)
    }

    /// Whether the access token has expired. With `renew` the refresh
    /// flow runs before returning.
    pub fn check_token(&mut self, renew: bool) -> Result<bool, Error> {
        let access = self.require_access_token()?.to_string();
        let claims = jwt::unverified_claims(&access, TokenKind::Access)?;

        let expired = claims.exp <= Utc::now().timestamp();
        if expired && renew {
            self.renew_access_token()?;
        }

        Ok(expired)
    }

    /// Verify a token against this pool's JWKS and return its claims
    pub fn verify_token(&self, token: &str, kind: TokenKind) -> Result<Claims, Error> {
        jwt::verify(&self.region, &self.user_pool_id, token, kind)
    }

    /// Sign out of all clients and clear the token slots
    pub fn logout(&mut self) -> Result<(), Error> {
        let token = self.require_access_token()?.to_string();
        self.cli.global_sign_out(&token)?;

        self.id_token = None;
        self.access_token = None;
        self.refresh_token = None;
        self.token_type = None;

        Ok(())
    }

    /// Sign up a new user with the given attributes
    pub fn register(
        &mut self,
        username: &str,
        password: &str,
        user_attributes: &HashMap<String, AttributeValue>,
        attr_map: &AttrMap,
    ) -> Result<SignUpReply, Error> {
        let req = SignUpRequest {
            client_id: self.client_id.clone(),
            username: username.to_string(),
            password: password.to_string(),
            user_attributes: attributes::to_cognito(user_attributes, attr_map),
            secret_hash: self.secret_hash_for(username),
        };

        self.cli.sign_up(&req)
    }

    /// Confirm a registration with the emailed or texted code
    pub fn confirm_sign_up(
        &mut self,
        confirmation_code: &str,
        username: Option<&str>,
    ) -> Result<(), Error> {
        let username = match username {
            Some(u) => u.to_string(),
            None => self.require_username()?.to_string(),
        };
        let hash = self.secret_hash_for(&username);

        self.cli
            .confirm_sign_up(&self.client_id, &username, confirmation_code, hash.as_deref())
    }

    /// Confirm a registration without a code, with admin privileges
    pub fn admin_confirm_sign_up(&mut self, username: Option<&str>) -> Result<(), Error> {
        let username = match username {
            Some(u) => u.to_string(),
            None => self.require_username()?.to_string(),
        };

        self.cli.admin_confirm_sign_up(&self.user_pool_id, &username)
    }

    /// Send the user a password reset code
    pub fn initiate_forgot_password(
        &mut self,
        username: &str,
    ) -> Result<CodeDeliveryDetails, Error> {
        let hash = self.secret_hash_for(username);

        self.cli
            .forgot_password(&self.client_id, username, hash.as_deref())
    }

    /// Set a new password with the reset code
    pub fn confirm_forgot_password(
        &mut self,
        confirmation_code: &str,
        password: &str,
    ) -> Result<(), Error> {
        let username = self.require_username()?.to_string();
        let hash = self.secret_hash_for(&username);

        self.cli.confirm_forgot_password(
            &self.client_id,
            &username,
            confirmation_code,
            password,
            hash.as_deref(),
        )
    }

    /// Change the password of the authenticated user
    pub fn change_password(
        &mut self,
        previous_password: &str,
        proposed_password: &str,
    ) -> Result<(), Error> {
        self.check_token(true)?;
        let token = self.require_access_token()?.to_string();

        self.cli
            .change_password(&token, previous_password, proposed_password)
    }

    /// The authenticated user's profile
    pub fn get_user(&mut self, attr_map: &AttrMap) -> Result<User, Error> {
        let token = self.require_access_token()?.to_string();
        let raw = self.cli.get_user(&token)?;

        Ok(User::from_raw(raw, attr_map))
    }

    /// The session user's profile, read with admin privileges
    pub fn admin_get_user(&mut self, attr_map: &AttrMap) -> Result<User, Error> {
        let username = self.require_username()?.to_string();
        let raw = self.cli.admin_get_user(&self.user_pool_id, &username)?;

        Ok(User::from_raw(raw, attr_map))
    }

    /// All users of the pool
    pub fn get_users(&mut self, attr_map: &AttrMap) -> Result<Vec<User>, Error> {
        let raws = self.cli.list_users(&self.user_pool_id)?;

        Ok(raws
            .into_iter()
            .map(|raw| User::from_raw(raw, attr_map))
            .collect())
    }

    /// Create a user with admin privileges. An empty temporary
    /// password lets the pool generate one.
    pub fn admin_create_user(
        &mut self,
        username: &str,
        temporary_password: &str,
        user_attributes: &HashMap<String, AttributeValue>,
        attr_map: &AttrMap,
    ) -> Result<User, Error> {
        let raw = self.cli.admin_create_user(
            &self.user_pool_id,
            username,
            temporary_password,
            &attributes::to_cognito(user_attributes, attr_map),
        )?;

        Ok(User::from_raw(raw, attr_map))
    }

    /// Update attributes of the authenticated user
    pub fn update_profile(
        &mut self,
        user_attributes: &HashMap<String, AttributeValue>,
        attr_map: &AttrMap,
    ) -> Result<(), Error> {
        let token = self.require_access_token()?.to_string();

        self.cli
            .update_user_attributes(&token, &attributes::to_cognito(user_attributes, attr_map))
    }

    /// Update attributes of the session user with admin privileges
    pub fn admin_update_profile(
        &mut self,
        user_attributes: &HashMap<String, AttributeValue>,
        attr_map: &AttrMap,
    ) -> Result<(), Error> {
        let username = self.require_username()?.to_string();

        self.cli.admin_update_user_attributes(
            &self.user_pool_id,
            &username,
            &attributes::to_cognito(user_attributes, attr_map),
        )
    }

    /// Send an attribute verification code to the user
    pub fn send_verification(&mut self, attribute_name: &str) -> Result<(), Error> {
        self.check_token(true)?;
        let token = self.require_access_token()?.to_string();

        self.cli
            .get_user_attribute_verification_code(&token, attribute_name)
    }

    /// Verify an attribute with the received code
    pub fn validate_verification(
        &mut self,
        confirmation_code: &str,
        attribute_name: &str,
    ) -> Result<(), Error> {
        self.check_token(true)?;
        let token = self.require_access_token()?.to_string();

        self.cli
            .verify_user_attribute(&token, attribute_name, confirmation_code)
    }

    /// Delete the authenticated user
    pub fn delete_user(&mut self) -> Result<(), Error> {
        let token = self.require_access_token()?.to_string();

        self.cli.delete_user(&token)
    }

    /// Delete the session user with admin privileges
    pub fn admin_delete_user(&mut self) -> Result<(), Error> {
        let username = self.require_username()?.to_string();

        self.cli.admin_delete_user(&self.user_pool_id, &username)
    }

    /// Fetch a group by name
    pub fn get_group(&mut self, group_name: &str) -> Result<Group, Error> {
        Ok(self.cli.get_group(&self.user_pool_id, group_name)?.into())
    }

    /// All groups of the pool
    pub fn get_groups(&mut self) -> Result<Vec<Group>, Error> {
        Ok(self
            .cli
            .list_groups(&self.user_pool_id)?
            .into_iter()
            .map(Group::from)
            .collect())
    }

    /// Whether a device enrollment can run: the server issued a device
    /// group key and no device password is enrolled yet
    pub fn can_register_device(&self) -> bool {
        self.device_group_key.is_some() && self.device_password.is_none()
    }

    /// Enroll the current device as trusted, returning the generated
    /// device password
    pub fn register_device(
        &mut self,
        device_name: &str,
        remember_device: bool,
    ) -> Result<String, Error> {
        let group_key = match &self.device_group_key {
            Some(_) if self.device_password.is_some() => {
                return Err(Error::DeviceRegistrationDisallowed(
                    "a device password is already enrolled",
                ))
            }
            Some(group_key) => group_key.clone(),
            None => {
                return Err(Error::DeviceRegistrationDisallowed(
                    "the server issued no device group key",
                ))
            }
        };
        let device_key = self.device_key.clone().ok_or(
            Error::DeviceRegistrationDisallowed("the server issued no device key"),
        )?;
        let token = self.require_access_token()?.to_string();

        let generated = device::generate_verifier(&group_key, &device_key)?;
        self.cli
            .confirm_device(&token, &device_key, &generated.verifier, device_name)?;
        self.cli.update_device_status(&token, &device_key, remember_device)?;

        // Only remember the password once the server accepted the verifier
        self.device_password = Some(generated.device_password.clone());

        Ok(generated.device_password)
    }

    /// Forget the current device
    pub fn forget_device(&mut self) -> Result<(), Error> {
        let token = self.require_access_token()?.to_string();
        let device_key = self
            .device_key
            .clone()
            .ok_or(Error::Config("session has no device key"))?;

        self.cli.forget_device(&token, &device_key)
    }

    pub fn user_pool_id(&self) -> &str {
        &self.user_pool_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    pub fn device_key(&self) -> Option<&str> {
        self.device_key.as_deref()
    }

    pub fn device_group_key(&self) -> Option<&str> {
        self.device_group_key.as_deref()
    }

    pub fn device_password(&self) -> Option<&str> {
        self.device_password.as_deref()
    }
}
