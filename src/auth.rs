//! The SRP challenge/response state machine
//!
//! Drives one authentication attempt against the identity provider:
//! initiate, answer the password verifier challenge, then dispatch on
//! whatever the server asks for next. Each entry point consumes the
//! flow; a failed attempt needs a fresh one.

use std::collections::HashMap;

use log::debug;

use rscognito_core::{AuthFlow, AuthReply, ChallengeName, Error, IdpClient};
use rscognito_srp::{SrpClient, SrpConfig};

pub(crate) struct SrpFlow<'a, C: IdpClient> {
    cli: &'a mut C,
    srp: SrpClient,
    client_id: String,
    username: String,
}

impl<'a, C: IdpClient> SrpFlow<'a, C> {
    pub fn new(cli: &'a mut C, conf: SrpConfig) -> Result<Self, Error> {
        let client_id = conf.client_id.clone();
        let username = conf.username.clone();
        let srp = SrpClient::new(conf)?;

        Ok(Self {
            cli,
            srp,
            client_id,
            username,
        })
    }

    /// USER_SRP_AUTH initiate call. The server must come back with a
    /// password verifier challenge.
    fn initiate(&mut self) -> Result<AuthReply, Error> {
        debug!("initiating SRP auth for {}", self.username);

        let reply =
            self.cli
                .initiate_auth(&self.client_id, AuthFlow::UserSrpAuth, &self.srp.auth_params())?;

        match reply.challenge() {
            Some(ChallengeName::PasswordVerifier) => Ok(reply),
            _ => Err(unsupported(&reply)),
        }
    }

    /// Answer the password verifier challenge with the signed claim
    fn respond_password_verifier(&mut self, challenge: &AuthReply) -> Result<AuthReply, Error> {
        let responses = self.srp.process_challenge(&challenge.challenge_parameters)?;

        self.cli.respond_to_auth_challenge(
            &self.client_id,
            ChallengeName::PasswordVerifier,
            &responses,
            None,
        )
    }

    /// Password-only entry point. MFA and password rotation demands
    /// surface as errors carrying the context needed to resume.
    pub fn authenticate(mut self) -> Result<AuthReply, Error> {
        let initial = self.initiate()?;
        let reply = self.respond_password_verifier(&initial)?;

        match reply.challenge() {
            Some(ChallengeName::DeviceSrpAuth) => self.authenticate_device(),
            Some(ChallengeName::SoftwareTokenMfa) => Err(mfa_required(&initial, &reply)),
            Some(ChallengeName::NewPasswordRequired) => Err(Error::ForceChangePassword {
                session: reply.session.unwrap_or_default(),
            }),
            Some(_) => Err(unsupported(&reply)),
            None if reply.challenge_name.is_some() => Err(unsupported(&reply)),
            None => Ok(reply),
        }
    }

    /// Entry point for users enrolled in software token MFA
    pub fn authenticate_with_mfa(mut self, mfa_code: &str) -> Result<AuthReply, Error> {
        let initial = self.initiate()?;
        // The MFA answer must echo the username the server returned
        // with the initial challenge, not the caller supplied one
        let user_sub = match initial.challenge_parameters.get("USERNAME") {
            Some(u) => u.clone(),
            None => return rscognito_core::err_missing_param("USERNAME"),
        };

        let reply = self.respond_password_verifier(&initial)?;

        match reply.challenge() {
            Some(ChallengeName::SoftwareTokenMfa) => {
                debug!("answering software token MFA challenge for {}", user_sub);

                let mut responses = HashMap::new();
                responses.insert("USERNAME".to_string(), user_sub);
                responses.insert("SOFTWARE_TOKEN_MFA_CODE".to_string(), mfa_code.to_string());

                self.cli.respond_to_auth_challenge(
                    &self.client_id,
                    ChallengeName::SoftwareTokenMfa,
                    &responses,
                    reply.session.as_deref(),
                )
            }
            Some(ChallengeName::DeviceSrpAuth) => self.authenticate_device(),
            Some(ChallengeName::NewPasswordRequired) => Err(Error::ForceChangePassword {
                session: reply.session.unwrap_or_default(),
            }),
            Some(_) => Err(unsupported(&reply)),
            None if reply.challenge_name.is_some() => Err(unsupported(&reply)),
            None => Ok(reply),
        }
    }

    /// Entry point for completing a server demanded password rotation
    pub fn set_new_password(mut self, new_password: &str) -> Result<AuthReply, Error> {
        let initial = self.initiate()?;
        let reply = self.respond_password_verifier(&initial)?;

        match reply.challenge() {
            Some(ChallengeName::NewPasswordRequired) => {
                debug!("setting new password for {}", self.username);

                let mut responses = HashMap::new();
                responses.insert("USERNAME".to_string(), self.username.clone());
                responses.insert("NEW_PASSWORD".to_string(), new_password.to_string());

                self.cli.respond_to_auth_challenge(
                    &self.client_id,
                    ChallengeName::NewPasswordRequired,
                    &responses,
                    reply.session.as_deref(),
                )
            }
            Some(ChallengeName::DeviceSrpAuth) => self.authenticate_device(),
            Some(ChallengeName::SoftwareTokenMfa) => Err(mfa_required(&initial, &reply)),
            Some(_) => Err(unsupported(&reply)),
            None if reply.challenge_name.is_some() => Err(unsupported(&reply)),
            None => Ok(reply),
        }
    }

    /// The trusted device re-auth branch: a second SRP exchange keyed
    /// by the device secrets, entered straight through
    /// respond_to_auth_challenge without a new initiate call
    fn authenticate_device(&mut self) -> Result<AuthReply, Error> {
        debug!("entering device SRP auth");

        let reply = self.cli.respond_to_auth_challenge(
            &self.client_id,
            ChallengeName::DeviceSrpAuth,
            &self.srp.auth_params(),
            None,
        )?;

        let responses = self
            .srp
            .process_device_challenge(&reply.challenge_parameters)?;

        self.cli.respond_to_auth_challenge(
            &self.client_id,
            ChallengeName::DevicePasswordVerifier,
            &responses,
            None,
        )
    }
}

fn unsupported(reply: &AuthReply) -> Error {
    match &reply.challenge_name {
        Some(name) => Error::UnsupportedChallenge(name.clone()),
        None => Error::MalformedReply("no challenge and no authentication result".to_string()),
    }
}

fn mfa_required(initial: &AuthReply, reply: &AuthReply) -> Error {
    Error::MfaRequired {
        session: reply.session.clone().unwrap_or_default(),
        username: initial
            .challenge_parameters
            .get("USERNAME")
            .cloned()
            .unwrap_or_default(),
    }
}
