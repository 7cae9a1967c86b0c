//! Session operations: refresh, expiry checks, device enrollment,
//! admin auth and logout

use rscognito_core::{AuthenticationResult, Error};

use crate::tests::{fixtures, mock::MockIdp};
use crate::SessionBuilder;

fn refresh_result() -> AuthenticationResult {
    AuthenticationResult {
        refresh_token: None,
        ..fixtures::auth_result()
    }
}

#[test]
fn renew_access_token_keeps_the_refresh_token() {
    fixtures::seed_jwks("eu-west-1_OpsRenew");

    let mut mock = MockIdp::default();
    mock.initiate_replies.push(fixtures::tokens_reply(refresh_result()));

    let mut session = SessionBuilder::new("eu-west-1_OpsRenew", "client-abc")
        .username("alice")
        .tokens(fixtures::ID_TOKEN, fixtures::EXPIRED_ACCESS_TOKEN, "refresh-1")
        .device("dev-1", "grp-1", None)
        .open(mock)
        .unwrap();

    session.renew_access_token().unwrap();

    assert_eq!(session.access_token(), Some(fixtures::ACCESS_TOKEN));
    assert_eq!(session.id_token(), Some(fixtures::ID_TOKEN));
    assert_eq!(session.refresh_token(), Some("refresh-1"));

    let (client_id, flow, params) = &session.client().initiate_calls[0];
    assert_eq!(client_id, "client-abc");
    assert_eq!(flow, "REFRESH_TOKEN");
    assert_eq!(params["REFRESH_TOKEN"], "refresh-1");
    assert_eq!(params["DEVICE_KEY"], "dev-1");
}

#[test]
fn check_token_renews_only_when_expired() {
    fixtures::seed_jwks("eu-west-1_OpsCheck");

    let mut mock = MockIdp::default();
    mock.initiate_replies.push(fixtures::tokens_reply(refresh_result()));

    let mut session = SessionBuilder::new("eu-west-1_OpsCheck", "client-abc")
        .tokens(fixtures::ID_TOKEN, fixtures::EXPIRED_ACCESS_TOKEN, "refresh-1")
        .open(mock)
        .unwrap();

    assert!(session.check_token(true).unwrap());
    assert_eq!(session.access_token(), Some(fixtures::ACCESS_TOKEN));

    // Now current; a second check issues no refresh call
    assert!(!session.check_token(true).unwrap());
    assert_eq!(session.client().initiate_calls.len(), 1);
}

#[test]
fn check_token_without_renewal_just_reports() {
    let mock = MockIdp::default();
    let mut session = SessionBuilder::new("eu-west-1_OpsCheckNoRenew", "client-abc")
        .tokens(fixtures::ID_TOKEN, fixtures::EXPIRED_ACCESS_TOKEN, "refresh-1")
        .open(mock)
        .unwrap();

    assert!(session.check_token(false).unwrap());
    assert!(session.client().initiate_calls.is_empty());
}

#[test]
fn check_token_requires_an_access_token() {
    let mock = MockIdp::default();
    let mut session = SessionBuilder::new("eu-west-1_OpsNoToken", "client-abc")
        .open(mock)
        .unwrap();

    let err = session.check_token(true).unwrap_err();
    assert!(matches!(err, Error::AccessTokenRequired));
}

#[test]
fn admin_authenticate_bypasses_srp() {
    fixtures::seed_jwks("eu-west-1_OpsAdmin");

    let mut mock = MockIdp::default();
    mock.admin_initiate_replies
        .push(fixtures::tokens_reply(fixtures::auth_result()));

    let mut session = SessionBuilder::new("eu-west-1_OpsAdmin", "abc")
        .username("alice")
        .client_secret("s3cret")
        .open(mock)
        .unwrap();

    session.admin_authenticate("hunter2").unwrap();
    assert_eq!(session.access_token(), Some(fixtures::ACCESS_TOKEN));

    let (pool, client_id, flow, params) = &session.client().admin_initiate_calls[0];
    assert_eq!(pool, "eu-west-1_OpsAdmin");
    assert_eq!(client_id, "abc");
    assert_eq!(flow, "ADMIN_NO_SRP_AUTH");
    assert_eq!(params["USERNAME"], "alice");
    assert_eq!(params["PASSWORD"], "hunter2");
    assert_eq!(
        params["SECRET_HASH"],
        "ow5kPfU7hNNZ98jlAU3VSiZTgs6Mwt+UiEeN+J9THWM="
    );
}

#[test]
fn logout_clears_the_token_slots() {
    let mock = MockIdp::default();
    let mut session = SessionBuilder::new("eu-west-1_OpsLogout", "client-abc")
        .tokens(fixtures::ID_TOKEN, fixtures::ACCESS_TOKEN, "refresh-1")
        .open(mock)
        .unwrap();

    session.logout().unwrap();

    assert_eq!(session.id_token(), None);
    assert_eq!(session.access_token(), None);
    assert_eq!(session.refresh_token(), None);
    assert_eq!(session.token_type(), None);
    assert_eq!(session.client().signed_out, vec![fixtures::ACCESS_TOKEN]);
}

#[test]
fn device_enrollment_gate() {
    let mock = MockIdp::default();
    let mut session = SessionBuilder::new("eu-west-1_OpsDevGate", "client-abc")
        .tokens(fixtures::ID_TOKEN, fixtures::ACCESS_TOKEN, "refresh-1")
        .open(mock)
        .unwrap();

    // No server issued group key yet
    assert!(!session.can_register_device());
    let err = session.register_device("laptop", true).unwrap_err();
    assert!(matches!(err, Error::DeviceRegistrationDisallowed(_)));

    let mock = MockIdp::default();
    let mut session = SessionBuilder::new("eu-west-1_OpsDevGate", "client-abc")
        .tokens(fixtures::ID_TOKEN, fixtures::ACCESS_TOKEN, "refresh-1")
        .device("dev-1", "grp-1", None)
        .open(mock)
        .unwrap();

    assert!(session.can_register_device());
    let password = session.register_device("laptop", true).unwrap();
    assert_eq!(session.device_password(), Some(password.as_str()));

    {
        let mock = session.client();
        let (device_key, device_name, verifier) = &mock.confirmed_devices[0];
        assert_eq!(device_key, "dev-1");
        assert_eq!(device_name, "laptop");
        assert!(!verifier.password_verifier.is_empty());
        assert!(!verifier.salt.is_empty());
        assert_eq!(mock.device_statuses, vec![("dev-1".to_string(), true)]);
    }

    // Already enrolled now
    assert!(!session.can_register_device());
    let err = session.register_device("laptop", true).unwrap_err();
    assert!(matches!(err, Error::DeviceRegistrationDisallowed(_)));
}

#[test]
fn builder_rejects_a_bare_pool_id() {
    match SessionBuilder::new("nounderscore", "client-abc").open(MockIdp::default()) {
        Err(Error::Config(_)) => {}
        Err(other) => panic!("unexpected error: {:?}", other),
        Ok(_) => panic!("expected an error"),
    }
}

#[test]
fn builder_derives_the_region_from_the_pool_id() {
    let session = SessionBuilder::new("ap-southeast-2_Pool", "client-abc")
        .open(MockIdp::default())
        .unwrap();
    assert_eq!(session.region(), "ap-southeast-2");
}
