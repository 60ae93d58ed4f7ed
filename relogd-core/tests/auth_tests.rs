use relogd_core::config::GatewayConfig;
use relogd_core::error::LoginError;
use relogd_core::portal::{Authenticator, PortalAuthenticator};
use relogd_core::types::Credentials;
use secrecy::Secret;
use std::time::Duration;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const LOGIN_PATH: &str = "/eportal/portal/login";

fn authenticator_for(server: &MockServer, password: &str) -> PortalAuthenticator {
    let gateway = GatewayConfig {
        endpoint: format!("{}{}", server.uri(), LOGIN_PATH),
        timeout_secs: 1,
        ..GatewayConfig::default()
    };
    let credentials = Credentials::new("20231234", Secret::new(password.to_string()), "cmcc");
    PortalAuthenticator::new(credentials, gateway).unwrap()
}

async fn gateway_replying(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    server
}

/// Test the request carries every query parameter the gateway expects
#[tokio::test]
async fn test_login_sends_expected_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LOGIN_PATH))
        .and(query_param("callback", "dr1003"))
        .and(query_param("login_method", "1"))
        .and(query_param("user_account", ",0,20231234@cmcc"))
        .and(query_param("user_password", "p&ss word"))
        .and(query_param("wlan_user_ip", "10.38.64.137"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"dr1003({"info":1})"#))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = authenticator_for(&server, "p&ss word").login().await;

    assert!(outcome.is_success());
    assert!(outcome.error().is_none());
}

#[tokio::test]
async fn test_login_success_envelope() {
    let server =
        gateway_replying(r#"dr1003({"result":1,"msg":"Portal协议认证成功！","info":1});"#).await;

    let outcome = authenticator_for(&server, "pw").login().await;

    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_login_rejected_by_gateway() {
    let server = gateway_replying(r#"dr1003({"info":0,"msg":"ldap auth error"})"#).await;

    let outcome = authenticator_for(&server, "pw").login().await;

    assert!(!outcome.is_success());
    assert_eq!(
        outcome.error(),
        Some(&LoginError::Rejected {
            message: "ldap auth error".to_string()
        })
    );
}

#[tokio::test]
async fn test_login_unexpected_info_code() {
    let server = gateway_replying(r#"dr1003({"info":-1})"#).await;

    let outcome = authenticator_for(&server, "pw").login().await;

    assert_eq!(outcome.error(), Some(&LoginError::UnexpectedInfo { code: -1 }));
}

#[tokio::test]
async fn test_login_missing_info_field() {
    let server = gateway_replying(r#"dr1003({"result":0})"#).await;

    let outcome = authenticator_for(&server, "pw").login().await;
    let error = outcome.error().unwrap();

    assert_eq!(error, &LoginError::MissingInfo);
    assert!(!error.is_transport());
}

#[tokio::test]
async fn test_login_malformed_envelopes() {
    for body in [
        r#"{"info":1}"#,
        r#"dr1003({"info":1}"#,
        r#"dr1003{"info":1})"#,
        r#")dr1003({"info":1}"#,
        "",
    ] {
        let server = gateway_replying(body).await;

        let outcome = authenticator_for(&server, "pw").login().await;

        assert!(
            matches!(outcome.error(), Some(LoginError::MalformedEnvelope { .. })),
            "body {:?} gave {:?}",
            body,
            outcome.error()
        );
    }
}

#[tokio::test]
async fn test_login_invalid_json() {
    let server = gateway_replying("dr1003(<html>)").await;

    let outcome = authenticator_for(&server, "pw").login().await;
    let error = outcome.error().unwrap();

    assert!(matches!(error, LoginError::InvalidJson { .. }));
    assert!(error.is_protocol());
}

/// Test a dead gateway is a transport failure, distinct from any verdict
#[tokio::test]
async fn test_login_connection_refused() {
    let gateway = GatewayConfig {
        endpoint: "http://127.0.0.1:59998/eportal/portal/login".to_string(),
        timeout_secs: 1,
        ..GatewayConfig::default()
    };
    let credentials = Credentials::new("alice", Secret::new("pw".to_string()), "cmcc");
    let auth = PortalAuthenticator::new(credentials, gateway).unwrap();

    let outcome = auth.login().await;
    let error = outcome.error().unwrap();

    assert!(error.is_transport());
    assert!(!error.to_string().contains("pw"), "password must not leak");
}

#[tokio::test]
async fn test_login_timeout_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"dr1003({"info":1})"#)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let outcome = authenticator_for(&server, "pw").login().await;

    match outcome.error() {
        Some(LoginError::Transport { reason }) => {
            assert!(reason.to_lowercase().contains("timeout"))
        }
        other => panic!("expected a transport error, got: {:?}", other),
    }
}
