//! OTP step-up behavior: cooldown, resend supersession, stale queues.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bancroft_auth::prelude::*;

fn config_for(server_uri: &str, cooldown: Duration) -> PortalConfig {
    PortalConfig {
        idp: IdpConfig {
            authorization_endpoint: format!("{server_uri}/authorize"),
            token_endpoint: format!("{server_uri}/token"),
            userinfo_endpoint: format!("{server_uri}/userinfo"),
            client_id: "portal-web".to_string(),
            redirect_uri: "https://portal.example.com/signin/callback".to_string(),
            scopes: Vec::new(),
        },
        directory: DirectoryConfig {
            profile_endpoint: format!("{server_uri}/customers"),
            guid_lookup_endpoint: format!("{server_uri}/guid-lookup"),
            max_concurrency: 4,
        },
        otp: OtpConfig {
            endpoint: format!("{server_uri}/otp"),
            resend_cooldown: cooldown,
            ..OtpConfig::default()
        },
        ..PortalConfig::default()
    }
}

fn otp_envelope(code: &str, queue: &str) -> String {
    format!(
        "<otp_response><vers_v_response_code>{code}</vers_v_response_code>\
         <otp_qname>{queue}</otp_qname></otp_response>"
    )
}

async fn mount_step_up_idp(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-test",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"sub": "subject-1"})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/customers/subject-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "partyId": "party-9",
            "bpId": "480012",
            "customerName": "Karoo Trading",
            "contactMechanisms": [{"type": "CELLPHONE", "value": "0821234567"}],
            "relatedParties": []
        })))
        .mount(server)
        .await;
}

/// Runs the flow up to the issued challenge and returns the harness.
async fn reach_otp_challenge(
    server: &MockServer,
    cooldown: Duration,
) -> (SigninOrchestrator, SessionId) {
    mount_step_up_idp(server).await;

    let orchestrator = SigninOrchestrator::new(
        &config_for(&server.uri(), cooldown),
        Arc::new(MemorySessionStore::default()),
    )
    .unwrap();
    let session = SessionId::new();

    let url = orchestrator.start_signin(session).await.unwrap();
    let state = url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    let params = CallbackParams {
        code: Some("abc123".to_string()),
        state: Some(state),
        ..CallbackParams::default()
    };
    let landed = orchestrator.handle_callback(session, &params).await.unwrap();
    assert_eq!(landed, SigninState::OtpChallenge);

    (orchestrator, session)
}

#[tokio::test]
async fn resend_before_cooldown_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/otp"))
        .and(body_string_contains("GEN"))
        .respond_with(ResponseTemplate::new(200).set_body_string(otp_envelope("0000", "Q-1")))
        .expect(1)
        .mount(&server)
        .await;

    let (orchestrator, session) = reach_otp_challenge(&server, Duration::from_secs(30)).await;

    let err = orchestrator.resend_otp(session).await.unwrap_err();
    match err {
        SigninError::OtpResendThrottled { remaining } => {
            assert!(remaining <= Duration::from_secs(30));
            assert!(remaining > Duration::from_secs(25));
        }
        other => panic!("unexpected error: {other}"),
    }

    // The original challenge is untouched.
    let challenge = orchestrator
        .pending_challenge(session)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(challenge.queue_name, "Q-1");
}

#[tokio::test]
async fn resend_after_cooldown_supersedes_the_old_queue() {
    let server = MockServer::start().await;
    // First issue answers Q-1, the resend answers Q-2.
    Mock::given(method("POST"))
        .and(path("/otp"))
        .and(body_string_contains("GEN"))
        .respond_with(ResponseTemplate::new(200).set_body_string(otp_envelope("0000", "Q-1")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/otp"))
        .and(body_string_contains("GEN"))
        .respond_with(ResponseTemplate::new(200).set_body_string(otp_envelope("0000", "Q-2")))
        .mount(&server)
        .await;

    let (orchestrator, session) = reach_otp_challenge(&server, Duration::from_millis(20)).await;
    tokio::time::sleep(Duration::from_millis(40)).await;

    let fresh = orchestrator.resend_otp(session).await.unwrap();
    assert_eq!(fresh.queue_name, "Q-2");

    // Validating against the superseded queue name must fail without
    // ever reaching the gateway.
    let err = orchestrator
        .submit_otp(session, "482910", Some("Q-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, SigninError::OtpValidationFailed(_)));

    let validations = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| {
            r.url.path() == "/otp" && String::from_utf8_lossy(&r.body).contains("VAL")
        })
        .count();
    assert_eq!(validations, 0, "stale submission must not reach the gateway");
}

#[tokio::test]
async fn blocking_code_marks_challenge_failed_but_resend_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/otp"))
        .and(body_string_contains("GEN"))
        .respond_with(ResponseTemplate::new(200).set_body_string(otp_envelope("0000", "Q-1")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/otp"))
        .and(body_string_contains("VAL"))
        .respond_with(ResponseTemplate::new(200).set_body_string(otp_envelope("1002", "Q-1")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/otp"))
        .and(body_string_contains("GEN"))
        .respond_with(ResponseTemplate::new(200).set_body_string(otp_envelope("0000", "Q-2")))
        .mount(&server)
        .await;

    let (orchestrator, session) = reach_otp_challenge(&server, Duration::from_millis(20)).await;

    let blocked = orchestrator
        .submit_otp(session, "000000", Some("Q-1"))
        .await
        .unwrap();
    assert_eq!(blocked.outcome.code, OtpResponseCode::TooManyAttempts);
    assert_eq!(blocked.state, SigninState::OtpChallenge);

    // The spent challenge no longer validates.
    let err = orchestrator
        .submit_otp(session, "000000", Some("Q-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, SigninError::OtpValidationFailed(_)));

    // But a resend issues a new challenge under a new queue.
    tokio::time::sleep(Duration::from_millis(40)).await;
    let fresh = orchestrator.resend_otp(session).await.unwrap();
    assert_eq!(fresh.queue_name, "Q-2");
    assert!(fresh.is_pending());
}

#[tokio::test]
async fn expired_reissued_keeps_the_challenge_pending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/otp"))
        .and(body_string_contains("GEN"))
        .respond_with(ResponseTemplate::new(200).set_body_string(otp_envelope("0000", "Q-1")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/otp"))
        .and(body_string_contains("VAL"))
        .and(body_string_contains("111111"))
        .respond_with(ResponseTemplate::new(200).set_body_string(otp_envelope("1003", "Q-1")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/otp"))
        .and(body_string_contains("VAL"))
        .and(body_string_contains("482910"))
        .respond_with(ResponseTemplate::new(200).set_body_string(otp_envelope("0000", "Q-1")))
        .mount(&server)
        .await;

    let (orchestrator, session) = reach_otp_challenge(&server, Duration::from_secs(30)).await;

    let informational = orchestrator
        .submit_otp(session, "111111", Some("Q-1"))
        .await
        .unwrap();
    assert_eq!(informational.outcome.code, OtpResponseCode::ExpiredReissued);
    assert!(informational.outcome.message().contains("new code"));

    // The reissued code still validates on the same queue.
    let ok = orchestrator
        .submit_otp(session, "482910", Some("Q-1"))
        .await
        .unwrap();
    assert!(ok.outcome.code.is_success());
    assert_eq!(ok.state, SigninState::BusinessProfileSelection);
}
