//! Sign-in routes driven end-to-end over HTTP.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bancroft_auth::prelude::*;

fn router_for(server_uri: &str) -> Router {
    let config = PortalConfig {
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
            ..OtpConfig::default()
        },
        session: SessionConfig {
            cookie_secure: false,
            ..SessionConfig::default()
        },
        ..PortalConfig::default()
    };

    let orchestrator = Arc::new(
        SigninOrchestrator::new(&config, Arc::new(MemorySessionStore::default())).unwrap(),
    );
    signin_router(SigninFlowState {
        orchestrator,
        session: config.session.clone(),
    })
}

async fn mount_no_step_up_backend(server: &MockServer) {
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
            "bpId": "",
            "customerName": "Karoo Trading",
            "contactMechanisms": [],
            "relatedParties": []
        })))
        .mount(server)
        .await;
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn state_without_session_is_welcome() {
    let server = MockServer::start().await;
    let router = router_for(&server.uri());

    let response = router
        .oneshot(Request::get("/signin/state").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["state"], "welcome");
}

#[tokio::test]
async fn start_redirects_to_idp_and_sets_the_session_cookie() {
    let server = MockServer::start().await;
    let router = router_for(&server.uri());

    let response = router
        .oneshot(Request::get("/signin/start").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with(&format!("{}/authorize?", server.uri())));
    assert!(location.contains("code_challenge_method=S256"));

    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("bancroft_session="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn full_flow_over_http_without_step_up() {
    let server = MockServer::start().await;
    mount_no_step_up_backend(&server).await;
    let router = router_for(&server.uri());

    // Start: capture the cookie and the state echoed by the IdP.
    let response = router
        .clone()
        .oneshot(Request::get("/signin/start").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    let state = url::Url::parse(location)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    // Callback.
    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/signin/callback?code=abc123&state={state}"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["state"], "business_profile_selection");

    // Profile selection enters the application.
    let response = router
        .clone()
        .oneshot(
            Request::post("/signin/profile")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"party_id": "party-9"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["state"], "entered");

    // Sign-out clears the session.
    let response = router
        .clone()
        .oneshot(
            Request::post("/signout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["state"], "welcome");

    let response = router
        .oneshot(
            Request::get("/signin/state")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["state"], "welcome");
}

#[tokio::test]
async fn callback_without_cookie_is_rejected() {
    let server = MockServer::start().await;
    let router = router_for(&server.uri());

    let response = router
        .oneshot(
            Request::get("/signin/callback?code=abc123&state=s")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn idp_error_maps_to_restart_response() {
    let server = MockServer::start().await;
    let router = router_for(&server.uri());

    let response = router
        .clone()
        .oneshot(Request::get("/signin/start").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let response = router
        .oneshot(
            Request::get("/signin/callback?error=access_denied&error_description=denied")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["restart"], true);
    assert!(body["error"].as_str().unwrap().contains("access_denied"));
}
