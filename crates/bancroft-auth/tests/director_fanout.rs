//! Director fan-out behavior against a mocked directory.

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bancroft_auth::{
    CustomerProfile, CustomerProfileResolver, DirectoryClient, DirectoryConfig,
};

fn resolver_for(server_uri: &str) -> CustomerProfileResolver {
    let config = DirectoryConfig {
        profile_endpoint: format!("{server_uri}/customers"),
        guid_lookup_endpoint: format!("{server_uri}/guid-lookup"),
        max_concurrency: 4,
    };
    CustomerProfileResolver::new(DirectoryClient::new(config, reqwest::Client::new()), 4)
}

fn board_profile(director_bp_ids: &[&str]) -> CustomerProfile {
    let related: Vec<serde_json::Value> = director_bp_ids
        .iter()
        .map(|bp_id| {
            serde_json::json!({
                "bpId": bp_id,
                "name": format!("Director {bp_id}"),
                "relationshipType": "DIRECTOR"
            })
        })
        .collect();
    serde_json::from_value(serde_json::json!({
        "partyId": "party-1",
        "bpId": "480012",
        "customerName": "Karoo Trading",
        "relatedParties": related
    }))
    .unwrap()
}

fn guid_lookup_body(bp_id: &str, bp_guid: &str, http_status: &str) -> serde_json::Value {
    serde_json::json!({
        "customers": [{
            "bpId": bp_id,
            "bpGuid": bp_guid,
            "errorMsg": if http_status == "OK" { "" } else { "lookup failed" },
            "httpStatus": http_status
        }]
    })
}

fn director_profile(bp_id: &str) -> serde_json::Value {
    serde_json::json!({
        "partyId": format!("party-{bp_id}"),
        "bpId": bp_id,
        "customerName": format!("Director {bp_id}"),
        "relationshipType": "DIRECTOR"
    })
}

#[tokio::test]
async fn one_failed_guid_lookup_out_of_three_still_resolves_the_rest() {
    let server = MockServer::start().await;

    for (bp_id, guid) in [("1001", "g-1001"), ("1002", "g-1002")] {
        Mock::given(method("POST"))
            .and(path("/guid-lookup"))
            .and(body_string_contains(bp_id))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(guid_lookup_body(bp_id, guid, "OK")),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/customers/guid/{guid}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(director_profile(bp_id)))
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/guid-lookup"))
        .and(body_string_contains("1003"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(guid_lookup_body("1003", "", "NOT_FOUND")),
        )
        .mount(&server)
        .await;

    let resolver = resolver_for(&server.uri());
    let profile = board_profile(&["1001", "1002", "1003"]);

    let resolution = resolver.resolve_directors(&profile, "token").await;

    assert_eq!(resolution.success.len(), 2);
    assert_eq!(resolution.failed.len(), 1);
    assert_eq!(resolution.failed[0].bp_id, "1003");
    assert!(resolution.failed[0].reason.contains("NOT_FOUND"));

    let mut resolved: Vec<&str> = resolution.success.iter().map(|p| p.bp_id.as_str()).collect();
    resolved.sort_unstable();
    assert_eq!(resolved, vec!["1001", "1002"]);
}

#[tokio::test]
async fn failed_profile_fetch_is_collected_per_item() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/guid-lookup"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(guid_lookup_body("1001", "g-1001", "OK")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/customers/guid/g-1001"))
        .respond_with(ResponseTemplate::new(500).set_body_string("directory fault"))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server.uri());
    let profile = board_profile(&["1001"]);

    let resolution = resolver.resolve_directors(&profile, "token").await;

    assert!(resolution.success.is_empty());
    assert_eq!(resolution.failed.len(), 1);
    assert_eq!(resolution.failed[0].bp_id, "1001");
}

#[tokio::test]
async fn zero_directors_returns_empty_without_network_calls() {
    let server = MockServer::start().await;
    // Any request would 404 and surface as a failure entry.

    let resolver = resolver_for(&server.uri());
    let profile = board_profile(&[]);

    let resolution = resolver.resolve_directors(&profile, "token").await;

    assert!(resolution.success.is_empty());
    assert!(resolution.failed.is_empty());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn profile_lookup_sends_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customers/subject-1"))
        .and(header("authorization", "Bearer at-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(director_profile("480012")))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = resolver_for(&server.uri());
    let profile = resolver.resolve_by_identity("subject-1", "at-test").await.unwrap();

    assert_eq!(profile.bp_id, "480012");
}
