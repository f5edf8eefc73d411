//! Integration tests for the site API client.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hydrant::FetchError;
use hydrant::site::SiteClient;

fn client(server: &MockServer) -> SiteClient {
    SiteClient::new(server.uri(), "hydrant-test", Duration::from_secs(5)).unwrap()
}

async fn respond(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn stats_counts_are_lenient() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/stats/",
        json!({
            "blueprintExtensions": [{ "id": 1 }, { "id": 2 }],
            "totalApiCalls": "12345",
            "totalInstalls": -4,
        }),
    )
    .await;

    let stats = client(&server).get_stats().await.unwrap();
    assert_eq!(stats.blueprint_count(), 2);
    assert_eq!(stats.total_api_calls, 12345);
    assert_eq!(stats.total_installs, 0);
}

#[tokio::test]
async fn stats_missing_fields_default_to_zero() {
    let server = MockServer::start().await;
    respond(&server, "/stats/", json!({ "blueprintExtensions": "nope" })).await;

    let stats = client(&server).get_stats().await.unwrap();
    assert_eq!(stats.blueprint_count(), 0);
    assert_eq!(stats.total_api_calls, 0);
}

#[tokio::test]
async fn donors_drop_unsafe_links() {
    let server = MockServer::start().await;
    respond(
        &server,
        "/donators",
        json!([
            {
                "Name": "Ada",
                "Donation": "£5",
                "Link": "https://ada.example",
                "Image": "javascript:alert(1)"
            },
            { "Name": "Bob", "Link": "/relative" },
            "not an object",
            { "Donation": "£1" },
            { "Name": "Cy", "Donation": 5, "Link": 42 }
        ]),
    )
    .await;

    let donors = client(&server).get_donors().await.unwrap();
    assert_eq!(donors.len(), 4);
    assert_eq!(donors[0].name, "Ada");
    assert_eq!(donors[0].link.as_deref(), Some("https://ada.example/"));
    assert_eq!(donors[0].image, None);
    assert_eq!(donors[1].link, None);
    assert_eq!(donors[2].name, "Unknown");
    assert_eq!(donors[3].name, "Cy");
    assert_eq!(donors[3].donation.as_deref(), Some("5"));
    assert_eq!(donors[3].link, None);
}

#[tokio::test]
async fn donors_non_list_body_is_empty() {
    let server = MockServer::start().await;
    respond(&server, "/donators", json!({ "error": "maintenance" })).await;

    assert!(client(&server).get_donors().await.unwrap().is_empty());
}

#[tokio::test]
async fn site_errors_map_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).get_stats().await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 503, .. }));
}

#[tokio::test]
async fn unparseable_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client(&server).get_stats().await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)), "{err:?}");
}
