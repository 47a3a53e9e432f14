//! Client tests against a mock proxy.

use advisory_common::Category;
use advisory_client::{AdvisoryClient, ClientConfig, ClientError};
use test_utils::{airsigmet_collection, sigmet_collection};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> AdvisoryClient {
    AdvisoryClient::new(ClientConfig::default().with_base_url(server.uri())).unwrap()
}

#[tokio::test]
async fn test_fetch_decodes_collection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/isigmet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sigmet_collection()))
        .expect(1)
        .mount(&server)
        .await;

    let collection = client_for(&server).fetch(Category::Sigmet).await;
    assert_eq!(collection.len(), 2);
}

#[tokio::test]
async fn test_server_error_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/airsigmet"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(serde_json::json!({"message": "Error fetching AIRSIGMET data"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.try_fetch(Category::Airsigmet).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 500, .. }));
    assert!(client.fetch(Category::Airsigmet).await.is_empty());
}

#[tokio::test]
async fn test_invalid_body_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/isigmet"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(
        client.try_fetch(Category::Sigmet).await,
        Err(ClientError::Decode(_))
    ));
    assert!(client.fetch(Category::Sigmet).await.is_empty());
}

#[tokio::test]
async fn test_fetch_all_returns_every_category() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/isigmet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sigmet_collection()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/airsigmet"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let datasets = client_for(&server).fetch_all().await;
    assert_eq!(datasets.len(), 2);

    let sigmet = datasets.iter().find(|(c, _)| *c == Category::Sigmet).unwrap();
    let airsigmet = datasets.iter().find(|(c, _)| *c == Category::Airsigmet).unwrap();
    assert_eq!(sigmet.1.len(), 2);
    assert!(airsigmet.1.is_empty());
}

#[tokio::test]
async fn test_fixture_airsigmet_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/airsigmet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(airsigmet_collection()))
        .mount(&server)
        .await;

    let collection = client_for(&server).fetch(Category::Airsigmet).await;
    let props = collection.features[0].properties.as_ref().unwrap();
    assert_eq!(props["hazard"], "IFR");
}
