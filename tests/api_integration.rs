//! Management API client 통합 테스트
//!
//! wiremock을 사용한 HTTP 모킹 테스트

use rabbitmq_zabbix::api::{ManagementClient, MetricValue};
use rabbitmq_zabbix::error::ApiError;
use serde_json::json;
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ManagementClient {
    ManagementClient::new(&format!("{}/api", server.uri()))
        .unwrap()
        .with_auth("monitor", "secret")
}

#[tokio::test]
async fn test_queues_success_with_basic_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/queues"))
        .and(basic_auth("monitor", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "orders",
                "vhost": "/",
                "node": "rabbit@mq-01",
                "messages": 5,
                "consumers": 1,
                "message_stats": {"publish": 100, "publish_details": {"rate": 0.2}}
            },
            {"name": "audit", "vhost": "logs", "node": "rabbit@mq-02"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let queues = client_for(&mock_server).queues().await.unwrap();

    assert_eq!(queues.len(), 2);
    assert_eq!(queues[0].name, "orders");
    assert_eq!(queues[0].messages, Some(MetricValue::Unsigned(5)));
    assert_eq!(queues[1].vhost, "logs");
    assert!(queues[1].message_stats.is_none());
}

#[tokio::test]
async fn test_fetch_returns_raw_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/overview"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"rabbitmq_version": "3.13.0"})),
        )
        .mount(&mock_server)
        .await;

    let value = client_for(&mock_server).fetch(&["overview"]).await.unwrap();
    assert_eq!(value["rabbitmq_version"], "3.13.0");
}

#[tokio::test]
async fn test_aliveness_vhost_is_percent_encoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/aliveness-test/%2F"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let status = client_for(&mock_server).aliveness("/").await.unwrap();
    assert!(status.is_ok());
}

#[tokio::test]
async fn test_404_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/shovels"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).shovels().await;
    match result {
        Err(e) => {
            assert!(e.is_not_found());
            assert_eq!(e.http_status(), Some(404));
        }
        Ok(_) => panic!("expected NotFound"),
    }
}

#[tokio::test]
async fn test_http_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).nodes().await;
    assert!(matches!(
        result,
        Err(ApiError::Status { status: 401, .. })
    ));
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/exchanges"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).exchanges().await;
    assert!(matches!(result, Err(ApiError::Parse { .. })));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = ManagementClient::new(&format!("http://127.0.0.1:{}/api", port)).unwrap();
    let result = client.overview().await;
    assert!(matches!(result, Err(ApiError::Transport(_))));
}

#[tokio::test]
async fn test_single_attempt_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).queues().await;
    assert!(result.is_err());
}
