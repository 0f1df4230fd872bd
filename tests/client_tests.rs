//! API 客户端集成测试

use rbac_console::client::ApiClient;
use rbac_console::config::ApiConfig;
use rbac_console::error::ConsoleError;
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{create_test_client, TEST_COOKIE};

#[tokio::test]
async fn test_requests_carry_session_cookie_and_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/UserInfo/current"))
        .and(header("cookie", format!(".AspNetCore.Cookies={}", TEST_COOKIE).as_str()))
        .and(header_exists("x-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "userId": "U001" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let body = client.get(&["api", "UserInfo", "current"], &[]).await.unwrap();
    assert_eq!(body, Some(json!({ "userId": "U001" })));
}

#[tokio::test]
async fn test_no_content_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/CmApplications/APP1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let body = client.delete(&["api", "CmApplications", "APP1"]).await.unwrap();
    assert!(body.is_none());
}

#[tokio::test]
async fn test_empty_success_body_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/Rbac"))
        .and(body_json(json!({ "appCode": "APP1" })))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let body = client
        .post(&["api", "Rbac"], &json!({ "appCode": "APP1" }))
        .await
        .unwrap();
    assert!(body.is_none());
}

#[tokio::test]
async fn test_client_error_keeps_json_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/CmAppRoles"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "Role already exists" })),
        )
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let err = client
        .post(&["api", "CmAppRoles"], &json!({}))
        .await
        .unwrap_err();

    match &err {
        ConsoleError::Http { status, payload } => {
            assert_eq!(*status, 409);
            assert_eq!(payload["message"], "Role already exists");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.code(), 409);
    assert_eq!(err.user_message(), "Request failed (409): Role already exists");
}

#[tokio::test]
async fn test_server_error_keeps_text_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/CmApplications"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let err = client.get(&["api", "CmApplications"], &[]).await.unwrap_err();
    match err {
        ConsoleError::Http { status, payload } => {
            assert_eq!(status, 500);
            assert_eq!(payload, json!("boom"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/CmApplications"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let err = client.get(&["api", "CmApplications"], &[]).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Decode(_)));
}

#[tokio::test]
async fn test_query_parameters_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/AuthUsers"))
        .and(query_param("keyword", "wang li"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let body = client
        .get(&["api", "AuthUsers"], &[("keyword", "wang li")])
        .await
        .unwrap();
    assert_eq!(body, Some(json!([])));
}

#[tokio::test]
async fn test_download_reads_file_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/UserReviewForm/download"))
        .and(query_param("appCode", "APP1"))
        .and(query_param("format", "xlsx"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-disposition",
                    "attachment; filename=\"review_APP1.xlsx\"",
                )
                .set_body_bytes(vec![1u8, 2, 3]),
        )
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let download = client
        .download(
            &["api", "UserReviewForm", "download"],
            &[("appCode", "APP1"), ("format", "xlsx")],
        )
        .await
        .unwrap();
    assert_eq!(download.bytes, vec![1, 2, 3]);
    assert_eq!(download.file_name.as_deref(), Some("review_APP1.xlsx"));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // 先占用再释放一个端口，保证无人监听
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ApiConfig {
        base_url: format!("http://127.0.0.1:{}", port),
        timeout_secs: 2,
        session_cookie: None,
        cookie_name: ".AspNetCore.Cookies".to_string(),
    };
    let client = ApiClient::new(&config).unwrap();

    let err = client.get(&["api", "CmApplications"], &[]).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Transport(_)));
    assert_eq!(err.user_message(), "Unable to reach the server");
}
