//! 服务层集成测试
//! 响应归一化、客户端过滤、提交前校验

use rbac_console::error::ConsoleError;
use rbac_console::models::{AppRoleRequest, ApplicationRequest, GrantRequest};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::create_test_services;

#[tokio::test]
async fn test_application_list_normalizes_mixed_key_casing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/CmApplications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "apP_CODE": "APP_ATH_01", "apP_NAME": "Attendance", "iS_ACTIVE": "Y" },
                { "appCode": "APP_HR", "appName": "HR", "isActive": false },
                { "description": "row without a code" }
            ]
        })))
        .mount(&server)
        .await;

    let services = create_test_services(&server);
    let apps = services.applications.list().await.unwrap();

    assert_eq!(apps.len(), 2);
    assert_eq!(apps[0].app_code, "APP_ATH_01");
    assert_eq!(apps[0].app_name, "Attendance");
    assert!(apps[0].is_active);
    assert_eq!(apps[1].app_code, "APP_HR");
    assert!(!apps[1].is_active);
}

#[tokio::test]
async fn test_role_list_is_filtered_by_application() {
    let server = MockServer::start().await;
    // 后端忽略 appCode 参数，返回全部角色
    Mock::given(method("GET"))
        .and(path("/api/CmAppRoles"))
        .and(query_param("appCode", "APP1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "apP_CODE": "APP1", "rolE_CODE": "ADMIN", "rolE_NAME": "Administrator" },
            { "apP_CODE": "APP2", "rolE_CODE": "ADMIN", "rolE_NAME": "Administrator" },
            { "apP_CODE": "APP1", "rolE_CODE": "VIEWER", "rolE_NAME": "Viewer" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let services = create_test_services(&server);
    let roles = services.roles.list(Some("APP1")).await.unwrap();

    let codes: Vec<&str> = roles.iter().map(|r| r.role_code.as_str()).collect();
    assert_eq!(codes, vec!["ADMIN", "VIEWER"]);
    assert!(roles.iter().all(|r| r.app_code == "APP1"));
}

#[tokio::test]
async fn test_get_application_without_body_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/CmApplications/MISSING"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let services = create_test_services(&server);
    let err = services.applications.get("MISSING").await.unwrap_err();
    assert!(matches!(err, ConsoleError::NotFound(_)));
    assert_eq!(err.user_message(), "Application MISSING not found");
}

#[tokio::test]
async fn test_get_function_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/CmAppFunctions/APP1/EXPORT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "apP_CODE": "APP1", "funC_CODE": "EXPORT", "funC_NAME": "Export" }
        })))
        .mount(&server)
        .await;

    let services = create_test_services(&server);
    let function = services.functions.get("APP1", "EXPORT").await.unwrap();
    assert_eq!(function.function_code, "EXPORT");
    assert_eq!(function.function_name, "Export");
}

#[tokio::test]
async fn test_invalid_application_is_not_submitted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/CmApplications"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let services = create_test_services(&server);
    let req = ApplicationRequest {
        app_code: "APP1".to_string(),
        app_name: String::new(),
        app_title: None,
        description: None,
        base_url: None,
        login_url: None,
        is_active: true,
    };
    let err = services.applications.create(&req).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(_)));
}

#[tokio::test]
async fn test_update_role_puts_to_composite_path() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/CmAppRoles/APP1/ADMIN"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let services = create_test_services(&server);
    let req = AppRoleRequest {
        app_code: "APP1".to_string(),
        role_code: "ADMIN".to_string(),
        role_name: "Administrator".to_string(),
        description: Some("Full access".to_string()),
        home_url: None,
        is_active: true,
    };
    services.roles.update(&req).await.unwrap();
}

#[tokio::test]
async fn test_grant_delete_sends_key_as_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/CmUserAuthorize"))
        .and(body_json(json!({
            "userId": "U001",
            "appCode": "APP1",
            "roleCode": "ADMIN",
            "siteCode": "S1",
            "domainCode": "D1",
            "factoryCode": "F1"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let services = create_test_services(&server);
    let req = GrantRequest {
        user_id: "U001".to_string(),
        app_code: "APP1".to_string(),
        role_code: "ADMIN".to_string(),
        site_code: "S1".to_string(),
        domain_code: "D1".to_string(),
        factory_code: "F1".to_string(),
    };
    services.grants.delete(&req).await.unwrap();
}

#[tokio::test]
async fn test_grant_requires_all_fields() {
    let server = MockServer::start().await;
    let services = create_test_services(&server);
    let req = GrantRequest {
        user_id: "U001".to_string(),
        app_code: "APP1".to_string(),
        role_code: String::new(),
        site_code: "S1".to_string(),
        domain_code: String::new(),
        factory_code: "F1".to_string(),
    };
    let err = services.grants.create(&req).await.unwrap_err();
    match err {
        ConsoleError::Validation(errors) => {
            let fields = errors.field_errors();
            assert!(fields.contains_key("role_code"));
            assert!(fields.contains_key("domain_code"));
            assert_eq!(fields.len(), 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_grant_list_filters_by_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/CmUserAuthorize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "useR_ID": "U001", "apP_CODE": "APP1", "rolE_CODE": "ADMIN" },
            { "useR_ID": "U002", "apP_CODE": "APP1", "rolE_CODE": "VIEWER" }
        ])))
        .mount(&server)
        .await;

    let services = create_test_services(&server);
    let grants = services.grants.list(Some("u001"), None).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].role_code, "ADMIN");
}

#[tokio::test]
async fn test_assigned_functions_accepts_objects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Rbac/assigned-functions/APP1/ADMIN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "funC_CODE": "F2" },
            { "functionCode": "F1" },
            "F2"
        ])))
        .mount(&server)
        .await;

    let services = create_test_services(&server);
    let codes = services.rbac.assigned("APP1", "ADMIN").await.unwrap();
    assert_eq!(codes, vec!["F1", "F2"]);
}

#[tokio::test]
async fn test_current_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/UserInfo/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": "U001",
            "userName": "Wang",
            "roles": ["ADMIN", { "roleCode": "AUDITOR" }]
        })))
        .mount(&server)
        .await;

    let services = create_test_services(&server);
    let user = services.users.current().await.unwrap();
    assert_eq!(user.user_id, "U001");
    assert_eq!(user.user_name.as_deref(), Some("Wang"));
    assert_eq!(user.roles, vec!["ADMIN", "AUDITOR"]);
}
