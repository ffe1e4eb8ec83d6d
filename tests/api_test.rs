#[cfg(test)]
mod api_integration_tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use compliancevault::core::config::AppConfig;
    use compliancevault::core::shared::state::AppState;
    use compliancevault::main_module::{build_router, init_store, StoreMode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct Caller {
        organization_id: Uuid,
        user_id: Uuid,
        role: &'static str,
    }

    impl Caller {
        fn new(organization_id: Uuid, role: &'static str) -> Self {
            Self {
                organization_id,
                user_id: Uuid::new_v4(),
                role,
            }
        }
    }

    fn test_app() -> Router {
        let config = AppConfig::default();
        let store = init_store(&config, StoreMode::Memory).unwrap();
        build_router(Arc::new(AppState::new(config, store)))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        caller: Option<&Caller>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder
                .header("X-Organization-Id", caller.organization_id.to_string())
                .header("X-User-Id", caller.user_id.to_string())
                .header("X-User-Role", caller.role)
                .header("X-User-Name", "Integration Test");
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(app: &Router, organization_id: Uuid, name: &str) {
        let admin = Caller::new(organization_id, "admin");
        let (status, body) = send(
            app,
            "PUT",
            "/api/organizations/me",
            Some(&admin),
            Some(json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    #[tokio::test]
    async fn test_health_and_tenant_headers() {
        let app = test_app();

        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _) = send(&app, "GET", "/api/controls", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let viewer = Caller::new(Uuid::new_v4(), "viewer");
        let (status, body) = send(&app, "GET", "/api/controls?domain_code=SG", Some(&viewer), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().iter().all(|c| c["domain_code"] == "SG"));

        let (status, body) = send(&app, "GET", "/api/controls/count", Some(&viewer), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 11);
        let (_, body) = send(
            &app,
            "GET",
            "/api/controls/count?domain_code=SG&is_baseline=true",
            Some(&viewer),
            None,
        )
        .await;
        assert_eq!(body["count"], 3);
    }

    #[tokio::test]
    async fn test_evaluation_flow_updates_dashboard() {
        let app = test_app();
        let org = Uuid::new_v4();
        register(&app, org, "Ministry of Transport").await;

        let viewer = Caller::new(org, "viewer");
        let (status, _) = send(
            &app,
            "PUT",
            "/api/evaluations/SG-01",
            Some(&viewer),
            Some(json!({ "status": "fully_applied" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let auditor = Caller::new(org, "auditor");
        let (status, body) = send(
            &app,
            "PUT",
            "/api/evaluations/SG-01",
            Some(&auditor),
            Some(json!({ "status": "fully_applied", "feedback": "Policy signed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["status"], "fully_applied");

        let (status, body) = send(&app, "GET", "/api/dashboard/overview", Some(&viewer), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["overall_score"], 14.3);
        assert_eq!(body["is_bia_assessed"], false);
        assert_eq!(body["bia_target"], "Baseline (Default - BIA Required)");

        let (status, body) = send(&app, "GET", "/api/history?entity_type=evaluation", Some(&viewer), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "GET", "/api/history?limit=0", Some(&viewer), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/api/evaluations/XX-99", Some(&viewer), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unregistered_organization_cannot_write() {
        let app = test_app();
        let auditor = Caller::new(Uuid::new_v4(), "auditor");
        let (status, body) = send(
            &app,
            "PUT",
            "/api/evaluations/SG-01",
            Some(&auditor),
            Some(json!({ "status": "fully_applied" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Organization not found");
    }

    #[tokio::test]
    async fn test_bia_drives_compliance_level() {
        let app = test_app();
        let org = Uuid::new_v4();
        register(&app, org, "National Archive").await;
        let admin = Caller::new(org, "admin");

        let (status, process) = send(
            &app,
            "POST",
            "/api/bia/processes",
            Some(&admin),
            Some(json!({ "name": "Records retention", "impact_legal": 4 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{process}");
        assert_eq!(process["criticality_score"], 20);

        let (status, asset) = send(
            &app,
            "POST",
            "/api/bia/assets",
            Some(&admin),
            Some(json!({
                "process_id": process["id"],
                "name": "Archive index",
                "type": "database",
                "c_rating": 2,
                "i_rating": 1,
                "a_rating": 0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{asset}");
        assert_eq!(asset["security_level"], "Medium");

        let (status, body) = send(&app, "GET", "/api/bia/compliance-level", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["level"], "Medium");
        assert_eq!(body["controls"], "Baseline + 1+");
        assert_eq!(body["is_assessed"], true);

        let (status, body) = send(
            &app,
            "PUT",
            "/api/bia/settings",
            Some(&admin),
            Some(json!({ "weight_legal": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["processes_rescored"], 1);

        let (status, body) = send(&app, "GET", "/api/bia/processes", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["criticality_score"], 5);
        assert_eq!(body[0]["assets"].as_array().unwrap().len(), 1);

        let (status, _) = send(
            &app,
            "POST",
            "/api/bia/assets",
            Some(&admin),
            Some(json!({
                "process_id": process["id"],
                "name": "Bad",
                "i_rating": 4
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_evidence_permissions() {
        let app = test_app();
        let org = Uuid::new_v4();
        register(&app, org, "Health Authority").await;
        let uploader = Caller::new(org, "auditor");

        let (status, _) = send(
            &app,
            "POST",
            "/api/evaluations/AM-01/evidence",
            Some(&uploader),
            Some(json!({ "file_name": "notes.txt", "file_type": "text/plain", "file_size": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, evidence) = send(
            &app,
            "POST",
            "/api/evaluations/AM-01/evidence",
            Some(&uploader),
            Some(json!({ "file_name": "inventory.pdf", "file_type": "application/pdf", "file_size": 4096 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{evidence}");
        let uri = format!(
            "/api/evaluations/AM-01/evidence/{}",
            evidence["id"].as_str().unwrap()
        );

        let colleague = Caller::new(org, "auditor");
        let (status, _) = send(&app, "DELETE", &uri, Some(&colleague), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, "DELETE", &uri, Some(&uploader), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Evidence deleted");
    }

    #[tokio::test]
    async fn test_public_stats_need_no_identity() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/api/dashboard/public", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_organizations"], 0);

        let org = Uuid::new_v4();
        register(&app, org, "Customs Department").await;
        let auditor = Caller::new(org, "auditor");
        send(
            &app,
            "PUT",
            "/api/evaluations/RA-01",
            Some(&auditor),
            Some(json!({ "status": "partially_applied" })),
        )
        .await;

        let (status, body) = send(&app, "GET", "/api/dashboard/public", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_organizations"], 1);
        assert_eq!(body["organizations_scored"], 1);
        assert_eq!(body["total_evaluations"], 1);
    }
}
