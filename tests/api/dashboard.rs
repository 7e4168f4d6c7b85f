use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::{
    matchers::{any, method, path, query_param, query_param_is_missing},
    Mock, MockServer, ResponseTemplate,
};

use crate::helpers::{TestApp, TEST_AUTOMATION, TEST_GROUP};

const INVALID_ACTION: &str = "Missing or invalid ?action= parameter. Use stats or test-pipeline.";

fn subscriber(variant: Option<&str>, opened: u64, clicked: u64, sent: u64) -> Value {
    json!({
        "email": "someone@example.com",
        "fields": { "ad_variant": variant },
        "opened_count": opened,
        "clicked_count": clicked,
        "sent_count": sent,
    })
}

async fn mount_subscriber_pages(server: &MockServer) {
    let listing = format!("/groups/{TEST_GROUP}/subscribers");
    Mock::given(method("GET"))
        .and(path(listing.as_str()))
        .and(query_param("limit", "1000"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [subscriber(Some("A"), 1, 1, 1), subscriber(Some("A"), 0, 0, 1)],
            "meta": { "next_cursor": "page-2" },
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(listing.as_str()))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [subscriber(Some("B"), 0, 0, 0), subscriber(None, 2, 0, 3)],
            "meta": { "next_cursor": null },
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_automation(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/automations/{TEST_AUTOMATION}").as_str()))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn dashboard_without_valid_action_is_400() -> Result<()> {
    let app = TestApp::spawn().await?;

    for action in [None, Some(""), Some("delete")] {
        let res = app.get_dashboard(action).await?;

        assert_eq!(StatusCode::BAD_REQUEST, res.status(), "action: {action:?}");
        assert_eq!(
            Some("*"),
            res.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok())
        );
        assert_eq!(json!({ "error": INVALID_ACTION }), res.json::<Value>().await?);
    }

    Ok(())
}

#[tokio::test]
async fn dashboard_undecodable_query_is_json_400() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.provider_server)
        .await;

    let res = app
        .http_client
        .get(format!(
            "http://{}/api/dashboard?action=stats&action=test-pipeline",
            app.addr
        ))
        .send()
        .await?;

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
    assert_eq!(
        Some("application/json"),
        res.headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
    );
    assert_eq!(json!({ "error": INVALID_ACTION }), res.json::<Value>().await?);

    Ok(())
}

#[tokio::test]
async fn dashboard_non_get_methods_are_json_405() -> Result<()> {
    let app = TestApp::spawn().await?;

    let url = format!("http://{}/api/dashboard?action=stats", app.addr);
    let requests = [
        app.http_client.post(&url),
        app.http_client.put(&url),
        app.http_client.delete(&url),
    ];

    for request in requests {
        let res = request.send().await?;
        assert_eq!(StatusCode::METHOD_NOT_ALLOWED, res.status());
        assert_eq!(
            Some("application/json"),
            res.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
        );
        assert_eq!(
            json!({ "error": "Method not allowed" }),
            res.json::<Value>().await?
        );
    }

    Ok(())
}

#[tokio::test]
async fn dashboard_stats_aggregates_all_pages() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_subscriber_pages(&app.provider_server).await;
    mount_automation(
        &app.provider_server,
        ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "name": "Welcome sequence",
                "enabled": true,
                "broken": false,
                "emails_count": 3,
                "stats": {
                    "queue_count": 2,
                    "completed_count": 5,
                    "sent_count": 8,
                    "open_count": 4,
                    "click_count": 1,
                },
            }
        })),
    )
    .await;

    let res = app.get_dashboard(Some("stats")).await?;

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(
        Some("*"),
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok())
    );
    let body: Value = res.json().await?;

    assert_eq!(4, body["total"]);
    assert_eq!(
        json!({
            "A": {
                "count": 2, "percentage": "50.0", "sent": 2, "opened": 1, "clicked": 1,
                "openRate": "50.0", "clickRate": "50.0",
            },
            "B": {
                "count": 1, "percentage": "25.0", "sent": 0, "opened": 0, "clicked": 0,
                "openRate": "0.0", "clickRate": "0.0",
            },
            "unknown": {
                "count": 1, "percentage": "25.0", "sent": 1, "opened": 1, "clicked": 0,
                "openRate": "100.0", "clickRate": "0.0",
            },
        }),
        body["variants"]
    );

    let automation = &body["automation"];
    assert_eq!("Welcome sequence", automation["name"]);
    assert_eq!(true, automation["enabled"]);
    assert_eq!(false, automation["broken"]);
    assert_eq!(3, automation["emails_count"]);
    assert_eq!(2, automation["queue_count"]);
    assert_eq!(5, automation["completed_count"]);
    assert_eq!(8, automation["sent"]);
    assert_eq!(4, automation["opens"]);
    assert_eq!(1, automation["clicks"]);
    assert_eq!("50.0", automation["openRate"]);
    assert_eq!("12.5", automation["clickRate"]);
    assert_eq!(8, automation["stats"]["sent_count"]);
    assert!(body["fetchedAt"].is_string());

    Ok(())
}

#[tokio::test]
async fn dashboard_stats_fails_when_automation_fetch_fails() -> Result<()> {
    let app = TestApp::spawn().await?;
    Mock::given(path(format!("/groups/{TEST_GROUP}/subscribers").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&app.provider_server)
        .await;
    mount_automation(&app.provider_server, ResponseTemplate::new(500)).await;

    let res = app.get_dashboard(Some("stats")).await?;

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    assert_eq!(
        json!({ "error": "Automation fetch error: 500" }),
        res.json::<Value>().await?
    );

    Ok(())
}

#[tokio::test]
async fn dashboard_stats_fails_when_subscriber_fetch_fails() -> Result<()> {
    let app = TestApp::spawn().await?;
    Mock::given(path(format!("/groups/{TEST_GROUP}/subscribers").as_str()))
        .respond_with(ResponseTemplate::new(502))
        .mount(&app.provider_server)
        .await;
    mount_automation(
        &app.provider_server,
        ResponseTemplate::new(200).set_body_json(json!({ "data": { "enabled": true } })),
    )
    .await;

    let res = app.get_dashboard(Some("stats")).await?;

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    assert_eq!(
        json!({ "error": "MailerLite API error: 502" }),
        res.json::<Value>().await?
    );

    Ok(())
}

#[tokio::test]
async fn dashboard_stats_without_api_key_is_500() -> Result<()> {
    let app = TestApp::spawn_with_api_key(None).await?;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.provider_server)
        .await;

    let res = app.get_dashboard(Some("stats")).await?;

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    assert_eq!(
        json!({ "error": "Missing MAILERLITE_API_KEY env var" }),
        res.json::<Value>().await?
    );

    Ok(())
}

#[tokio::test]
async fn dashboard_test_pipeline_reports_every_check() -> Result<()> {
    let app = TestApp::spawn().await?;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.site_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/subscribe"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&app.site_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/groups/{TEST_GROUP}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "name": "Signups", "active_count": 42 } })),
        )
        .mount(&app.provider_server)
        .await;
    mount_automation(
        &app.provider_server,
        ResponseTemplate::new(200)
            .set_body_json(json!({ "data": { "enabled": true, "broken": true } })),
    )
    .await;

    let res = app.get_dashboard(Some("test-pipeline")).await?;

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await?;
    assert_eq!(
        json!([
            { "name": "API Key", "pass": true, "detail": "Configured" },
            { "name": "Landing Page", "pass": true, "detail": "HTTP 200" },
            { "name": "Subscribe Function", "pass": true, "detail": "Deployed (405 on GET as expected)" },
            { "name": "MailerLite Group", "pass": true, "detail": "\"Signups\" (42 active)" },
            { "name": "Automation", "pass": false, "detail": "Enabled but BROKEN" },
        ]),
        body["checks"]
    );
    assert_eq!(false, body["allPassed"]);
    assert!(body["testedAt"].is_string());

    Ok(())
}

#[tokio::test]
async fn dashboard_test_pipeline_without_api_key_still_probes_the_site() -> Result<()> {
    let app = TestApp::spawn_with_api_key(None).await?;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.site_server)
        .await;
    Mock::given(path("/api/subscribe"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&app.site_server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.provider_server)
        .await;

    let res = app.get_dashboard(Some("test-pipeline")).await?;

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await?;
    let checks = body["checks"].as_array().cloned().unwrap_or_default();
    assert_eq!(5, checks.len());
    assert_eq!(false, checks[0]["pass"]);
    assert_eq!(true, checks[1]["pass"]);
    assert_eq!(true, checks[2]["pass"]);
    for check in &checks[3..] {
        assert_eq!(false, check["pass"]);
        assert_eq!("Skipped (no API key)", check["detail"]);
    }
    assert_eq!(false, body["allPassed"]);

    Ok(())
}
