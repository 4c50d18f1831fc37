mod common;

use consent_gateway::models::ApiResponse;
use serde_json::json;
use sqlx::PgPool;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use common::spawn_app;

#[sqlx::test]
async fn privacy_notices_are_passed_through(pool: PgPool) {
    let app = spawn_app(pool).await;
    Mock::given(method("GET"))
        .and(path("/consents/u1/cHJvdmlkZXI/Y29uc3VtZXI"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "pn-1", "title": "Research"}
        ])))
        .expect(1)
        .mount(&app.consent_manager)
        .await;

    let response = app
        .get_private("/private/consent/u1/cHJvdmlkZXI/Y29uc3VtZXI")
        .await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: ApiResponse = response.json().await.unwrap();
    assert_eq!(body.data, json!([{"_id": "pn-1", "title": "Research"}]));
}

#[sqlx::test]
async fn privacy_notice_by_id_is_passed_through(pool: PgPool) {
    let app = spawn_app(pool).await;
    Mock::given(method("GET"))
        .and(path("/consents/u1/privacy-notices/pn-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_id": "pn-1"})))
        .expect(1)
        .mount(&app.consent_manager)
        .await;

    let response = app
        .get_private("/private/consent/u1/privacy-notices/pn-1")
        .await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: ApiResponse = response.json().await.unwrap();
    assert_eq!(body.data, json!({"_id": "pn-1"}));
}

#[sqlx::test]
async fn privacy_notice_errors_keep_upstream_status(pool: PgPool) {
    let app = spawn_app(pool).await;
    Mock::given(method("GET"))
        .and(path("/consents/u1/privacy-notices/pn-x"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid id"})))
        .mount(&app.consent_manager)
        .await;

    let response = app
        .get_private("/private/consent/u1/privacy-notices/pn-x")
        .await;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: ApiResponse = response.json().await.unwrap();
    assert_eq!(body.status, 400);
    assert_eq!(body.data, json!({"error": "invalid id"}));
}

#[sqlx::test]
async fn available_exchanges_gain_privacy_notice_links(pool: PgPool) {
    let app = spawn_app(pool).await;
    Mock::given(method("GET"))
        .and(path("/consents/exchanges/provider"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "participant": {"base64SelfDescription": "U0VMRg"},
            "exchanges": [
                {"base64SelfDescription": "T1RIRVI", "name": "other"}
            ]
        })))
        .mount(&app.consent_manager)
        .await;

    let response = app
        .get_private("/private/consent/exchanges/provider?userId=u1")
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: ApiResponse = response.json().await.unwrap();
    assert_eq!(
        body.data["exchanges"][0]["privacyNoticeEndpoint"],
        "https://connector.example.com/private/consent/u1/U0VMRg/T1RIRVI"
    );
    assert_eq!(body.data["exchanges"][0]["name"], "other");

    let response = app.get_private("/private/consent/exchanges/provider").await;
    let body: ApiResponse = response.json().await.unwrap();
    assert_eq!(
        body.data["exchanges"][0]["privacyNoticeEndpoint"],
        "https://connector.example.com/private/consent/{userId}/U0VMRg/T1RIRVI"
    );
}

#[sqlx::test]
async fn empty_exchanges_are_returned_unchanged(pool: PgPool) {
    let app = spawn_app(pool).await;
    let upstream = json!({"participant": {"base64SelfDescription": "U0VMRg"}, "exchanges": []});
    Mock::given(method("GET"))
        .and(path("/consents/exchanges/consumer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&upstream))
        .mount(&app.consent_manager)
        .await;

    let response = app.get_private("/private/consent/exchanges/consumer").await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: ApiResponse = response.json().await.unwrap();
    assert_eq!(body.data, upstream);
}
