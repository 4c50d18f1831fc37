mod common;

use serde_json::Value;
use sqlx::PgPool;

use common::spawn_app;

#[sqlx::test]
async fn health_check_works(pool: PgPool) {
    let app = spawn_app(pool).await;

    let response = app
        .client
        .get(app.url("/health-check"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(Some(0), response.content_length());
}

#[sqlx::test]
async fn template_route_answers_with_fixed_message(pool: PgPool) {
    let app = spawn_app(pool).await;

    let response = app
        .client
        .get(app.url("/public/v1/template"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["message"],
        "This is a public template method, it doesn't do anything"
    );
}
