#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use consent_gateway::config::AppConfig;
use consent_gateway::services::jwt::JwtService;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use sqlx::PgPool;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const SESSION_TOKEN: &str = "participant-session-jwt";

pub fn init_tracing_once() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("consent_gateway=debug")
            .with_test_writer()
            .init();
    });
}

/// A running gateway wired to a mock consent manager.
pub struct TestApp {
    /// Returned address format: `http://127.0.0.1:8492`
    pub address: String,
    pub consent_manager: MockServer,
    /// Bearer token accepted by the private routes
    pub access_token: String,
    pub client: reqwest::Client,
    pub db_pool: PgPool,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// GET on a private route with a valid bearer token.
    pub async fn get_private(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// POST on a private route with a valid bearer token.
    pub async fn post_private(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_public(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Waits until the consent manager received a request on `path`.
    pub async fn wait_for_request(&self, path: &str) -> Request {
        for _ in 0..50 {
            let requests = self
                .consent_manager
                .received_requests()
                .await
                .unwrap_or_default();
            if let Some(request) = requests.into_iter().find(|r| r.url.path() == path) {
                return request;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("consent manager never received a request on {path}");
    }
}

/// Spawns the application against a fresh mock consent manager that accepts
/// participant logins.
pub async fn spawn_app(db_pool: PgPool) -> TestApp {
    dotenvy::from_filename_override("tests/data/.test.env").unwrap();
    init_tracing_once();

    let consent_manager = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/participants/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Participant logged in",
            "jwt": SESSION_TOKEN,
        })))
        .mount(&consent_manager)
        .await;

    let mut config = AppConfig::from_env().expect("Test configuration should load");
    config.consent_manager_url = consent_manager.uri();

    let access_token = JwtService::from_secret(config.jwt_secret.as_bytes())
        .create_access_token("test-gateway")
        .unwrap();

    // Randomly choose an available port
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port at localhost");
    let port = listener.local_addr().unwrap().port();

    let app = consent_gateway::app(db_pool.clone(), config).expect("Failed to build app");
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let address = format!("http://127.0.0.1:{port}");

    // Wait for server to be ready
    let client = reqwest::Client::new();
    for _ in 0..10 {
        if client
            .get(format!("{address}/health-check"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    TestApp {
        address,
        consent_manager,
        access_token,
        client,
        db_pool,
    }
}

pub async fn insert_user(
    pool: &PgPool,
    internal_id: &str,
    user_identifier: Option<&str>,
    email: &str,
    consent_id: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO users (internal_id, user_identifier, email, consent_id) VALUES ($1, $2, $3, $4)",
    )
    .bind(internal_id)
    .bind(user_identifier)
    .bind(email)
    .bind(consent_id)
    .execute(pool)
    .await
    .expect("Failed to insert user");
}

pub async fn stored_consent_id(pool: &PgPool, email: &str) -> Option<String> {
    sqlx::query_scalar::<_, Option<String>>("SELECT consent_id FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("Failed to read user")
}

/// Signs `claims` the way the consent manager does for exported consents.
/// Returns `(signedConsent, encrypted)`.
pub fn sign_consent(claims: &Value) -> (String, String) {
    let key = b"per-consent-signing-key";
    let signed = encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(key),
    )
    .unwrap();
    (signed, STANDARD.encode(key))
}
