//! # Consent Manager Client
//!
//! Typed access to the external consent manager. Every call made on behalf of
//! this gateway is authenticated as the configured participant: a fresh
//! session token is obtained from `POST /participants/login` and sent as a
//! bearer token. Calls made on behalf of a user additionally forward the
//! user's consent key in the [`USER_KEY_HEADER`] header.
//!
//! Responses are passed through as [`serde_json::Value`]; the gateway only
//! reshapes the few fields it needs and otherwise mirrors the upstream payload.
//!
//! ## Errors
//!
//! Non-2xx answers become [`ConsentError::Upstream`] carrying the upstream
//! status and body so handlers can forward both to the caller.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, instrument, trace};
use url::Url;

use crate::config::ParticipantCredentials;
use crate::utils::constant::USER_KEY_HEADER;

/// Errors returned by [`ConsentClient`] operations.
#[derive(Debug, Error)]
pub enum ConsentError {
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    #[error("consent manager {endpoint} returned {status}: {body}")]
    Upstream {
        endpoint: String,
        status: u16,
        body: Value,
    },
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
    #[error("participant login response from {0} carries no session token")]
    MissingSessionToken(String),
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid path parameter: {0:?}")]
    InvalidPathSegment(String),
}

/// Body forwarded to a data provider when importing a consent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequest {
    pub data_provider_endpoint: String,
    pub signed_consent: String,
    pub encrypted: String,
}

/// Client for the consent manager API.
#[derive(Debug, Clone)]
pub struct ConsentClient {
    http: reqwest::Client,
    base_url: Url,
    participant: ParticipantCredentials,
}

impl ConsentClient {
    /// Creates a client talking to `base_url` as `participant`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsentError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute URL that can take a path, and [`ConsentError::Http`] if the
    /// underlying HTTP client cannot be built.
    pub fn new(
        base_url: impl AsRef<str>,
        participant: ParticipantCredentials,
        timeout: Duration,
    ) -> Result<Self, ConsentError> {
        let base_url = parse_base(base_url.as_ref())?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ConsentError::Http {
                endpoint: "client_init".into(),
                source,
            })?;

        Ok(Self {
            http,
            base_url,
            participant,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Logs this gateway in as a participant.
    ///
    /// POST /participants/login
    #[instrument(skip(self), fields(client_id = %self.participant.client_id))]
    pub async fn participant_login(&self) -> Result<Value, ConsentError> {
        let endpoint = self.endpoint(&["participants", "login"])?;
        let builder = self.http.post(endpoint.clone()).json(&json!({
            "clientID": self.participant.client_id,
            "clientSecret": self.participant.client_secret,
        }));
        self.send(&endpoint, builder).await
    }

    /// Logs a user in to the consent manager with their credentials.
    ///
    /// POST /users/login
    #[instrument(skip(self, password))]
    pub async fn user_login(&self, email: &str, password: &str) -> Result<Value, ConsentError> {
        let endpoint = self.endpoint(&["users", "login"])?;
        let builder = self
            .authorized(Method::POST, &endpoint, None)
            .await?
            .json(&json!({ "email": email, "password": password }));
        self.send(&endpoint, builder).await
    }

    /// Consents of the user owning `user_key`.
    ///
    /// GET /consents/me
    #[instrument(skip_all)]
    pub async fn me(&self, user_key: Option<&str>) -> Result<Value, ConsentError> {
        self.get(&["consents", "me"], user_key).await
    }

    /// GET /consents/me/{id}
    #[instrument(skip(self, user_key))]
    pub async fn me_by_id(&self, user_key: Option<&str>, id: &str) -> Result<Value, ConsentError> {
        self.get(&["consents", "me", id], user_key).await
    }

    /// Consents of the user known to the consent manager as `user_identifier`.
    ///
    /// GET /consents/users/{identifier}
    #[instrument(skip(self))]
    pub async fn user_consent(&self, user_identifier: &str) -> Result<Value, ConsentError> {
        self.get(&["consents", "users", user_identifier], None).await
    }

    /// GET /consents/users/{identifier}/{id}
    #[instrument(skip(self))]
    pub async fn user_consent_by_id(
        &self,
        user_identifier: &str,
        id: &str,
    ) -> Result<Value, ConsentError> {
        self.get(&["consents", "users", user_identifier, id], None)
            .await
    }

    /// Privacy notices that apply between a provider and a consumer.
    ///
    /// GET /consents/{userId}/{providerSd}/{consumerSd}
    #[instrument(skip(self))]
    pub async fn privacy_notices(
        &self,
        user_id: &str,
        provider_sd: &str,
        consumer_sd: &str,
    ) -> Result<Value, ConsentError> {
        self.get(&["consents", user_id, provider_sd, consumer_sd], None)
            .await
    }

    /// GET /consents/{userId}/privacy-notices/{privacyNoticeId}
    #[instrument(skip(self))]
    pub async fn privacy_notice_by_id(
        &self,
        user_id: &str,
        privacy_notice_id: &str,
    ) -> Result<Value, ConsentError> {
        self.get(
            &["consents", user_id, "privacy-notices", privacy_notice_id],
            None,
        )
        .await
    }

    /// Gives consent on behalf of the user owning `user_key`. The body is
    /// forwarded as received.
    ///
    /// POST /consents
    #[instrument(skip_all)]
    pub async fn give_consent(
        &self,
        user_key: Option<&str>,
        body: &Value,
    ) -> Result<Value, ConsentError> {
        let endpoint = self.endpoint(&["consents"])?;
        let builder = self
            .authorized(Method::POST, &endpoint, user_key)
            .await?
            .json(body);
        self.send(&endpoint, builder).await
    }

    /// Triggers the data exchange authorized by `consent_id`.
    ///
    /// POST /consents/{consentId}/data-exchange
    #[instrument(skip(self, user_key))]
    pub async fn data_exchange(
        &self,
        user_key: Option<&str>,
        consent_id: &str,
    ) -> Result<Value, ConsentError> {
        let endpoint = self.endpoint(&["consents", consent_id, "data-exchange"])?;
        let builder = self.authorized(Method::POST, &endpoint, user_key).await?;
        self.send(&endpoint, builder).await
    }

    /// Exchanges this participant takes part in, seen from `role`
    /// (`provider` or `consumer`).
    ///
    /// GET /consents/exchanges/{role}
    #[instrument(skip(self))]
    pub async fn available_exchanges(&self, role: &str) -> Result<Value, ConsentError> {
        self.get(&["consents", "exchanges", role], None).await
    }

    /// Hands the access token generated for an exported consent back to the
    /// consent manager.
    ///
    /// POST /consents/{id}/token
    #[instrument(skip(self, token))]
    pub async fn post_access_token(
        &self,
        consent_id: &str,
        token: &str,
    ) -> Result<Value, ConsentError> {
        let endpoint = self.endpoint(&["consents", consent_id, "token"])?;
        let builder = self
            .authorized(Method::POST, &endpoint, None)
            .await?
            .json(&json!({ "token": token }));
        self.send(&endpoint, builder).await
    }

    /// Forwards a signed consent to the export endpoint of a data provider.
    ///
    /// POST {dataProviderEndpoint}/consent/export
    #[instrument(skip_all, fields(provider = %request.data_provider_endpoint))]
    pub async fn post_data_request(&self, request: &DataRequest) -> Result<Value, ConsentError> {
        let provider = parse_base(&request.data_provider_endpoint)?;
        let endpoint = append_segments(&provider, &["consent", "export"])?;
        let builder = self.http.post(endpoint.clone()).json(&json!({
            "signedConsent": request.signed_consent,
            "encrypted": request.encrypted,
        }));
        self.send(&endpoint, builder).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ConsentError> {
        append_segments(&self.base_url, segments)
    }

    async fn get(&self, segments: &[&str], user_key: Option<&str>) -> Result<Value, ConsentError> {
        let endpoint = self.endpoint(segments)?;
        let builder = self.authorized(Method::GET, &endpoint, user_key).await?;
        self.send(&endpoint, builder).await
    }

    /// Builds a request carrying a fresh participant session token and,
    /// when present, the user's key.
    async fn authorized(
        &self,
        method: Method,
        endpoint: &Url,
        user_key: Option<&str>,
    ) -> Result<RequestBuilder, ConsentError> {
        let token = self.session_token().await?;
        let mut builder = self
            .http
            .request(method, endpoint.clone())
            .bearer_auth(token);
        if let Some(key) = user_key {
            builder = builder.header(USER_KEY_HEADER, key);
        }
        Ok(builder)
    }

    async fn session_token(&self) -> Result<String, ConsentError> {
        let response = self.participant_login().await?;
        response
            .get("jwt")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| {
                error!("Participant login succeeded without a session token");
                ConsentError::MissingSessionToken(self.base_url.to_string())
            })
    }

    async fn send(&self, endpoint: &Url, builder: RequestBuilder) -> Result<Value, ConsentError> {
        trace!(%endpoint, "Sending request to consent manager");

        let response = builder.send().await.map_err(|source| ConsentError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|source| ConsentError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;

        if !status.is_success() {
            let body = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            debug!(%endpoint, status = status.as_u16(), "Consent manager returned an error");
            return Err(ConsentError::Upstream {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|source| ConsentError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

/// Parses an absolute `http(s)` base URL that path segments can be appended to.
fn parse_base(raw: &str) -> Result<Url, ConsentError> {
    let url = Url::parse(raw).map_err(|e| {
        error!(url = raw, error = %e, "Unparseable base URL");
        ConsentError::InvalidBaseUrl(raw.to_string())
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        error!(url = raw, "Base URL cannot take a path");
        return Err(ConsentError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}

/// Appends `segments` to the path of `base`, one path segment each.
///
/// Every segment is percent-encoded, `/`, `?` and `#` included, so a
/// parameter can never reach another path of the remote API. Empty, `.` and
/// `..` segments are rejected.
fn append_segments(base: &Url, segments: &[&str]) -> Result<Url, ConsentError> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || **s == "." || **s == "..")
    {
        return Err(ConsentError::InvalidPathSegment((*bad).to_string()));
    }

    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| ConsentError::InvalidBaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ConsentClient {
        ConsentClient::new(
            server.uri(),
            ParticipantCredentials {
                client_id: "participant".into(),
                client_secret: "secret".into(),
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/participants/login"))
            .and(body_json(json!({"clientID": "participant", "clientSecret": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": "session"})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn user_scoped_calls_forward_session_and_user_key() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/consents/me/c1"))
            .and(header("authorization", "Bearer session"))
            .and(header(USER_KEY_HEADER, "user-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_id": "c1"})))
            .expect(1)
            .mount(&server)
            .await;

        let consent = client(&server)
            .me_by_id(Some("user-key"), "c1")
            .await
            .unwrap();
        assert_eq!(consent["_id"], "c1");
    }

    #[tokio::test]
    async fn non_success_keeps_status_and_json_body() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/consents/users/u1"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"error": "no consent"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).user_consent("u1").await.unwrap_err();
        match err {
            ConsentError::Upstream { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, json!({"error": "no consent"}));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_is_kept_as_text() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/consents/exchanges/provider"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client(&server)
            .available_exchanges("provider")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConsentError::Upstream { status: 502, body: Value::String(ref s), .. } if s == "bad gateway"
        ));
    }

    #[tokio::test]
    async fn path_parameters_stay_inside_their_segment() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/consents/exchanges/provider"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"exchanges": []})))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/consents/me/..%2Fexchanges%2Fprovider"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "no consent"})))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .me_by_id(Some("user-key"), "../exchanges/provider")
            .await
            .unwrap_err();
        assert!(matches!(err, ConsentError::Upstream { status: 404, .. }));
    }

    #[tokio::test]
    async fn dot_segments_are_rejected_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/participants/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": "session"})))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server);
        for id in ["..", ".", ""] {
            let err = client.me_by_id(None, id).await.unwrap_err();
            assert!(matches!(err, ConsentError::InvalidPathSegment(_)), "id {id:?}");
        }
    }

    #[test]
    fn segments_are_percent_encoded() {
        let base = Url::parse("http://cm.local/v1/").unwrap();
        let url = append_segments(&base, &["consents", "a/b?c#d", "%2F"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://cm.local/v1/consents/a%2Fb%3Fc%23d/%252F"
        );
    }

    #[test]
    fn base_url_must_take_a_path() {
        let credentials = ParticipantCredentials {
            client_id: "participant".into(),
            client_secret: "secret".into(),
        };
        for base in ["not a url", "mailto:cm@example.com"] {
            let err = ConsentClient::new(base, credentials.clone(), Duration::from_secs(1))
                .unwrap_err();
            assert!(matches!(err, ConsentError::InvalidBaseUrl(_)), "base {base}");
        }
    }

    #[tokio::test]
    async fn login_without_jwt_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/participants/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .mount(&server)
            .await;

        let err = client(&server).me(None).await.unwrap_err();
        assert!(matches!(err, ConsentError::MissingSessionToken(_)));
    }

    #[tokio::test]
    async fn data_request_goes_to_provider_without_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/public/v1/consent/export"))
            .and(body_json(json!({"signedConsent": "jwt", "encrypted": "key"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "OK"})))
            .expect(1)
            .mount(&server)
            .await;

        let request = DataRequest {
            data_provider_endpoint: format!("{}/public/v1/", server.uri()),
            signed_consent: "jwt".into(),
            encrypted: "key".into(),
        };
        let response = client(&server).post_data_request(&request).await.unwrap();
        assert_eq!(response["message"], "OK");
    }
}
