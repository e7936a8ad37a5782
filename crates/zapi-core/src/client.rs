//! ZAPI session, transport and generic verbs.
//!
//! [`ZapiSession`] is the only entry point resource code needs. Its four verbs
//! ([`get`](ZapiSession::get), [`create`](ZapiSession::create),
//! [`update`](ZapiSession::update), [`delete`](ZapiSession::delete)) take a
//! resource path as a list of segments and hide URL layout, headers and error
//! classification. Calls are never retried.

use crate::config::{ConfigOptions, ZapiConfig};
use crate::error::classify;
use crate::path::{encode_path, SEPARATOR};
use crate::request::{ApiRequest, JSON_CONTENT_TYPE};
use crate::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// First path segment of every ZAPI URL.
pub const API_ROOT: &str = "zapi";

/// CGI endpoint following the version segment.
pub const API_ENDPOINT: &str = "zapi.cgi";

/// Header carrying the ZAPI key.
pub const ZAPI_KEY_HEADER: &str = "ZAPI_KEY";

const USER_AGENT: &str = concat!("zapi-core/", env!("CARGO_PKG_VERSION"));

/// Raw outcome of one call that reached the appliance.
///
/// The body is kept even when the status signals failure so callers can still
/// inspect a partial or malformed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Raw response body
    pub body: Vec<u8>,
    /// Classified error, set only for failure statuses
    pub error: Option<Error>,
}

impl ApiResponse {
    /// Build a response and classify it.
    ///
    /// Failure statuses with a JSON body go through [`classify`]; any other
    /// failure body becomes [`Error::Http`].
    #[must_use]
    pub fn new(status: StatusCode, content_type: Option<&str>, body: Vec<u8>) -> Self {
        let error = if status.is_client_error() || status.is_server_error() {
            if content_type.is_some_and(|value| value.starts_with(JSON_CONTENT_TYPE)) {
                classify(&body)
            } else {
                Some(Error::Http {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                })
            }
        } else {
            None
        };

        Self {
            status,
            body,
            error,
        }
    }

    /// Body decoded as UTF-8, lossily.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Return the body, or the classified error if there is one.
    ///
    /// # Errors
    ///
    /// Returns the classified error for failure statuses.
    pub fn into_result(self) -> Result<Vec<u8>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.body),
        }
    }
}

/// Connection state for one appliance.
///
/// Immutable after construction and cheap to clone; clones share the
/// underlying HTTP client and may issue calls concurrently.
#[derive(Debug, Clone)]
pub struct ZapiSession {
    http: Client,
    base_url: String,
    zapi_key: Arc<SecretString>,
    options: ConfigOptions,
}

impl ZapiSession {
    /// Create a session for `host`, using default options when `options` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host or options are invalid, or the HTTP
    /// client cannot be built.
    pub fn new(
        host: impl Into<String>,
        zapi_key: impl Into<String>,
        options: Option<ConfigOptions>,
    ) -> Result<Self> {
        let config = ZapiConfig::new(host, zapi_key)?.with_options(options.unwrap_or_default());
        Self::from_config(&config)
    }

    /// Create a session from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &ZapiConfig) -> Result<Self> {
        use validator::Validate;

        config.validate()?;
        let base_url = config.parse_base_url()?;
        let options = config.options.clone();

        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(options.timeout());

        if !options.tls_verify {
            warn!(host = %base_url, "TLS verification disabled for ZAPI session");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &options.tls_ca_cert {
            debug!("loading ZAPI CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read ZAPI CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let certs = reqwest::Certificate::from_pem_bundle(&bytes)
                .map_err(|err| Error::ConfigError(format!("Invalid ZAPI CA certificate: {err}")))?;
            if certs.is_empty() {
                return Err(Error::ConfigError(format!(
                    "ZAPI CA certificate {} contains no PEM certificates",
                    ca_cert.display()
                )));
            }
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build ZAPI HTTP client: {err}"))
        })?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            zapi_key: Arc::new(SecretString::from(
                config.zapi_key.expose_secret().to_string(),
            )),
            options,
        })
    }

    /// Return the base URL (scheme, host and port).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Return the session options.
    #[must_use]
    pub const fn options(&self) -> &ConfigOptions {
        &self.options
    }

    /// Build the absolute URL for an encoded resource path.
    ///
    /// The result has the form `<base>/zapi/v<version>/zapi.cgi/<encoded_path>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the URL cannot be built, or if a
    /// segment is `.` or `..`, which URL normalisation would collapse onto a
    /// different resource.
    pub fn endpoint_url(&self, encoded_path: &str) -> Result<Url> {
        if let Some(segment) = encoded_path
            .split(SEPARATOR)
            .find(|segment| matches!(*segment, "." | ".."))
        {
            return Err(Error::InvalidEndpoint(format!(
                "ZAPI path `{encoded_path}` contains the relative segment `{segment}`"
            )));
        }

        let mut url = Url::parse(&self.base_url)?;
        let version = format!("v{}", self.options.api_version);

        url.path_segments_mut()
            .map_err(|()| {
                Error::InvalidEndpoint(format!("ZAPI base URL `{}` cannot hold a path", self.base_url))
            })?
            .pop_if_empty()
            .push(API_ROOT)
            .push(&version)
            .push(API_ENDPOINT)
            .extend(encoded_path.split(SEPARATOR));

        Ok(url)
    }

    /// Build a body-less request for a resource path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the URL cannot be built.
    pub fn build_request(&self, method: Method, path: &[&str]) -> Result<ApiRequest> {
        let url = self.endpoint_url(&encode_path(path))?;
        Ok(ApiRequest::new(method, url))
    }

    /// Execute one request.
    ///
    /// Transport failures (DNS, refused connection, timeout) are returned as
    /// errors. Any response that arrives is returned as an [`ApiResponse`],
    /// with its classified error when the status signals failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`], [`Error::ServiceUnavailable`] or
    /// [`Error::HttpError`] when no response could be read.
    pub async fn call(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .header(ZAPI_KEY_HEADER, self.zapi_key.expose_secret());

        if let Some(body) = &request.body {
            if let Some(content_type) = request.content_type {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
            builder = builder.body(body.clone());
        }

        debug!(method = %request.method, path = request.path(), "ZAPI request");

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?.to_vec();

        debug!(status = status.as_u16(), path = request.path(), "ZAPI response");

        Ok(ApiResponse::new(status, content_type.as_deref(), body))
    }

    /// Read an entity and decode it into `T`.
    ///
    /// The error message of a failed read is passed through unaltered so
    /// callers can recognise "not found" responses by their text.
    ///
    /// # Errors
    ///
    /// Returns the transport or classified error, or [`Error::ParseError`] if
    /// the body does not decode as `T`.
    pub async fn get<T>(&self, path: &[&str]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self.build_request(Method::GET, path)?;
        let body = self.call(&request).await?.into_result()?;

        serde_json::from_slice(&body).map_err(|err| {
            Error::ParseError(format!(
                "Failed to parse ZAPI response for `{}`: {err}",
                request.path()
            ))
        })
    }

    /// Create an entity (HTTP POST). The response body is discarded.
    ///
    /// # Errors
    ///
    /// Returns the serialization, transport or classified error.
    pub async fn create<B>(&self, body: &B, path: &[&str]) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.send_json(Method::POST, body, path).await
    }

    /// Update an entity (HTTP PUT). The response body is discarded.
    ///
    /// # Errors
    ///
    /// Returns the serialization, transport or classified error.
    pub async fn update<B>(&self, body: &B, path: &[&str]) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PUT, body, path).await
    }

    /// Delete an entity.
    ///
    /// # Errors
    ///
    /// Returns the transport or classified error.
    pub async fn delete(&self, path: &[&str]) -> Result<()> {
        let request = self.build_request(Method::DELETE, path)?;
        self.call(&request).await?.into_result().map(|_| ())
    }

    async fn send_json<B>(&self, method: Method, body: &B, path: &[&str]) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let request = self.build_request(method, path)?.with_json(body)?;
        self.call(&request).await?.into_result().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, body_string, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const KEY: &str = "zapi-test-key";

    #[derive(Debug, Deserialize)]
    struct FarmDetailsResponse {
        params: FarmParams,
    }

    #[derive(Debug, Deserialize)]
    struct FarmParams {
        farmname: String,
    }

    fn test_session(server: &MockServer) -> ZapiSession {
        ZapiSession::new(server.uri(), KEY, None).unwrap()
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn session_is_shareable() {
        assert_send_sync::<ZapiSession>();
    }

    #[test]
    fn endpoint_url_layout() {
        let session = ZapiSession::new("lb.example.com:444", KEY, None).unwrap();
        let url = session
            .endpoint_url(&encode_path(&["farms", "web/public"]))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://lb.example.com:444/zapi/v3.1/zapi.cgi/farms/web~public"
        );
    }

    #[test]
    fn endpoint_url_uses_configured_version() {
        let options = ConfigOptions::new().with_api_version("4.0");
        let session = ZapiSession::new("http://lb.example.com/", KEY, Some(options)).unwrap();
        let url = session.endpoint_url("system/version").unwrap();
        assert_eq!(
            url.as_str(),
            "http://lb.example.com/zapi/v4.0/zapi.cgi/system/version"
        );
    }

    #[test]
    fn endpoint_url_rejects_relative_segments() {
        let session = ZapiSession::new("lb.example.com", KEY, None).unwrap();

        for name in [".", ".."] {
            let err = session
                .build_request(Method::DELETE, &["farms", name])
                .unwrap_err();
            assert!(matches!(err, Error::InvalidEndpoint(_)), "{name}: {err:?}");
        }
    }

    #[test]
    fn endpoint_url_keeps_dots_inside_segments() {
        let session = ZapiSession::new("lb.example.com", KEY, None).unwrap();
        let request = session
            .build_request(Method::GET, &["farms", "...", "a.b"])
            .unwrap();
        assert_eq!(request.path(), "/zapi/v3.1/zapi.cgi/farms/.../a.b");
    }

    #[tokio::test]
    async fn delete_of_relative_segment_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let session = test_session(&server);
        let err = session.delete(&["farms", ".."]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn host_starting_with_http_gets_default_scheme() {
        let session = ZapiSession::new("http-lb.example.com:444", KEY, None).unwrap();
        assert_eq!(session.base_url(), "https://http-lb.example.com:444");

        let url = session.endpoint_url("farms").unwrap();
        assert_eq!(
            url.as_str(),
            "https://http-lb.example.com:444/zapi/v3.1/zapi.cgi/farms"
        );
    }

    fn write_temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("zapi-core-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_ca_certificate_is_config_error() {
        let options = ConfigOptions::new()
            .with_tls_verify(true)
            .with_ca_cert("/nonexistent/zapi-ca.pem".into());
        let err = ZapiSession::new("lb.example.com", KEY, Some(options)).unwrap_err();

        assert!(matches!(err, Error::ConfigError(_)));
        assert!(err.to_string().contains("zapi-ca.pem"));
    }

    #[test]
    fn non_pem_ca_certificate_is_config_error() {
        let path = write_temp_file("not-a-cert.pem", "this is not a certificate\n");
        let options = ConfigOptions::new()
            .with_tls_verify(true)
            .with_ca_cert(path.clone());
        let result = ZapiSession::new("lb.example.com", KEY, Some(options));
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
        assert!(err.to_string().contains("no PEM certificates"));
    }

    #[test]
    fn corrupt_pem_ca_certificate_is_config_error() {
        let path = write_temp_file(
            "corrupt.pem",
            "-----BEGIN CERTIFICATE-----\n!!!not base64!!!\n-----END CERTIFICATE-----\n",
        );
        let options = ConfigOptions::new().with_ca_cert(path.clone());
        let result = ZapiSession::new("lb.example.com", KEY, Some(options));
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result.unwrap_err(), Error::ConfigError(_)));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = ConfigOptions::new().with_timeout(0);
        let err = ZapiSession::new("lb.example.com", KEY, Some(options)).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn failure_status_with_plain_text_is_protocol_error() {
        let response = ApiResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some("text/plain"),
            b"boom".to_vec(),
        );
        assert_eq!(
            response.error,
            Some(Error::Http {
                status: 500,
                body: "boom".to_string()
            })
        );
    }

    #[test]
    fn success_status_has_no_error() {
        let response = ApiResponse::new(StatusCode::OK, Some("text/plain"), b"{}".to_vec());
        assert!(response.error.is_none());
        assert_eq!(response.into_result().unwrap(), b"{}".to_vec());
    }

    #[tokio::test]
    async fn create_then_get_farm() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/zapi/v3.1/zapi.cgi/farms"))
            .and(header("ZAPI_KEY", KEY))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({"name": "f1"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/zapi/v3.1/zapi.cgi/farms/f1"))
            .and(header("ZAPI_KEY", KEY))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"params": {"farmname": "f1"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = test_session(&server);
        session.create(&json!({"name": "f1"}), &["farms"]).await.unwrap();

        let farm: FarmDetailsResponse = session.get(&["farms", "f1"]).await.unwrap();
        assert_eq!(farm.params.farmname, "f1");
    }

    #[tokio::test]
    async fn get_missing_entity_keeps_server_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zapi/v3.1/zapi.cgi/farms/nope"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Farm not found"})),
            )
            .mount(&server)
            .await;

        let session = test_session(&server);
        let err = session
            .get::<serde_json::Value>(&["farms", "nope"])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api(_)));
        assert_eq!(err.to_string(), "Farm not found");
    }

    #[tokio::test]
    async fn description_prefixes_message() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/zapi/v3.1/zapi.cgi/farms/f1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "description": "Delete farm f1",
                "message": "The farm is in use"
            })))
            .mount(&server)
            .await;

        let session = test_session(&server);
        let err = session.delete(&["farms", "f1"]).await.unwrap_err();
        assert_eq!(err.to_string(), "Delete farm f1 failed: The farm is in use");
    }

    #[tokio::test]
    async fn plain_text_failure_is_formatted() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zapi/v3.1/zapi.cgi/system/version"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let session = test_session(&server);
        let err = session
            .get::<serde_json::Value>(&["system", "version"])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502 :: Bad Gateway");
    }

    #[tokio::test]
    async fn failure_with_empty_json_body_is_success() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/zapi/v3.1/zapi.cgi/farms/f1"))
            .respond_with(
                ResponseTemplate::new(400).insert_header("Content-Type", "application/json"),
            )
            .mount(&server)
            .await;

        let session = test_session(&server);
        session.delete(&["farms", "f1"]).await.unwrap();
    }

    #[tokio::test]
    async fn call_retains_raw_body_next_to_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zapi/v3.1/zapi.cgi/farms"))
            .respond_with(
                ResponseTemplate::new(500).set_body_raw("{\"message\": \"trunc", "application/json"),
            )
            .mount(&server)
            .await;

        let session = test_session(&server);
        let request = session.build_request(Method::GET, &["farms"]).unwrap();
        let response = session.call(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.text(), "{\"message\": \"trunc");
        assert!(matches!(
            response.error,
            Some(Error::MalformedErrorBody { .. })
        ));
    }

    #[tokio::test]
    async fn delete_sends_no_body_or_content_type() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/zapi/v3.1/zapi.cgi/interfaces/virtual/eth0:1"))
            .and(|request: &Request| {
                request.body.is_empty() && !request.headers.contains_key("content-type")
            })
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": "true"})))
            .expect(1)
            .mount(&server)
            .await;

        let session = test_session(&server);
        session
            .delete(&["interfaces", "virtual", "eth0:1"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_writes_markup_literally() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/zapi/v3.1/zapi.cgi/farms/f1"))
            .and(body_string(r#"{"error503":"<h1>down & out</h1>"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_string("ignored"))
            .expect(1)
            .mount(&server)
            .await;

        let session = test_session(&server);
        session
            .update(&json!({"error503": "<h1>down & out</h1>"}), &["farms", "f1"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn segments_with_separator_are_escaped_on_the_wire() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zapi/v3.1/zapi.cgi/certificates/certs~zencert.pem"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let session = test_session(&server);
        session
            .get::<serde_json::Value>(&["certificates", "certs/zencert.pem"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn undecodable_success_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zapi/v3.1/zapi.cgi/farms"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let session = test_session(&server);
        let err = session
            .get::<serde_json::Value>(&["farms"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let options = ConfigOptions::new().with_timeout(1);
        let session = ZapiSession::new(server.uri(), KEY, Some(options)).unwrap();
        let err = session
            .get::<serde_json::Value>(&["farms"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let session = ZapiSession::new("http://127.0.0.1:1", KEY, None).unwrap();
        let err = session.delete(&["farms", "f1"]).await.unwrap_err();
        assert!(err.is_transport());
    }
}
