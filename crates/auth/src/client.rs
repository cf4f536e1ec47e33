//! Authenticated request façade.
//!
//! Every request goes through [`Client::send`], which takes a complete
//! header set. The authenticated entry points mint a fresh assertion,
//! add the `Authorization` header, and then call the same `send`.

use std::{str::FromStr, sync::Arc, time::Duration};

use http::{
    HeaderMap, HeaderName, HeaderValue, Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::Serialize;

use crate::{
    canonical::{CanonicalPayload, CanonicalizationError, HttpMethod, join_url},
    error::{AuthError, ServerError},
    key::{KeyError, PublicKey, SecretKey},
    signing::{SchnorrSigner, SignedAssertion, sign_payload},
    token,
    transport::{DEFAULT_TIMEOUT_SECS, ReqwestTransport, Request, Response, Transport},
};

/// Session credential context. Built once and shared read-only by every
/// authenticated call.
#[derive(Debug, Clone)]
pub struct Credentials {
    secret_key: Arc<SecretKey>,
}

impl Credentials {
    pub fn new(secret_key: SecretKey) -> Self {
        Self {
            secret_key: Arc::new(secret_key),
        }
    }

    /// Parses a hex or `nsec1…` secret key.
    pub fn parse(input: &str) -> Result<Self, KeyError> {
        Ok(Self::new(SecretKey::from_str(input)?))
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret_key.public_key()
    }

    /// Signs `payload` into an assertion.
    pub fn sign(&self, payload: CanonicalPayload) -> Result<SignedAssertion, AuthError> {
        let signer = SchnorrSigner::new(&self.secret_key);
        Ok(sign_payload(&signer, payload)?)
    }

    /// Builds the `Authorization` header value for one call.
    pub fn authorization(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<String, AuthError> {
        let assertion = self.sign(CanonicalPayload::new(method, url, body)?)?;
        Ok(token::authorization_value(&assertion)?)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Per-call request options merged into the outgoing request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

#[derive(Debug)]
pub struct Client<T> {
    base_url: String,
    transport: T,
    credentials: Option<Credentials>,
}

impl Client<ReqwestTransport> {
    pub fn from_config(config: ClientConfig) -> Result<Self, AuthError> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::new(config.base_url, transport))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    pub fn clear_credentials(&mut self) {
        self.credentials = None;
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<Response, AuthError> {
        let url = join_url(&self.base_url, path)?;
        self.send(Method::GET, url, options.headers, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Response, AuthError> {
        let url = join_url(&self.base_url, path)?;
        let body = serde_json::to_vec(body).map_err(CanonicalizationError::from)?;
        let headers = with_json_content_type(options.headers);
        self.send(Method::POST, url, headers, Some(body)).await
    }

    pub async fn authenticated_get(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, AuthError> {
        let credentials = self.require_credentials()?;
        let url = join_url(&self.base_url, path)?;
        let payload = CanonicalPayload::new(HttpMethod::Get, &url, None)?;
        let headers = authorize(credentials, payload, options.headers)?;
        self.send(Method::GET, url, headers, None).await
    }

    pub async fn authenticated_post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Response, AuthError> {
        let credentials = self.require_credentials()?;
        let url = join_url(&self.base_url, path)?;
        let (payload, bytes) = CanonicalPayload::for_json(HttpMethod::Post, &url, Some(body))?;
        let headers = with_json_content_type(options.headers);
        let headers = authorize(credentials, payload, headers)?;
        self.send(Method::POST, url, headers, bytes).await
    }

    /// Performs one request with a fully-formed header set and turns a
    /// structured error body into [`AuthError::Server`].
    pub async fn send(
        &self,
        method: Method,
        url: String,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response, AuthError> {
        let request = Request {
            method,
            url,
            headers,
            body,
        };
        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let response = self.transport.perform(request).await?;
        tracing::debug!(status = %response.status, "received response");

        if let Some(error) = ServerError::from_body(&response.body) {
            tracing::warn!(
                kind = %error.kind,
                code = ?error.code,
                status_code = ?error.status_code,
                "server reported error"
            );
            return Err(error.into());
        }
        Ok(response)
    }

    fn require_credentials(&self) -> Result<&Credentials, AuthError> {
        self.credentials
            .as_ref()
            .ok_or_else(|| KeyError::Missing.into())
    }
}

fn authorize(
    credentials: &Credentials,
    payload: CanonicalPayload,
    mut headers: HeaderMap,
) -> Result<HeaderMap, AuthError> {
    let assertion = credentials.sign(payload)?;
    headers.insert(AUTHORIZATION, token::authorization_header(&assertion)?);
    Ok(headers)
}

fn with_json_content_type(mut headers: HeaderMap) -> HeaderMap {
    headers
        .entry(CONTENT_TYPE)
        .or_insert(HeaderValue::from_static("application/json"));
    headers
}
