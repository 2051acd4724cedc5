//! Default transport built on `reqwest`, with tracing instrumentation.
//!
//! Request description keys map onto the request as follows:
//!
//! | key         | effect                                                   |
//! |-------------|----------------------------------------------------------|
//! | `params`    | query string; list values repeat the key                 |
//! | `headers`   | request headers                                          |
//! | `cookies`   | one `Cookie` header                                      |
//! | `json`      | JSON body                                                |
//! | `data`      | url-encoded form body                                    |
//! | `files`     | multipart parts; a string is a path read from disk       |
//! | `multipart` | same as `files`                                          |
//! | `auth`      | `basic` or `digest` authentication                       |
//! | `timeout`   | per-request timeout, in seconds                          |
//!
//! `verify`, `allow_redirects`, `proxies`, `cert` and `stream` are client-wide
//! settings in `reqwest`; they are ignored with a warning, and belong on the
//! client passed to [`ReqwestTransportBuilder::client`]. Other keys are
//! logged at debug level and ignored.
//!
//! Digest authentication sends the request once without credentials. When
//! the server answers `401` with a digest `WWW-Authenticate` challenge, the
//! request is rebuilt and resent with the computed `Authorization` header.

use std::path::Path;
use std::time::Duration;

use digest_auth::{AuthContext, HttpMethod};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE, WWW_AUTHENTICATE};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn, Span};
use url::Url;

use super::Transport;
use crate::error::{ApiError, ClientError, ConfigError};
use crate::method::RestMethod;
use crate::request::{RequestDescription, BASE_URI, METHOD, PATH, TIMEOUT, URI};
use crate::response::Response;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const PARAMS: &str = "params";
const HEADERS: &str = "headers";
const COOKIES: &str = "cookies";
const JSON: &str = "json";
const DATA: &str = "data";
const FILES: &str = "files";
const MULTIPART: &str = "multipart";
const AUTH: &str = "auth";

/// Options that `reqwest` only supports on the client, not per request.
const CLIENT_ONLY_OPTIONS: &[&str] = &["verify", "allow_redirects", "proxies", "cert", "stream"];

/// A request ready to send, plus what a digest retry needs.
struct Prepared {
    request: reqwest::RequestBuilder,
    method: RestMethod,
    url: Url,
    digest: Option<DigestCredentials>,
}

#[derive(Debug, Clone, PartialEq)]
struct DigestCredentials {
    username: String,
    password: String,
}

impl DigestCredentials {
    /// Answers a `WWW-Authenticate` digest challenge for `method` on `url`.
    fn answer(
        &self,
        challenge: &str,
        method: RestMethod,
        url: &Url,
    ) -> Result<HeaderValue, ClientError> {
        let mut prompt = digest_auth::parse(challenge)?;
        let uri = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };
        let context = AuthContext::new_with_method(
            self.username.as_str(),
            self.password.as_str(),
            uri.as_str(),
            None::<&[u8]>,
            HttpMethod::from(method.as_str()),
        );
        let answer = prompt.respond(&context)?.to_header_string();
        let (_, value) = header_pair(AUTHORIZATION.as_str(), &answer)?;
        Ok(value)
    }
}

/// Builder for configuring a [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    default_headers: HeaderMap,
    client: Option<reqwest::Client>,
}

impl ReqwestTransportBuilder {
    fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: HeaderMap::new(),
            client: None,
        }
    }

    /// Sets the client-wide timeout. A `timeout` in the request description
    /// overrides it per request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header sent with every request.
    ///
    /// ## Errors
    ///
    /// Returns [`ClientError::InvalidHeader`] if the name or value is not
    /// valid HTTP.
    pub fn default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, ApiError> {
        let (name, value) = header_pair(name.as_ref(), value.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Uses a pre-configured client. Timeout and default headers set on
    /// this builder are then ignored.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the [`ReqwestTransport`].
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<ReqwestTransport, ApiError> {
        let client = match self.client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(self.timeout)
                .default_headers(self.default_headers)
                .pool_max_idle_per_host(10)
                .build()
                .map_err(ClientError::Request)?,
        };

        Ok(ReqwestTransport { client })
    }
}

/// [`Transport`] sending request descriptions with `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    /// Creates a transport with default settings.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, ApiError> {
        Self::builder().build()
    }

    /// Wraps an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds the `reqwest` request for a description without sending it.
    async fn prepare(&self, description: &RequestDescription) -> Result<Prepared, ApiError> {
        let method_name = description
            .method()
            .ok_or_else(|| ConfigError::missing_field(METHOD))?;
        let method: RestMethod = method_name
            .parse()
            .map_err(|_| ConfigError::InvalidMethod {
                method: method_name.to_string(),
            })?;
        let url = Url::parse(&description.get_url()?).map_err(ConfigError::from)?;

        Span::current().record("http.method", method.as_str());
        Span::current().record("http.url", url.as_str());

        let mut request = self.client.request(method.to_reqwest(), url.clone());
        let mut form: Option<Form> = None;
        let mut digest = None;

        for (key, value) in description.as_map() {
            if value.is_null() {
                continue;
            }
            request = match key.as_str() {
                METHOD | URI | BASE_URI | PATH => request,
                PARAMS => request.query(&pairs(value)),
                HEADERS => request.headers(headers(value)?),
                COOKIES => match cookie_header(value)? {
                    Some(cookie) => request.header(COOKIE, cookie),
                    None => request,
                },
                JSON => request.json(value),
                DATA => request.form(&pairs(value)),
                FILES | MULTIPART => {
                    form = Some(add_parts(form.unwrap_or_default(), value).await?);
                    request
                }
                AUTH => match auth(value)? {
                    Auth::Basic { username, password } => request.basic_auth(username, password),
                    Auth::Digest(credentials) => {
                        digest = Some(credentials);
                        request
                    }
                },
                TIMEOUT => match value.as_f64() {
                    Some(secs) if secs.is_finite() && secs > 0.0 => {
                        request.timeout(Duration::from_secs_f64(secs))
                    }
                    _ => request,
                },
                other if CLIENT_ONLY_OPTIONS.contains(&other) => {
                    warn!(
                        option = other,
                        "request option is not supported per request; configure the reqwest client instead"
                    );
                    request
                }
                other => {
                    debug!(option = other, "ignoring unsupported request option");
                    request
                }
            };
        }

        let request = match form {
            Some(form) => request.multipart(form),
            None => request,
        };
        Ok(Prepared {
            request,
            method,
            url,
            digest,
        })
    }

    /// Resends with an `Authorization` header when `response` is a digest
    /// challenge. Any other response is returned unchanged.
    async fn answer_digest(
        &self,
        description: &RequestDescription,
        credentials: &DigestCredentials,
        method: RestMethod,
        url: &Url,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let Some(challenge) = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.trim_start().to_ascii_lowercase().starts_with("digest"))
            .map(str::to_owned)
        else {
            return Ok(response);
        };

        let authorization = credentials.answer(&challenge, method, url)?;
        debug!(url = %url, "answering digest challenge");

        // Multipart bodies cannot be cloned, so the request is rebuilt.
        let retry = self.prepare(description).await?;
        let response = retry
            .request
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(ClientError::Request)?;
        Ok(response)
    }
}

impl Transport for ReqwestTransport {
    /// Sends the request described by `description`.
    ///
    /// Any status code is returned as a [`Response`]; judging it is left to
    /// the response hooks.
    #[instrument(
        name = "api_request",
        skip(self, description),
        fields(
            http.method = tracing::field::Empty,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    async fn request(&self, description: &RequestDescription) -> Result<Response, ApiError> {
        let Prepared {
            request,
            method,
            url,
            digest,
        } = self.prepare(description).await?;

        let mut response = request.send().await.map_err(ClientError::Request)?;
        if let Some(credentials) = digest {
            response = self
                .answer_digest(description, &credentials, method, &url, response)
                .await?;
        }
        let status = response.status();
        Span::current().record("http.status_code", status.as_u16());

        let otel_status = if status.is_server_error() {
            "ERROR"
        } else if status.is_success() {
            "OK"
        } else {
            "UNSET"
        };
        Span::current().record("otel.status_code", otel_status);

        let headers = response.headers().clone();
        let url = response.url().to_string();
        let body = response.bytes().await.map_err(ClientError::Request)?;

        debug!(status = status.as_u16(), bytes = body.len(), "received response");

        Ok(Response::new(status.as_u16())
            .with_headers(headers)
            .with_url(url)
            .with_body(body))
    }
}

/// Renders a scalar as request text. Strings are taken verbatim.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Flattens a group into `(key, value)` pairs; arrays repeat the key.
fn pairs(value: &Value) -> Vec<(String, String)> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                pairs.extend(items.iter().filter_map(text).map(|v| (key.clone(), v)));
            }
            other => pairs.extend(text(other).map(|v| (key.clone(), v))),
        }
    }
    pairs
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ClientError> {
    let header_name = HeaderName::try_from(name).map_err(|e| ClientError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    let header_value = HeaderValue::try_from(value).map_err(|e| ClientError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    Ok((header_name, header_value))
}

fn headers(value: &Value) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs(value) {
        let (name, value) = header_pair(&name, &value)?;
        headers.append(name, value);
    }
    Ok(headers)
}

fn cookie_header(value: &Value) -> Result<Option<HeaderValue>, ClientError> {
    let cookies = pairs(value)
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>();
    if cookies.is_empty() {
        return Ok(None);
    }
    let (_, value) = header_pair(COOKIE.as_str(), &cookies.join("; "))?;
    Ok(Some(value))
}

enum Auth {
    Basic {
        username: String,
        password: Option<String>,
    },
    Digest(DigestCredentials),
}

fn auth(value: &Value) -> Result<Auth, ClientError> {
    let empty = Map::new();
    let auth = value.as_object().unwrap_or(&empty);
    let kind = auth.get("type").and_then(Value::as_str).unwrap_or("basic");
    let username = auth.get("username").and_then(text).unwrap_or_default();
    let password = auth.get("password").and_then(text);

    match kind {
        "basic" => Ok(Auth::Basic { username, password }),
        "digest" => Ok(Auth::Digest(DigestCredentials {
            username,
            password: password.unwrap_or_default(),
        })),
        other => Err(ClientError::UnsupportedAuth {
            kind: other.to_string(),
        }),
    }
}

async fn add_parts(mut form: Form, value: &Value) -> Result<Form, ClientError> {
    let Some(fields) = value.as_object() else {
        return Ok(form);
    };

    for (field, value) in fields {
        match value {
            Value::Array(items) => {
                for item in items {
                    form = form.part(field.clone(), part(field, item).await?);
                }
            }
            Value::Null => {}
            other => form = form.part(field.clone(), part(field, other).await?),
        }
    }
    Ok(form)
}

/// Builds one multipart part.
///
/// A string names a file on disk; an object `{filename, content, mime}`
/// is sent from memory; other scalars become text parts.
async fn part(field: &str, value: &Value) -> Result<Part, ClientError> {
    match value {
        Value::String(path) => {
            let content = tokio::fs::read(path)
                .await
                .map_err(|source| ClientError::File {
                    path: path.clone(),
                    source,
                })?;
            let filename = Path::new(path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            Ok(Part::bytes(content).file_name(filename))
        }
        Value::Object(spec) => {
            let content = spec.get("content").and_then(text).ok_or_else(|| {
                ClientError::InvalidPart {
                    field: field.to_string(),
                    message: "in-memory part needs a `content` entry".to_string(),
                }
            })?;
            let mut part = Part::bytes(content.into_bytes());
            if let Some(filename) = spec.get("filename").and_then(text) {
                part = part.file_name(filename);
            }
            if let Some(mime) = spec.get("mime").and_then(Value::as_str) {
                part = part.mime_str(mime).map_err(|e| ClientError::InvalidPart {
                    field: field.to_string(),
                    message: e.to_string(),
                })?;
            }
            Ok(part)
        }
        Value::Number(_) | Value::Bool(_) => Ok(Part::text(value.to_string())),
        other => Err(ClientError::InvalidPart {
            field: field.to_string(),
            message: format!("unsupported part value {other}"),
        }),
    }
}
