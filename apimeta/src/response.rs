//! Responses returned by transports and the values API calls produce.

use std::borrow::Cow;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::builder::Api;
use crate::error::ClientError;
use crate::request::Kwargs;

/// An HTTP response as seen by response hooks.
///
/// Transports fill in status, headers and body. Before the hook chain runs,
/// the call attaches the calling [`Api`] and the original keyword arguments
/// so hooks can inspect what produced the response.
///
/// ## Examples
///
/// ```rust
/// use apimeta::Response;
///
/// let resp = Response::new(200).with_body(r#"{"id": 7}"#);
/// assert_eq!(resp.status_code(), 200);
/// assert_eq!(resp.json::<serde_json::Value>().unwrap()["id"], 7);
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
    url: Option<String>,
    caller: Option<Arc<Api>>,
    input_kwargs: Kwargs,
}

impl Response {
    /// Creates an empty response with the given status code.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            url: None,
            caller: None,
            input_kwargs: Kwargs::new(),
        }
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Records the URL the response came from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// The body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserializes the body as JSON.
    ///
    /// ## Errors
    ///
    /// Returns [`ClientError::Decode`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The API whose call produced this response.
    pub fn caller(&self) -> Option<&Api> {
        self.caller.as_deref()
    }

    /// The keyword arguments the API was called with.
    pub fn input_kwargs(&self) -> &Kwargs {
        &self.input_kwargs
    }

    pub(crate) fn attach(&mut self, caller: Arc<Api>, input_kwargs: Kwargs) {
        self.caller = Some(caller);
        self.input_kwargs = input_kwargs;
    }
}

/// Final result of an API call.
///
/// The first response hook (or the API handler) returning a value turns the
/// call into [`ApiOutput::Value`]; when nothing does, the raw response comes
/// back unchanged.
#[derive(Debug, Clone)]
pub enum ApiOutput {
    /// A value produced by a hook or the handler.
    Value(Value),
    /// The untouched transport response.
    Response(Response),
}

impl ApiOutput {
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Response(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Response(_) => None,
        }
    }

    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Self::Value(_) => None,
            Self::Response(resp) => Some(resp),
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Value(_) => None,
            Self::Response(resp) => Some(resp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Repo {
        id: u64,
        name: String,
    }

    #[test]
    fn test_json_typed() {
        let resp = Response::new(200).with_body(r#"{"id": 1, "name": "apimeta"}"#);
        let repo: Repo = resp.json().unwrap();
        assert_eq!(
            repo,
            Repo {
                id: 1,
                name: "apimeta".to_string()
            }
        );
    }

    #[test]
    fn test_json_decode_error() {
        let resp = Response::new(200).with_body("not json");
        assert!(matches!(
            resp.json::<Value>(),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn test_text_is_lossy() {
        let resp = Response::new(200).with_body(vec![b'o', b'k', 0xff]);
        assert_eq!(resp.text(), "ok\u{fffd}");
    }

    #[test]
    fn test_fresh_response_has_no_caller() {
        let resp = Response::new(204);
        assert!(resp.caller().is_none());
        assert!(resp.input_kwargs().is_empty());
    }

    #[test]
    fn test_output_accessors() {
        let value = ApiOutput::Value(json!({"ok": true}));
        assert!(!value.is_response());
        assert_eq!(value.as_value(), Some(&json!({"ok": true})));

        let raw = ApiOutput::Response(Response::new(200));
        assert!(raw.is_response());
        assert_eq!(raw.into_response().map(|r| r.status_code()), Some(200));
    }
}
