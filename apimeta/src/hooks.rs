//! Response hooks.
//!
//! Hooks run after the transport returns, consumer-level hooks first (the
//! status check is always the first of those), then the API's own hooks.
//! The first hook returning `Ok(Some(value))` ends the chain and its value
//! becomes the call's result.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::response::Response;

/// What a hook produces: `None` passes the response on.
pub type HookResult = Result<Option<Value>, ApiError>;

type HookFn = dyn Fn(&Response) -> HookResult + Send + Sync;

/// A function invoked with the response after a call.
///
/// API handlers share this shape: they receive the raw response once no
/// hook has produced a value.
///
/// ## Examples
///
/// ```rust
/// use apimeta::hooks::ResponseHook;
/// use apimeta::Response;
///
/// let status_only = ResponseHook::new(|resp| Ok(Some(resp.status_code().into())));
/// let out = status_only.call(&Response::new(201)).unwrap();
/// assert_eq!(out, Some(201.into()));
/// ```
#[derive(Clone)]
pub struct ResponseHook(Arc<HookFn>);

impl ResponseHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Response) -> HookResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, resp: &Response) -> HookResult {
        (self.0)(resp)
    }
}

impl fmt::Debug for ResponseHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseHook(..)")
    }
}

/// Fails when the response status differs from the caller's expected code.
///
/// Responses without a caller, or whose API declares no expectation, pass.
///
/// ## Errors
///
/// Returns [`ApiError::UnexpectedStatusCode`] carrying the response.
pub fn check_status(resp: &Response) -> HookResult {
    let Some(expected) = resp.caller().and_then(|api| api.expected_status_code()) else {
        return Ok(None);
    };

    let actual = resp.status_code();
    if actual != expected {
        return Err(ApiError::UnexpectedStatusCode {
            expected,
            actual,
            response: Box::new(resp.clone()),
        });
    }
    Ok(None)
}

/// Decodes the response body as JSON.
///
/// An empty body decodes to `null`.
///
/// ## Errors
///
/// Returns a decode error if the body is not valid JSON.
pub fn json(resp: &Response) -> HookResult {
    if resp.body().is_empty() {
        return Ok(Some(Value::Null));
    }
    Ok(Some(resp.json::<Value>()?))
}

/// Runs `hooks` in order, stopping at the first one that yields a value.
pub(crate) fn run_chain(hooks: &[ResponseHook], resp: &Response) -> HookResult {
    for (index, hook) in hooks.iter().enumerate() {
        if let Some(value) = hook.call(resp)? {
            debug!(hook = index, "response hook short-circuited");
            return Ok(Some(value));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_check_status_without_caller_passes() {
        assert!(check_status(&Response::new(500)).unwrap().is_none());
    }

    #[test]
    fn test_json_hook() {
        let resp = Response::new(200).with_body(r#"{"a": [1, 2]}"#);
        assert_eq!(json(&resp).unwrap(), Some(json!({"a": [1, 2]})));
    }

    #[test]
    fn test_json_hook_empty_body() {
        assert_eq!(json(&Response::new(204)).unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_chain_stops_at_first_value() {
        let later_ran = Arc::new(AtomicBool::new(false));
        let flag = later_ran.clone();
        let hooks = vec![
            ResponseHook::new(|_| Ok(None)),
            ResponseHook::new(|_| Ok(Some(json!("first")))),
            ResponseHook::new(move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(Some(json!("second")))
            }),
        ];

        let result = run_chain(&hooks, &Response::new(200)).unwrap();
        assert_eq!(result, Some(json!("first")));
        assert!(!later_ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_chain_without_values() {
        let hooks = vec![ResponseHook::new(|_| Ok(None))];
        assert_eq!(run_chain(&hooks, &Response::new(200)).unwrap(), None);
    }

    #[test]
    fn test_chain_error_propagates() {
        let hooks = vec![ResponseHook::new(|_| Err(ApiError::custom("boom")))];
        let err = run_chain(&hooks, &Response::new(200)).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
