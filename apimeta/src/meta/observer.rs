//! Event dispatch from parsed metadata to a builder.

use serde_json::Value;
use tracing::trace;

use super::MetaEvent;
use crate::error::ApiError;

/// Receives metadata events, one callback per event kind.
pub trait MetaBuilder {
    /// Attaches an argument group built from raw declarations.
    fn build_arg_group(&mut self, group_name: &str, raw_args: &Value) -> Result<(), ApiError>;

    /// Overrides the base URI.
    fn build_base_uri(&mut self, base_uri: &str) -> Result<(), ApiError>;

    /// Sets the transport timeout.
    fn build_timeout(&mut self, timeout: &Value) -> Result<(), ApiError>;

    /// Sets the expected response status code.
    fn build_expected_status_code(&mut self, status_code: u16) -> Result<(), ApiError>;
}

/// Forwards [`MetaEvent`]s to the matching [`MetaBuilder`] callback.
pub struct ParseObserver<'b, B: MetaBuilder + ?Sized> {
    builder: &'b mut B,
}

impl<'b, B: MetaBuilder + ?Sized> ParseObserver<'b, B> {
    pub fn new(builder: &'b mut B) -> Self {
        Self { builder }
    }

    /// Dispatches one event.
    ///
    /// ## Errors
    ///
    /// Propagates the builder callback's error.
    pub fn trigger(&mut self, event: &MetaEvent) -> Result<(), ApiError> {
        trace!(?event, "dispatching meta event");
        match event {
            MetaEvent::ArgGroup { name, raw } => self.builder.build_arg_group(name, raw),
            MetaEvent::BaseUri(base_uri) => self.builder.build_base_uri(base_uri),
            MetaEvent::Timeout(timeout) => self.builder.build_timeout(timeout),
            MetaEvent::ExpectedStatusCode(code) => self.builder.build_expected_status_code(*code),
        }
    }

    /// Dispatches events in order, stopping at the first error.
    pub fn trigger_all<'e>(
        &mut self,
        events: impl IntoIterator<Item = &'e MetaEvent>,
    ) -> Result<(), ApiError> {
        events.into_iter().try_for_each(|event| self.trigger(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl MetaBuilder for Recorder {
        fn build_arg_group(&mut self, group_name: &str, raw_args: &Value) -> Result<(), ApiError> {
            self.calls.push(format!("arg_group:{group_name}:{raw_args}"));
            Ok(())
        }

        fn build_base_uri(&mut self, base_uri: &str) -> Result<(), ApiError> {
            self.calls.push(format!("base_uri:{base_uri}"));
            Ok(())
        }

        fn build_timeout(&mut self, timeout: &Value) -> Result<(), ApiError> {
            self.calls.push(format!("timeout:{timeout}"));
            Ok(())
        }

        fn build_expected_status_code(&mut self, status_code: u16) -> Result<(), ApiError> {
            if status_code == 0 {
                return Err(ApiError::custom("zero"));
            }
            self.calls.push(format!("status:{status_code}"));
            Ok(())
        }
    }

    #[test]
    fn test_events_reach_callbacks_in_order() {
        let mut recorder = Recorder::default();
        let events = vec![
            MetaEvent::BaseUri("https://x".to_string()),
            MetaEvent::ArgGroup {
                name: "params".to_string(),
                raw: json!(["q"]),
            },
            MetaEvent::Timeout(json!(3)),
            MetaEvent::ExpectedStatusCode(200),
        ];

        ParseObserver::new(&mut recorder).trigger_all(&events).unwrap();

        assert_eq!(
            recorder.calls,
            vec![
                "base_uri:https://x",
                "arg_group:params:[\"q\"]",
                "timeout:3",
                "status:200",
            ]
        );
    }

    #[test]
    fn test_first_error_stops_dispatch() {
        let mut recorder = Recorder::default();
        let events = vec![
            MetaEvent::ExpectedStatusCode(0),
            MetaEvent::Timeout(json!(3)),
        ];
        assert!(ParseObserver::new(&mut recorder).trigger_all(&events).is_err());
        assert!(recorder.calls.is_empty());
    }
}
