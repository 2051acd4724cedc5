//! Assembly of declared APIs.
//!
//! [`ApiBuilder`] turns one declaration (method, URI template, optional
//! documentation with a `<meta>` block) into an [`Api`]. The path group is
//! synthesized from the URI template up front; everything else arrives as
//! [`MetaEvent`](crate::meta::MetaEvent)s dispatched through the
//! [`MetaBuilder`] callbacks.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::api_name::ApiName;
use crate::arg::{ArgGroup, ArgValidators, GroupRegistry, RawArgument};
use crate::error::{ApiError, ArgumentError};
use crate::hooks::{run_chain, ResponseHook};
use crate::meta::{MetaBuilder, ParseObserver, ParserRegistry};
use crate::method::RestMethod;
use crate::request::{Kwargs, RequestDescription, BASE_URI, METHOD, PATH, TIMEOUT, URI};
use crate::response::{ApiOutput, Response};
use crate::uri;

/// A declared, callable API.
///
/// The groups and the template description are read-only once built; every
/// call works on its own copy of the template.
#[derive(Debug)]
pub struct Api {
    name: ApiName,
    method: RestMethod,
    uri: String,
    doc: Option<String>,
    groups: Vec<ArgGroup>,
    template: RequestDescription,
    expected_status_code: Option<u16>,
    hooks: Vec<ResponseHook>,
    handler: Option<ResponseHook>,
}

impl Api {
    pub fn name(&self) -> &ApiName {
        &self.name
    }

    pub fn method(&self) -> RestMethod {
        self.method
    }

    /// The URI template, relative to the base URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Argument groups in declaration order, the path group first.
    pub fn groups(&self) -> &[ArgGroup] {
        &self.groups
    }

    pub fn group(&self, group_name: &str) -> Option<&ArgGroup> {
        self.groups.iter().find(|g| g.group_name() == group_name)
    }

    /// The description every call starts from.
    pub fn template(&self) -> &RequestDescription {
        &self.template
    }

    pub fn expected_status_code(&self) -> Option<u16> {
        self.expected_status_code
    }

    /// API-level response hooks, run after the consumer's.
    pub fn hooks(&self) -> &[ResponseHook] {
        &self.hooks
    }

    /// Assembles the request description for one call.
    ///
    /// Each group resolves against a fresh copy of the template. Keys any
    /// group consumed are dropped from the keyword arguments; the rest are
    /// merged into the top level as transport options.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use apimeta::{Consumer, RestMethod};
    /// # use apimeta::client::Transport;
    /// # use apimeta::{ApiError, RequestDescription, Response};
    /// # struct Offline;
    /// # impl Transport for Offline {
    /// #     async fn request(&self, _: &RequestDescription) -> Result<Response, ApiError> {
    /// #         Ok(Response::new(200))
    /// #     }
    /// # }
    ///
    /// let mut consumer = Consumer::builder("https://api.example.com", Offline).build()?;
    /// let api = consumer
    ///     .declare(RestMethod::Get, "/users/{user}")
    ///     .name("get_user")
    ///     .register()?;
    ///
    /// let kwargs = serde_json::json!({"user": "ada", "timeout": 5});
    /// let description = api.describe(kwargs.as_object().unwrap())?;
    /// assert_eq!(description.get_url()?, "https://api.example.com/users/ada");
    /// assert_eq!(description.get("timeout"), Some(&serde_json::json!(5)));
    /// # Ok::<(), apimeta::ApiError>(())
    /// ```
    ///
    /// ## Errors
    ///
    /// Propagates the first argument resolution failure.
    pub fn describe(&self, kwargs: &Kwargs) -> Result<RequestDescription, ArgumentError> {
        let mut description = self.template.clone();
        let mut consumed = HashSet::new();

        for group in &self.groups {
            consumed.extend(group.resolve_into(&mut description, kwargs)?);
        }

        let passthrough: Kwargs = kwargs
            .iter()
            .filter(|(key, _)| !consumed.contains(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        description.merge(passthrough);

        Ok(description)
    }

    /// Runs the hook chains, then the handler, over a response.
    ///
    /// Consumer hooks run before the API's own. The first value any of them
    /// yields is the result; the raw response is returned when neither the
    /// hooks nor the handler produce one.
    pub(crate) fn handle(
        &self,
        consumer_hooks: &[ResponseHook],
        resp: Response,
    ) -> Result<ApiOutput, ApiError> {
        if let Some(value) = run_chain(consumer_hooks, &resp)? {
            return Ok(ApiOutput::Value(value));
        }
        if let Some(value) = run_chain(&self.hooks, &resp)? {
            return Ok(ApiOutput::Value(value));
        }
        if let Some(handler) = &self.handler {
            if let Some(value) = handler.call(&resp)? {
                return Ok(ApiOutput::Value(value));
            }
        }
        Ok(ApiOutput::Response(resp))
    }
}

/// Builds an [`Api`] from a declaration and its metadata.
///
/// ## Examples
///
/// ```rust
/// use apimeta::arg::GroupRegistry;
/// use apimeta::builder::ApiBuilder;
/// use apimeta::meta::ParserRegistry;
/// use apimeta::{ApiName, RequestDescription, RestMethod};
///
/// let registry = GroupRegistry::default();
/// let api = ApiBuilder::new(
///     &registry,
///     ApiName::new("search").unwrap(),
///     RestMethod::Get,
///     "/search",
///     RequestDescription::new(),
///     Default::default(),
/// )?
/// .doc("Search.\n<meta>\nargs:\n  query: q\nexpected_status_code: 200\n</meta>")
/// .build(&ParserRegistry::default())?;
///
/// assert!(api.group("params").is_some());
/// assert_eq!(api.expected_status_code(), Some(200));
/// # Ok::<(), apimeta::ApiError>(())
/// ```
pub struct ApiBuilder<'r> {
    registry: &'r GroupRegistry,
    validators: ArgValidators,
    api: Api,
}

impl<'r> ApiBuilder<'r> {
    /// Starts an API from the consumer's template description.
    ///
    /// `method` and `uri` are written into the template. When the URI
    /// template has variables, a `path` group is created with one required
    /// argument per variable, defaulting to the inline `{name=default}`.
    ///
    /// ## Errors
    ///
    /// Returns a config error for a malformed URI template, and propagates
    /// path group construction failures.
    pub fn new(
        registry: &'r GroupRegistry,
        name: ApiName,
        method: RestMethod,
        uri: impl Into<String>,
        mut template: RequestDescription,
        validators: ArgValidators,
    ) -> Result<Self, ApiError> {
        let uri = uri.into();
        template.insert(URI, uri.as_str());
        template.insert(METHOD, method.as_str());

        let mut builder = Self {
            registry,
            validators,
            api: Api {
                name,
                method,
                uri,
                doc: None,
                groups: Vec::new(),
                template,
                expected_status_code: None,
                hooks: Vec::new(),
                handler: None,
            },
        };
        builder.build_path_group()?;
        Ok(builder)
    }

    fn build_path_group(&mut self) -> Result<(), ApiError> {
        let raw_args: Vec<RawArgument> = uri::variables(&self.api.uri)?
            .into_iter()
            .map(|var| match var.default {
                Some(default) => RawArgument::new(var.name).with_default(default),
                None => RawArgument::new(var.name),
            })
            .collect();

        if raw_args.is_empty() {
            return Ok(());
        }

        let group = self
            .registry
            .create(PATH, &raw_args, self.validators.get(PATH))?;
        debug!(api = %self.api.name, args = raw_args.len(), "built path group");
        self.api.groups.push(group);
        Ok(())
    }

    /// Sets the documentation the `<meta>` block is read from.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.api.doc = Some(doc.into());
        self
    }

    /// Sets the expectation used when the metadata declares none.
    pub fn expected_status_code(mut self, status_code: Option<u16>) -> Self {
        self.api.expected_status_code = status_code;
        self
    }

    /// Sets the handler invoked when no hook yields a value.
    pub fn handler(mut self, handler: ResponseHook) -> Self {
        self.api.handler = Some(handler);
        self
    }

    pub fn response_hook(mut self, hook: ResponseHook) -> Self {
        self.api.hooks.push(hook);
        self
    }

    /// Applies the documentation's metadata and returns the finished API.
    ///
    /// Documentation without a `<meta>` block leaves the API as declared.
    ///
    /// ## Errors
    ///
    /// Propagates metadata parse and group construction failures, and
    /// returns [`ArgumentError::InvalidValidator`] for validators aimed at a
    /// group the API does not have.
    pub fn build(mut self, parsers: &ParserRegistry) -> Result<Api, ApiError> {
        let events = match self.api.doc.as_deref() {
            Some(doc) => parsers.parse(doc)?,
            None => None,
        };
        if let Some(events) = events {
            ParseObserver::new(&mut self).trigger_all(&events)?;
        }

        for (group_name, validators) in &self.validators {
            if self.api.group(group_name).is_none() {
                let argument = validators.keys().next().cloned().unwrap_or_default();
                return Err(ArgumentError::InvalidValidator {
                    group: group_name.clone(),
                    argument,
                }
                .into());
            }
        }

        debug!(
            api = %self.api.name,
            method = %self.api.method,
            uri = %self.api.uri,
            groups = self.api.groups.len(),
            "built api"
        );
        Ok(self.api)
    }
}

impl MetaBuilder for ApiBuilder<'_> {
    fn build_arg_group(&mut self, group_name: &str, raw_args: &Value) -> Result<(), ApiError> {
        let raw_args = RawArgument::normalize(raw_args)?;
        let group = self
            .registry
            .create(group_name, &raw_args, self.validators.get(group_name))?;
        debug!(api = %self.api.name, group = group_name, "built argument group");
        self.api.groups.push(group);
        Ok(())
    }

    fn build_base_uri(&mut self, base_uri: &str) -> Result<(), ApiError> {
        self.api.template.insert(BASE_URI, base_uri);
        Ok(())
    }

    fn build_timeout(&mut self, timeout: &Value) -> Result<(), ApiError> {
        self.api.template.insert(TIMEOUT, timeout.clone());
        Ok(())
    }

    fn build_expected_status_code(&mut self, status_code: u16) -> Result<(), ApiError> {
        self.api.expected_status_code = Some(status_code);
        Ok(())
    }
}
