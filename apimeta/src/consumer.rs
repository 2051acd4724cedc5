//! The runtime registry of declared APIs.
//!
//! A [`Consumer`] owns everything its APIs share: the base URI, the
//! template request description, the transport, the consumer-level hook
//! chain, an optional [`Router`], and the group and metadata-parser
//! registries used while declaring.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use apimeta::{ApiOutput, Consumer, Kwargs};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), apimeta::ApiError> {
//! let mut github = Consumer::new("https://api.github.com")?;
//!
//! github
//!     .get("/repos/{owner}/{repo}/issues")
//!     .name("list_issues")
//!     .doc(
//!         "List issues of a repository.
//!
//!          <meta>
//!          args:
//!            query:
//!              state: {default: open}
//!            header: {accept: application/vnd.github+json}
//!          expected_status_code: 200
//!          </meta>",
//!     )
//!     .jsonify()
//!     .register()?;
//!
//! let kwargs: Kwargs = json!({"owner": "rust-lang", "repo": "rust"})
//!     .as_object()
//!     .cloned()
//!     .unwrap_or_default();
//! let issues = github.call("list_issues", kwargs).await?;
//! if let ApiOutput::Value(issues) = issues {
//!     println!("{issues}");
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::api_name::ApiName;
use crate::arg::{ArgValidators, GroupRegistry, Validator};
use crate::builder::{Api, ApiBuilder};
use crate::client::{ReqwestTransport, Transport};
use crate::error::{ApiError, ConfigError};
use crate::hooks::{self, ResponseHook};
use crate::meta::ParserRegistry;
use crate::method::RestMethod;
use crate::request::{Kwargs, RequestDescription, BASE_URI};
use crate::response::{ApiOutput, Response};

/// Marker types tracking whether a [`Declaration`] has been named.
pub mod declaration_state {
    /// The API name has not been set.
    pub struct Missing;
    /// The API name has been set.
    pub struct Present;
}

use declaration_state::{Missing, Present};

/// Picks a base URI for a route key.
///
/// Returning `None` falls back to the consumer's own base URI.
pub trait Router: Send + Sync {
    fn get(&self, route_key: &str) -> Option<String>;
}

impl Router for HashMap<String, String> {
    fn get(&self, route_key: &str) -> Option<String> {
        HashMap::get(self, route_key).cloned()
    }
}

/// Builder for configuring a [`Consumer`].
pub struct ConsumerBuilder<T> {
    base_uri: String,
    transport: T,
    expected_status_code: Option<u16>,
    options: Kwargs,
    router: Option<Box<dyn Router>>,
    registry: GroupRegistry,
    parsers: ParserRegistry,
}

impl<T: Transport> ConsumerBuilder<T> {
    /// Sets the status code every API expects unless its metadata says
    /// otherwise.
    pub fn expected_status_code(mut self, status_code: u16) -> Self {
        self.expected_status_code = Some(status_code);
        self
    }

    /// Seeds a key of the template description shared by every API, such
    /// as `timeout` or a pre-filled group.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use apimeta::client::ReqwestTransport;
    /// use apimeta::Consumer;
    /// use serde_json::json;
    ///
    /// let consumer = Consumer::builder("https://x", ReqwestTransport::new()?)
    ///     .option("timeout", 5)
    ///     .option("auth", json!({"type": "basic"}))
    ///     .build()?;
    /// assert_eq!(consumer.template().get("timeout"), Some(&json!(5)));
    /// # Ok::<(), apimeta::ApiError>(())
    /// ```
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn router(mut self, router: impl Router + 'static) -> Self {
        self.router = Some(Box::new(router));
        self
    }

    /// Replaces the default group registry.
    pub fn registry(mut self, registry: GroupRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the default metadata parser registry.
    pub fn parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }

    /// Builds the [`Consumer`].
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the base URI does not parse.
    pub fn build(self) -> Result<Consumer<T>, ApiError> {
        Url::parse(&self.base_uri).map_err(ConfigError::from)?;

        let mut template = RequestDescription::from(self.options);
        template.insert(BASE_URI, self.base_uri.as_str());

        debug!(base_uri = %self.base_uri, "created consumer");
        Ok(Consumer {
            base_uri: self.base_uri,
            template,
            expected_status_code: self.expected_status_code,
            apis: HashMap::new(),
            hooks: vec![ResponseHook::new(hooks::check_status)],
            transport: self.transport,
            router: self.router,
            registry: self.registry,
            parsers: self.parsers,
        })
    }
}

/// A set of APIs sharing a base URI, a transport and a hook chain.
pub struct Consumer<T = ReqwestTransport> {
    base_uri: String,
    template: RequestDescription,
    expected_status_code: Option<u16>,
    apis: HashMap<String, Arc<Api>>,
    hooks: Vec<ResponseHook>,
    transport: T,
    router: Option<Box<dyn Router>>,
    registry: GroupRegistry,
    parsers: ParserRegistry,
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut apis: Vec<_> = self.apis.keys().collect();
        apis.sort();
        f.debug_struct("Consumer")
            .field("base_uri", &self.base_uri)
            .field("expected_status_code", &self.expected_status_code)
            .field("apis", &apis)
            .field("hooks", &self.hooks.len())
            .field("router", &self.router.is_some())
            .finish_non_exhaustive()
    }
}

impl Consumer<ReqwestTransport> {
    /// Creates a consumer using the default [`ReqwestTransport`].
    ///
    /// ## Errors
    ///
    /// Returns an error if the base URI is invalid or the HTTP client cannot
    /// be constructed.
    pub fn new(base_uri: impl Into<String>) -> Result<Self, ApiError> {
        Self::builder(base_uri, ReqwestTransport::new()?).build()
    }
}

impl<T: Transport> Consumer<T> {
    pub fn builder(base_uri: impl Into<String>, transport: T) -> ConsumerBuilder<T> {
        ConsumerBuilder {
            base_uri: base_uri.into(),
            transport,
            expected_status_code: None,
            options: Kwargs::new(),
            router: None,
            registry: GroupRegistry::default(),
            parsers: ParserRegistry::default(),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// The description every API's template is seeded from.
    pub fn template(&self) -> &RequestDescription {
        &self.template
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn expected_status_code(&self) -> Option<u16> {
        self.expected_status_code
    }

    /// Group types available to APIs declared from now on.
    pub fn registry_mut(&mut self) -> &mut GroupRegistry {
        &mut self.registry
    }

    /// Metadata formats available to APIs declared from now on.
    pub fn parsers_mut(&mut self) -> &mut ParserRegistry {
        &mut self.parsers
    }

    /// Starts declaring an API.
    pub fn declare(
        &mut self,
        method: RestMethod,
        uri: impl Into<String>,
    ) -> Declaration<'_, T, Missing> {
        Declaration {
            consumer: self,
            method,
            uri: uri.into(),
            name: None,
            doc: None,
            validators: ArgValidators::new(),
            handler: None,
            hooks: Vec::new(),
            _state: PhantomData,
        }
    }

    pub fn get(&mut self, uri: impl Into<String>) -> Declaration<'_, T, Missing> {
        self.declare(RestMethod::Get, uri)
    }

    pub fn post(&mut self, uri: impl Into<String>) -> Declaration<'_, T, Missing> {
        self.declare(RestMethod::Post, uri)
    }

    pub fn put(&mut self, uri: impl Into<String>) -> Declaration<'_, T, Missing> {
        self.declare(RestMethod::Put, uri)
    }

    pub fn patch(&mut self, uri: impl Into<String>) -> Declaration<'_, T, Missing> {
        self.declare(RestMethod::Patch, uri)
    }

    pub fn delete(&mut self, uri: impl Into<String>) -> Declaration<'_, T, Missing> {
        self.declare(RestMethod::Delete, uri)
    }

    pub fn head(&mut self, uri: impl Into<String>) -> Declaration<'_, T, Missing> {
        self.declare(RestMethod::Head, uri)
    }

    /// Appends a consumer-level response hook.
    ///
    /// Consumer hooks run before any API-level hook, after the built-in
    /// status check.
    pub fn add_response_hook(&mut self, hook: ResponseHook) {
        self.hooks.push(hook);
    }

    pub fn set_router(&mut self, router: impl Router + 'static) {
        self.router = Some(Box::new(router));
    }

    /// Names of the declared APIs, in no particular order.
    pub fn api_names(&self) -> impl Iterator<Item = &str> {
        self.apis.keys().map(String::as_str)
    }

    /// Looks up a declared API.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::UnknownApi`] if no API has that name.
    pub fn api(&self, name: &str) -> Result<BoundApi<'_, T>, ApiError> {
        let api = self
            .apis
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownApi {
                name: name.to_string(),
            })?;
        Ok(BoundApi {
            consumer: self,
            api,
            base_uri: None,
        })
    }

    /// Calls a declared API by name.
    ///
    /// ## Errors
    ///
    /// See [`BoundApi::call`].
    pub async fn call(&self, name: &str, kwargs: Kwargs) -> Result<ApiOutput, ApiError> {
        self.api(name)?.call(kwargs).await
    }

    /// Base URI the router picks for `route_key`, or the consumer's own.
    pub fn routed_base_uri(&self, route_key: &str) -> String {
        self.router
            .as_ref()
            .and_then(|router| router.get(route_key))
            .unwrap_or_else(|| self.base_uri.clone())
    }

    /// A view of this consumer whose calls go to the routed base URI.
    pub fn routing(&self, route_key: &str) -> Route<'_, T> {
        Route {
            consumer: self,
            base_uri: self.routed_base_uri(route_key),
        }
    }
}

/// An API being declared on a [`Consumer`].
///
/// `N` tracks whether the API has been named; only named declarations can
/// be registered.
pub struct Declaration<'c, T, N> {
    consumer: &'c mut Consumer<T>,
    method: RestMethod,
    uri: String,
    name: Option<String>,
    doc: Option<String>,
    validators: ArgValidators,
    handler: Option<ResponseHook>,
    hooks: Vec<ResponseHook>,
    _state: PhantomData<N>,
}

impl<'c, T> Declaration<'c, T, Missing> {
    /// Sets the API name, which must be a valid identifier.
    pub fn name(self, name: impl Into<String>) -> Declaration<'c, T, Present> {
        Declaration {
            consumer: self.consumer,
            method: self.method,
            uri: self.uri,
            name: Some(name.into()),
            doc: self.doc,
            validators: self.validators,
            handler: self.handler,
            hooks: self.hooks,
            _state: PhantomData,
        }
    }
}

impl<T, N> Declaration<'_, T, N> {
    /// Sets the documentation; its `<meta>` block configures the API.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Attaches a validator to one argument of one group.
    pub fn validator(
        mut self,
        group_name: impl Into<String>,
        arg_name: impl Into<String>,
        validator: Validator,
    ) -> Self {
        self.validators
            .entry(group_name.into())
            .or_default()
            .insert(arg_name.into(), validator);
        self
    }

    /// Attaches validators for several groups at once.
    pub fn validators(mut self, validators: ArgValidators) -> Self {
        for (group_name, group) in validators {
            self.validators.entry(group_name).or_default().extend(group);
        }
        self
    }

    /// Sets the function that receives the response when no hook yields a
    /// value.
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Response) -> hooks::HookResult + Send + Sync + 'static,
    {
        self.handler = Some(ResponseHook::new(handler));
        self
    }

    /// Appends an API-level response hook.
    pub fn response_hook(mut self, hook: ResponseHook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Returns the decoded JSON body instead of the raw response.
    pub fn jsonify(self) -> Self {
        self.response_hook(ResponseHook::new(hooks::json))
    }
}

impl<T: Transport> Declaration<'_, T, Present> {
    /// Builds the API and adds it to the consumer.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidApiName`] or
    /// [`ConfigError::DuplicateApi`] for a bad name, and propagates metadata
    /// and argument group errors.
    pub fn register(self) -> Result<Arc<Api>, ApiError> {
        let raw_name = self.name.unwrap_or_default();
        let name = ApiName::new(raw_name).map_err(ConfigError::from)?;
        if self.consumer.apis.contains_key(name.as_str()) {
            return Err(ConfigError::DuplicateApi {
                name: name.to_string(),
            }
            .into());
        }

        let mut builder = ApiBuilder::new(
            &self.consumer.registry,
            name,
            self.method,
            self.uri,
            self.consumer.template.clone(),
            self.validators,
        )?
        .expected_status_code(self.consumer.expected_status_code);
        if let Some(doc) = self.doc {
            builder = builder.doc(doc);
        }
        if let Some(handler) = self.handler {
            builder = builder.handler(handler);
        }
        for hook in self.hooks {
            builder = builder.response_hook(hook);
        }

        let api = Arc::new(builder.build(&self.consumer.parsers)?);
        self.consumer
            .apis
            .insert(api.name().to_string(), Arc::clone(&api));
        Ok(api)
    }
}

/// A declared API bound to its consumer, ready to call.
pub struct BoundApi<'a, T> {
    consumer: &'a Consumer<T>,
    api: Arc<Api>,
    base_uri: Option<String>,
}

impl<'a, T: Transport> BoundApi<'a, T> {
    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Re-binds this API to the base URI routed for `route_key`.
    pub fn routing(&self, route_key: &str) -> Self {
        Self {
            consumer: self.consumer,
            api: Arc::clone(&self.api),
            base_uri: Some(self.consumer.routed_base_uri(route_key)),
        }
    }

    /// Calls the API.
    ///
    /// The request description is assembled from the keyword arguments,
    /// sent through the consumer's transport, and the response runs through
    /// the consumer hooks, the API hooks and finally the handler.
    ///
    /// ## Errors
    ///
    /// Returns argument errors before anything is sent, transport errors,
    /// [`ApiError::UnexpectedStatusCode`] from the status check, and any
    /// error raised by a hook or the handler.
    #[instrument(name = "api_call", skip(self, kwargs), fields(api.name = %self.api.name()))]
    pub async fn call(&self, kwargs: Kwargs) -> Result<ApiOutput, ApiError> {
        let mut input = kwargs;
        if let Some(base_uri) = &self.base_uri {
            input.insert(BASE_URI.to_string(), Value::String(base_uri.clone()));
        }

        let description = self.api.describe(&input)?;
        let mut resp = self.consumer.transport.request(&description).await?;
        resp.attach(Arc::clone(&self.api), input);

        self.api.handle(&self.consumer.hooks, resp)
    }
}

/// A consumer view whose calls go to a routed base URI.
pub struct Route<'a, T> {
    consumer: &'a Consumer<T>,
    base_uri: String,
}

impl<'a, T: Transport> Route<'a, T> {
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Looks up an API, bound to this route's base URI.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::UnknownApi`] if no API has that name.
    pub fn api(&self, name: &str) -> Result<BoundApi<'a, T>, ApiError> {
        let mut bound = self.consumer.api(name)?;
        bound.base_uri = Some(self.base_uri.clone());
        Ok(bound)
    }

    pub async fn call(&self, name: &str, kwargs: Kwargs) -> Result<ApiOutput, ApiError> {
        self.api(name)?.call(kwargs).await
    }
}
