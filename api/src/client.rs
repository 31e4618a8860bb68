//! FocusApp API client implementation

use crate::{
    config::ClientConfig,
    error::ApiError,
    interceptor::{ErrorInterceptor, FetchHook},
};
use focusapp_core::storage::{ACCESS_KEY, TokenStorage};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// How a request authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAuth {
    /// No `Authorization` header
    Anonymous,
    /// `Authorization: Bearer <token>` with an explicit token
    Bearer(String),
    /// `Authorization: Bearer <access>` with the token read from storage at
    /// send time
    Stored,
}

/// A request against a backend endpoint.
///
/// Paths are relative to the configured base URL (`"users/me/"`).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    auth: RequestAuth,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Create an anonymous request.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            auth: RequestAuth::Anonymous,
            body: None,
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PATCH` request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Authenticate with an explicit bearer token.
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.auth = RequestAuth::Bearer(token.into());
        self
    }

    /// Authenticate with the access token currently in storage.
    #[must_use]
    pub fn authenticated(mut self) -> Self {
        self.auth = RequestAuth::Stored;
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Endpoint path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Authentication mode.
    #[must_use]
    pub const fn auth(&self) -> &RequestAuth {
        &self.auth
    }
}

struct ClientInner {
    http: Client,
    config: ClientConfig,
    storage: Arc<dyn TokenStorage>,
    fetch_hook: OnceLock<Arc<dyn FetchHook>>,
    error_interceptors: RwLock<Vec<Arc<dyn ErrorInterceptor>>>,
}

/// FocusApp API client
///
/// Cheap to clone; clones share the HTTP connection pool and the installed
/// interceptors.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url)
            .field("fetch_hook_installed", &self.inner.fetch_hook.get().is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from environment configuration
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if `FOCUSAPP_API_BASE_URL` is invalid
    pub fn from_env(storage: Arc<dyn TokenStorage>) -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env()?, storage)
    }

    /// Create a client with explicit configuration
    ///
    /// `storage` is where authenticated requests read the access token from.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RequestFailed` if the HTTP client cannot be built
    pub fn new(config: ClientConfig, storage: Arc<dyn TokenStorage>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                storage,
                fetch_hook: OnceLock::new(),
                error_interceptors: RwLock::new(Vec::new()),
            }),
        })
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Install the raw-response hook.
    ///
    /// Installation happens at most once per client: later calls leave the
    /// first hook in place and return `false`.
    pub fn install_fetch_interceptor(&self, hook: Arc<dyn FetchHook>) -> bool {
        self.inner.fetch_hook.set(hook).is_ok()
    }

    /// Whether a raw-response hook is installed.
    #[must_use]
    pub fn has_fetch_interceptor(&self) -> bool {
        self.inner.fetch_hook.get().is_some()
    }

    /// Append an error interceptor for the high-level convention.
    pub fn add_error_interceptor(&self, interceptor: Arc<dyn ErrorInterceptor>) {
        self.inner
            .error_interceptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(interceptor);
    }

    /// Number of registered error interceptors.
    #[must_use]
    pub fn error_interceptor_count(&self) -> usize {
        self.inner
            .error_interceptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Send a request and return the raw response, whatever its status
    ///
    /// The installed fetch hook observes the status before the response is
    /// handed back untouched.
    ///
    /// # Errors
    ///
    /// Returns errors only when no response was received (network failure,
    /// missing stored token)
    pub async fn fetch(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let response = self.execute(request).await?;

        if let Some(hook) = self.inner.fetch_hook.get() {
            hook.after_fetch(response.status().as_u16());
        }

        Ok(response)
    }

    /// Send a request and decode a JSON success body
    ///
    /// Non-2xx statuses become errors. Every error is shown to the registered
    /// error interceptors, then returned as-is.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for `401`, `ApiError::Status` for other
    /// non-success statuses, and network or parsing errors otherwise
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let result = self.request_json(request).await;

        if let Err(error) = &result {
            self.notify_error_interceptors(error);
        }

        result
    }

    async fn request_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        let response = ensure_success(response).await?;
        decode_json(response).await
    }

    fn notify_error_interceptors(&self, error: &ApiError) {
        let interceptors = self
            .inner
            .error_interceptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for interceptor in interceptors {
            interceptor.on_error(error);
        }
    }

    async fn execute(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let url = self.inner.config.endpoint(&request.path);
        let mut builder = self.inner.http.request(request.method.clone(), &url);

        match &request.auth {
            RequestAuth::Anonymous => {}
            RequestAuth::Bearer(token) => builder = builder.bearer_auth(token),
            RequestAuth::Stored => {
                let token = self
                    .inner
                    .storage
                    .get(ACCESS_KEY)?
                    .filter(|token| !token.is_empty())
                    .ok_or(ApiError::MissingToken)?;
                builder = builder.bearer_auth(token);
            }
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = %request.method, url = %url, "Sending API request");

        builder
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))
    }
}

/// Turn a non-2xx response into the matching error.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status {
                status: status.as_u16(),
                message: body,
            })
        }
    }
}

pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))
}
