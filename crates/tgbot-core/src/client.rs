//! Credentials and transport bundled for repeated calls.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::api_url::ApiUrl;
use crate::error::ApiResult;
use crate::executor::{ExecuteOptions, execute, execute_into};
use crate::request::RequestBody;
use crate::transport::HttpTransport;

/// Token, endpoint template and transport of one bot.
///
/// Cloning is cheap; clones share the same transport.
#[derive(Clone)]
pub struct ApiClient {
    token: Arc<str>,
    api_url: ApiUrl,
    transport: Arc<dyn HttpTransport>,
}

impl ApiClient {
    /// Creates a client using the public API endpoint.
    pub fn new(token: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            token: Arc::from(token.into()),
            api_url: ApiUrl::default(),
            transport,
        }
    }

    /// Sets the endpoint template. Invalid templates are replaced by the default.
    pub fn with_api_url(mut self, template: &str) -> Self {
        self.api_url = ApiUrl::parse_or_default(template);
        self
    }

    /// Returns the bot token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the endpoint template.
    pub fn api_url(&self) -> &ApiUrl {
        &self.api_url
    }

    /// Returns the shared transport.
    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    /// Options carrying this client's endpoint template.
    pub fn options(&self) -> ExecuteOptions {
        ExecuteOptions::new().with_api_url(self.api_url.as_str())
    }

    /// Executes `body` and decodes its result.
    pub async fn call<T, B>(&self, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: RequestBody + ?Sized,
    {
        self.call_with(body, ExecuteOptions::new()).await
    }

    /// Executes `body` with extra options (e.g. a cancellation token).
    pub async fn call_with<T, B>(&self, body: &B, options: ExecuteOptions) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: RequestBody + ?Sized,
    {
        let options = self.options().merge(options);
        execute_into(self.transport.as_ref(), &self.token, body, &options).await
    }

    /// Executes `body` and discards its result.
    pub async fn send<B>(&self, body: &B) -> ApiResult<()>
    where
        B: RequestBody + ?Sized,
    {
        self.send_with(body, ExecuteOptions::new()).await
    }

    /// Executes `body` with extra options and discards its result.
    pub async fn send_with<B>(&self, body: &B, options: ExecuteOptions) -> ApiResult<()>
    where
        B: RequestBody + ?Sized,
    {
        let options = self.options().merge(options);
        execute(self.transport.as_ref(), &self.token, body, &options).await?;
        Ok(())
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}
