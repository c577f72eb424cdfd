//! Per-update context handed to handlers.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::api_url::ApiUrl;
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::executor::ExecuteOptions;
use crate::request::RequestBody;
use crate::transport::HttpTransport;
use crate::update::Update;

/// Everything a handler needs to react to one update.
///
/// Created by the delivery engine for each update and dropped once the
/// handler chain returns. The client is shared, not copied.
#[derive(Debug, Clone)]
pub struct Context {
    client: ApiClient,
    update: Update,
    cancel: Option<CancellationToken>,
}

impl Context {
    /// Creates a context for `update`.
    pub fn new(client: ApiClient, update: Update) -> Self {
        Self {
            client,
            update,
            cancel: None,
        }
    }

    /// Ties follow-up calls to the engine's lifetime.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Returns the update being handled.
    pub fn update(&self) -> &Update {
        &self.update
    }

    /// Returns the bot token.
    pub fn token(&self) -> &str {
        self.client.token()
    }

    /// Returns the endpoint template.
    pub fn api_url(&self) -> &ApiUrl {
        self.client.api_url()
    }

    /// Returns the shared transport.
    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        self.client.transport()
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Sends a follow-up request and decodes its result.
    pub async fn call<T, B>(&self, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: RequestBody + ?Sized,
    {
        self.client.call_with(body, self.options()).await
    }

    /// Sends a follow-up request and discards its result.
    pub async fn send<B>(&self, body: &B) -> ApiResult<()>
    where
        B: RequestBody + ?Sized,
    {
        self.client.send_with(body, self.options()).await
    }

    fn options(&self) -> ExecuteOptions {
        ExecuteOptions {
            api_url: None,
            cancel: self.cancel.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::request::{JSON_CONTENT_TYPE, json_body};
    use crate::testing::MockTransport;
    use crate::transport::HttpBody;
    use crate::types::Message;

    struct Reply<'a> {
        chat_id: i64,
        text: &'a str,
    }

    impl RequestBody for Reply<'_> {
        fn endpoint(&self) -> &str {
            "sendMessage"
        }

        fn reader(&self) -> ApiResult<HttpBody> {
            json_body(&json!({ "chat_id": self.chat_id, "text": self.text }))
        }

        fn content_type(&self) -> String {
            JSON_CONTENT_TYPE.to_string()
        }
    }

    #[tokio::test]
    async fn test_follow_up_uses_context_credentials() {
        let transport = Arc::new(MockTransport::new());
        transport.push_ok(json!({
            "message_id": 2,
            "date": 0,
            "chat": {"id": 99, "type": "private"},
            "text": "pong"
        }));

        let client = ApiClient::new("42:secret", transport.clone())
            .with_api_url("http://local/bot{token}/{method}");
        let ctx = Context::new(client, Update::new(1));

        let sent: Message = ctx
            .call(&Reply {
                chat_id: 99,
                text: "pong",
            })
            .await
            .unwrap();

        assert_eq!(sent.chat.id, 99);
        assert_eq!(
            transport.requests()[0].url,
            "http://local/bot42:secret/sendMessage"
        );
        assert_eq!(ctx.update().update_id, 1);
    }
}
