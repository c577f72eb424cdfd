//! `getMe`: the bot's own account.

use serde::{Deserialize, Serialize};

use crate::json_request;

/// Returns the bot's `User`. Handy for checking a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetMe {}

json_request!(GetMe => "getMe");

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tgbot_core::testing::MockTransport;
    use tgbot_core::{ApiClient, User};

    use super::*;

    #[tokio::test]
    async fn test_get_me() {
        let transport = Arc::new(MockTransport::new());
        transport.push_ok(json!({
            "id": 7,
            "is_bot": true,
            "first_name": "Echo",
            "username": "echo_bot"
        }));
        let client = ApiClient::new("7:abc", transport.clone());

        let me: User = client.call(&GetMe {}).await.unwrap();
        assert_eq!(me.username.as_deref(), Some("echo_bot"));
        assert_eq!(transport.requests()[0].body.as_bytes(), Some(&b"{}"[..]));
        assert!(transport.requests()[0].url.ends_with("/bot7:abc/getMe"));
    }
}
