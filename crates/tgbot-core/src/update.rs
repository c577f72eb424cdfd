//! Incoming updates and the enumeration of update kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{CallbackQuery, Message};

/// One event delivered by the platform.
///
/// `update_id` grows strictly; at most one of the optional payloads is set.
/// Kinds without a typed field stay in `extra`, keyed by their wire name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Update {
    /// Creates an update with no payload. Mostly useful in tests.
    pub fn new(update_id: i64) -> Self {
        Self {
            update_id,
            message: None,
            edited_message: None,
            channel_post: None,
            edited_channel_post: None,
            callback_query: None,
            extra: Map::new(),
        }
    }

    /// Parses an update from its JSON representation.
    pub fn from_slice(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    /// Returns the kind of this update, if it is a known one.
    pub fn kind(&self) -> Option<UpdateType> {
        if self.message.is_some() {
            return Some(UpdateType::Message);
        }
        if self.edited_message.is_some() {
            return Some(UpdateType::EditedMessage);
        }
        if self.channel_post.is_some() {
            return Some(UpdateType::ChannelPost);
        }
        if self.edited_channel_post.is_some() {
            return Some(UpdateType::EditedChannelPost);
        }
        if self.callback_query.is_some() {
            return Some(UpdateType::CallbackQuery);
        }
        self.extra.keys().find_map(|k| k.parse().ok())
    }

    /// Returns the message-like payload, whichever field carries it.
    pub fn any_message(&self) -> Option<&Message> {
        self.message
            .as_ref()
            .or(self.edited_message.as_ref())
            .or(self.channel_post.as_ref())
            .or(self.edited_channel_post.as_ref())
            .or_else(|| self.callback_query.as_ref()?.message.as_ref())
    }

    /// Returns the chat this update belongs to.
    pub fn chat_id(&self) -> Option<i64> {
        self.any_message().map(|m| m.chat.id)
    }

    /// Returns the text of the message-like payload.
    pub fn text(&self) -> Option<&str> {
        self.any_message()?.text.as_deref()
    }
}

/// Returned when an update kind name is not part of [`UpdateType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown update type '{0}'")]
pub struct UnknownUpdateType(pub String);

macro_rules! update_types {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Known update kinds, as accepted by `allowed_updates` filters.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum UpdateType {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl UpdateType {
            /// Every known kind, in wire order.
            pub const ALL: &'static [UpdateType] = &[$(UpdateType::$variant),+];

            /// Returns the wire name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(UpdateType::$variant => $name,)+
                }
            }
        }

        impl FromStr for UpdateType {
            type Err = UnknownUpdateType;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(UpdateType::$variant),)+
                    other => Err(UnknownUpdateType(other.to_string())),
                }
            }
        }
    };
}

update_types! {
    Message => "message",
    EditedMessage => "edited_message",
    ChannelPost => "channel_post",
    EditedChannelPost => "edited_channel_post",
    BusinessConnection => "business_connection",
    BusinessMessage => "business_message",
    EditedBusinessMessage => "edited_business_message",
    DeletedBusinessMessages => "deleted_business_messages",
    MessageReaction => "message_reaction",
    MessageReactionCount => "message_reaction_count",
    InlineQuery => "inline_query",
    ChosenInlineResult => "chosen_inline_result",
    CallbackQuery => "callback_query",
    ShippingQuery => "shipping_query",
    PreCheckoutQuery => "pre_checkout_query",
    PurchasedPaidMedia => "purchased_paid_media",
    Poll => "poll",
    PollAnswer => "poll_answer",
    MyChatMember => "my_chat_member",
    ChatMember => "chat_member",
    ChatJoinRequest => "chat_join_request",
    ChatBoost => "chat_boost",
    RemovedChatBoost => "removed_chat_boost",
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks that every name in `names` is a known update kind.
pub fn validate_update_types<S: AsRef<str>>(names: &[S]) -> Result<(), UnknownUpdateType> {
    for name in names {
        name.as_ref().parse::<UpdateType>()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE_UPDATE: &str = r#"{
        "update_id": 10000,
        "message": {
            "message_id": 1365,
            "date": 1441645532,
            "chat": {"id": 1111111, "type": "private", "first_name": "Test"},
            "from": {"id": 1111111, "is_bot": false, "first_name": "Test"},
            "text": "/start",
            "entities": [{"type": "bot_command", "offset": 0, "length": 6}]
        }
    }"#;

    #[test]
    fn test_decode_twice_is_stable() {
        let a = Update::from_slice(MESSAGE_UPDATE.as_bytes()).unwrap();
        let b = Update::from_slice(MESSAGE_UPDATE.as_bytes()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.kind(), Some(UpdateType::Message));
        assert_eq!(a.chat_id(), Some(1111111));
        assert_eq!(a.text(), Some("/start"));
        assert!(a.message.unwrap().extra.contains_key("entities"));
    }

    #[test]
    fn test_untyped_kind_is_preserved() {
        let raw = r#"{"update_id": 7, "poll_answer": {"poll_id": "p", "option_ids": [0]}}"#;
        let update = Update::from_slice(raw.as_bytes()).unwrap();
        assert_eq!(update.kind(), Some(UpdateType::PollAnswer));
        assert!(update.extra.contains_key("poll_answer"));
        assert_eq!(update.chat_id(), None);

        let back = serde_json::to_value(&update).unwrap();
        assert_eq!(back["poll_answer"]["poll_id"], "p");
    }

    #[test]
    fn test_update_type_names() {
        assert_eq!("chat_boost".parse::<UpdateType>(), Ok(UpdateType::ChatBoost));
        assert_eq!(UpdateType::EditedChannelPost.to_string(), "edited_channel_post");
        assert!(validate_update_types(&["message", "callback_query"]).is_ok());
        assert_eq!(
            validate_update_types(&["message", "messages"]),
            Err(UnknownUpdateType("messages".to_string()))
        );
        assert_eq!(UpdateType::ALL.len(), 23);
    }
}
