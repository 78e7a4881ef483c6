//! Bot API wire types.
//!
//! Only the fields newsbot reads or writes are modelled.

use serde::{Deserialize, Serialize};

/// Envelope of every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Payload on success.
    pub result: Option<T>,
    /// Human-readable error.
    #[serde(default)]
    pub description: Option<String>,
    /// Error code, mirrors the HTTP status.
    #[serde(default)]
    pub error_code: Option<u16>,
    /// Extra error information.
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

/// Extra information attached to some errors.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before retrying after a flood limit.
    #[serde(default)]
    pub retry_after: Option<u64>,
}

/// An incoming update from getUpdates.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update id.
    pub update_id: i64,
    /// New incoming message, if this update is one.
    #[serde(default)]
    pub message: Option<Message>,
}

/// A chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message id within the chat.
    pub message_id: i64,
    /// Chat the message belongs to.
    pub chat: Chat,
    /// Sender.
    #[serde(default)]
    pub from: Option<TelegramUser>,
    /// Text for text messages.
    #[serde(default)]
    pub text: Option<String>,
}

/// A chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Chat id.
    pub id: i64,
}

/// A Telegram account.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    /// Account id.
    pub id: i64,
    /// First name.
    #[serde(default)]
    pub first_name: String,
}

/// A text message from a user, as handed to the bot handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Chat to reply to. Equal to the user's id in private chats.
    pub chat_id: i64,
    /// Sender's first name.
    pub first_name: String,
    /// Message text.
    pub text: String,
}

impl Update {
    /// Extract a text message, if this update carries one.
    pub fn into_incoming(self) -> Option<IncomingMessage> {
        let message = self.message?;
        let text = message.text?;
        Some(IncomingMessage {
            chat_id: message.chat.id,
            first_name: message.from.map(|u| u.first_name).unwrap_or_default(),
            text,
        })
    }
}

/// Reply keyboard shown under the input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardMarkup {
    /// Rows of buttons.
    pub keyboard: Vec<Vec<KeyboardButton>>,
    /// Let clients shrink the keyboard to fit.
    pub resize_keyboard: bool,
}

impl ReplyKeyboardMarkup {
    /// Build a keyboard from rows of labels.
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Self {
            keyboard: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|label| KeyboardButton {
                            text: label.to_string(),
                        })
                        .collect()
                })
                .collect(),
            resize_keyboard: true,
        }
    }
}

/// A reply keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    /// Label, sent back as message text when pressed.
    pub text: String,
}

/// Body of a sendMessage call.
#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    pub disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a ReplyKeyboardMarkup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_updates() {
        let json = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"message_id": 1, "chat": {"id": 42, "type": "private"},
                  "from": {"id": 42, "is_bot": false, "first_name": "Ann"}, "text": "/start"}},
                {"update_id": 11, "edited_message": {"message_id": 1}}
            ]
        }"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(response.ok);
        let updates = response.result.unwrap();
        assert_eq!(updates.len(), 2);

        let incoming = updates[0].clone().into_incoming().unwrap();
        assert_eq!(incoming.chat_id, 42);
        assert_eq!(incoming.first_name, "Ann");
        assert_eq!(incoming.text, "/start");
        assert!(updates[1].clone().into_incoming().is_none());
    }

    #[test]
    fn test_deserialize_error() {
        let json = r#"{"ok": false, "error_code": 429, "description": "Too Many Requests",
                       "parameters": {"retry_after": 7}}"#;
        let response: ApiResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(!response.ok);
        assert_eq!(response.error_code, Some(429));
        assert_eq!(response.parameters.unwrap().retry_after, Some(7));
    }

    #[test]
    fn test_keyboard_serialization() {
        let keyboard = ReplyKeyboardMarkup::from_rows(&[&["A", "B"], &["C"]]);
        let json = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "keyboard": [[{"text": "A"}, {"text": "B"}], [{"text": "C"}]],
                "resize_keyboard": true
            })
        );
    }
}
