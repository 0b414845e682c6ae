use crate::domain::{ChatId, MessageRef, UserId};

/// Cross-messenger incoming update model.
///
/// Telegram-specific fields live in the Telegram adapter.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Text(TextMessage),
    Callback(CallbackQuery),
}

/// Who sent an update.
#[derive(Clone, Debug, Default)]
pub struct Sender {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Sender {
    /// Username for log lines.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("no_username")
    }
}

#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub sender: Sender,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub callback_id: String,
    pub sender: Sender,
    pub data: Option<String>,
    pub message: Option<CallbackMessage>,
}

/// The message a callback button was attached to.
#[derive(Clone, Debug)]
pub struct CallbackMessage {
    pub msg: MessageRef,
    pub text: Option<String>,
}

/// How an edited/sent text should be parsed by the messenger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextMode {
    Plain,
    Html,
}

/// Quick-reply keyboard shown under the input field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    pub resize: bool,
}

impl ReplyKeyboard {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            resize: false,
        }
    }

    pub fn resized(mut self) -> Self {
        self.resize = true;
        self
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(String::as_str)
    }
}
