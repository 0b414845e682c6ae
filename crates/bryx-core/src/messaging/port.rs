use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{ReplyKeyboard, TextMode},
    Result,
};

/// Outbound side of the chat transport.
///
/// Telegram is the only implementation; the router and its tests only ever see
/// this trait.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<ReplyKeyboard>,
    ) -> Result<MessageRef>;

    async fn edit_text(&self, msg: MessageRef, text: &str, mode: TextMode) -> Result<()>;

    async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()>;
}
