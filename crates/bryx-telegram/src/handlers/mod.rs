//! Telegram update handlers.
//!
//! Each handler is a thin adapter that:
//! - drops updates without the fields the core needs
//! - converts teloxide types into `bryx-core` messaging types
//! - hands the update to the core router
//!
//! Handlers always return `Ok`: the router has already turned every failure
//! into a reply, and the dispatcher must keep polling.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message, User},
};

use bryx_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::types::{self, CallbackMessage, IncomingUpdate, Sender, TextMessage},
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(update) = text_update(&msg) {
        state.router.handle(update).await;
    }
    Ok(())
}

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    state.router.handle(callback_update(&q)).await;
    Ok(())
}

fn sender(user: &User) -> Sender {
    Sender {
        id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()).filter(|s| !s.is_empty()),
        last_name: user.last_name.clone(),
    }
}

/// `None` for non-text messages and messages without a sender.
fn text_update(msg: &Message) -> Option<IncomingUpdate> {
    let text = msg.text()?;
    let user = msg.from()?;
    Some(IncomingUpdate::Text(TextMessage {
        chat_id: ChatId(msg.chat.id.0),
        sender: sender(user),
        text: text.to_string(),
    }))
}

fn callback_update(q: &CallbackQuery) -> IncomingUpdate {
    let message = q.message.as_ref().map(|m| CallbackMessage {
        msg: MessageRef {
            chat_id: ChatId(m.chat.id.0),
            message_id: MessageId(m.id.0),
        },
        text: m.text().map(str::to_string),
    });

    IncomingUpdate::Callback(types::CallbackQuery {
        callback_id: q.id.clone(),
        sender: sender(&q.from),
        data: q.data.clone(),
        message,
    })
}
