//! Telegram update handlers.
//!
//! Each text message is classified as a known command, an unknown command or
//! free text. Only the first and last reach the core dispatcher; unknown
//! commands get a short hint and are not recorded anywhere.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use dob_core::{
    domain::{ChatId, CommandKind, Interaction, Sender},
    replies::escape_html,
};

use crate::chunks::{split_html_chunks, SAFE_MESSAGE_LIMIT};
use crate::router::AppState;

/// Result of classifying one inbound text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classified {
    Dispatch(Interaction),
    UnknownCommand(String),
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        // Stickers, photos, voice: nothing to record.
        return Ok(());
    };

    let mut sender = Sender::new(user.id.0 as i64).with_display_name(user.first_name.clone());
    sender.username = user.username.clone();

    route_text(&state, ChatId(msg.chat.id.0), sender, text).await;
    Ok(())
}

/// Classify, dispatch and reply. Send failures are logged, never returned.
pub async fn route_text(state: &AppState, chat_id: ChatId, sender: Sender, text: &str) {
    let user_id = sender.user_id.0;
    let reply = match classify(text, sender) {
        Classified::Dispatch(interaction) => state.dispatcher.handle(&interaction).await,
        Classified::UnknownCommand(name) => unknown_command_reply(&name),
    };

    for chunk in split_html_chunks(&reply, SAFE_MESSAGE_LIMIT) {
        if let Err(e) = state.messenger.send_html(chat_id, &chunk).await {
            tracing::warn!(chat_id = chat_id.0, user_id, error = %e, "failed to send reply");
            break;
        }
    }
}

pub fn classify(text: &str, sender: Sender) -> Classified {
    if !text.starts_with('/') {
        return Classified::Dispatch(Interaction::free_text(sender, text));
    }

    let cmd = command_name(text);
    match CommandKind::from_name(&cmd) {
        Some(kind) => Classified::Dispatch(Interaction::command(kind, sender)),
        None => Classified::UnknownCommand(cmd),
    }
}

fn command_name(text: &str) -> String {
    // Telegram may send `/cmd@botname arg1 ...`
    text.trim()
        .split(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

fn unknown_command_reply(name: &str) -> String {
    format!(
        "Unknown command /{}. Use /help for the list of commands.",
        escape_html(name)
    )
}
