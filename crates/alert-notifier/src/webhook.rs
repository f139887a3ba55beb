//! Telegram webhook commands.
//!
//! The only command is `/id`, which replies with the id of the chat it was
//! sent from so operators can fill in `telegram_chat_id`.

use anyhow::{Context, Result};
use notify::TelegramChannel;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

/// Subset of a Telegram `Update` we care about.
#[derive(Debug, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub text: Option<String>,
    /// Kept raw so the reply can echo it back in full
    #[serde(default)]
    pub chat: Value,
}

/// Reply to send for an update, as `(chat_id, text)`.
pub fn reply_for(update: &Update) -> Option<(String, String)> {
    let message = update.message.as_ref()?;
    if message.text.as_deref() != Some("/id") {
        return None;
    }

    let chat_id = match message.chat.get("id")? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return None,
    };
    let text = format!("Hola, the chat id is {chat_id}\nFull data: {}", message.chat);
    Some((chat_id, text))
}

/// Handle one webhook payload, replying through the Bot API when needed.
pub async fn process_update(telegram: Option<&TelegramChannel>, payload: Value) -> Result<()> {
    let update: Update = serde_json::from_value(payload).context("Malformed Telegram update")?;

    let Some((chat_id, text)) = reply_for(&update) else {
        debug!("Ignoring Telegram update");
        return Ok(());
    };

    let telegram = telegram.context("Cannot answer /id: no Telegram token configured")?;
    info!(chat_id = %chat_id, "Answering /id command");
    telegram
        .send_message(&chat_id, &text, None)
        .await
        .context("Failed to answer /id command")?;
    Ok(())
}
