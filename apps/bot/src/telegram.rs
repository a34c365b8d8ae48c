use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::{
    Bot,
    prelude::Requester,
    types::{ChatId, InputFile},
};
use tracing::debug;

use crate::update::Sender;

/// Telegram delivery to one fixed chat.
pub struct TelegramSender {
    bot: Bot,
    chat: ChatId,
}

impl TelegramSender {
    pub fn new(token: &str, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(token),
            chat: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl Sender for TelegramSender {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.bot.send_message(self.chat, text).await?;
        debug!(chars = text.len(), "message sent");
        Ok(())
    }

    async fn send_image(&self, path: &Path) -> Result<()> {
        self.bot
            .send_photo(self.chat, InputFile::file(path.to_path_buf()))
            .await?;
        debug!(path = %path.display(), "photo sent");
        Ok(())
    }
}
