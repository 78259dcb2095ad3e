use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    AllowedUpdate, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton,
    KeyboardMarkup, ParseMode, ReplyMarkup, UpdateKind, WebAppInfo,
};
use teloxide::RequestError;
use tracing::debug;
use url::Url;

use super::{ChatId, InboundUpdate, IncomingMessage, Markup, Transport, TransportError};

impl From<RequestError> for TransportError {
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::Network(e) => TransportError::Network(e.to_string()),
            RequestError::InvalidJson { source, .. } => {
                TransportError::InvalidResponse(source.to_string())
            }
            other => TransportError::Api(other.to_string()),
        }
    }
}

/// Bot API transport backed by a teloxide `Bot`.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// The HTTP client has to outlive a `getUpdates` long poll of
    /// `poll_timeout_secs`, so its timeout is set past it.
    pub fn new(token: &str, poll_timeout_secs: u32) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(request_timeout(poll_timeout_secs))
            .build()
            .context("Failed to build Telegram HTTP client")?;
        Ok(Self {
            bot: Bot::with_client(token, client),
        })
    }

    #[cfg(test)]
    fn with_api_url(mut self, url: Url) -> Self {
        self.bot = self.bot.set_api_url(url);
        self
    }
}

fn request_timeout(poll_timeout_secs: u32) -> Duration {
    Duration::from_secs(u64::from(poll_timeout_secs) + 10)
}

fn parse_url(raw: &str) -> Result<Url, TransportError> {
    Url::parse(raw).map_err(|_| TransportError::InvalidUrl(raw.to_string()))
}

fn reply_markup(markup: &Markup) -> Result<ReplyMarkup, TransportError> {
    match markup {
        Markup::Keyboard(rows) => {
            let rows: Vec<Vec<KeyboardButton>> = rows
                .iter()
                .map(|row| row.iter().map(|label| KeyboardButton::new(*label)).collect())
                .collect();
            Ok(ReplyMarkup::Keyboard(
                KeyboardMarkup::new(rows).resize_keyboard(),
            ))
        }
        Markup::WebApp { text, url } => {
            let info = WebAppInfo {
                url: parse_url(url)?,
            };
            Ok(ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(vec![
                vec![InlineKeyboardButton::web_app(text.clone(), info)],
            ])))
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn get_updates(
        &self,
        offset: i32,
        timeout_secs: u32,
    ) -> Result<Vec<InboundUpdate>, TransportError> {
        let updates = self
            .bot
            .get_updates()
            .offset(offset)
            .timeout(timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message])
            .await?;

        Ok(updates
            .into_iter()
            .map(|update| {
                let message = match update.kind {
                    UpdateKind::Message(msg) => msg.text().map(|text| IncomingMessage {
                        chat_id: msg.chat.id,
                        text: text.to_string(),
                    }),
                    _ => None,
                };
                InboundUpdate {
                    update_id: update.id.0,
                    message,
                }
            })
            .collect())
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<(), TransportError> {
        let mut request = self
            .bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup {
            request = request.reply_markup(reply_markup(markup)?);
        }
        request.await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo_url: &str,
        caption: &str,
        markup: Option<&Markup>,
    ) -> Result<(), TransportError> {
        let photo = InputFile::url(parse_url(photo_url)?);
        let mut request = self
            .bot
            .send_photo(chat_id, photo)
            .caption(caption)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup {
            request = request.reply_markup(reply_markup(markup)?);
        }
        request.await?;
        Ok(())
    }

    async fn delete_webhook(&self) -> Result<(), TransportError> {
        self.bot.delete_webhook().await?;
        debug!("Webhook deleted");
        Ok(())
    }
}
