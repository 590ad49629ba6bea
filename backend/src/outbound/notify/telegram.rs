//! Telegram Bot API notifier.
//!
//! Sends a `sendMessage` call to the buyer's chat with an inline button that
//! deep-links back into the mini app on the unlocked item.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::ports::{PurchaseNotice, PurchaseNotifier, PurchaseNotifierError};

/// Default Bot API base.
pub const DEFAULT_BOT_API_BASE_URL: &str = "https://api.telegram.org";

const CONFIRMATION_TEXT: &str =
    "✅ Payment confirmed! Your ticket has been unlocked. Tap to view the booking code.";
const BUTTON_TEXT: &str = "View Ticket";

/// Notifier posting purchase confirmations through a Telegram bot.
pub struct TelegramNotifier {
    client: Client,
    api_base: Url,
    bot_token: Zeroizing<String>,
    deep_link_base: Url,
}

impl TelegramNotifier {
    /// Build a notifier with a per-request timeout.
    ///
    /// `deep_link_base` is the mini app link, for example
    /// `https://t.me/example_bot/app`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        api_base: Url,
        bot_token: Zeroizing<String>,
        deep_link_base: Url,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base,
            bot_token,
            deep_link_base,
        })
    }

    fn send_message_url(&self) -> Result<Url, PurchaseNotifierError> {
        let method_segment = format!("bot{}", self.bot_token.as_str());
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| PurchaseNotifierError::delivery("invalid bot API base URL"))?
            .pop_if_empty()
            .extend([method_segment.as_str(), "sendMessage"]);
        Ok(url)
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    reply_markup: InlineKeyboard,
}

#[derive(Debug, Serialize)]
struct InlineKeyboard {
    inline_keyboard: Vec<Vec<InlineButton>>,
}

#[derive(Debug, Serialize)]
struct InlineButton {
    text: &'static str,
    url: String,
}

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

fn item_deep_link(base: &Url, notice: &PurchaseNotice) -> Url {
    let mut link = base.clone();
    link.query_pairs_mut()
        .clear()
        .append_pair("startapp", &format!("item_{}", notice.item_id));
    link
}

fn build_request<'a>(notice: &'a PurchaseNotice, deep_link_base: &Url) -> SendMessageRequest<'a> {
    SendMessageRequest {
        chat_id: notice.recipient.as_ref(),
        text: CONFIRMATION_TEXT,
        reply_markup: InlineKeyboard {
            inline_keyboard: vec![vec![InlineButton {
                text: BUTTON_TEXT,
                url: item_deep_link(deep_link_base, notice).to_string(),
            }]],
        },
    }
}

fn parse_bot_response(body: &[u8]) -> Result<(), PurchaseNotifierError> {
    let decoded: BotApiResponse = serde_json::from_slice(body).map_err(|error| {
        PurchaseNotifierError::delivery(format!("invalid Bot API response: {error}"))
    })?;
    if decoded.ok {
        Ok(())
    } else {
        Err(PurchaseNotifierError::delivery(
            decoded
                .description
                .unwrap_or_else(|| "Bot API rejected the message".to_owned()),
        ))
    }
}

#[async_trait]
impl PurchaseNotifier for TelegramNotifier {
    async fn purchase_completed(
        &self,
        notice: &PurchaseNotice,
    ) -> Result<(), PurchaseNotifierError> {
        let url = self.send_message_url()?;
        let payload = build_request(notice, &self.deep_link_base);
        // reqwest errors echo the request URL, which embeds the bot token.
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|error| PurchaseNotifierError::delivery(error.without_url().to_string()))?;
        let body = response
            .bytes()
            .await
            .map_err(|error| PurchaseNotifierError::delivery(error.without_url().to_string()))?;
        parse_bot_response(body.as_ref())
    }
}
