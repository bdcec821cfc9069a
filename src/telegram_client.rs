use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// Posts messages to a chat through the Telegram Bot API.
pub struct TelegramClient {
    http_client: Client,
    base_url: String,
    bot_token: Secret<String>,
    chat_id: String,
}

#[derive(serde::Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramClient {
    pub fn new(
        base_url: String,
        bot_token: Secret<String>,
        chat_id: String,
        timeout: Option<time::Duration>,
    ) -> Result<TelegramClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(TelegramClient {
            http_client,
            base_url,
            bot_token,
            chat_id,
        })
    }

    #[tracing::instrument(name = "Send a message to the Telegram chat", skip(self))]
    pub async fn send_message(&self, text: &str) -> Result<(), reqwest::Error> {
        // The token is part of the path, so the url must never be logged
        let url = format!(
            "{}/bot{}/sendMessage",
            self.base_url,
            self.bot_token.expose_secret()
        );
        let body = SendMessageBody {
            chat_id: &self.chat_id,
            text,
        };

        self.http_client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?; // return an error when server response status code is 4xx or 5xx

        Ok(())
    }
}
