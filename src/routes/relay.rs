use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::Deserialize;

use super::{early_access::signup_notification, error_chain_fmt};
use crate::{
    domain::{
        new_subscriber::NewSubscriber,
        subscriber_email::{SubscriberEmail, SubscriberEmailError},
    },
    telegram_client::TelegramClient,
};

#[derive(Deserialize)]
pub struct RelayBody {
    pub email: Option<String>,
}

/// Forwards an email submission to the chat relay without storing it.
#[tracing::instrument(
    name = "Relaying an email submission to Telegram",
    skip(body, telegram_client),
    fields(
        subscriber_email = ?body.email
    )
)]
pub async fn handle_send_telegram(
    body: web::Json<RelayBody>,
    telegram_client: web::Data<TelegramClient>,
) -> Result<HttpResponse, RelayError> {
    let email = SubscriberEmail::parse(body.into_inner().email.unwrap_or_default())?;

    telegram_client
        .send_message(&signup_notification(&NewSubscriber::from_email(email)))
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Message sent to Telegram" })))
}

/// `JsonConfig` error handler of the relay resource, which answers with its own error shape.
pub fn malformed_relay_body_handler(
    err: JsonPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    RelayError::MalformedBody(err).into()
}

#[derive(thiserror::Error)]
pub enum RelayError {
    #[error("Valid email is required")]
    InvalidEmail(#[from] SubscriberEmailError),
    #[error("Invalid JSON")]
    MalformedBody(#[source] JsonPayloadError),
    #[error("Failed to send message to Telegram")]
    SendError(#[from] reqwest::Error),
}

impl std::fmt::Debug for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidEmail(_) | RelayError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            RelayError::SendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            RelayError::InvalidEmail(_) | RelayError::MalformedBody(_) => {
                serde_json::json!({ "error": self.to_string() })
            }
            RelayError::SendError(err) => serde_json::json!({
                "error": self.to_string(),
                "details": err.to_string(),
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
