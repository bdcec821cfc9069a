use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use super::subscriptions::{insert_subscriber, SubscribeError, SubscribeResponse};
use crate::{
    domain::{
        new_subscriber::NewSubscriber, subscriber_email::SubscriberEmail,
        subscriber_name::SubscriberName,
    },
    email_client::{EmailClient, EmailClientError},
    telegram_client::TelegramClient,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarlyAccessBody {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl TryFrom<EarlyAccessBody> for NewSubscriber {
    type Error = SubscribeError;

    fn try_from(body: EarlyAccessBody) -> Result<Self, Self::Error> {
        let first_name = SubscriberName::parse(body.first_name.unwrap_or_default())
            .map_err(|_| SubscribeError::MissingField("First name"))?;
        let last_name = SubscriberName::parse(body.last_name.unwrap_or_default())
            .map_err(|_| SubscribeError::MissingField("Last name"))?;
        let email = SubscriberEmail::parse(body.email.unwrap_or_default())?;

        Ok(NewSubscriber {
            email,
            first_name: Some(first_name),
            last_name: Some(last_name),
        })
    }
}

/// Stores the signup and then fans out to the chat relay and the welcome email.
///
/// A failure in the fan-out is reported to the caller but the subscriber row
/// is kept: there is no rollback once the insert has succeeded.
#[tracing::instrument(
    name = "Adding a new early access signup",
    skip(body, db_pool, telegram_client, email_client),
    fields(
        subscriber_email = ?body.email
    )
)]
pub async fn handle_early_access(
    body: web::Json<EarlyAccessBody>,
    db_pool: web::Data<PgPool>,
    telegram_client: web::Data<TelegramClient>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, SubscribeError> {
    let new_subscriber: NewSubscriber = body.into_inner().try_into()?;
    let subscriber = insert_subscriber(&db_pool, &new_subscriber).await?;

    if let Err(err) = telegram_client
        .send_message(&signup_notification(&new_subscriber))
        .await
    {
        tracing::error!(
            "Failed to notify the signup of {}: {:?}",
            new_subscriber.email,
            err
        );
        return Err(SubscribeError::NotifyError(err));
    }

    if let Err(err) = send_welcome_email(&email_client, &new_subscriber).await {
        if let EmailClientError::InvalidAddress(cause) = &err {
            tracing::warn!(
                "{} passed validation but is not a valid mailbox: {}",
                new_subscriber.email,
                cause
            );
        }
        tracing::error!(
            "Failed to send a welcome email to {}: {:?}",
            new_subscriber.email,
            err
        );
        return Err(SubscribeError::WelcomeEmailError(err));
    }

    Ok(HttpResponse::Created().json(SubscribeResponse::created(subscriber)))
}

pub fn signup_notification(new_subscriber: &NewSubscriber) -> String {
    match new_subscriber.full_name() {
        Some(name) => format!("New email submission: {} ({})", new_subscriber.email, name),
        None => format!("New email submission: {}", new_subscriber.email),
    }
}

/// Addresses such as `x@@y.z` are accepted by `SubscriberEmail::parse` but not by
/// the SMTP mailbox parser, so they fail here with `EmailClientError::InvalidAddress`.
#[tracing::instrument(
    name = "Send a welcome email to a new subscriber",
    skip(email_client, new_subscriber)
)]
async fn send_welcome_email(
    email_client: &EmailClient,
    new_subscriber: &NewSubscriber,
) -> Result<(), EmailClientError> {
    let greeting = new_subscriber
        .first_name
        .as_ref()
        .map(|name| format!("Hi {},", name.as_ref()))
        .unwrap_or_else(|| String::from("Hi,"));
    let html_body = format!(
        r#"
            <div>
                <h1>Welcome to HanJaemi!</h1>
                <p>{}</p>
                <p>You are on the early access list. We will write to you as soon as we launch.</p>
            </div>
        "#,
        greeting
    );

    email_client
        .send_email(
            &new_subscriber.email,
            "Welcome to HanJaemi early access",
            html_body.as_str(),
        )
        .await
}
