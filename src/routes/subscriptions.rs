use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::error_chain_fmt;
use crate::{
    domain::{
        new_subscriber::NewSubscriber,
        subscriber::Subscriber,
        subscriber_email::{SubscriberEmail, SubscriberEmailError},
    },
    email_client::EmailClientError,
};

// Postgres error code raised when the UNIQUE(email) constraint is hit
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Deserialize)]
pub struct SubscribeBody {
    pub email: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber: Option<Subscriber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubscribeResponse {
    pub fn created(subscriber: Subscriber) -> SubscribeResponse {
        SubscribeResponse {
            success: true,
            message: String::from("Subscription successful"),
            subscriber: Some(subscriber),
            error: None,
        }
    }

    fn failed(message: String, error: String) -> SubscribeResponse {
        SubscribeResponse {
            success: false,
            message,
            subscriber: None,
            error: Some(error),
        }
    }
}

impl TryFrom<SubscribeBody> for NewSubscriber {
    type Error = SubscribeError;

    fn try_from(body: SubscribeBody) -> Result<Self, Self::Error> {
        let email = SubscriberEmail::parse(body.email.unwrap_or_default())?;

        Ok(NewSubscriber::from_email(email))
    }
}

#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(body, db_pool),
    fields(
        subscriber_email = ?body.email
    )
)]
pub async fn handle_subscribe(
    body: web::Json<SubscribeBody>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, SubscribeError> {
    let new_subscriber: NewSubscriber = body.into_inner().try_into()?;
    let subscriber = insert_subscriber(&db_pool, &new_subscriber).await?;

    Ok(HttpResponse::Created().json(SubscribeResponse::created(subscriber)))
}

/// Inserts the subscriber and relies on the UNIQUE(email) constraint to reject
/// duplicates, so two concurrent submissions of the same address cannot both win.
#[tracing::instrument(
    name = "Insert a new subscriber into the database",
    skip(new_subscriber, db_pool)
)]
pub async fn insert_subscriber(
    db_pool: &PgPool,
    new_subscriber: &NewSubscriber,
) -> Result<Subscriber, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO subscribers (id, email, first_name, last_name, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, email, first_name, last_name, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new_subscriber.email.as_ref())
    .bind(new_subscriber.first_name.as_ref().map(|name| name.as_ref()))
    .bind(new_subscriber.last_name.as_ref().map(|name| name.as_ref()))
    .bind(Utc::now())
    .map(|row: PgRow| Subscriber {
        id: row.get("id"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        created_at: row.get("created_at"),
    })
    .fetch_one(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })
}

/// Used as the `JsonConfig` error handler so unparseable bodies get our JSON error shape.
pub fn malformed_body_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            SubscribeError::PayloadTooLarge(err).into()
        }
        err => SubscribeError::MalformedBody(err).into(),
    }
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Invalid email format")]
    InvalidEmail(#[source] SubscriberEmailError),
    #[error("Invalid JSON")]
    MalformedBody(#[source] JsonPayloadError),
    #[error("Payload too large")]
    PayloadTooLarge(#[source] JsonPayloadError),
    #[error("Duplicate email")]
    DuplicateEmail(#[source] sqlx::Error),
    #[error("Internal server error")]
    StoreError(#[source] sqlx::Error),
    #[error("Failed to notify")]
    NotifyError(#[source] reqwest::Error),
    #[error("Failed to send welcome email")]
    WelcomeEmailError(#[source] EmailClientError),
}

impl SubscribeError {
    /// Human readable text shown by the form.
    pub fn message(&self) -> String {
        match self {
            SubscribeError::MissingField(_) | SubscribeError::InvalidEmail(_) => self.to_string(),
            SubscribeError::MalformedBody(_) => String::from("Invalid request format"),
            SubscribeError::PayloadTooLarge(_) => String::from("The request body is too large"),
            SubscribeError::DuplicateEmail(_) => String::from("This email is already subscribed"),
            SubscribeError::StoreError(_) => String::from("An unexpected error occurred"),
            SubscribeError::NotifyError(_) => {
                String::from("Failed to notify about the new subscriber")
            }
            SubscribeError::WelcomeEmailError(_) => String::from("Failed to send the welcome email"),
        }
    }
}

impl From<SubscriberEmailError> for SubscribeError {
    fn from(err: SubscriberEmailError) -> Self {
        match err {
            SubscriberEmailError::Empty => SubscribeError::MissingField("Email"),
            invalid => SubscribeError::InvalidEmail(invalid),
        }
    }
}

impl From<sqlx::Error> for SubscribeError {
    fn from(err: sqlx::Error) -> Self {
        let is_unique_violation = match &err {
            sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
            _ => false,
        };

        if is_unique_violation {
            SubscribeError::DuplicateEmail(err)
        } else {
            SubscribeError::StoreError(err)
        }
    }
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::MissingField(_)
            | SubscribeError::InvalidEmail(_)
            | SubscribeError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            SubscribeError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            SubscribeError::DuplicateEmail(_) => StatusCode::CONFLICT,
            SubscribeError::StoreError(_)
            | SubscribeError::NotifyError(_)
            | SubscribeError::WelcomeEmailError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(SubscribeResponse::failed(self.message(), self.to_string()))
    }
}
