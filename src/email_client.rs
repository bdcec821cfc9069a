use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;

use crate::config::EmailClientSettings;
use crate::domain::subscriber_email::SubscriberEmail;

#[derive(thiserror::Error, Debug)]
pub enum EmailClientError {
    #[error("The email address cannot be used as a mailbox.")]
    InvalidAddress(#[from] lettre::address::AddressError),
    #[error("Failed to build the email message.")]
    InvalidMessage(#[from] lettre::error::Error),
    #[error("The SMTP relay did not accept the email.")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Sends transactional emails through an SMTP relay.
pub struct EmailClient {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl EmailClient {
    pub fn new(settings: &EmailClientSettings) -> Result<EmailClient, EmailClientError> {
        let sender: Mailbox = settings.sender_email.parse()?;

        // Local relays (MailHog and friends) speak plain SMTP
        let builder = if settings.require_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };
        let mut builder = builder.port(settings.port);

        if !settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.expose_secret().clone(),
            ));
        }

        Ok(EmailClient {
            mailer: builder.build(),
            sender,
        })
    }

    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> Result<(), EmailClientError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient.as_ref().parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(String::from(html_content))?;

        self.mailer.send(message).await?;

        Ok(())
    }
}
