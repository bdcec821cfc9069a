use once_cell::sync::Lazy;
use regex::Regex;

// Anything without whitespace shaped like `local@domain.tld`
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("Invalid email pattern"));

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SubscriberEmailError {
    #[error("An email must not be empty")]
    Empty,
    #[error("{0} email is not valid")]
    Invalid(String),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<SubscriberEmail, SubscriberEmailError> {
        let email = email.trim();

        if email.is_empty() {
            return Err(SubscriberEmailError::Empty);
        }

        if !EMAIL_PATTERN.is_match(email) {
            return Err(SubscriberEmailError::Invalid(email.to_owned()));
        }

        Ok(Self(email.to_owned()))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
