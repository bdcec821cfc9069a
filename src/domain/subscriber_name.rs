#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SubscriberNameError {
    #[error("A name must not be empty")]
    Empty,
}

/// Free text name given on the early access form. Only emptiness is checked.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SubscriberName(String);

impl SubscriberName {
    pub fn parse(name: String) -> Result<SubscriberName, SubscriberNameError> {
        let name = name.trim();

        if name.is_empty() {
            return Err(SubscriberNameError::Empty);
        }

        Ok(Self(name.to_owned()))
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
