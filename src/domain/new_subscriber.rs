use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;

/// A validated signup, ready to be inserted.
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub first_name: Option<SubscriberName>,
    pub last_name: Option<SubscriberName>,
}

impl NewSubscriber {
    pub fn from_email(email: SubscriberEmail) -> NewSubscriber {
        NewSubscriber {
            email,
            first_name: None,
            last_name: None,
        }
    }

    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first.as_ref(), last.as_ref())),
            (Some(name), None) | (None, Some(name)) => Some(name.as_ref().to_owned()),
            (None, None) => None,
        }
    }
}
