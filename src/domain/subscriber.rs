use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A row of the `subscribers` table, as returned to the caller after an insert.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
