use serde_json::json;
use sqlx::{postgres::PgRow, Row};
use wiremock::matchers::{any, method, path_regex};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::TestApp;

fn valid_body() -> serde_json::Value {
    json!({
        "firstName": "Jimin",
        "lastName": "Park",
        "email": "jimin@example.com"
    })
}

async fn mount_telegram(test_app: &TestApp, status: u16, expected_calls: u64) {
    Mock::given(path_regex(r"^/bot.+/sendMessage$"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected_calls)
        .mount(&test_app.telegram_server)
        .await;
}

#[tokio::test]
async fn early_access_returns_201_when_fan_out_succeeds() {
    let test_app = TestApp::spawn_app().await;
    mount_telegram(&test_app, 200, 1).await;

    let response = test_app.post_early_access(valid_body()).await;

    assert_eq!(201, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["subscriber"]["firstName"], "Jimin");
    assert_eq!(body["subscriber"]["lastName"], "Park");
}

#[tokio::test]
async fn early_access_persists_the_names() {
    let test_app = TestApp::spawn_app().await;
    mount_telegram(&test_app, 200, 1).await;

    test_app.post_early_access(valid_body()).await;

    let (email, first_name, last_name): (String, Option<String>, Option<String>) =
        sqlx::query("SELECT email, first_name, last_name FROM subscribers;")
            .map(|row: PgRow| {
                (
                    row.get("email"),
                    row.get("first_name"),
                    row.get("last_name"),
                )
            })
            .fetch_one(&test_app.db_pool)
            .await
            .expect("Query to fetch subscribers failed.");

    assert_eq!(email, "jimin@example.com");
    assert_eq!(first_name.as_deref(), Some("Jimin"));
    assert_eq!(last_name.as_deref(), Some("Park"));
}

#[tokio::test]
async fn early_access_notifies_the_chat_with_the_email() {
    let test_app = TestApp::spawn_app().await;
    mount_telegram(&test_app, 200, 1).await;

    test_app.post_early_access(valid_body()).await;

    let received_requests = test_app.telegram_server.received_requests().await.unwrap();
    let message: serde_json::Value = serde_json::from_slice(&received_requests[0].body).unwrap();

    assert_eq!(
        message["text"],
        "New email submission: jimin@example.com (Jimin Park)"
    );
    assert_eq!(message["chat_id"], test_app.config.telegram.chat_id.as_str());
}

#[tokio::test]
async fn early_access_sends_a_welcome_email_to_the_subscriber() {
    let test_app = TestApp::spawn_app().await;
    mount_telegram(&test_app, 200, 1).await;

    test_app.post_early_access(valid_body()).await;

    let messages = test_app.smtp_server.received_messages();

    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("jimin@example.com"));
    assert!(messages[0].contains("Welcome to HanJaemi early access"));
}

#[tokio::test]
async fn early_access_returns_400_when_a_field_is_missing() {
    let test_app = TestApp::spawn_app().await;
    mount_telegram(&test_app, 200, 0).await;

    let test_cases = vec![
        (
            json!({ "lastName": "Park", "email": "jimin@example.com" }),
            "First name is required",
        ),
        (
            json!({ "firstName": "Jimin", "lastName": "", "email": "jimin@example.com" }),
            "Last name is required",
        ),
        (
            json!({ "firstName": "Jimin", "lastName": "Park" }),
            "Email is required",
        ),
        (
            json!({ "firstName": "Jimin", "lastName": "Park", "email": "jimin" }),
            "Invalid email format",
        ),
    ];

    for (invalid_body, expected_error) in test_cases {
        let response = test_app.post_early_access(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status for {}",
            expected_error
        );

        let body: serde_json::Value = response.json().await.unwrap();

        assert_eq!(body["error"], expected_error);
    }

    assert_eq!(test_app.count_subscribers().await, 0);
    assert!(test_app.smtp_server.received_messages().is_empty());
}

#[tokio::test]
async fn early_access_returns_409_without_fan_out_for_duplicates() {
    let test_app = TestApp::spawn_app().await;
    mount_telegram(&test_app, 200, 1).await;

    let first_response = test_app.post_early_access(valid_body()).await;
    let second_response = test_app.post_early_access(valid_body()).await;

    assert_eq!(201, first_response.status().as_u16());
    assert_eq!(409, second_response.status().as_u16());
    assert_eq!(test_app.count_subscribers().await, 1);
    assert_eq!(test_app.smtp_server.received_messages().len(), 1);
}

#[tokio::test]
async fn early_access_returns_500_but_keeps_the_subscriber_when_notification_fails() {
    let test_app = TestApp::spawn_app().await;
    mount_telegram(&test_app, 500, 1).await;

    let response = test_app.post_early_access(valid_body()).await;

    assert_eq!(500, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to notify");

    // No rollback: the row written before the fan-out stays
    assert_eq!(test_app.count_subscribers().await, 1);
    // The welcome email is only attempted after a successful notification
    assert!(test_app.smtp_server.received_messages().is_empty());
}

#[tokio::test]
async fn early_access_returns_500_but_keeps_the_subscriber_when_email_fails() {
    let test_app = TestApp::spawn_app_with_unreachable_smtp().await;
    mount_telegram(&test_app, 200, 1).await;

    let response = test_app.post_early_access(valid_body()).await;

    assert_eq!(500, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(body["error"], "Failed to send welcome email");
    assert_eq!(test_app.count_subscribers().await, 1);

    // A retry is a duplicate, not a second chance at the fan-out
    let retry = test_app.post_early_access(valid_body()).await;

    assert_eq!(409, retry.status().as_u16());
}

#[tokio::test]
async fn early_access_returns_500_when_the_email_is_not_a_deliverable_mailbox() {
    let test_app = TestApp::spawn_app().await;
    mount_telegram(&test_app, 200, 1).await;

    let response = test_app
        .post_early_access(json!({
            "firstName": "Jimin",
            "lastName": "Park",
            "email": "x@@y.z"
        }))
        .await;

    assert_eq!(500, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(body["error"], "Failed to send welcome email");
    assert_eq!(test_app.count_subscribers().await, 1);
    assert!(test_app.smtp_server.received_messages().is_empty());
}

#[tokio::test]
async fn early_access_returns_405_for_other_methods() {
    let test_app = TestApp::spawn_app().await;
    mount_telegram(&test_app, 200, 0).await;

    let response = test_app.get("/api/early-access").await;

    assert_eq!(405, response.status().as_u16());
}

#[tokio::test]
async fn early_access_rejects_malformed_json_without_notifying() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.telegram_server)
        .await;

    let response = test_app.post_raw("/api/early-access", "{not json}").await;

    assert_eq!(400, response.status().as_u16());
}
