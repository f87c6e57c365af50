use crate::helpers::{spawn_app, TestApp};
use chrono::{Duration, Timelike, Utc};
use serde_json::json;
use uuid::Uuid;

/// The current `HH:MM` in the reference zone. Sleeps past the minute
/// boundary first when it is close, so the minute cannot roll over between
/// arranging the setting and hitting the endpoint.
async fn current_minute(app: &TestApp) -> String {
    let mut now = Utc::now().with_timezone(&app.reference_offset);
    if now.second() >= 50 {
        tokio::time::sleep(std::time::Duration::from_secs(61 - u64::from(now.second()))).await;
        now = Utc::now().with_timezone(&app.reference_offset);
    }
    format!("{:02}:{:02}", now.hour(), now.minute())
}

async fn seed_reachable_user(app: &TestApp, time: &str, enabled: bool) -> Uuid {
    let user = Uuid::new_v4();
    app.seed_word(user, "apple", "りんご");
    app.post_fcm(&json!({ "user_id": user, "token": format!("token-{}", user) }))
        .await;
    app.put_notification_time(&json!({
        "user_id": user,
        "notification_time": time,
        "is_enabled": enabled,
    }))
    .await;
    user
}

#[tokio::test]
async fn a_user_due_this_minute_is_notified() {
    // arrange
    let app = spawn_app().await;
    let minute = current_minute(&app).await;
    seed_reachable_user(&app, &minute, true).await;

    // act
    let response = app.post_schedule().await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let report = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(report["targetTime"], minute.as_str());
    assert_eq!(report["usersFound"], 1);
    assert_eq!(report["result"]["successCount"], 1);
    assert_eq!(app.push.delivery_count(), 1);
}

#[tokio::test]
async fn a_user_due_at_a_different_time_is_not_notified() {
    // arrange
    let app = spawn_app().await;
    let later = Utc::now().with_timezone(&app.reference_offset) + Duration::hours(3);
    let time = format!("{:02}:{:02}", later.hour(), later.minute());
    seed_reachable_user(&app, &time, true).await;

    // act
    let response = app.post_schedule().await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let report = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(report["usersFound"], 0);
    assert!(report.get("result").is_none());
    assert_eq!(app.push.delivery_count(), 0);
}

#[tokio::test]
async fn a_second_run_in_the_same_minute_does_not_double_notify() {
    // arrange
    let app = spawn_app().await;
    let minute = current_minute(&app).await;
    seed_reachable_user(&app, &minute, true).await;

    // act
    let first = app.post_schedule().await;
    let second = app.post_schedule().await;

    // assert
    let first = first.json::<serde_json::Value>().await.unwrap();
    assert_eq!(first["result"]["successCount"], 1);

    let second = second.json::<serde_json::Value>().await.unwrap();
    assert!(second.get("result").is_none());
    assert_eq!(app.push.delivery_count(), 1);
}

#[tokio::test]
async fn a_disabled_setting_is_never_due() {
    // arrange
    let app = spawn_app().await;
    let minute = current_minute(&app).await;
    seed_reachable_user(&app, &minute, false).await;

    // act
    let response = app.post_schedule().await;

    // assert
    let report = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(report["usersFound"], 0);
    assert_eq!(app.push.delivery_count(), 0);
}

#[tokio::test]
async fn the_schedule_endpoint_requires_operator_credentials() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app.post_schedule_without_auth().await;

    // assert
    assert_eq!(401, response.status().as_u16());
    assert_eq!(
        r#"Basic realm="notifications""#,
        response.headers()["WWW-Authenticate"]
    );
}
