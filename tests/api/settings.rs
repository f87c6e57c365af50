use crate::helpers::spawn_app;
use chrono::NaiveTime;
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;
use vocab_reminder::models::NotificationSetting;

fn saved_setting(app: &crate::helpers::TestApp, user: Uuid) -> Option<NotificationSetting> {
    use vocab_reminder::schema::notification_settings::dsl::*;
    notification_settings
        .filter(user_id.eq(user))
        .first::<NotificationSetting>(&app.db_connection)
        .optional()
        .unwrap()
}

#[tokio::test]
async fn updating_the_notification_time_persists_the_setting() {
    // arrange
    let app = spawn_app().await;
    let user = Uuid::new_v4();

    // act
    let response = app
        .put_notification_time(&json!({
            "user_id": user,
            "notification_time": "08:30",
            "is_enabled": true,
        }))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let saved = saved_setting(&app, user).expect("No setting was saved.");
    assert_eq!(saved.notification_time, NaiveTime::from_hms(8, 30, 0));
    assert!(saved.is_enabled);
}

#[tokio::test]
async fn a_second_update_overwrites_the_first() {
    // arrange
    let app = spawn_app().await;
    let user = Uuid::new_v4();
    app.put_notification_time(&json!({
        "user_id": user,
        "notification_time": "08:30",
        "is_enabled": true,
    }))
    .await;

    // act
    let response = app
        .put_notification_time(&json!({
            "user_id": user,
            "notification_time": "21:15:45",
            "is_enabled": false,
        }))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let saved = saved_setting(&app, user).expect("No setting was saved.");
    // seconds are dropped: the scheduler works at minute granularity
    assert_eq!(saved.notification_time, NaiveTime::from_hms(21, 15, 0));
    assert!(!saved.is_enabled);
}

#[tokio::test]
async fn an_invalid_time_is_rejected_with_400() {
    // arrange
    let app = spawn_app().await;
    let user = Uuid::new_v4();
    let test_cases = vec![
        ("25:00", "hour out of range"),
        ("10:61", "minute out of range"),
        ("half past nine", "not a time"),
        ("", "empty string"),
    ];

    for (time, description) in test_cases {
        // act
        let response = app
            .put_notification_time(&json!({
                "user_id": user,
                "notification_time": time,
                "is_enabled": true,
            }))
            .await;

        // assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the time was {}.",
            description
        );
    }
    assert!(saved_setting(&app, user).is_none());
}

#[tokio::test]
async fn subscription_status_reports_counts_and_word_availability() {
    // arrange
    let app = spawn_app().await;
    let user = Uuid::new_v4();
    app.post_web_push(&json!({
        "user_id": user,
        "endpoint": "https://push.example.com/send/old",
        "p256dh_key": "p256dh",
        "auth_key": "auth",
    }))
    .await;
    app.post_web_push(&json!({
        "user_id": user,
        "endpoint": "https://push.example.com/send/new",
        "p256dh_key": "p256dh",
        "auth_key": "auth",
    }))
    .await;
    app.post_fcm(&json!({ "user_id": user, "token": "token-1" }))
        .await;
    app.seed_word(user, "apple", "りんご");

    // act
    let response = app.get_subscription_status(user).await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let status = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(status["webPushTotal"], 2);
    assert_eq!(status["webPushActive"], 1);
    assert_eq!(status["fcmTotal"], 1);
    assert_eq!(status["fcmActive"], 1);
    assert_eq!(status["hasWords"], true);
}

#[tokio::test]
async fn subscription_status_for_an_unknown_user_is_all_zeroes() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app.get_subscription_status(Uuid::new_v4()).await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let status = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(status["webPushTotal"], 0);
    assert_eq!(status["fcmActive"], 0);
    assert_eq!(status["hasWords"], false);
}
