use chrono::{FixedOffset, Utc};
use diesel::prelude::*;
use diesel::{Connection, PgConnection};
use once_cell::sync::Lazy;
use secrecy::ExposeSecret;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use vocab_reminder::configuration::{get_configuration, Settings};
use vocab_reminder::models::{FcmToken, NewVocabularyWord, PushSubscription};
use vocab_reminder::push::{DeliveryOutcome, PushClient, PushClients, WordReminder};
use vocab_reminder::store::DeliveryTarget;
use vocab_reminder::telemetry::{get_subscriber, init_subscriber};

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".into();
    let subscriber_name = "test".into();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

/// Stands in for both push services. Records every delivery and answers
/// `Delivered`, or `Gone` for targets marked dead up front.
#[derive(Clone, Default)]
pub struct RecordingPushClient {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    deliveries: Mutex<Vec<(String, String)>>,
    gone: Mutex<HashSet<String>>,
}

impl RecordingPushClient {
    pub fn mark_gone(&self, key: &str) {
        self.inner.gone.lock().unwrap().insert(key.to_string());
    }

    /// `(endpoint-or-token, notification body)` per delivery, in order.
    pub fn deliveries(&self) -> Vec<(String, String)> {
        self.inner.deliveries.lock().unwrap().clone()
    }

    pub fn delivery_count(&self) -> usize {
        self.inner.deliveries.lock().unwrap().len()
    }

    fn clients(&self) -> PushClients {
        PushClients {
            web_push: Box::new(self.clone()),
            fcm: Box::new(self.clone()),
        }
    }
}

fn target_key(target: &DeliveryTarget) -> String {
    match target {
        DeliveryTarget::WebPush { endpoint, .. } => endpoint.clone(),
        DeliveryTarget::Fcm { token } => token.clone(),
    }
}

#[async_trait::async_trait]
impl PushClient for RecordingPushClient {
    async fn deliver(
        &self,
        target: &DeliveryTarget,
        reminder: &WordReminder,
    ) -> anyhow::Result<DeliveryOutcome> {
        let key = target_key(target);
        self.inner
            .deliveries
            .lock()
            .unwrap()
            .push((key.clone(), reminder.body()));
        if self.inner.gone.lock().unwrap().contains(&key) {
            Ok(DeliveryOutcome::Gone)
        } else {
            Ok(DeliveryOutcome::Delivered)
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub db_connection: PgConnection,
    pub push: RecordingPushClient,
    pub api_client: reqwest::Client,
    pub reference_offset: FixedOffset,
    operator_username: String,
    operator_password: String,
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = None;
        c.database.database_name = Uuid::new_v4().to_string();
        c
    };

    let db_connection = setup_database(&configuration);

    let push = RecordingPushClient::default();
    let app = vocab_reminder::startup::build(&configuration, push.clients())
        .await
        .unwrap();
    let mut port = app.port;
    let _ = tokio::spawn(app.server.launch());

    TestApp {
        address: format!("http://127.0.0.1:{}", port.get().await),
        db_connection,
        push,
        api_client: reqwest::Client::new(),
        reference_offset: configuration.schedule.reference_offset().unwrap(),
        operator_username: configuration.operator.username.clone(),
        operator_password: configuration.operator.password.expose_secret().clone(),
    }
}

impl TestApp {
    pub async fn post_web_push(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}/subscriptions/web-push", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_fcm(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}/subscriptions/fcm", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_notification_time(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .put(format!("{}/settings/notification-time", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_subscription_status(&self, user_id: Uuid) -> reqwest::Response {
        self.api_client
            .get(format!(
                "{}/subscriptions/status?user_id={}",
                self.address, user_id
            ))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_dispatch(&self) -> reqwest::Response {
        self.api_client
            .post(format!("{}/notifications/dispatch", self.address))
            .basic_auth(&self.operator_username, Some(&self.operator_password))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_dispatch_with(
        &self,
        username: &str,
        password: Option<&str>,
    ) -> reqwest::Response {
        let mut request = self
            .api_client
            .post(format!("{}/notifications/dispatch", self.address));
        if let Some(password) = password {
            request = request.basic_auth(username, Some(password));
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn post_schedule(&self) -> reqwest::Response {
        self.api_client
            .post(format!("{}/notifications/schedule", self.address))
            .basic_auth(&self.operator_username, Some(&self.operator_password))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_schedule_without_auth(&self) -> reqwest::Response {
        self.api_client
            .post(format!("{}/notifications/schedule", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub fn seed_word(&self, user: Uuid, word: &str, meaning: &str) {
        use vocab_reminder::schema::vocabulary_words;
        diesel::insert_into(vocabulary_words::table)
            .values(NewVocabularyWord {
                id: &Uuid::new_v4(),
                user_id: &user,
                word,
                meaning,
                created_at: &Utc::now(),
            })
            .execute(&self.db_connection)
            .unwrap();
    }

    pub fn web_push_rows(&self, user: Uuid) -> Vec<PushSubscription> {
        use vocab_reminder::schema::push_subscriptions::dsl::*;
        push_subscriptions
            .filter(user_id.eq(user))
            .order(created_at.asc())
            .load::<PushSubscription>(&self.db_connection)
            .unwrap()
    }

    pub fn fcm_rows(&self, user: Uuid) -> Vec<FcmToken> {
        use vocab_reminder::schema::fcm_tokens::dsl::*;
        fcm_tokens
            .filter(user_id.eq(user))
            .order(created_at.asc())
            .load::<FcmToken>(&self.db_connection)
            .unwrap()
    }
}

fn setup_database(configuration: &Settings) -> PgConnection {
    let connection = PgConnection::establish(
        &configuration.database.connection_string_without_database(),
    )
    .expect("Failed to connect to Postgres.");

    diesel::sql_query(format!(
        "CREATE DATABASE \"{}\"",
        configuration.database.database_name
    ))
    .execute(&connection)
    .unwrap();

    let connection = PgConnection::establish(&configuration.database.connection_string())
        .expect("Failed to connect to Postgres.");
    diesel_migrations::run_pending_migrations(&connection).unwrap();
    connection
}
