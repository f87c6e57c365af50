use crate::schema::push_subscriptions;
use chrono::offset::Utc;
use chrono::DateTime;

#[derive(Queryable)]
pub struct PushSubscription {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub endpoint: String,
    pub p256dh_key: String,
    pub auth_key: String,
    pub user_agent: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "push_subscriptions"]
pub struct NewPushSubscription<'a> {
    pub id: &'a uuid::Uuid,
    pub user_id: &'a uuid::Uuid,
    pub endpoint: &'a str,
    pub p256dh_key: &'a str,
    pub auth_key: &'a str,
    pub user_agent: Option<&'a str>,
    pub is_active: bool,
    pub created_at: &'a DateTime<Utc>,
}
