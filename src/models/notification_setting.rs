use crate::schema::notification_settings;
use chrono::offset::Utc;
use chrono::{DateTime, NaiveTime};

#[derive(Queryable)]
pub struct NotificationSetting {
    pub user_id: uuid::Uuid,
    pub notification_time: NaiveTime,
    pub is_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "notification_settings"]
pub struct NewNotificationSetting<'a> {
    pub user_id: &'a uuid::Uuid,
    pub notification_time: &'a NaiveTime,
    pub is_enabled: bool,
    pub updated_at: &'a DateTime<Utc>,
}
