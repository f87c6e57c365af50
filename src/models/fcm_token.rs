use crate::schema::fcm_tokens;
use chrono::offset::Utc;
use chrono::DateTime;

#[derive(Queryable)]
pub struct FcmToken {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub token: String,
    pub device_info: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "fcm_tokens"]
pub struct NewFcmToken<'a> {
    pub id: &'a uuid::Uuid,
    pub user_id: &'a uuid::Uuid,
    pub token: &'a str,
    pub device_info: Option<&'a str>,
    pub is_active: bool,
    pub created_at: &'a DateTime<Utc>,
}
