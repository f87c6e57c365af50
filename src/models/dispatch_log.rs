use crate::schema::dispatch_log;
use chrono::offset::Utc;
use chrono::DateTime;

#[derive(Queryable)]
pub struct DispatchLogEntry {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub slot: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "dispatch_log"]
pub struct NewDispatchLogEntry<'a> {
    pub id: &'a uuid::Uuid,
    pub user_id: &'a uuid::Uuid,
    pub slot: &'a str,
    pub created_at: &'a DateTime<Utc>,
}
