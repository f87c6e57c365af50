use crate::schema::vocabulary_words;
use chrono::offset::Utc;
use chrono::DateTime;

// Owned by the word-CRUD side of the application; this service only ever
// reads it, except for test seeding through `NewVocabularyWord`.

#[derive(Queryable)]
pub struct VocabularyWord {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub word: String,
    pub meaning: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "vocabulary_words"]
pub struct NewVocabularyWord<'a> {
    pub id: &'a uuid::Uuid,
    pub user_id: &'a uuid::Uuid,
    pub word: &'a str,
    pub meaning: &'a str,
    pub created_at: &'a DateTime<Utc>,
}
