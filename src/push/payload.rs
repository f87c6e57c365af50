use serde_json::json;

pub const REMINDER_TITLE: &str = "英単語学習リマインダー";
pub const REMINDER_ICON: &str = "/logo192.png";
pub const REMINDER_TAG: &str = "daily-vocabulary";

/// The word picked for one user's reminder, plus the notification content
/// derived from it.
#[derive(Debug, Clone)]
pub struct WordReminder {
    pub word: String,
    pub meaning: String,
}

impl WordReminder {
    pub fn title(&self) -> &'static str {
        REMINDER_TITLE
    }

    pub fn body(&self) -> String {
        format!(
            "「{}」の意味は覚えていますか？\n意味: {}",
            self.word, self.meaning
        )
    }

    /// Worker-facing notification options: tag de-duplicates repeated
    /// reminders, actions drive the notification-click routing.
    pub fn web_notification(&self) -> serde_json::Value {
        json!({
            "title": self.title(),
            "body": self.body(),
            "icon": REMINDER_ICON,
            "badge": REMINDER_ICON,
            "tag": REMINDER_TAG,
            "requireInteraction": true,
            "actions": [
                { "action": "review", "title": "復習する" },
                { "action": "dismiss", "title": "後で" }
            ],
        })
    }

    pub fn data(&self) -> serde_json::Value {
        json!({
            "word": self.word,
            "meaning": self.meaning,
            "type": "vocabulary_reminder",
            "click_action": "/",
        })
    }
}
