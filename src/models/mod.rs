mod dispatch_log;
mod fcm_token;
mod notification_setting;
mod push_subscription;
mod vocabulary_word;

pub use dispatch_log::*;
pub use fcm_token::*;
pub use notification_setting::*;
pub use push_subscription::*;
pub use vocabulary_word::*;
