mod notification_time;
mod push_endpoint;

pub use notification_time::NotificationTime;
pub use push_endpoint::PushEndpoint;
