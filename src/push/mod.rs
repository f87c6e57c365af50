mod fcm_client;
mod payload;
mod web_push_client;


pub use fcm_client::FcmClient;
pub use payload::WordReminder;
pub use web_push_client::WebPushClient;

use crate::configuration::PushSettings;
use crate::store::{Channel, DeliveryTarget};
use crate::vapid::VapidSigner;
use async_trait::async_trait;

/// What the push service told us about one delivery attempt.
///
/// Transport failures (DNS, timeouts) are `Err` at the call site instead;
/// both `Rejected` and `Err` leave the record active for the next run.
#[derive(Debug)]
pub enum DeliveryOutcome {
    Delivered,
    /// The subscription or token is permanently dead (HTTP 410/404,
    /// FCM UNREGISTERED/INVALID_ARGUMENT). Deactivate and never retry.
    Gone,
    /// Any other rejection; possibly transient or a sender-side
    /// misconfiguration, not proof the target is dead.
    Rejected { status: u16, detail: String },
}

#[async_trait]
pub trait PushClient: Send + Sync {
    async fn deliver(
        &self,
        target: &DeliveryTarget,
        reminder: &WordReminder,
    ) -> anyhow::Result<DeliveryOutcome>;
}

/// Missing or malformed signing material. Fatal for a whole dispatch run:
/// every send would fail identically.
#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("invalid VAPID signing key")]
    InvalidVapidKey(#[source] jsonwebtoken::errors::Error),
    #[error("invalid FCM service-account key")]
    InvalidFcmKey(#[source] jsonwebtoken::errors::Error),
}

/// One client per channel, behind the same seam the tests use to inject
/// scripted fakes.
pub struct PushClients {
    pub web_push: Box<dyn PushClient>,
    pub fcm: Box<dyn PushClient>,
}

impl PushClients {
    pub fn build(settings: &PushSettings) -> Result<Self, ConfigurationError> {
        let http = reqwest::Client::new();
        let signer = VapidSigner::new(
            &settings.vapid.private_key_pem,
            settings.vapid.public_key.clone(),
            settings.vapid.subject.clone(),
            settings.vapid.ttl_seconds,
        )?;
        Ok(Self {
            web_push: Box::new(WebPushClient::new(
                http.clone(),
                signer,
                settings.vapid.ttl_seconds,
            )),
            fcm: Box::new(FcmClient::new(&settings.fcm, http)?),
        })
    }

    pub fn for_target(&self, target: &DeliveryTarget) -> &dyn PushClient {
        match target.channel() {
            Channel::WebPush => self.web_push.as_ref(),
            Channel::Fcm => self.fcm.as_ref(),
        }
    }
}
