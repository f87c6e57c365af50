use super::{DeliveryOutcome, PushClient, WordReminder};
use crate::domain::PushEndpoint;
use crate::store::DeliveryTarget;
use crate::vapid::VapidSigner;
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;

/// Sends payload-less Web Push requests authenticated with VAPID.
///
/// Payload-less because the service worker renders a fallback notification
/// when the push event carries no data; sending a body would additionally
/// require RFC 8291 content encryption against the subscription keys.
pub struct WebPushClient {
    http: reqwest::Client,
    signer: VapidSigner,
    ttl_seconds: u64,
}

impl WebPushClient {
    pub fn new(http: reqwest::Client, signer: VapidSigner, ttl_seconds: u64) -> Self {
        Self {
            http,
            signer,
            ttl_seconds,
        }
    }
}

#[async_trait]
impl PushClient for WebPushClient {
    #[tracing::instrument(name = "Deliver a Web Push notification", skip(self, target, _reminder))]
    async fn deliver(
        &self,
        target: &DeliveryTarget,
        _reminder: &WordReminder,
    ) -> anyhow::Result<DeliveryOutcome> {
        let endpoint = match target {
            DeliveryTarget::WebPush { endpoint, .. } => endpoint,
            DeliveryTarget::Fcm { .. } => {
                bail!("The Web Push client was handed an FCM token.")
            }
        };
        let endpoint = PushEndpoint::parse(endpoint).map_err(|e| anyhow!(e))?;
        let token = self
            .signer
            .sign(&endpoint, Utc::now())
            .context("Failed to sign the VAPID token.")?;

        let response = self
            .http
            .post(endpoint.as_ref())
            .header(AUTHORIZATION, self.signer.authorization_header(&token))
            .header("TTL", self.ttl_seconds.to_string())
            .body(Vec::new())
            .send()
            .await
            .context("Failed to reach the push service.")?;

        let status = response.status();
        if status.is_success() {
            return Ok(DeliveryOutcome::Delivered);
        }
        let detail = response.text().await.unwrap_or_default();
        if status == StatusCode::GONE || status == StatusCode::NOT_FOUND {
            tracing::info!(%status, "Push service reported the subscription gone.");
            return Ok(DeliveryOutcome::Gone);
        }
        Ok(DeliveryOutcome::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}
