use super::{ConfigurationError, DeliveryOutcome, PushClient, WordReminder};
use crate::configuration::FcmSettings;
use crate::push::payload::REMINDER_ICON;
use crate::store::DeliveryTarget;
use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::ExposeSecret;
use serde_json::json;
use tokio::sync::Mutex;

const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const OAUTH_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const ASSERTION_LIFETIME_SECONDS: i64 = 3600;

/// Sends reminders through the FCM v1 API.
///
/// FCM's own service-to-service auth: an RS256-signed service-account
/// assertion is exchanged for a short-lived bearer token, which is cached
/// until shortly before it expires so a dispatch run performs at most one
/// exchange.
pub struct FcmClient {
    http: reqwest::Client,
    project_id: String,
    client_email: String,
    signing_key: EncodingKey,
    cached_token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(serde::Serialize)]
struct OauthClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(serde::Deserialize)]
struct OauthResponse {
    access_token: String,
    expires_in: Option<i64>,
}

impl FcmClient {
    pub fn new(settings: &FcmSettings, http: reqwest::Client) -> Result<Self, ConfigurationError> {
        let signing_key =
            EncodingKey::from_rsa_pem(settings.private_key_pem.expose_secret().as_bytes())
                .map_err(ConfigurationError::InvalidFcmKey)?;
        Ok(Self {
            http,
            project_id: settings.project_id.clone(),
            client_email: settings.client_email.clone(),
            signing_key,
            cached_token: Mutex::new(None),
        })
    }

    #[tracing::instrument(name = "Exchange a service-account JWT for an access token", skip(self))]
    async fn access_token(&self) -> anyhow::Result<String> {
        let mut cached = self.cached_token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + Duration::seconds(60) {
                return Ok(token.access_token.clone());
            }
        }

        let now = Utc::now();
        let claims = OauthClaims {
            iss: &self.client_email,
            scope: FCM_SCOPE,
            aud: OAUTH_TOKEN_URL,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECONDS,
        };
        let assertion =
            jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
                .context("Failed to sign the service-account assertion.")?;

        let response = self
            .http
            .post(OAUTH_TOKEN_URL)
            .form(&[
                ("grant_type", OAUTH_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach the OAuth token endpoint.")?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            bail!("The OAuth token exchange failed with {}: {}", status, detail);
        }
        let body: OauthResponse = response
            .json()
            .await
            .context("Failed to parse the OAuth token response.")?;

        *cached = Some(CachedToken {
            access_token: body.access_token.clone(),
            expires_at: now + Duration::seconds(body.expires_in.unwrap_or(3600)),
        });
        Ok(body.access_token)
    }

    fn send_url(&self) -> String {
        format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.project_id
        )
    }

    fn message_body(&self, token: &str, reminder: &WordReminder) -> serde_json::Value {
        json!({
            "message": {
                "token": token,
                "notification": {
                    "title": reminder.title(),
                    "body": reminder.body(),
                    "image": REMINDER_ICON,
                },
                "data": reminder.data(),
                "webpush": {
                    "headers": { "TTL": "86400" },
                    "notification": {
                        "icon": REMINDER_ICON,
                        "badge": REMINDER_ICON,
                        "requireInteraction": false,
                    },
                    "fcm_options": { "link": "/" },
                },
            },
        })
    }
}

#[async_trait]
impl PushClient for FcmClient {
    #[tracing::instrument(name = "Deliver an FCM notification", skip(self, target, reminder))]
    async fn deliver(
        &self,
        target: &DeliveryTarget,
        reminder: &WordReminder,
    ) -> anyhow::Result<DeliveryOutcome> {
        let token = match target {
            DeliveryTarget::Fcm { token } => token,
            DeliveryTarget::WebPush { .. } => {
                bail!("The FCM client was handed a Web Push subscription.")
            }
        };
        let access_token = self.access_token().await?;

        let response = self
            .http
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&self.message_body(token, reminder))
            .send()
            .await
            .context("Failed to reach the FCM send endpoint.")?;

        let status = response.status();
        if status.is_success() {
            return Ok(DeliveryOutcome::Delivered);
        }
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        if is_dead_token_error(&body) {
            tracing::info!("FCM reported the registration token invalid.");
            return Ok(DeliveryOutcome::Gone);
        }
        let detail = body["error"]["message"]
            .as_str()
            .unwrap_or("Unknown FCM error")
            .to_string();
        Ok(DeliveryOutcome::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}

fn is_dead_token_error(body: &serde_json::Value) -> bool {
    let code = body["error"]["details"][0]["errorCode"]
        .as_str()
        .or_else(|| body["error"]["status"].as_str());
    matches!(code, Some("UNREGISTERED") | Some("INVALID_ARGUMENT"))
}
