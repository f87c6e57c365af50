use crate::domain::PushEndpoint;
use crate::push::ConfigurationError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, Secret};

/// The Web Push protocol caps VAPID token lifetime at 24 hours.
const MAX_TOKEN_LIFETIME_SECONDS: u64 = 24 * 60 * 60;

#[derive(serde::Serialize, serde::Deserialize)]
pub struct VapidClaims {
    pub aud: String,
    pub exp: i64,
    pub sub: String,
}

/// Signs VAPID authorization tokens for Web Push requests.
///
/// Construction parses the private key once; an unusable key is a
/// configuration error that would fail every send identically, so it is
/// surfaced before any dispatch run starts.
pub struct VapidSigner {
    key: EncodingKey,
    public_key: String,
    subject: String,
    lifetime: Duration,
}

impl VapidSigner {
    pub fn new(
        private_key_pem: &Secret<String>,
        public_key: String,
        subject: String,
        ttl_seconds: u64,
    ) -> Result<Self, ConfigurationError> {
        let key = EncodingKey::from_ec_pem(private_key_pem.expose_secret().as_bytes())
            .map_err(ConfigurationError::InvalidVapidKey)?;
        let lifetime = Duration::seconds(ttl_seconds.min(MAX_TOKEN_LIFETIME_SECONDS) as i64);
        Ok(Self {
            key,
            public_key,
            subject,
            lifetime,
        })
    }

    /// ES256-signed JWT binding the push service origin and an expiry.
    pub fn sign(
        &self,
        endpoint: &PushEndpoint,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = VapidClaims {
            aud: endpoint.origin(),
            exp: (now + self.lifetime).timestamp(),
            sub: self.subject.clone(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::ES256), &claims, &self.key)
    }

    /// `Authorization` header value for a signed token.
    pub fn authorization_header(&self, token: &str) -> String {
        format!("vapid t={}, k={}", token, self.public_key)
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }
}
