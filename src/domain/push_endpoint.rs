use reqwest::Url;

/// A validated Web Push subscription endpoint.
///
/// The push service issues these; we only ever POST to them and derive the
/// VAPID `aud` claim from the origin.
#[derive(Debug, Clone)]
pub struct PushEndpoint {
    url: Url,
}

impl PushEndpoint {
    pub fn parse(s: &str) -> Result<PushEndpoint, String> {
        let url =
            Url::parse(s).map_err(|e| format!("{} is not a valid push endpoint: {}", s, e))?;
        if url.scheme() != "https" {
            return Err(format!(
                "{} is not a valid push endpoint: push services are https-only",
                s
            ));
        }
        if url.host_str().is_none() {
            return Err(format!("{} is not a valid push endpoint: missing host", s));
        }
        Ok(Self { url })
    }

    /// Scheme + authority, e.g. `https://fcm.googleapis.com`.
    pub fn origin(&self) -> String {
        match self.url.port() {
            Some(port) => format!(
                "{}://{}:{}",
                self.url.scheme(),
                // checked in parse
                self.url.host_str().unwrap_or_default(),
                port
            ),
            None => format!(
                "{}://{}",
                self.url.scheme(),
                self.url.host_str().unwrap_or_default()
            ),
        }
    }
}

impl AsRef<str> for PushEndpoint {
    fn as_ref(&self) -> &str {
        self.url.as_str()
    }
}
