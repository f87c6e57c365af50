use chrono::FixedOffset;
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;
use serde_aux::field_attributes::deserialize_option_number_from_string;
use std::net::IpAddr;

pub enum Environment {
    Local,
    Production,
}

#[derive(serde::Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub push: PushSettings,
    pub schedule: ScheduleSettings,
    pub operator: OperatorSettings,
}

#[derive(serde::Deserialize)]
pub struct ApplicationSettings {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub port: Option<u16>,
    pub host: IpAddr,
}

#[derive(serde::Deserialize)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

#[derive(serde::Deserialize)]
pub struct PushSettings {
    pub vapid: VapidSettings,
    pub fcm: FcmSettings,
}

#[derive(serde::Deserialize)]
pub struct VapidSettings {
    /// Uncompressed P-256 public point, base64url without padding. Sent
    /// verbatim in the `k=` parameter and as the application server key.
    pub public_key: String,
    /// PKCS#8 PEM of the matching private key.
    pub private_key_pem: Secret<String>,
    pub subject: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub ttl_seconds: u64,
}

#[derive(serde::Deserialize)]
pub struct FcmSettings {
    pub project_id: String,
    pub client_email: String,
    pub private_key_pem: Secret<String>,
}

#[derive(Clone, serde::Deserialize)]
pub struct ScheduleSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub utc_offset_hours: i32,
}

#[derive(Clone, serde::Deserialize)]
pub struct OperatorSettings {
    pub username: String,
    pub password: Secret<String>,
}

impl ScheduleSettings {
    /// The fixed reference zone all notification times are interpreted in.
    pub fn reference_offset(&self) -> Result<FixedOffset, String> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            format!(
                "{} is not a valid UTC offset in hours.",
                self.utc_offset_hours
            )
        })
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either 'local' or 'production'.",
                other
            )),
        }
    }
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        use secrecy::ExposeSecret;
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database_name,
            ssl_mode(self.require_ssl)
        )
    }

    pub fn connection_string_without_database(&self) -> String {
        use secrecy::ExposeSecret;
        format!(
            "postgres://{}:{}@{}:{}?sslmode={}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            ssl_mode(self.require_ssl)
        )
    }
}

fn ssl_mode(require_ssl: bool) -> &'static str {
    match require_ssl {
        true => "require",
        false => "prefer",
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");

    let mut settings = config::Config::default();
    settings.merge(config::File::from(configuration_directory.join("base")).required(true))?;
    settings.merge(
        config::File::from(configuration_directory.join(environment.as_str())).required(true),
    )?;
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;
    settings.try_into()
}
