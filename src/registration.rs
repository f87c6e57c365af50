//! The browser-side registration flow, expressed against an abstract
//! platform so the permission/worker/subscription state machine is the same
//! for every embedding (web view, PWA shell, tests).

/// Whether the platform exposes notification and background-worker APIs at
/// all. Checked once, up front, instead of sprinkling existence checks
/// through the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Supported,
    Unsupported,
}

/// The platform permission prompt's three-way answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushChannel {
    WebPush,
    Vendor,
}

/// Where the background worker script is loaded from. The explicit path is
/// deployment-specific; the default lets the platform pick its own.
#[derive(Debug, Clone, Copy)]
pub enum WorkerScript<'a> {
    Explicit(&'a str),
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebPushSubscription {
    pub endpoint: String,
    pub p256dh_key: String,
    pub auth_key: String,
}

/// What `register_for_push` hands back for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    WebPush(WebPushSubscription),
    Vendor { token: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("push notifications are not supported on this platform")]
    Unsupported,
    /// Terminal until the user re-opts in; never retried silently.
    #[error("the user denied the notification permission")]
    PermissionDenied,
    #[error("notification permission has not been granted yet")]
    PermissionNotGranted,
    /// Configuration error: nothing to hand the push service.
    #[error("no application server key is configured")]
    MissingPublicKey,
    #[error("background worker registration failed: {0}")]
    WorkerRegistration(String),
    #[error("the platform failed to create a registration: {0}")]
    Subscription(String),
}

/// The platform primitives the flow needs. A dismissal of the permission
/// prompt surfaces as `Default`, not as an error.
pub trait PushPlatform {
    fn capability(&self) -> Capability;
    fn permission_state(&self) -> PermissionState;
    fn request_permission(&mut self) -> PermissionState;
    fn register_worker(&mut self, script: WorkerScript<'_>) -> Result<(), String>;
    fn subscribe_web_push(
        &mut self,
        application_server_key: &str,
    ) -> Result<WebPushSubscription, String>;
    fn vendor_token(&mut self, application_server_key: &str) -> Result<String, String>;
}

pub struct RegistrationClient<P: PushPlatform> {
    platform: P,
    application_server_key: Option<String>,
    worker_script_path: String,
}

impl<P: PushPlatform> RegistrationClient<P> {
    pub fn new(
        platform: P,
        application_server_key: Option<String>,
        worker_script_path: String,
    ) -> Self {
        Self {
            platform,
            application_server_key,
            worker_script_path,
        }
    }

    pub fn capability(&self) -> Capability {
        self.platform.capability()
    }

    /// Idempotent: once the user has decided, repeated calls report the
    /// stored state without prompting again.
    pub fn request_permission(&mut self) -> PermissionState {
        if self.platform.capability() == Capability::Unsupported {
            return PermissionState::Denied;
        }
        match self.platform.permission_state() {
            PermissionState::Default => self.platform.request_permission(),
            decided => decided,
        }
    }

    /// Obtain a subscription or vendor token ready to persist.
    ///
    /// The explicit worker path can be wrong per deployment, so a failed
    /// install is retried exactly once letting the platform pick the
    /// default script location.
    pub fn register_for_push(
        &mut self,
        channel: PushChannel,
    ) -> Result<Registration, RegistrationError> {
        if self.platform.capability() == Capability::Unsupported {
            return Err(RegistrationError::Unsupported);
        }
        match self.platform.permission_state() {
            PermissionState::Granted => {}
            PermissionState::Denied => return Err(RegistrationError::PermissionDenied),
            PermissionState::Default => return Err(RegistrationError::PermissionNotGranted),
        }
        let key = self
            .application_server_key
            .clone()
            .ok_or(RegistrationError::MissingPublicKey)?;

        if let Err(first) = self
            .platform
            .register_worker(WorkerScript::Explicit(&self.worker_script_path))
        {
            self.platform
                .register_worker(WorkerScript::Default)
                .map_err(|second| {
                    RegistrationError::WorkerRegistration(format!(
                        "{}; retry with the default script: {}",
                        first, second
                    ))
                })?;
        }

        match channel {
            PushChannel::WebPush => self
                .platform
                .subscribe_web_push(&key)
                .map(Registration::WebPush)
                .map_err(RegistrationError::Subscription),
            PushChannel::Vendor => self
                .platform
                .vendor_token(&key)
                .map(|token| Registration::Vendor { token })
                .map_err(RegistrationError::Subscription),
        }
    }
}
