//! Shared request-scoped state: configuration and the email sender.

use crate::api::email::EmailSender;

const DEFAULT_OTP_TTL_MINUTES: i64 = 10;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    frontend_base_url: String,
    admin_email: String,
    otp_ttl_minutes: i64,
    session_ttl_seconds: i64,
}

impl AppConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, admin_email: String) -> Self {
        Self {
            frontend_base_url,
            admin_email,
            otp_ttl_minutes: DEFAULT_OTP_TTL_MINUTES,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_otp_ttl_minutes(mut self, minutes: i64) -> Self {
        self.otp_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(crate) fn admin_email(&self) -> &str {
        &self.admin_email
    }

    pub(crate) fn otp_ttl_minutes(&self) -> i64 {
        self.otp_ttl_minutes
    }

    pub(crate) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

/// Per-process state handed to handlers through an `Extension`.
#[derive(Debug)]
pub struct AppState {
    config: AppConfig,
    email: EmailSender,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, email: EmailSender) -> Self {
        Self { config, email }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn email(&self) -> &EmailSender {
        &self.email
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    AppState::new(
        AppConfig::new(
            "https://pspk.or.ke".to_string(),
            "membership@pspk.or.ke".to_string(),
        ),
        EmailSender::Log,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_overrides() {
        let config = AppConfig::new(
            "https://pspk.or.ke".to_string(),
            "membership@pspk.or.ke".to_string(),
        );
        assert_eq!(config.frontend_base_url(), "https://pspk.or.ke");
        assert_eq!(config.admin_email(), "membership@pspk.or.ke");
        assert_eq!(config.otp_ttl_minutes(), DEFAULT_OTP_TTL_MINUTES);
        assert_eq!(config.session_ttl_seconds(), DEFAULT_SESSION_TTL_SECONDS);
        assert!(config.session_cookie_secure());

        let config = config
            .with_otp_ttl_minutes(5)
            .with_session_ttl_seconds(3600);
        assert_eq!(config.otp_ttl_minutes(), 5);
        assert_eq!(config.session_ttl_seconds(), 3600);
    }

    #[test]
    fn plain_http_frontend_disables_secure_cookies() {
        let config = AppConfig::new(
            "http://localhost:5173".to_string(),
            "membership@pspk.or.ke".to_string(),
        );
        assert!(!config.session_cookie_secure());
    }
}
