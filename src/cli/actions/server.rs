use crate::api;
use crate::api::email::{EmailApiConfig, EmailSender};
use crate::api::handlers::state::{AppConfig, AppState};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_url: String,
    pub admin_email: String,
    pub email_api_url: String,
    pub email_api_key: Option<String>,
    pub email_from: String,
    pub otp_ttl_minutes: i64,
    pub session_ttl_hours: i64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the email client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let email_sender = match args.email_api_key {
        Some(api_key) => EmailSender::http(EmailApiConfig::new(
            args.email_api_url,
            SecretString::from(api_key),
            args.email_from,
        ))?,
        None => {
            warn!("no email API key configured, outbound email will only be logged");
            EmailSender::Log
        }
    };

    let config = AppConfig::new(args.frontend_url, args.admin_email)
        .with_otp_ttl_minutes(args.otp_ttl_minutes)
        .with_session_ttl_seconds(args.session_ttl_hours * 60 * 60);

    let state = Arc::new(AppState::new(config, email_sender));

    api::new(args.port, args.dsn, state).await
}
