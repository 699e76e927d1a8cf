//! Outbound email delivery.
//!
//! Every notification this service sends (OTP codes, approval/rejection,
//! resignation and data-request confirmations, contact alerts) goes through
//! an `EmailSender`. Delivery to the transactional-email HTTP API is a
//! best-effort side effect: the store mutation that preceded it has already
//! committed, and a dispatch failure is logged and reported through
//! `NotificationOutcome`, never as the parent operation's failure.
//!
//! The default sender for local dev is `EmailSender::Log`, which logs the
//! message and reports it as sent.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{error, info};

/// A composed message ready for dispatch.
#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Where a notification ended up. Separate from the parent operation's
/// result so callers and tests can observe delivery independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    Failed,
}

/// Transactional-email HTTP API settings.
#[derive(Clone)]
pub struct EmailApiConfig {
    api_url: String,
    api_key: SecretString,
    from: String,
}

impl EmailApiConfig {
    #[must_use]
    pub fn new(api_url: String, api_key: SecretString, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
        }
    }
}

impl std::fmt::Debug for EmailApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailApiConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"***")
            .field("from", &self.from)
            .finish()
    }
}

/// Email delivery backend.
#[derive(Debug)]
pub enum EmailSender {
    /// POST the message as JSON to the provider with a bearer credential.
    Http {
        client: Client,
        config: EmailApiConfig,
    },
    /// Local dev: log the message instead of sending it.
    Log,
}

impl EmailSender {
    /// Build an HTTP sender for the configured provider.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn http(config: EmailApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::api::APP_USER_AGENT)
            .build()
            .context("failed to build email HTTP client")?;
        Ok(Self::Http { client, config })
    }

    /// Deliver a message, or return an error describing why it failed.
    ///
    /// # Errors
    /// Returns an error if the provider rejects the message or is
    /// unreachable.
    pub async fn send(&self, message: &EmailMessage) -> Result<()> {
        match self {
            Self::Http { client, config } => {
                let payload = json!({
                    "from": &config.from,
                    "to": [&message.to],
                    "subject": &message.subject,
                    "text": &message.body,
                });
                let response = client
                    .post(&config.api_url)
                    .bearer_auth(config.api_key.expose_secret())
                    .json(&payload)
                    .send()
                    .await
                    .context("email provider request failed")?;

                if response.status().is_success() {
                    Ok(())
                } else {
                    Err(anyhow!(
                        "email provider returned {}",
                        response.status()
                    ))
                }
            }
            Self::Log => {
                info!(
                    to = %message.to,
                    subject = %message.subject,
                    "email send stub"
                );
                Ok(())
            }
        }
    }

    /// Deliver a message without letting a failure propagate. The error is
    /// logged server-side; callers only see the outcome.
    pub async fn send_best_effort(&self, message: EmailMessage) -> NotificationOutcome {
        match self.send(&message).await {
            Ok(()) => NotificationOutcome::Sent,
            Err(err) => {
                error!(to = %message.to, subject = %message.subject, "email dispatch failed: {err}");
                NotificationOutcome::Failed
            }
        }
    }
}

/// Message builders for every notification the service sends.
pub mod messages {
    use super::EmailMessage;
    use crate::member::models::DataRequestType;
    use crate::otp::models::ActionType;

    const PARTY: &str = "People's Solidarity Party of Kenya";

    pub(crate) fn otp_code(
        to: &str,
        first_name: &str,
        code: &str,
        action: ActionType,
        ttl_minutes: i64,
    ) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: format!("Your {PARTY} verification code"),
            body: format!(
                "Dear {first_name},\n\n\
                 Your one-time code for your {} is: {code}\n\n\
                 The code expires in {ttl_minutes} minutes and can be used once.\n\
                 If you did not request this, you can ignore this email.\n\n\
                 {PARTY}",
                action.label()
            ),
        }
    }

    pub(crate) fn registration_received(to: &str, first_name: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: format!("{PARTY}: registration received"),
            body: format!(
                "Dear {first_name},\n\n\
                 Thank you for registering with the {PARTY}. Your application is \
                 pending verification; you will receive another email once it has \
                 been reviewed.\n\n\
                 {PARTY}"
            ),
        }
    }

    pub(crate) fn approval(to: &str, first_name: &str, membership_number: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: format!("Welcome to the {PARTY}"),
            body: format!(
                "Dear {first_name},\n\n\
                 Your membership has been approved. Your membership number is \
                 {membership_number}. Please keep it for your records.\n\n\
                 {PARTY}"
            ),
        }
    }

    pub(crate) fn rejection(to: &str, first_name: &str, reason: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: format!("{PARTY}: registration update"),
            body: format!(
                "Dear {first_name},\n\n\
                 We were unable to approve your membership application.\n\
                 Reason: {reason}\n\n\
                 You may register again once the issue has been addressed.\n\n\
                 {PARTY}"
            ),
        }
    }

    pub(crate) fn resignation_confirmation(to: &str, full_name: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: format!("{PARTY}: resignation confirmed"),
            body: format!(
                "Dear {full_name},\n\n\
                 Your resignation has been processed and your membership record \
                 has been removed from the register. This action is final.\n\n\
                 {PARTY}"
            ),
        }
    }

    pub(crate) fn data_request_ack(to: &str, request_type: DataRequestType) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: format!("{PARTY}: data {} request received", request_type.as_str()),
            body: format!(
                "Your data {} request has been received and will be handled by \
                 our data protection office within 14 days, as required by law.\n\n\
                 {PARTY}",
                request_type.as_str()
            ),
        }
    }

    pub(crate) fn data_request_admin_alert(
        to: &str,
        member_email: &str,
        request_type: DataRequestType,
        reason: Option<&str>,
        details: Option<&str>,
    ) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: format!("New data {} request", request_type.as_str()),
            body: format!(
                "A member has raised a data {} request.\n\n\
                 Member: {member_email}\n\
                 Reason: {}\n\
                 Details: {}\n\n\
                 Action required within 14 days.",
                request_type.as_str(),
                reason.unwrap_or("(none given)"),
                details.unwrap_or("(none given)"),
            ),
        }
    }

    pub(crate) fn contact_alert(
        to: &str,
        name: &str,
        email: &str,
        subject: Option<&str>,
        message: &str,
    ) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: format!(
                "Website contact: {}",
                subject.unwrap_or("(no subject)")
            ),
            body: format!("From: {name} <{email}>\n\n{message}"),
        }
    }

    pub(crate) fn volunteer_ack(to: &str, name: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: format!("{PARTY}: thank you for volunteering"),
            body: format!(
                "Dear {name},\n\n\
                 Thank you for signing up to volunteer. Our county coordination \
                 team will be in touch.\n\n\
                 {PARTY}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{messages, EmailMessage, EmailSender, NotificationOutcome};
    use crate::member::models::DataRequestType;
    use crate::otp::models::ActionType;

    #[tokio::test]
    async fn log_sender_always_reports_sent() {
        let sender = EmailSender::Log;
        let outcome = sender
            .send_best_effort(EmailMessage {
                to: "member@example.com".to_string(),
                subject: "subject".to_string(),
                body: "body".to_string(),
            })
            .await;
        assert_eq!(outcome, NotificationOutcome::Sent);
    }

    #[test]
    fn otp_message_contains_code_and_ttl() {
        let message = messages::otp_code(
            "a@x.com",
            "Amina",
            "123456",
            ActionType::Resignation,
            10,
        );
        assert_eq!(message.to, "a@x.com");
        assert!(message.body.contains("123456"));
        assert!(message.body.contains("10 minutes"));
        assert!(message.body.contains("resignation"));
    }

    #[test]
    fn approval_message_carries_membership_number() {
        let message = messages::approval("a@x.com", "Amina", "PSP-K-2025-00001");
        assert!(message.body.contains("PSP-K-2025-00001"));
    }

    #[test]
    fn admin_alert_handles_missing_optionals() {
        let message = messages::data_request_admin_alert(
            "admin@pspk.or.ke",
            "member@example.com",
            DataRequestType::Correction,
            None,
            None,
        );
        assert!(message.body.contains("(none given)"));
        assert!(message.subject.contains("correction"));
    }
}
