//! Outbound email delivery
//!
//! SMTP mailer for onboarding and password-reset notifications. Sends are
//! best-effort: callers downgrade delivery failures to a partial-success
//! condition instead of failing the operation that triggered them.

use crate::core::config::EmailConfig;
use crate::core::error::{LmsError, Result};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// SMTP mailer with the sender identity and link base injected at startup
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
    from_name: String,
    frontend_url: String,
}

impl Mailer {
    /// Build a mailer from configuration.
    ///
    /// Blank SMTP credentials produce a disabled mailer whose sends fail with
    /// an explanatory error; operations proceed and report the notification
    /// as undelivered.
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let frontend_url = config.frontend_url.trim_end_matches('/').to_string();

        if !config.is_configured() {
            tracing::warn!("SMTP credentials not configured; outbound email is disabled");
            return Ok(Self {
                transport: None,
                from: None,
                from_name: config.from_name.clone(),
                frontend_url,
            });
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| LmsError::EmailError(format!("Invalid SMTP relay: {}", e)))?
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_pass.clone(),
            ))
            .build();

        let from: Mailbox = format!("{} <{}>", config.from_name, config.smtp_user)
            .parse()
            .map_err(|e| LmsError::EmailError(format!("Invalid from address: {}", e)))?;

        Ok(Self {
            transport: Some(transport),
            from: Some(from),
            from_name: config.from_name.clone(),
            frontend_url,
        })
    }

    /// The password setup URL embedded in welcome emails
    pub fn setup_url(&self, token: &str) -> String {
        format!("{}/employee/set-password?token={}", self.frontend_url, token)
    }

    /// The password reset URL embedded in reset emails
    pub fn reset_url(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, token)
    }

    /// Send the onboarding email with a password setup link
    pub async fn send_welcome_email(
        &self,
        to: &str,
        employee_name: &str,
        company_name: &str,
        setup_token: &str,
    ) -> Result<()> {
        let url = self.setup_url(setup_token);
        let subject = "Welcome to the Learning Management System - Set Your Password";

        let text = format!(
            "Welcome to Our Learning Management System!\n\n\
             Dear {name},\n\n\
             Your account has been created in our Learning Management System by the HR team at {company}.\n\n\
             To get started, please set your password by visiting this link:\n{url}\n\n\
             This password setup link will expire in 7 days for security reasons. If you don't set \
             your password within this time, please contact HR for assistance.\n\n\
             Best regards,\n{from}\n{company}\n",
            name = employee_name,
            company = company_name,
            url = url,
            from = self.from_name,
        );

        let html = format!(
            "<div style=\"max-width: 600px; margin: 0 auto; padding: 20px; font-family: Arial, sans-serif;\">\
             <h2 style=\"color: #333; text-align: center;\">Welcome to Our Learning Management System!</h2>\
             <p>Dear <strong>{name}</strong>,</p>\
             <p>Your account has been created in our Learning Management System by the HR team at \
             <strong>{company}</strong>.</p>\
             <p>To get started, you need to <strong>set up your password</strong>:</p>\
             <div style=\"text-align: center; margin: 30px 0;\">\
             <a href=\"{url}\" style=\"background-color: #4F46E5; color: white; padding: 12px 30px; \
             text-decoration: none; border-radius: 5px; display: inline-block;\">Set My Password</a>\
             </div>\
             <p>Or copy and paste this link in your browser:</p>\
             <p style=\"word-break: break-all; color: #007bff;\">{url}</p>\
             <p><strong>This link will expire in 7 days.</strong> If you don't set your password \
             within this time, please contact HR for assistance.</p>\
             <hr style=\"margin: 30px 0; border: none; border-top: 1px solid #eee;\">\
             <p style=\"color: #666; font-size: 12px;\">This is an automated email, please do not reply.</p>\
             </div>",
            name = employee_name,
            company = company_name,
            url = url,
        );

        self.send(to, subject, text, html).await
    }

    /// Send the HR password reset email
    pub async fn send_reset_email(&self, to: &str, reset_token: &str) -> Result<()> {
        let url = self.reset_url(reset_token);
        let subject = "Password Reset Request - Learning Management System";

        let text = format!(
            "Password Reset Request\n\n\
             You have requested to reset your password for your Learning Management System account.\n\n\
             Please visit this link to reset your password:\n{url}\n\n\
             This link will expire in 1 hour.\n\n\
             If you did not request this password reset, please ignore this email.\n",
            url = url,
        );

        let html = format!(
            "<div style=\"max-width: 600px; margin: 0 auto; padding: 20px; font-family: Arial, sans-serif;\">\
             <h2 style=\"color: #333; text-align: center;\">Password Reset Request</h2>\
             <p>Hello,</p>\
             <p>You have requested to reset your password for your Learning Management System account. \
             Click the button below to reset your password:</p>\
             <div style=\"text-align: center; margin: 30px 0;\">\
             <a href=\"{url}\" style=\"background-color: #007bff; color: white; padding: 12px 30px; \
             text-decoration: none; border-radius: 5px; display: inline-block;\">Reset Password</a>\
             </div>\
             <p>Or copy and paste this link in your browser:</p>\
             <p style=\"word-break: break-all; color: #007bff;\">{url}</p>\
             <p><strong>This link will expire in 1 hour.</strong></p>\
             <p>If you did not request this password reset, please ignore this email.</p>\
             <hr style=\"margin: 30px 0; border: none; border-top: 1px solid #eee;\">\
             <p style=\"color: #666; font-size: 12px;\">This is an automated email, please do not reply.</p>\
             </div>",
            url = url,
        );

        self.send(to, subject, text, html).await
    }

    async fn send(&self, to: &str, subject: &str, text: String, html: String) -> Result<()> {
        let (transport, from) = match (&self.transport, &self.from) {
            (Some(transport), Some(from)) => (transport, from),
            _ => {
                return Err(LmsError::EmailError(
                    "Outbound email is not configured".to_string(),
                ));
            }
        };

        let to: Mailbox = to
            .parse()
            .map_err(|e| LmsError::EmailError(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(from.clone())
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))
            .map_err(|e| LmsError::EmailError(format!("Failed to build email: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| LmsError::EmailError(format!("SMTP send failed: {}", e)))?;

        tracing::info!(subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_mailer() -> Mailer {
        Mailer::new(&EmailConfig {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_user: String::new(),
            smtp_pass: String::new(),
            from_name: "Learning Management System".to_string(),
            frontend_url: "http://localhost:5173/".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_link_urls() {
        let mailer = disabled_mailer();

        // Trailing slash on the base URL is normalized away
        assert_eq!(
            mailer.setup_url("tok123"),
            "http://localhost:5173/employee/set-password?token=tok123"
        );
        assert_eq!(
            mailer.reset_url("tok456"),
            "http://localhost:5173/reset-password?token=tok456"
        );
    }

    #[tokio::test]
    async fn test_disabled_mailer_reports_failure() {
        let mailer = disabled_mailer();

        let result = mailer
            .send_welcome_email("bob@co.com", "Bob", "Acme", "tok123")
            .await;
        assert!(matches!(result, Err(LmsError::EmailError(_))));

        let result = mailer.send_reset_email("alice@co.com", "tok456").await;
        assert!(matches!(result, Err(LmsError::EmailError(_))));
    }
}
