//! Email service for verification and welcome notifications

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send the email-verification message with its activation link
    pub async fn send_verification_email(
        &self,
        to: &str,
        name: &str,
        verification_link: &str,
    ) -> AppResult<()> {
        let subject = "Verify your library account";
        let text = format!(
            r#"
Hello {name},

Thank you for registering with our library. Please verify your email
address by opening the link below:

{link}

This link will expire in 24 hours. If you didn't create an account,
you can safely ignore this email.
"#,
            name = name,
            link = verification_link
        );
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Welcome to Our Library!</h2>
  <p>Hello {name},</p>
  <p>Thank you for registering with our library. Please verify your email address by clicking the button below:</p>
  <div style="text-align: center; margin: 30px 0;">
    <a href="{link}"
       style="background-color: #4CAF50; color: white; padding: 15px 32px;
              text-decoration: none; display: inline-block; border-radius: 4px;">
      Verify Email
    </a>
  </div>
  <p>Or copy and paste this link in your browser:</p>
  <p>{link}</p>
  <p>This link will expire in 24 hours.</p>
  <p>If you didn't create an account, you can safely ignore this email.</p>
  <hr style="margin: 20px 0;">
  <p style="color: #666; font-size: 12px;">This is an automated email, please do not reply.</p>
</div>"#,
            name = name,
            link = verification_link
        );

        self.send_email(to, subject, &text, &html).await
    }

    /// Send the welcome message after successful verification
    pub async fn send_welcome_email(&self, to: &str, name: &str) -> AppResult<()> {
        let subject = "Welcome to our library";
        let text = format!(
            r#"
Hello {name},

Your email has been successfully verified. You can now browse the
catalog, borrow up to 3 books at a time, track your borrowed books and
manage your account.
"#,
            name = name
        );
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Welcome to Our Library!</h2>
  <p>Hello {name},</p>
  <p>Your email has been successfully verified. You can now start using our library services.</p>
  <p>Here are some things you can do:</p>
  <ul>
    <li>Browse our collection of books</li>
    <li>Borrow up to 3 books at a time</li>
    <li>Track your borrowed books</li>
    <li>Manage your account settings</li>
  </ul>
  <p>If you have any questions, please don't hesitate to contact our support team.</p>
  <hr style="margin: 20px 0;">
  <p style="color: #666; font-size: 12px;">This is an automated email, please do not reply.</p>
</div>"#,
            name = name
        );

        self.send_email(to, subject, &text, &html).await
    }

    /// Generic email sending function
    async fn send_email(&self, to: &str, subject: &str, text: &str, html: &str) -> AppResult<()> {
        let from_name = self.config.smtp_from_name.as_deref().unwrap_or("Libris");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.to_string()),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        let mailer = mailer_builder.build();

        mailer
            .send(&email)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}
