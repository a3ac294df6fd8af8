pub mod templates;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

/// A message ready to hand to a [`Mailer`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), String>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), String> {
        let mut builder = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML);

        if let Some(reply_to) = email.reply_to {
            builder = builder.reply_to(
                reply_to
                    .parse()
                    .map_err(|e| format!("Invalid reply-to address: {e}"))?,
            );
        }

        let message = builder
            .body(email.html_body)
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}

pub fn password_reset(to_email: &str, name: &str, reset_url: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to_email.to_string(),
        reply_to: None,
        subject: "Password Reset Request".to_string(),
        html_body: templates::render_password_reset(name, reset_url),
    }
}

pub fn contact_message(
    support_email: &str,
    from_name: &str,
    from_email: &str,
    subject: &str,
    message: &str,
) -> OutgoingEmail {
    OutgoingEmail {
        to: support_email.to_string(),
        reply_to: Some(from_email.to_string()),
        subject: subject.to_string(),
        html_body: templates::render_contact(from_name, from_email, message),
    }
}
