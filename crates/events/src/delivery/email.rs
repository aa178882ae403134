//! Templated email delivery via SMTP.
//!
//! [`EmailDelivery`] renders a named template from the `email_templates`
//! table and sends it as HTML over the `lettre` async SMTP transport.
//! Configuration is loaded from environment variables; if `SMTP_HOST` is not
//! set, [`EmailConfig::from_env`] returns `None` and no mailer should be
//! constructed.

use std::collections::HashMap;

use intake_core::templating;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use intake_db::models::email_template::EmailTemplate;
use intake_db::repositories::EmailTemplateRepo;
use intake_db::DbPool;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    #[error("Email template '{0}' not found")]
    TemplateNotFound(String),

    #[error("Email template lookup failed: {0}")]
    Database(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "demos@label.local";

/// Configuration for the SMTP email delivery service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable        | Required | Default              |
    /// |-----------------|----------|----------------------|
    /// | `SMTP_HOST`     | yes      | -                    |
    /// | `SMTP_PORT`     | no       | `587`                |
    /// | `SMTP_FROM`     | no       | `demos@label.local`  |
    /// | `SMTP_USER`     | no       | -                    |
    /// | `SMTP_PASSWORD` | no       | -                    |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// A template with its placeholders filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Fill a template's subject and HTML body from `vars`.
pub fn render_template(template: &EmailTemplate, vars: &HashMap<&str, String>) -> RenderedEmail {
    RenderedEmail {
        subject: templating::render(&template.subject, vars),
        html: templating::render_html(&template.html_content, vars),
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

type Mailer = AsyncSmtpTransport<Tokio1Executor>;

/// Sends templated HTML emails to artists.
///
/// The SMTP transport pools its connections, so one instance is built at
/// startup and shared behind an `Arc`.
pub struct EmailDelivery {
    mailer: Mailer,
    from: Mailbox,
}

impl EmailDelivery {
    /// Build the STARTTLS transport and parse the sender address.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let mut builder = Mailer::starttls_relay(&config.smtp_host)?.port(config.smtp_port);
        if let (Some(user), Some(pass)) = (config.smtp_user, config.smtp_password) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        Ok(Self {
            mailer: builder.build(),
            from: config.from_address.parse()?,
        })
    }

    /// Look up `template_name`, render it with `vars`, and send it to `to_email`.
    pub async fn send_template(
        &self,
        pool: &DbPool,
        template_name: &str,
        to_email: &str,
        vars: &HashMap<&str, String>,
    ) -> Result<(), EmailError> {
        let template = EmailTemplateRepo::find_by_name(pool, template_name)
            .await?
            .ok_or_else(|| EmailError::TemplateNotFound(template_name.to_string()))?;

        let rendered = render_template(&template, vars);
        self.send_html(to_email, &rendered).await?;

        tracing::info!(to = to_email, template = template_name, "Templated email sent");
        Ok(())
    }

    /// Send an already rendered email.
    pub async fn send_html(&self, to_email: &str, email: &RenderedEmail) -> Result<(), EmailError> {
        let message = build_message(&self.from, to_email, email)?;
        self.mailer.send(message).await?;
        Ok(())
    }
}

fn build_message(
    from: &Mailbox,
    to_email: &str,
    email: &RenderedEmail,
) -> Result<Message, EmailError> {
    Message::builder()
        .from(from.clone())
        .to(to_email.parse()?)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(email.html.clone())
        .map_err(|e| EmailError::Build(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
