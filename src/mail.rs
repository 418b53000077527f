use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::MailConfig;
use crate::error::AppError;

/// Outbound notification seam. The auth flow only ever sends these three
/// messages; everything about transport and formatting stays behind it.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_email(&self, to: &str, token: &str) -> Result<(), AppError>;
    async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), AppError>;
    async fn send_login_code_email(&self, to: &str, code: &str) -> Result<(), AppError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    verify_url: String,
    reset_url: String,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)?
            .port(cfg.smtp_port)
            .credentials(creds)
            .build();
        let from: Mailbox = cfg.from_address.parse()?;
        Ok(Self {
            transport,
            from,
            verify_url: cfg.verify_url.clone(),
            reset_url: cfg.reset_url.clone(),
        })
    }

    async fn send_html(&self, to: &str, subject: &str, html: String) -> Result<(), AppError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|_| AppError::Mail(format!("invalid recipient address {to}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| AppError::Mail(e.to_string()))?;
        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;
        info!(%to, subject, "email sent");
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification_email(&self, to: &str, token: &str) -> Result<(), AppError> {
        let link = format!("{}?token={}", self.verify_url, token);
        let html = format!(
            "<h3>Welcome!</h3>\
             <p>Please verify your email by clicking the link below:</p>\
             <a href=\"{link}\">Verify Email</a>"
        );
        self.send_html(to, "Email Verification", html).await
    }

    async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), AppError> {
        let link = format!("{}?token={}", self.reset_url, token);
        let html = format!(
            "<h3>Password Reset</h3>\
             <p>Please reset your password by visiting the link below. \
             The link is valid for 15 minutes.</p>\
             <a href=\"{link}\">Reset password</a>"
        );
        self.send_html(to, "Password Reset", html).await
    }

    async fn send_login_code_email(&self, to: &str, code: &str) -> Result<(), AppError> {
        let html = format!(
            "<h3>Your login code</h3>\
             <p>Enter this code to sign in. It expires in 15 minutes.</p>\
             <h2>{code}</h2>"
        );
        self.send_html(to, "Login Code", html).await
    }
}
