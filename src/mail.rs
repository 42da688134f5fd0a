use anyhow::Context;
use axum::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset_link(&self, to: &str, link: &str) -> anyhow::Result<()>;
}

/// SMTP relay, upgrading to TLS when the server offers STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let tls = TlsParameters::new(cfg.host.clone()).context("smtp tls parameters")?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.host)
            .port(cfg.port)
            .tls(Tls::Opportunistic(tls));
        if let (Some(user), Some(pass)) = (&cfg.user, &cfg.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = cfg
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid FROM_EMAIL {}", cfg.from))?;

        info!(host = %cfg.host, port = cfg.port, "smtp mailer configured");
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

pub(crate) fn reset_message(from: Mailbox, to: &str, link: &str) -> anyhow::Result<Message> {
    let to = to
        .parse::<Mailbox>()
        .with_context(|| format!("invalid recipient {to}"))?;
    let text = format!("Reset your password: {link}");
    let html = format!(r#"<p>Reset your password: <a href="{link}">{link}</a></p>"#);
    Message::builder()
        .from(from)
        .to(to)
        .subject("Rupayana Password Reset")
        .multipart(MultiPart::alternative_plain_html(text, html))
        .context("build reset mail")
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_reset_link(&self, to: &str, link: &str) -> anyhow::Result<()> {
        let message = reset_message(self.from.clone(), to, link)?;
        self.transport
            .send(message)
            .await
            .context("smtp send reset link")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from() -> Mailbox {
        "no-reply@rupayana.test".parse().unwrap()
    }

    #[test]
    fn reset_message_carries_link_in_both_parts() {
        let link = "http://localhost:5500/frontend/reset.html?token=abc&email=a%40example.com";
        let message = reset_message(from(), "a@example.com", link).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Rupayana Password Reset"));
        assert!(raw.contains("To: a@example.com"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn reset_message_rejects_bad_recipient() {
        assert!(reset_message(from(), "not an address", "http://x").is_err());
    }

    #[test]
    fn mailer_rejects_bad_sender() {
        let cfg = SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            user: None,
            pass: None,
            from: "nope".into(),
        };
        assert!(SmtpMailer::new(&cfg).is_err());
    }
}
