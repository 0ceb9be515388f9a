//! Mail delivery. `SmtpTransport` is the only backend that talks to the network;
//! `EmailService` holds an `Arc<dyn MailTransport>` so tests can swap it out.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::SmtpSettings;
use crate::mail::DispatchError;

/// A fully rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivery acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendReceipt {
    pub message_id: String,
    pub to: String,
    pub subject: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<SendReceipt, DispatchError>;

    /// Opens a connection and authenticates without sending anything.
    async fn verify(&self) -> Result<bool, DispatchError>;
}

pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn from_settings(settings: &SmtpSettings) -> Result<Self, DispatchError> {
        let tls_parameters = TlsParameters::builder(settings.host.clone())
            .dangerous_accept_invalid_certs(!settings.reject_unauthorized)
            .build()?;
        let tls = if settings.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            .port(settings.port)
            .tls(tls);
        if let (Some(user), Some(pass)) = (&settings.user, &settings.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            inner: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<SendReceipt, DispatchError> {
        let from: Mailbox = email.from.parse()?;
        let to: Mailbox = email.to.parse()?;
        let message_id = new_message_id(&from);

        let message = Message::builder()
            .message_id(Some(message_id.clone()))
            .from(from)
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html)?;

        let response = self.inner.send(message).await?;
        debug!("SMTP response: {}", response.code());
        if !response.is_positive() {
            return Err(DispatchError::Delivery(format!(
                "server replied {}",
                response.code()
            )));
        }

        Ok(SendReceipt {
            message_id,
            to: email.to,
            subject: email.subject,
        })
    }

    async fn verify(&self) -> Result<bool, DispatchError> {
        Ok(self.inner.test_connection().await?)
    }
}

/// `<uuid@sender-domain>`, the same shape mail clients generate.
pub fn new_message_id(from: &Mailbox) -> String {
    format!("<{}@{}>", Uuid::new_v4(), from.email.domain())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_uses_sender_domain() {
        let from: Mailbox = "SendScript <noreply@sendscript.com>".parse().unwrap();
        let id = new_message_id(&from);
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@sendscript.com>"));
        assert_ne!(id, new_message_id(&from));
    }
}
