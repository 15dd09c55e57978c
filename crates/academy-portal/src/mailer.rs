//! Simulated outbound mail.
//!
//! Nothing is delivered: [`LogMailer`] logs each message and keeps it in an
//! outbox. Sending succeeds unless the template fails to render.

use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("Unknown template placeholder: {{{{{0}}}}}")]
    UnknownPlaceholder(String),

    #[error("Unterminated placeholder at byte {0}")]
    Unterminated(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Substitute `{{name}}` placeholders from `vars`.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> Result<String, MailError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or(MailError::Unterminated(offset + start))?;
        let name = after[..end].trim();
        let value = vars
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| *v)
            .ok_or_else(|| MailError::UnknownPlaceholder(name.to_string()))?;
        out.push_str(value);

        let consumed = start + 2 + end + 2;
        rest = &rest[consumed..];
        offset += consumed;
    }
    out.push_str(rest);
    Ok(out)
}

/// Logs messages instead of sending them.
pub struct LogMailer {
    from: String,
    outbox: Mutex<Vec<Email>>,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            outbox: Mutex::new(Vec::new()),
        }
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }

    /// Messages sent so far, oldest first.
    pub fn outbox(&self) -> Vec<Email> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

impl Mailer for LogMailer {
    fn send(&self, email: Email) -> Result<(), MailError> {
        tracing::info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            "email sent (simulated)"
        );
        tracing::debug!(body = %email.body, "email body");
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(email);
        }
        Ok(())
    }
}
