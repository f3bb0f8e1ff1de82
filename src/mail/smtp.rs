use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::agent::error::AgentError;

pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Sends application emails from the candidate's own account over
/// authenticated STARTTLS SMTP (a Gmail app password by default).
pub struct MailAgent {
    sender: String,
    password: String,
    pub smtp_server: String,
    pub smtp_port: u16,
}

impl MailAgent {
    pub fn new(sender: &str, password: &str) -> Self {
        Self {
            sender: sender.to_string(),
            password: password.to_string(),
            smtp_server: DEFAULT_SMTP_SERVER.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
        }
    }

    pub fn with_server(mut self, server: &str, port: u16) -> Self {
        self.smtp_server = server.to_string();
        self.smtp_port = port;
        self
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Compose a `multipart/mixed` message: plain-text body plus an optional
    /// file attachment.
    pub fn build_message(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> Result<Message, AgentError> {
        let from: Mailbox = self
            .sender
            .parse()
            .map_err(|e| AgentError::Mail(format!("invalid sender '{}': {}", self.sender, e)))?;
        let recipient: Mailbox = to
            .parse()
            .map_err(|e| AgentError::Mail(format!("invalid recipient '{}': {}", to, e)))?;

        let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(body.to_string()));

        if let Some(path) = attachment {
            let content = std::fs::read(path)
                .map_err(|e| AgentError::io(format!("reading attachment {}", path.display()), e))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment".to_string());
            let content_type = ContentType::parse(content_type_for(path))
                .map_err(|e| AgentError::Mail(format!("content type: {}", e)))?;
            parts = parts.singlepart(Attachment::new(filename).body(content, content_type));
        }

        Message::builder()
            .from(from)
            .to(recipient)
            .subject(subject)
            .multipart(parts)
            .map_err(|e| AgentError::Mail(format!("building message: {}", e)))
    }

    pub fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> Result<(), AgentError> {
        info!("Sending email to {}...", to);
        let message = self.build_message(to, subject, body, attachment)?;

        let mailer = SmtpTransport::starttls_relay(&self.smtp_server)
            .map_err(|e| AgentError::Mail(format!("smtp relay {}: {}", self.smtp_server, e)))?
            .port(self.smtp_port)
            .credentials(Credentials::new(self.sender.clone(), self.password.clone()))
            .build();

        mailer
            .send(&message)
            .map_err(|e| AgentError::Mail(format!("sending to {}: {}", to, e)))?;

        info!("Email sent successfully.");
        Ok(())
    }
}

pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
