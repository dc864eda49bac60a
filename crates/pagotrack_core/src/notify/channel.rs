//! Notification channel contract and HTTP gateway implementation.
//!
//! # Responsibility
//! - Define the outbound message shape and the channel trait.
//! - Ship messages through the institutional HTTP mail gateway.
//!
//! # Invariants
//! - `send` treats any non-2xx gateway response as failure.
//! - Gateway credentials travel only in headers, never in the URL.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const ENDPOINT_ENV: &str = "PAGOTRACK_MAIL_ENDPOINT";
const USER_ENV: &str = "PAGOTRACK_MAIL_USER";
const PASS_ENV: &str = "PAGOTRACK_MAIL_PASS";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// File attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Channel-agnostic outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub cc: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub attachments: Vec<Attachment>,
}

/// Channel-layer error.
#[derive(Debug)]
pub enum ChannelError {
    /// Missing or malformed channel configuration.
    Config(String),
    /// The message cannot be encoded for this channel.
    InvalidMessage(String),
    /// Network-level failure or timeout.
    Transport(String),
    /// The gateway answered with a non-success status.
    Rejected { status: u16, message: String },
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) => write!(f, "channel configuration error: {message}"),
            Self::InvalidMessage(message) => write!(f, "invalid outbound message: {message}"),
            Self::Transport(message) => write!(f, "channel transport failure: {message}"),
            Self::Rejected { status, message } => {
                write!(f, "gateway rejected the message (status {status}): {message}")
            }
        }
    }
}

impl Error for ChannelError {}

/// Outbound-notification collaborator boundary.
///
/// Implementations deliver the message or fail; the core never interprets
/// channel-specific codes beyond success/failure.
pub trait NotificationChannel {
    fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError>;
}

/// Configuration for [`HttpGatewayChannel`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub api_user: String,
    pub api_pass: String,
}

impl GatewayConfig {
    /// Builds a config from explicit values.
    ///
    /// # Errors
    /// Returns a `Config` error when any value is blank.
    pub fn new(
        endpoint: impl Into<String>,
        api_user: impl Into<String>,
        api_pass: impl Into<String>,
    ) -> Result<Self, ChannelError> {
        let config = Self {
            endpoint: endpoint.into(),
            api_user: api_user.into(),
            api_pass: api_pass.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads the gateway configuration from environment variables
    /// (`PAGOTRACK_MAIL_ENDPOINT`, `PAGOTRACK_MAIL_USER`,
    /// `PAGOTRACK_MAIL_PASS`).
    pub fn from_env() -> Result<Self, ChannelError> {
        let read = |name: &str| {
            std::env::var(name)
                .map_err(|_| ChannelError::Config(format!("environment variable {name} is not set")))
        };
        Self::new(read(ENDPOINT_ENV)?, read(USER_ENV)?, read(PASS_ENV)?)
    }

    fn validate(&self) -> Result<(), ChannelError> {
        if self.endpoint.trim().is_empty() {
            return Err(ChannelError::Config("endpoint must not be empty".to_string()));
        }
        if self.api_user.trim().is_empty() {
            return Err(ChannelError::Config("api_user must not be empty".to_string()));
        }
        if self.api_pass.trim().is_empty() {
            return Err(ChannelError::Config("api_pass must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Channel implementation for the institutional mail gateway.
///
/// The gateway accepts a multipart POST with `to`, `cc`, `subject`, `body`,
/// `altbody` and optional `fileN` parts, authenticated through
/// `X-API-USER` / `X-API-PASS` headers.
pub struct HttpGatewayChannel {
    config: GatewayConfig,
    client: reqwest::blocking::Client,
}

impl HttpGatewayChannel {
    /// Creates a channel with connection and request timeouts.
    ///
    /// # Errors
    /// Returns a `Config` error when the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, ChannelError> {
        config.validate()?;
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ChannelError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { config, client })
    }
}

impl NotificationChannel for HttpGatewayChannel {
    fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let mut form = reqwest::blocking::multipart::Form::new()
            .text("to", message.to.clone())
            .text("cc", message.cc.join(","))
            .text("subject", message.subject.clone())
            .text("body", message.html_body.clone())
            .text("altbody", message.text_body.clone());

        for (index, attachment) in message.attachments.iter().enumerate() {
            let part = reqwest::blocking::multipart::Part::bytes(attachment.bytes.clone())
                .file_name(attachment.file_name.clone())
                .mime_str(&attachment.mime_type)
                .map_err(|err| {
                    ChannelError::InvalidMessage(format!(
                        "attachment `{}` has an invalid MIME type: {err}",
                        attachment.file_name
                    ))
                })?;
            form = form.part(format!("file{}", index + 1), part);
        }

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("X-API-USER", &self.config.api_user)
            .header("X-API-PASS", &self.config.api_pass)
            .multipart(form)
            .send()
            .map_err(|err| ChannelError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(ChannelError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
