//! Notification dispatch orchestration.
//!
//! # Responsibility
//! - Run the notify use case: persist the transition, fetch the snapshot,
//!   render and ship the message.
//!
//! # Invariants
//! - The status transition is committed before the channel send; a channel
//!   failure never rolls it back.
//! - No automatic retries; resilience policy belongs to the caller.

use crate::model::slip::NotificationKind;
use crate::notify::channel::{Attachment, ChannelError, NotificationChannel, OutboundMessage};
use crate::notify::render::render_notification;
use crate::repo::slip_repo::SlipRepository;
use crate::service::slip_service::{NotificationUpdate, SlipService, SlipServiceError};
use chrono::{DateTime, Utc};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Dispatch error taxonomy.
#[derive(Debug)]
pub enum NotifyError {
    /// Lifecycle/persistence failure before or after the send.
    Service(SlipServiceError),
    /// The outbound channel failed; the status transition already
    /// committed.
    Channel(ChannelError),
    /// The resolved recipient is not a plausible email address.
    InvalidRecipient(String),
    /// A bulletin requires a non-empty attachment.
    MissingAttachment,
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{err}"),
            Self::Channel(err) => write!(f, "{err}"),
            Self::InvalidRecipient(recipient) => {
                write!(f, "invalid recipient address: `{recipient}`")
            }
            Self::MissingAttachment => {
                write!(f, "a bulletin requires a non-empty file attachment")
            }
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            Self::Channel(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SlipServiceError> for NotifyError {
    fn from(value: SlipServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<ChannelError> for NotifyError {
    fn from(value: ChannelError) -> Self {
        Self::Channel(value)
    }
}

/// Result of a successful notify run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub folio: String,
    pub recipient: String,
    pub update: NotificationUpdate,
}

/// Orchestrates deadline computation, status persistence and delivery.
pub struct NotificationDispatcher<R: SlipRepository, C: NotificationChannel> {
    service: SlipService<R>,
    channel: C,
    cc: Vec<String>,
}

impl<R: SlipRepository, C: NotificationChannel> NotificationDispatcher<R, C> {
    /// Creates a dispatcher over a lifecycle service and a channel.
    pub fn new(service: SlipService<R>, channel: C) -> Self {
        Self {
            service,
            channel,
            cc: Vec::new(),
        }
    }

    /// Sets the fixed carbon-copy list attached to every notification.
    pub fn with_cc(mut self, cc: Vec<String>) -> Self {
        self.cc = cc;
        self
    }

    /// Lifecycle service access for non-notify operations.
    pub fn service(&self) -> &SlipService<R> {
        &self.service
    }

    /// Outbound channel access.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Notifies the responsible party about a slip.
    ///
    /// An explicit `recipient` is validated up front, before any state is
    /// written. Order: (a)+(b) persist the notified transition with a
    /// freshly computed deadline, (c) fetch the joined snapshot, (d) render
    /// and send. When the snapshot vanished between (b) and (c) (the slip
    /// was deleted concurrently), the committed transition stays committed
    /// and a not-found error is returned.
    pub fn notify(
        &self,
        folio: &str,
        kind: NotificationKind,
        auth_signature: Option<String>,
        recipient: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<NotifyOutcome, NotifyError> {
        if let Some(to) = recipient {
            if !EMAIL_RE.is_match(to) {
                return Err(NotifyError::InvalidRecipient(to.to_string()));
            }
        }

        let update = self
            .service
            .record_notification(folio, kind, auth_signature, now)?;

        let snapshot = self
            .service
            .get_snapshot(folio)?
            .ok_or_else(|| NotifyError::Service(SlipServiceError::NotFound(folio.to_string())))?;

        let to = recipient.unwrap_or(snapshot.contact_email.as_str());
        if !EMAIL_RE.is_match(to) {
            return Err(NotifyError::InvalidRecipient(to.to_string()));
        }

        let message = render_notification(&snapshot, to, &self.cc);
        if let Err(err) = self.channel.send(&message) {
            error!(
                "event=notification_send module=notify status=error folio={} recipient={} error={}",
                folio, to, err
            );
            return Err(err.into());
        }

        info!(
            "event=notification_send module=notify status=ok folio={} recipient={} deadline={}",
            folio, to, update.deadline
        );
        Ok(NotifyOutcome {
            folio: folio.to_string(),
            recipient: to.to_string(),
            update,
        })
    }

    /// Sends a standalone informational bulletin with one attachment.
    ///
    /// Does not touch any slip state.
    pub fn send_bulletin(
        &self,
        recipient: &str,
        subject: &str,
        body_html: &str,
        body_text: &str,
        attachment: Attachment,
    ) -> Result<(), NotifyError> {
        if !EMAIL_RE.is_match(recipient) {
            return Err(NotifyError::InvalidRecipient(recipient.to_string()));
        }
        if attachment.bytes.is_empty() {
            return Err(NotifyError::MissingAttachment);
        }

        let message = OutboundMessage {
            to: recipient.to_string(),
            cc: self.cc.clone(),
            subject: subject.to_string(),
            html_body: body_html.to_string(),
            text_body: body_text.to_string(),
            attachments: vec![attachment],
        };
        self.channel.send(&message)?;

        info!(
            "event=bulletin_send module=notify status=ok recipient={}",
            recipient
        );
        Ok(())
    }
}
