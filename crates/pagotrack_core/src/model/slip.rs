//! Observation-slip domain record.
//!
//! # Responsibility
//! - Define the canonical slip record persisted per issued observation.
//! - Own the status state machine and folio generation.
//!
//! # Invariants
//! - `folio` is globally unique and never reused or rewritten.
//! - Status changes pass through `SlipStatus::can_transition_to`.
//! - The deadline is written at issuance (or re-notification) and nowhere
//!   else.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lifecycle state of an observation slip.
///
/// Storage labels are snake_case (`created`, `issued`, ...). `Resolved` and
/// `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlipStatus {
    /// Registered but not yet formally issued to the responsible party.
    Created,
    /// Formally issued; the resolution term is running.
    Issued,
    /// Stakeholders notified through the email gateway.
    NotifiedEmail,
    /// Stakeholders notified through the WhatsApp channel.
    NotifiedWhatsApp,
    /// Observations answered before the deadline.
    Resolved,
    /// Deadline passed without resolution.
    Expired,
}

impl SlipStatus {
    /// Storage label for this status.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Issued => "issued",
            Self::NotifiedEmail => "notified_email",
            Self::NotifiedWhatsApp => "notified_whatsapp",
            Self::Resolved => "resolved",
            Self::Expired => "expired",
        }
    }

    /// Parses a storage label back into a status.
    pub fn parse_db_str(value: &str) -> Option<Self> {
        match value {
            "created" => Some(Self::Created),
            "issued" => Some(Self::Issued),
            "notified_email" => Some(Self::NotifiedEmail),
            "notified_whatsapp" => Some(Self::NotifiedWhatsApp),
            "resolved" => Some(Self::Resolved),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// Authoritative transition table.
    ///
    /// Notification is allowed straight from `Created` because issuing and
    /// notifying happen as one business act at the treasury counter.
    /// Re-notification (a notified state to a notified state, itself
    /// included) is an explicit, permitted transition.
    pub fn can_transition_to(self, next: SlipStatus) -> bool {
        use SlipStatus::*;
        match self {
            Created => matches!(next, Issued | NotifiedEmail | NotifiedWhatsApp),
            Issued => matches!(next, NotifiedEmail | NotifiedWhatsApp | Resolved | Expired),
            NotifiedEmail | NotifiedWhatsApp => {
                matches!(next, NotifiedEmail | NotifiedWhatsApp | Resolved | Expired)
            }
            Resolved | Expired => false,
        }
    }

    /// Whether the slip still counts toward an unresolved observation.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            Self::Created | Self::Issued | Self::NotifiedEmail | Self::NotifiedWhatsApp
        )
    }
}

impl Display for SlipStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// Outbound notification channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Email,
    WhatsApp,
}

impl NotificationKind {
    /// Status recorded after a successful notification on this channel.
    pub fn notified_status(self) -> SlipStatus {
        match self {
            Self::Email => SlipStatus::NotifiedEmail,
            Self::WhatsApp => SlipStatus::NotifiedWhatsApp,
        }
    }
}

/// Canonical observation-slip record.
///
/// Plain data holder; store access lives in the repository layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slip {
    /// Unique folio, `VO` + issuance stamp + case id. Immutable.
    pub folio: String,
    /// Case (trámite) under review.
    pub case_id: i64,
    /// Civil issuance timestamp (America/Mexico_City wall clock).
    pub issued_at: NaiveDateTime,
    /// Civil resolution deadline, derived from `issued_at` once.
    pub deadline: NaiveDateTime,
    pub status: SlipStatus,
    /// Reviewer (glosador) who raised the observation.
    pub reviewer_id: i64,
    /// Free-text observation body.
    pub observation: String,
    /// Legal basis quoted on this particular slip.
    pub legal_basis: String,
    /// Error-catalog entry backing the observation.
    pub error_id: i64,
    /// Authorization signature captured at notification time, when given.
    pub auth_signature: Option<String>,
}

/// Validation failure for slip input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlipValidationError {
    /// A required field is missing or blank.
    MissingField(&'static str),
    /// A field is present but malformed.
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

impl Display for SlipValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field `{field}` is missing or empty"),
            Self::InvalidField { field, reason } => {
                write!(f, "invalid field `{field}`: {reason}")
            }
        }
    }
}

impl Error for SlipValidationError {}

impl Slip {
    /// Validates invariants that must hold before any persistence write.
    pub fn validate(&self) -> Result<(), SlipValidationError> {
        if self.folio.trim().is_empty() {
            return Err(SlipValidationError::MissingField("folio"));
        }
        if self.case_id <= 0 {
            return Err(SlipValidationError::InvalidField {
                field: "case_id",
                reason: "must be a positive case identifier".to_string(),
            });
        }
        if self.reviewer_id <= 0 {
            return Err(SlipValidationError::InvalidField {
                field: "reviewer_id",
                reason: "must be a positive reviewer identifier".to_string(),
            });
        }
        if self.observation.trim().is_empty() {
            return Err(SlipValidationError::MissingField("observation"));
        }
        if self.legal_basis.trim().is_empty() {
            return Err(SlipValidationError::MissingField("legal_basis"));
        }
        if self.error_id <= 0 {
            return Err(SlipValidationError::InvalidField {
                field: "error_id",
                reason: "must be a positive error-catalog identifier".to_string(),
            });
        }
        Ok(())
    }
}

/// Generates the folio for a slip issued at `issued_at` (civil time).
///
/// Wire format: `VO` + `%m%d%H%M%S` + case id. Two slips for the same case
/// issued within the same second collide by construction; the repository
/// surfaces that as a distinct folio-conflict error rather than masking it.
pub fn generate_folio(issued_at: NaiveDateTime, case_id: i64) -> String {
    format!("VO{}{}", issued_at.format("%m%d%H%M%S"), case_id)
}
