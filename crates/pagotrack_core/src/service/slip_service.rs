//! Slip lifecycle service.
//!
//! # Responsibility
//! - Issue slips, record notifications, patch and remove slips.
//! - Enforce the status transition table and field requirements per
//!   transition.
//!
//! # Invariants
//! - The deadline is derived from the issuance instant exactly once per
//!   issue/notification; no other path recomputes it.
//! - Every operation is one repository-level transactional unit.
//! - Callers pass "now" explicitly; this service never reads the clock.

use crate::model::slip::{
    generate_folio, NotificationKind, Slip, SlipStatus, SlipValidationError,
};
use crate::repo::slip_repo::{
    RepoError, SlipListItem, SlipListQuery, SlipPatch, SlipRepository, SlipSnapshot,
};
use crate::schedule::deadline::{compute_deadline, local_civil_time};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input for issuing a new slip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSlipInput {
    pub case_id: i64,
    pub reviewer_id: i64,
    pub observation: String,
    pub legal_basis: String,
    pub error_id: i64,
}

/// Fields rewritten by a successful notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationUpdate {
    pub status: SlipStatus,
    pub issued_at: NaiveDateTime,
    pub deadline: NaiveDateTime,
}

/// Service error taxonomy for slip lifecycle operations.
#[derive(Debug)]
pub enum SlipServiceError {
    /// Missing or malformed caller input.
    Validation(SlipValidationError),
    /// The requested status change is not in the transition table.
    InvalidTransition { from: SlipStatus, to: SlipStatus },
    /// No slip exists under the folio.
    NotFound(String),
    /// Folio collision: same case issued twice within one second.
    FolioConflict(String),
    /// Store operation failed.
    Persistence(RepoError),
}

impl Display for SlipServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidTransition { from, to } => {
                write!(f, "status transition {from} -> {to} is not allowed")
            }
            Self::NotFound(folio) => write!(f, "slip not found: {folio}"),
            Self::FolioConflict(folio) => {
                write!(f, "a slip with folio {folio} already exists; retry the issue")
            }
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SlipServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SlipServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(folio) => Self::NotFound(folio),
            RepoError::FolioConflict(folio) => Self::FolioConflict(folio),
            other => Self::Persistence(other),
        }
    }
}

impl From<SlipValidationError> for SlipServiceError {
    fn from(value: SlipValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Lifecycle service over a slip repository.
pub struct SlipService<R: SlipRepository> {
    repo: R,
}

impl<R: SlipRepository> SlipService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Issues a new slip for a case.
    ///
    /// The folio and the deadline are both derived from the civil issuance
    /// instant. Initial status is `Created`; the formal issue/notify step
    /// advances it.
    pub fn issue(
        &self,
        input: &IssueSlipInput,
        now: DateTime<Utc>,
    ) -> Result<Slip, SlipServiceError> {
        let issued_at = local_civil_time(now);
        let slip = Slip {
            folio: generate_folio(issued_at, input.case_id),
            case_id: input.case_id,
            issued_at,
            deadline: compute_deadline(issued_at),
            status: SlipStatus::Created,
            reviewer_id: input.reviewer_id,
            observation: input.observation.clone(),
            legal_basis: input.legal_basis.clone(),
            error_id: input.error_id,
            auth_signature: None,
        };
        slip.validate()?;
        self.repo.insert_slip(&slip)?;

        info!(
            "event=slip_issued module=service status=ok folio={} case_id={} deadline={}",
            slip.folio, slip.case_id, slip.deadline
        );
        Ok(slip)
    }

    /// Records a notification on an existing slip.
    ///
    /// Re-stamps the issuance instant to "now", recomputes the deadline
    /// from it, moves the status to the channel-specific notified state and
    /// writes the authorization signature as given: a notification without
    /// a signature clears any previously stored one.
    pub fn record_notification(
        &self,
        folio: &str,
        kind: NotificationKind,
        auth_signature: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<NotificationUpdate, SlipServiceError> {
        let slip = self
            .repo
            .get_slip(folio)?
            .ok_or_else(|| SlipServiceError::NotFound(folio.to_string()))?;

        let next = kind.notified_status();
        if !slip.status.can_transition_to(next) {
            return Err(SlipServiceError::InvalidTransition {
                from: slip.status,
                to: next,
            });
        }

        let issued_at = local_civil_time(now);
        let deadline = compute_deadline(issued_at);
        let patch = SlipPatch {
            status: Some(next),
            issued_at: Some(issued_at),
            deadline: Some(deadline),
            auth_signature: Some(auth_signature),
            ..SlipPatch::default()
        };
        self.repo.update_slip(folio, &patch)?;

        info!(
            "event=notification_recorded module=service status=ok folio={} channel={} deadline={}",
            folio,
            next.as_db_str(),
            deadline
        );
        Ok(NotificationUpdate {
            status: next,
            issued_at,
            deadline,
        })
    }

    /// Applies a typed field patch to an existing slip.
    ///
    /// Status changes inside the patch are checked against the transition
    /// table. Resubmitting the stored values returns `Ok(0)`.
    pub fn update(&self, folio: &str, patch: &SlipPatch) -> Result<usize, SlipServiceError> {
        if patch.is_empty() {
            return Err(SlipServiceError::Validation(
                SlipValidationError::InvalidField {
                    field: "patch",
                    reason: "no updatable fields provided".to_string(),
                },
            ));
        }

        if let Some(next) = patch.status {
            let slip = self
                .repo
                .get_slip(folio)?
                .ok_or_else(|| SlipServiceError::NotFound(folio.to_string()))?;
            if next != slip.status && !slip.status.can_transition_to(next) {
                return Err(SlipServiceError::InvalidTransition {
                    from: slip.status,
                    to: next,
                });
            }
        }

        Ok(self.repo.update_slip(folio, patch)?)
    }

    /// Hard-deletes a slip. Administrative removal, not a lifecycle state.
    pub fn remove(&self, folio: &str) -> Result<usize, SlipServiceError> {
        let removed = self.repo.delete_slip(folio)?;
        info!(
            "event=slip_removed module=service status=ok folio={}",
            folio
        );
        Ok(removed)
    }

    /// Fetches one slip by folio.
    pub fn get(&self, folio: &str) -> Result<Option<Slip>, SlipServiceError> {
        Ok(self.repo.get_slip(folio)?)
    }

    /// Fetches the fully joined rendering snapshot for one slip.
    pub fn get_snapshot(&self, folio: &str) -> Result<Option<SlipSnapshot>, SlipServiceError> {
        Ok(self.repo.get_snapshot(folio)?)
    }

    /// Lists slips using filter and pagination options.
    pub fn list(&self, query: &SlipListQuery) -> Result<Vec<SlipListItem>, SlipServiceError> {
        Ok(self.repo.list_slips(query)?)
    }

    /// Expires every open issued/notified slip whose deadline has passed.
    ///
    /// Returns the affected folios.
    pub fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<String>, SlipServiceError> {
        let civil_now = local_civil_time(now);
        let folios = self.repo.expire_overdue(civil_now)?;
        if !folios.is_empty() {
            info!(
                "event=slips_expired module=service status=ok count={}",
                folios.len()
            );
        }
        Ok(folios)
    }
}
