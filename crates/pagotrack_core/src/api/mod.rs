//! Boundary command contract for the surrounding service.
//!
//! # Responsibility
//! - Expose structured commands (`issue_slip`, `notify`, `list_slips`,
//!   `get_slip`, `update_slip`, `delete_slip`, `expire_overdue`) over plain
//!   serde data.
//! - Map internal error kinds to standard failure categories.
//!
//! # Invariants
//! - Request types reject unknown fields at deserialization time.
//! - The folio, issuance timestamp and deadline are never patchable from
//!   the boundary; only lifecycle operations derive them.
//! - Every failure carries a category plus a human-readable message.

use crate::model::slip::{NotificationKind, Slip, SlipStatus};
use crate::notify::channel::NotificationChannel;
use crate::notify::dispatcher::{NotificationDispatcher, NotifyError};
use crate::repo::slip_repo::{
    SlipListItem, SlipListQuery, SlipPatch, SlipRepository, SlipSnapshot,
};
use crate::service::slip_service::{IssueSlipInput, SlipService, SlipServiceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Standard failure categories for boundary adapters.
///
/// An HTTP adapter maps these to 400/404/503/500 respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    BadRequest,
    NotFound,
    Unavailable,
    Internal,
}

impl ErrorCategory {
    /// Conventional HTTP status code for this category.
    pub fn http_status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Unavailable => 503,
            Self::Internal => 500,
        }
    }
}

/// Boundary-level failure: category plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub category: ErrorCategory,
    pub message: String,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<SlipServiceError> for ApiError {
    fn from(value: SlipServiceError) -> Self {
        let category = match &value {
            SlipServiceError::Validation(_) | SlipServiceError::InvalidTransition { .. } => {
                ErrorCategory::BadRequest
            }
            SlipServiceError::NotFound(_) => ErrorCategory::NotFound,
            // A folio collision is retryable caller-side, not a caller bug.
            SlipServiceError::FolioConflict(_) => ErrorCategory::Unavailable,
            SlipServiceError::Persistence(_) => ErrorCategory::Internal,
        };
        Self {
            category,
            message: value.to_string(),
        }
    }
}

impl From<NotifyError> for ApiError {
    fn from(value: NotifyError) -> Self {
        match value {
            NotifyError::Service(err) => err.into(),
            NotifyError::Channel(err) => Self {
                category: ErrorCategory::Unavailable,
                message: err.to_string(),
            },
            other @ (NotifyError::InvalidRecipient(_) | NotifyError::MissingAttachment) => Self {
                category: ErrorCategory::BadRequest,
                message: other.to_string(),
            },
        }
    }
}

/// Command payload for issuing a new slip.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssueSlipRequest {
    pub case_id: i64,
    pub reviewer_id: i64,
    pub observation: String,
    pub legal_basis: String,
    pub error_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueSlipResponse {
    pub message: String,
    pub slip: Slip,
}

/// Command payload for notifying a slip's responsible party.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyRequest {
    pub folio: String,
    pub channel: NotificationKind,
    #[serde(default)]
    pub auth_signature: Option<String>,
    /// Overrides the department contact address when present.
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotifyResponse {
    pub message: String,
    pub folio: String,
    pub recipient: String,
    pub status: SlipStatus,
    pub issued_at: chrono::NaiveDateTime,
    pub deadline: chrono::NaiveDateTime,
}

/// Command payload for listing slips.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListSlipsRequest {
    #[serde(default)]
    pub status: Option<SlipStatus>,
    #[serde(default)]
    pub case_id: Option<i64>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListSlipsResponse {
    pub message: String,
    pub items: Vec<SlipListItem>,
}

/// Command payload for fetching one slip snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetSlipRequest {
    pub folio: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetSlipResponse {
    pub message: String,
    pub slip: SlipSnapshot,
}

/// Command payload for patching a slip.
///
/// The allow-list is explicit: fields absent here (folio, issuance
/// timestamp, deadline, case, error reference) cannot be updated through
/// the boundary, and unknown keys fail deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSlipRequest {
    pub folio: String,
    #[serde(default)]
    pub status: Option<SlipStatus>,
    #[serde(default)]
    pub reviewer_id: Option<i64>,
    #[serde(default)]
    pub observation: Option<String>,
    #[serde(default)]
    pub legal_basis: Option<String>,
    /// Sets the signature when present; clearing happens through the
    /// notification flow, not through this patch.
    #[serde(default)]
    pub auth_signature: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateSlipResponse {
    pub message: String,
    pub rows_affected: usize,
}

/// Command payload for deleting a slip.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteSlipRequest {
    pub folio: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteSlipResponse {
    pub message: String,
    pub rows_affected: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpireOverdueResponse {
    pub message: String,
    pub folios: Vec<String>,
}

/// Issues a new observation slip.
pub fn issue_slip<R: SlipRepository>(
    service: &SlipService<R>,
    request: &IssueSlipRequest,
    now: DateTime<Utc>,
) -> Result<IssueSlipResponse, ApiError> {
    let input = IssueSlipInput {
        case_id: request.case_id,
        reviewer_id: request.reviewer_id,
        observation: request.observation.clone(),
        legal_basis: request.legal_basis.clone(),
        error_id: request.error_id,
    };
    let slip = service.issue(&input, now)?;
    Ok(IssueSlipResponse {
        message: format!("slip {} issued", slip.folio),
        slip,
    })
}

/// Notifies the responsible party for a slip.
pub fn notify<R: SlipRepository, C: NotificationChannel>(
    dispatcher: &NotificationDispatcher<R, C>,
    request: &NotifyRequest,
    now: DateTime<Utc>,
) -> Result<NotifyResponse, ApiError> {
    let outcome = dispatcher.notify(
        &request.folio,
        request.channel,
        request.auth_signature.clone(),
        request.recipient.as_deref(),
        now,
    )?;
    Ok(NotifyResponse {
        message: format!("notification sent for slip {}", outcome.folio),
        folio: outcome.folio,
        recipient: outcome.recipient,
        status: outcome.update.status,
        issued_at: outcome.update.issued_at,
        deadline: outcome.update.deadline,
    })
}

/// Lists slips with optional filters.
pub fn list_slips<R: SlipRepository>(
    service: &SlipService<R>,
    request: &ListSlipsRequest,
) -> Result<ListSlipsResponse, ApiError> {
    let query = SlipListQuery {
        status: request.status,
        case_id: request.case_id,
        limit: request.limit,
        offset: request.offset.unwrap_or(0),
    };
    let items = service.list(&query)?;
    Ok(ListSlipsResponse {
        message: format!("{} slips", items.len()),
        items,
    })
}

/// Fetches the joined snapshot for one slip.
pub fn get_slip<R: SlipRepository>(
    service: &SlipService<R>,
    request: &GetSlipRequest,
) -> Result<GetSlipResponse, ApiError> {
    let slip = service
        .get_snapshot(&request.folio)?
        .ok_or_else(|| ApiError::from(SlipServiceError::NotFound(request.folio.clone())))?;
    Ok(GetSlipResponse {
        message: format!("slip {}", slip.folio),
        slip,
    })
}

/// Patches a slip through the typed allow-list.
pub fn update_slip<R: SlipRepository>(
    service: &SlipService<R>,
    request: &UpdateSlipRequest,
) -> Result<UpdateSlipResponse, ApiError> {
    let patch = SlipPatch {
        status: request.status,
        reviewer_id: request.reviewer_id,
        observation: request.observation.clone(),
        legal_basis: request.legal_basis.clone(),
        auth_signature: request.auth_signature.clone().map(Some),
        ..SlipPatch::default()
    };
    let rows_affected = service.update(&request.folio, &patch)?;
    let message = if rows_affected == 0 {
        "no changes: submitted values already stored".to_string()
    } else {
        format!("slip {} updated", request.folio)
    };
    Ok(UpdateSlipResponse {
        message,
        rows_affected,
    })
}

/// Hard-deletes a slip.
pub fn delete_slip<R: SlipRepository>(
    service: &SlipService<R>,
    request: &DeleteSlipRequest,
) -> Result<DeleteSlipResponse, ApiError> {
    let rows_affected = service.remove(&request.folio)?;
    Ok(DeleteSlipResponse {
        message: format!("slip {} deleted", request.folio),
        rows_affected,
    })
}

/// Expires every open slip with a passed deadline.
pub fn expire_overdue<R: SlipRepository>(
    service: &SlipService<R>,
    now: DateTime<Utc>,
) -> Result<ExpireOverdueResponse, ApiError> {
    let folios = service.expire_overdue(now)?;
    Ok(ExpireOverdueResponse {
        message: format!("{} slips expired", folios.len()),
        folios,
    })
}
