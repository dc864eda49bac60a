//! Core domain logic for PagoTrack observation slips.
//! This crate is the single source of truth for business invariants.

pub mod api;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod schedule;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::slip::{
    generate_folio, NotificationKind, Slip, SlipStatus, SlipValidationError,
};
pub use notify::channel::{
    Attachment, ChannelError, GatewayConfig, HttpGatewayChannel, NotificationChannel,
    OutboundMessage,
};
pub use notify::dispatcher::{NotificationDispatcher, NotifyError, NotifyOutcome};
pub use repo::slip_repo::{
    RepoError, RepoResult, SlipListItem, SlipListQuery, SlipPatch, SlipRepository, SlipSnapshot,
    SqliteSlipRepository,
};
pub use schedule::deadline::{compute_deadline, local_civil_time, CLOSING_DAY, CUTOFF_HOUR};
pub use service::slip_service::{
    IssueSlipInput, NotificationUpdate, SlipService, SlipServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
