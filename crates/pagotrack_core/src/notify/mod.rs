//! Outbound notification: channel contract, rendering, orchestration.
//!
//! # Responsibility
//! - Define the channel collaborator boundary (`NotificationChannel`).
//! - Render slip snapshots into outbound messages.
//! - Orchestrate the notify use case end to end.
//!
//! # Invariants
//! - The core never inspects channel-specific response codes; any
//!   non-success is a channel error.
//! - A channel failure after the status transition is surfaced, never
//!   rolled back (at-least-once status, best-effort notification).

pub mod channel;
pub mod dispatcher;
pub mod render;
