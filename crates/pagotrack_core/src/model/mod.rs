//! Domain model for observation slips.
//!
//! # Responsibility
//! - Define the canonical slip record and its status taxonomy.
//! - Keep the status transition table in one authoritative place.
//!
//! # Invariants
//! - A slip's folio is immutable once generated.
//! - No status value exists outside [`slip::SlipStatus`].

pub mod slip;
