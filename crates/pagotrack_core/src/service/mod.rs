//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce the slip status state machine on every mutation.

pub mod slip_service;
