//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for slips.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Slip::validate()` before SQL mutations.
//! - Every statement binds values through parameters; no value is spliced
//!   into SQL text.
//! - Repository APIs return semantic errors (`NotFound`, `FolioConflict`)
//!   in addition to DB transport errors.

pub mod slip_repo;
