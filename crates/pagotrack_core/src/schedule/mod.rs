//! Civil-calendar scheduling rules.
//!
//! # Responsibility
//! - Business-day arithmetic with weekend skipping.
//! - Resolution-deadline policy for observation slips.
//!
//! # Invariants
//! - All arithmetic is pure: callers pass every instant explicitly and no
//!   function reads the system clock.
//! - Every computed deadline lands on a Monday–Friday date.

pub mod business_day;
pub mod deadline;
