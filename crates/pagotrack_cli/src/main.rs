//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `pagotrack_core` linkage and
//!   schema bootstrap.
//! - Keep output deterministic for quick local sanity checks.

use pagotrack_core::db::{migrations, open_db_in_memory};

fn main() {
    println!("pagotrack_core version={}", pagotrack_core::core_version());
    match open_db_in_memory() {
        Ok(_) => println!(
            "pagotrack_core schema_version={} status=ok",
            migrations::latest_version()
        ),
        Err(err) => {
            eprintln!("pagotrack_core schema bootstrap failed: {err}");
            std::process::exit(1);
        }
    }
}
