//! Shared fixtures for integration tests: a migrated in-memory store with
//! the reference rows the slip joins expect.

use chrono::{DateTime, TimeZone, Utc};
use pagotrack_core::db::open_db_in_memory;
use pagotrack_core::schedule::deadline::CIVIL_TZ;
use rusqlite::{params, Connection};

pub const CASE_A: i64 = 7001;
pub const CASE_B: i64 = 7002;
pub const REVIEWER: i64 = 3;
pub const ERROR: i64 = 12;

/// Opens a migrated in-memory database seeded with one department, one
/// reviewer, one error-catalog entry and two cases.
pub fn seeded_db() -> Connection {
    let conn = open_db_in_memory().unwrap();

    conn.execute(
        "INSERT INTO departments (department_id, name, contact_name, contact_email)
         VALUES (1, 'Secretar\u{ed}a de Obras', 'Enlace Administrativo',
                 'enlace@municipio.gob.mx');",
        [],
    )
    .unwrap();

    conn.execute(
        "INSERT INTO reviewers (reviewer_id, first_name, last_name)
         VALUES (?1, 'Laura', 'Soto');",
        params![REVIEWER],
    )
    .unwrap();

    conn.execute(
        "INSERT INTO error_catalog
            (error_id, code, short_description, legal_basis, corrective_action, category)
         VALUES (?1, 'E-12', 'Comprobante fiscal inv\u{e1}lido', 'CFF Art. 29',
                 'Reexpedir el comprobante', 'Documentaci\u{f3}n');",
        params![ERROR],
    )
    .unwrap();

    for (case_id, case_number) in [(CASE_A, "TR-2025-7001"), (CASE_B, "TR-2025-7002")] {
        conn.execute(
            "INSERT INTO cases
                (case_id, case_number, case_type, provider, concept, amount_cents,
                 department_id)
             VALUES (?1, ?2, 'Pago directo', 'Proveedora del Centro',
                     'Servicios de mantenimiento', 123456, 1);",
            params![case_id, case_number],
        )
        .unwrap();
    }

    conn
}

/// Returns the UTC instant whose Mexico City wall-clock reading is the
/// given civil date and time.
pub fn civil_utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    CIVIL_TZ
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}
