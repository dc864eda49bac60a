//! Slip repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `slips` table and its joins.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Slip::validate()` before SQL mutations.
//! - Each repository operation is one transactional unit; concurrent
//!   readers never observe a half-applied operation.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::slip::{Slip, SlipStatus, SlipValidationError};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage format for civil timestamps.
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const SLIP_SELECT_SQL: &str = "SELECT
    folio,
    case_id,
    issued_at,
    deadline,
    status,
    reviewer_id,
    observation,
    legal_basis,
    error_id,
    auth_signature
FROM slips";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for slip persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(SlipValidationError),
    Db(DbError),
    /// No slip exists under the given folio.
    NotFound(String),
    /// A slip with the same folio already exists (same case, same second).
    FolioConflict(String),
    InvalidData(String),
    /// Connection has not been migrated to the supported schema version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(folio) => write!(f, "slip not found: {folio}"),
            Self::FolioConflict(folio) => {
                write!(f, "a slip with folio {folio} already exists")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted slip data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; run migrations first"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SlipValidationError> for RepoError {
    fn from(value: SlipValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Typed allow-list of updatable slip fields.
///
/// Replaces free-form key/value patching: anything not named here cannot be
/// updated through the repository, and the folio is never patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlipPatch {
    pub status: Option<SlipStatus>,
    pub issued_at: Option<NaiveDateTime>,
    pub deadline: Option<NaiveDateTime>,
    pub reviewer_id: Option<i64>,
    pub observation: Option<String>,
    pub legal_basis: Option<String>,
    /// Outer `None` leaves the stored signature untouched; `Some(None)`
    /// clears it.
    pub auth_signature: Option<Option<String>>,
}

impl SlipPatch {
    /// Whether the patch names no field at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply_to(&self, slip: &mut Slip) {
        if let Some(status) = self.status {
            slip.status = status;
        }
        if let Some(issued_at) = self.issued_at {
            slip.issued_at = issued_at;
        }
        if let Some(deadline) = self.deadline {
            slip.deadline = deadline;
        }
        if let Some(reviewer_id) = self.reviewer_id {
            slip.reviewer_id = reviewer_id;
        }
        if let Some(observation) = &self.observation {
            slip.observation = observation.clone();
        }
        if let Some(legal_basis) = &self.legal_basis {
            slip.legal_basis = legal_basis.clone();
        }
        if let Some(auth_signature) = &self.auth_signature {
            slip.auth_signature = auth_signature.clone();
        }
    }
}

/// Query options for listing slips.
#[derive(Debug, Clone, Default)]
pub struct SlipListQuery {
    pub status: Option<SlipStatus>,
    pub case_id: Option<i64>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Row shape for slip list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlipListItem {
    pub folio: String,
    pub case_id: i64,
    pub issued_at: NaiveDateTime,
    pub deadline: NaiveDateTime,
    pub status: SlipStatus,
    pub department: String,
    pub provider: String,
    pub reviewer_name: String,
}

/// Fully joined slip view used for notification rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlipSnapshot {
    pub folio: String,
    pub issued_at: NaiveDateTime,
    pub deadline: NaiveDateTime,
    pub status: SlipStatus,
    pub observation: String,
    pub legal_basis: String,
    pub auth_signature: Option<String>,
    pub case_id: i64,
    pub case_number: String,
    pub case_type: String,
    pub provider: String,
    pub concept: String,
    pub amount_cents: i64,
    pub department: String,
    pub contact_email: String,
    pub reviewer_name: String,
    pub error_code: String,
    pub error_description: String,
    pub error_legal_basis: String,
    pub corrective_action: String,
    pub error_category: String,
    /// Total slips ever issued for this case, computed at read time.
    pub case_slip_count: u32,
}

impl SlipSnapshot {
    /// Derived recurrence flag: more than one slip ever issued for the
    /// case. Never stored.
    pub fn is_recurrence(&self) -> bool {
        self.case_slip_count > 1
    }
}

/// Repository interface for slip CRUD and snapshot reads.
pub trait SlipRepository {
    fn insert_slip(&self, slip: &Slip) -> RepoResult<()>;
    fn get_slip(&self, folio: &str) -> RepoResult<Option<Slip>>;
    fn get_snapshot(&self, folio: &str) -> RepoResult<Option<SlipSnapshot>>;
    fn list_slips(&self, query: &SlipListQuery) -> RepoResult<Vec<SlipListItem>>;
    /// Applies the patch; returns affected rows (0 when the stored values
    /// already equal the patched values).
    fn update_slip(&self, folio: &str, patch: &SlipPatch) -> RepoResult<usize>;
    /// Hard delete; returns affected rows.
    fn delete_slip(&self, folio: &str) -> RepoResult<usize>;
    fn slip_count_for_case(&self, case_id: i64) -> RepoResult<u32>;
    /// Moves every open issued/notified slip with a passed deadline to
    /// `expired`; returns the affected folios.
    fn expire_overdue(&self, now: NaiveDateTime) -> RepoResult<Vec<String>>;
}

/// SQLite-backed slip repository.
#[derive(Debug)]
pub struct SqliteSlipRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSlipRepository<'conn> {
    /// Wraps a migrated connection.
    ///
    /// Rejects connections whose schema version does not match this binary
    /// or which lack the `slips` table, so later operations fail early and
    /// loudly instead of mid-request.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = crate::db::migrations::latest_version();
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        if !table_exists(conn, "slips")? {
            return Err(RepoError::MissingRequiredTable("slips"));
        }
        Ok(Self { conn })
    }
}

impl SlipRepository for SqliteSlipRepository<'_> {
    fn insert_slip(&self, slip: &Slip) -> RepoResult<()> {
        slip.validate()?;

        let result = self.conn.execute(
            "INSERT INTO slips (
                folio,
                case_id,
                issued_at,
                deadline,
                status,
                reviewer_id,
                observation,
                legal_basis,
                error_id,
                auth_signature
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                slip.folio.as_str(),
                slip.case_id,
                format_datetime(slip.issued_at),
                format_datetime(slip.deadline),
                slip.status.as_db_str(),
                slip.reviewer_id,
                slip.observation.as_str(),
                slip.legal_basis.as_str(),
                slip.error_id,
                slip.auth_signature.as_deref(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_primary_key_conflict(&err) => {
                Err(RepoError::FolioConflict(slip.folio.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get_slip(&self, folio: &str) -> RepoResult<Option<Slip>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SLIP_SELECT_SQL} WHERE folio = ?1;"))?;

        let mut rows = stmt.query(params![folio])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_slip_row(row)?));
        }
        Ok(None)
    }

    fn get_snapshot(&self, folio: &str) -> RepoResult<Option<SlipSnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                s.folio,
                s.issued_at,
                s.deadline,
                s.status,
                s.observation,
                s.legal_basis,
                s.auth_signature,
                c.case_id,
                c.case_number,
                c.case_type,
                c.provider,
                c.concept,
                c.amount_cents,
                d.name AS department,
                d.contact_email,
                r.first_name || ' ' || r.last_name AS reviewer_name,
                e.code AS error_code,
                e.short_description AS error_description,
                e.legal_basis AS error_legal_basis,
                e.corrective_action,
                e.category AS error_category,
                (SELECT COUNT(*) FROM slips s2 WHERE s2.case_id = s.case_id)
                    AS case_slip_count
            FROM slips s
            JOIN cases c ON c.case_id = s.case_id
            JOIN departments d ON d.department_id = c.department_id
            JOIN reviewers r ON r.reviewer_id = s.reviewer_id
            JOIN error_catalog e ON e.error_id = s.error_id
            WHERE s.folio = ?1;",
        )?;

        let mut rows = stmt.query(params![folio])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_snapshot_row(row)?));
        }
        Ok(None)
    }

    fn list_slips(&self, query: &SlipListQuery) -> RepoResult<Vec<SlipListItem>> {
        let mut sql = "SELECT
                s.folio,
                s.case_id,
                s.issued_at,
                s.deadline,
                s.status,
                d.name AS department,
                c.provider,
                r.first_name || ' ' || r.last_name AS reviewer_name
            FROM slips s
            JOIN cases c ON c.case_id = s.case_id
            JOIN departments d ON d.department_id = c.department_id
            JOIN reviewers r ON r.reviewer_id = s.reviewer_id
            WHERE 1 = 1"
            .to_string();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND s.status = ?");
            bind_values.push(Value::Text(status.as_db_str().to_string()));
        }
        if let Some(case_id) = query.case_id {
            sql.push_str(" AND s.case_id = ?");
            bind_values.push(Value::Integer(case_id));
        }

        sql.push_str(" ORDER BY s.issued_at DESC, s.folio ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            items.push(parse_list_row(row)?);
        }

        Ok(items)
    }

    fn update_slip(&self, folio: &str, patch: &SlipPatch) -> RepoResult<usize> {
        let tx = self.conn.unchecked_transaction()?;

        let Some(current) = get_slip_in_tx(&tx, folio)? else {
            return Err(RepoError::NotFound(folio.to_string()));
        };

        let mut updated = current.clone();
        patch.apply_to(&mut updated);
        updated.validate()?;

        // Resubmitting the stored values is a 0-row success, not an error.
        if updated == current {
            return Ok(0);
        }

        let changed = tx.execute(
            "UPDATE slips
             SET
                issued_at = ?1,
                deadline = ?2,
                status = ?3,
                reviewer_id = ?4,
                observation = ?5,
                legal_basis = ?6,
                auth_signature = ?7
             WHERE folio = ?8;",
            params![
                format_datetime(updated.issued_at),
                format_datetime(updated.deadline),
                updated.status.as_db_str(),
                updated.reviewer_id,
                updated.observation.as_str(),
                updated.legal_basis.as_str(),
                updated.auth_signature.as_deref(),
                folio,
            ],
        )?;
        tx.commit()?;

        Ok(changed)
    }

    fn delete_slip(&self, folio: &str) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM slips WHERE folio = ?1;", params![folio])?;
        if changed == 0 {
            return Err(RepoError::NotFound(folio.to_string()));
        }
        Ok(changed)
    }

    fn slip_count_for_case(&self, case_id: i64) -> RepoResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM slips WHERE case_id = ?1;",
            params![case_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn expire_overdue(&self, now: NaiveDateTime) -> RepoResult<Vec<String>> {
        let tx = self.conn.unchecked_transaction()?;
        let now_text = format_datetime(now);

        let folios = {
            let mut stmt = tx.prepare(
                "SELECT folio FROM slips
                 WHERE status IN ('issued', 'notified_email', 'notified_whatsapp')
                   AND deadline < ?1
                 ORDER BY folio ASC;",
            )?;
            let mut rows = stmt.query(params![now_text.as_str()])?;
            let mut folios: Vec<String> = Vec::new();
            while let Some(row) = rows.next()? {
                folios.push(row.get(0)?);
            }
            folios
        };

        if !folios.is_empty() {
            tx.execute(
                "UPDATE slips SET status = 'expired'
                 WHERE status IN ('issued', 'notified_email', 'notified_whatsapp')
                   AND deadline < ?1;",
                params![now_text.as_str()],
            )?;
        }
        tx.commit()?;

        Ok(folios)
    }
}

fn get_slip_in_tx(tx: &Transaction<'_>, folio: &str) -> RepoResult<Option<Slip>> {
    let mut stmt = tx.prepare(&format!("{SLIP_SELECT_SQL} WHERE folio = ?1;"))?;
    let mut rows = stmt.query(params![folio])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_slip_row(row)?));
    }
    Ok(None)
}

fn format_datetime(value: NaiveDateTime) -> String {
    value.format(DATETIME_FMT).to_string()
}

fn parse_datetime(value: &str, column: &str) -> RepoResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATETIME_FMT).map_err(|_| {
        RepoError::InvalidData(format!("invalid timestamp `{value}` in slips.{column}"))
    })
}

fn parse_status(value: &str) -> RepoResult<SlipStatus> {
    SlipStatus::parse_db_str(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{value}` in slips.status"))
    })
}

fn parse_slip_row(row: &Row<'_>) -> RepoResult<Slip> {
    let issued_at_text: String = row.get("issued_at")?;
    let deadline_text: String = row.get("deadline")?;
    let status_text: String = row.get("status")?;

    let slip = Slip {
        folio: row.get("folio")?,
        case_id: row.get("case_id")?,
        issued_at: parse_datetime(&issued_at_text, "issued_at")?,
        deadline: parse_datetime(&deadline_text, "deadline")?,
        status: parse_status(&status_text)?,
        reviewer_id: row.get("reviewer_id")?,
        observation: row.get("observation")?,
        legal_basis: row.get("legal_basis")?,
        error_id: row.get("error_id")?,
        auth_signature: row.get("auth_signature")?,
    };
    slip.validate()?;
    Ok(slip)
}

fn parse_list_row(row: &Row<'_>) -> RepoResult<SlipListItem> {
    let issued_at_text: String = row.get("issued_at")?;
    let deadline_text: String = row.get("deadline")?;
    let status_text: String = row.get("status")?;

    Ok(SlipListItem {
        folio: row.get("folio")?,
        case_id: row.get("case_id")?,
        issued_at: parse_datetime(&issued_at_text, "issued_at")?,
        deadline: parse_datetime(&deadline_text, "deadline")?,
        status: parse_status(&status_text)?,
        department: row.get("department")?,
        provider: row.get("provider")?,
        reviewer_name: row.get("reviewer_name")?,
    })
}

fn parse_snapshot_row(row: &Row<'_>) -> RepoResult<SlipSnapshot> {
    let issued_at_text: String = row.get("issued_at")?;
    let deadline_text: String = row.get("deadline")?;
    let status_text: String = row.get("status")?;

    Ok(SlipSnapshot {
        folio: row.get("folio")?,
        issued_at: parse_datetime(&issued_at_text, "issued_at")?,
        deadline: parse_datetime(&deadline_text, "deadline")?,
        status: parse_status(&status_text)?,
        observation: row.get("observation")?,
        legal_basis: row.get("legal_basis")?,
        auth_signature: row.get("auth_signature")?,
        case_id: row.get("case_id")?,
        case_number: row.get("case_number")?,
        case_type: row.get("case_type")?,
        provider: row.get("provider")?,
        concept: row.get("concept")?,
        amount_cents: row.get("amount_cents")?,
        department: row.get("department")?,
        contact_email: row.get("contact_email")?,
        reviewer_name: row.get("reviewer_name")?,
        error_code: row.get("error_code")?,
        error_description: row.get("error_description")?,
        error_legal_basis: row.get("error_legal_basis")?,
        corrective_action: row.get("corrective_action")?,
        error_category: row.get("error_category")?,
        case_slip_count: row.get("case_slip_count")?,
    })
}

// Only a primary-key collision maps to FolioConflict; foreign-key failures
// stay plain constraint errors.
fn is_primary_key_conflict(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
        params![table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
