//! Storage layer for checkdesk
//!
//! A single SQLite database holds every entity. `Storage` owns the
//! connection and hands out repositories that borrow it, together with
//! the audit log of the acting user.

pub mod banks;
pub mod checks;
pub mod clients;
pub mod exports;
pub mod init;
pub mod notifications;
pub mod schema;
pub mod users;

pub use banks::{BankRepository, BranchRepository};
pub use checks::{CheckFilter, CheckRepository, CheckSort};
pub use clients::ClientRepository;
pub use exports::ExportRepository;
pub use init::initialize_storage;
pub use notifications::NotificationRepository;
pub use users::UserRepository;

use std::path::Path;
use std::time::{Duration, Instant};

use log::{error, info};
use rusqlite::types::FromSql;
use rusqlite::Connection;
use serde::Serialize;

use crate::audit::{generate_diff, AuditEntry, AuditLogger, EntityType};
use crate::config::paths::CheckdeskPaths;
use crate::error::{CheckdeskError, CheckdeskResult};

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    conn: Connection,
    paths: Option<CheckdeskPaths>,
    audit: Option<AuditLogger>,
    actor: Option<String>,
}

impl Storage {
    /// Open (creating if needed) the database under `paths` and migrate it
    pub fn open(paths: CheckdeskPaths) -> CheckdeskResult<Self> {
        paths.ensure_directories()?;
        let conn = open_connection(&paths.database_file())?;
        let audit = AuditLogger::new(paths.audit_log());

        Ok(Self {
            conn,
            paths: Some(paths),
            audit: Some(audit),
            actor: None,
        })
    }

    /// Open a fresh in-memory database without an audit log
    pub fn open_in_memory() -> CheckdeskResult<Self> {
        let started_at = Instant::now();
        let mut conn = Connection::open_in_memory()?;
        bootstrap_connection(&mut conn)?;
        info!(
            "event=db_open status=ok mode=memory duration_ms={}",
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            conn,
            paths: None,
            audit: None,
            actor: None,
        })
    }

    /// Attach an audit log file
    pub fn with_audit_log(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.audit = Some(AuditLogger::new(path.into()));
        self
    }

    /// Set the username recorded in audit entries
    pub fn set_actor(&mut self, username: Option<String>) {
        self.actor = username;
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Paths of an on-disk database
    pub fn paths(&self) -> Option<&CheckdeskPaths> {
        self.paths.as_ref()
    }

    pub fn audit(&self) -> Option<&AuditLogger> {
        self.audit.as_ref()
    }

    pub fn banks(&self) -> BankRepository<'_> {
        BankRepository::new(&self.conn)
    }

    pub fn branches(&self) -> BranchRepository<'_> {
        BranchRepository::new(&self.conn)
    }

    pub fn clients(&self) -> ClientRepository<'_> {
        ClientRepository::new(&self.conn)
    }

    pub fn checks(&self) -> CheckRepository<'_> {
        CheckRepository::new(&self.conn)
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.conn)
    }

    pub fn notifications(&self) -> NotificationRepository<'_> {
        NotificationRepository::new(&self.conn)
    }

    pub fn exports(&self) -> ExportRepository<'_> {
        ExportRepository::new(&self.conn)
    }

    /// Current schema version of the open database
    pub fn schema_version(&self) -> CheckdeskResult<u32> {
        schema::current_version(&self.conn)
    }

    /// Record a create in the audit log
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> CheckdeskResult<()> {
        let entry = AuditEntry::create(entity_type, entity_id, entity_name, entity);
        self.write_audit(entry)
    }

    /// Record an update in the audit log, with a diff of the changed fields
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> CheckdeskResult<()> {
        let diff = match (serde_json::to_value(before), serde_json::to_value(after)) {
            (Ok(b), Ok(a)) => generate_diff(&b, &a),
            _ => None,
        };
        let entry = AuditEntry::update(entity_type, entity_id, entity_name, before, after, diff);
        self.write_audit(entry)
    }

    /// Record a delete in the audit log
    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> CheckdeskResult<()> {
        let entry = AuditEntry::delete(entity_type, entity_id, entity_name, entity);
        self.write_audit(entry)
    }

    fn write_audit(&self, entry: AuditEntry) -> CheckdeskResult<()> {
        match &self.audit {
            Some(logger) => logger.log(&entry.by(self.actor.clone())),
            None => Ok(()),
        }
    }
}

fn open_connection(path: &Path) -> CheckdeskResult<Connection> {
    let started_at = Instant::now();

    let mut conn = Connection::open(path).map_err(|e| {
        error!(
            "event=db_open status=error mode=file duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            e
        );
        CheckdeskError::Storage(format!("Failed to open {}: {}", path.display(), e))
    })?;

    if let Err(e) = bootstrap_connection(&mut conn) {
        error!(
            "event=db_open status=error mode=file duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            e
        );
        return Err(e);
    }

    info!(
        "event=db_open status=ok mode=file duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap_connection(conn: &mut Connection) -> CheckdeskResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    schema::apply_migrations(conn)?;
    Ok(())
}

/// Translate constraint failures into domain errors
pub(crate) fn map_constraint(
    err: rusqlite::Error,
    entity_type: &'static str,
    identifier: &str,
) -> CheckdeskError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        let code = failure.extended_code;
        if code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            || code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        {
            return CheckdeskError::Duplicate {
                entity_type,
                identifier: identifier.to_string(),
            };
        }
        if code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
            return CheckdeskError::Validation(format!(
                "{} '{}' references a missing record or is still referenced",
                entity_type, identifier
            ));
        }
        if code == rusqlite::ffi::SQLITE_CONSTRAINT_CHECK
            || code == rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL
        {
            return CheckdeskError::Validation(format!(
                "{} '{}' violates a data constraint",
                entity_type, identifier
            ));
        }
    }
    err.into()
}

/// Resolve a full or partial hexadecimal id against `table`
///
/// Returns `Ok(None)` when nothing matches and a validation error when the
/// prefix is ambiguous.
pub(crate) fn resolve_id_prefix<T: FromSql>(
    conn: &Connection,
    table: &'static str,
    fragment: &str,
) -> CheckdeskResult<Option<T>> {
    let fragment = fragment.trim().to_lowercase();
    if fragment.len() < 4 || !fragment.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        return Ok(None);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM {} WHERE id LIKE ?1 || '%' LIMIT 2",
        table
    ))?;
    let mut ids = stmt
        .query_map([&fragment], |row| row.get::<_, T>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    match ids.len() {
        0 => Ok(None),
        1 => Ok(ids.pop()),
        _ => Err(CheckdeskError::Validation(format!(
            "Ambiguous id '{}': several records match",
            fragment
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

/// Read a TEXT column through an enum's `parse` function
pub(crate) fn parse_column<T>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unexpected value '{}'", raw).into(),
        )
    })
}
