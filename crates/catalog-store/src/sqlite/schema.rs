//! Catalog database schema

use crate::error::StoreResult;
use catalog_model::ProfileKind;
use rusqlite::{Connection, OptionalExtension};
use tracing::info;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Table holding the local profiles of one aspect
#[must_use]
pub fn profile_table(kind: ProfileKind) -> &'static str {
    match kind {
        ProfileKind::StatementOfWork => "statement_of_work_profiles",
        ProfileKind::DeveloperSetup => "developer_setup_profiles",
        ProfileKind::TechnicalPointsOfContact => "technical_point_of_contact_profiles",
        ProfileKind::WorkLocation => "work_location_profiles",
    }
}

/// Create or upgrade the schema
///
/// # Errors
/// Returns error if a DDL statement fails
pub fn init_schema(conn: &Connection) -> StoreResult<()> {
    let current = schema_version(conn)?;

    if current == 0 {
        info!(version = SCHEMA_VERSION, "creating catalog schema");
        conn.execute_batch(PROGRAMS_SCHEMA)?;
        conn.execute_batch(PROFILES_SCHEMA)?;
        conn.execute_batch(EFFORTS_SCHEMA)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current < SCHEMA_VERSION {
        info!(from = current, to = SCHEMA_VERSION, "migrating catalog schema");
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else {
        info!(version = current, "catalog schema is up to date");
    }

    Ok(())
}

fn schema_version(conn: &Connection) -> StoreResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;
    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> StoreResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

const PROGRAMS_SCHEMA: &str = r#"
-- One row per program version; rows are never updated in place
CREATE TABLE IF NOT EXISTS programs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    program_id TEXT NOT NULL,
    path TEXT NOT NULL,
    name TEXT NOT NULL,
    date INTEGER NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    expect_software_effort INTEGER NOT NULL DEFAULT 0,

    description TEXT,
    aliases TEXT NOT NULL DEFAULT '[]',
    status TEXT,
    primary_location TEXT,
    organization_leader_name TEXT,
    chief_engineer_name TEXT,
    program_affiliation TEXT,
    program_type TEXT,
    program_value TEXT
);

CREATE INDEX IF NOT EXISTS idx_programs_current ON programs(program_id, active, date);
"#;

const PROFILES_SCHEMA: &str = r#"
-- Attribute bags stored as JSON
CREATE TABLE IF NOT EXISTS statement_of_work_profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    attributes TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS developer_setup_profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    attributes TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS technical_point_of_contact_profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    attributes TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS work_location_profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    attributes TEXT NOT NULL DEFAULT '{}'
);
"#;

const EFFORTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS software_efforts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    program_id TEXT NOT NULL,
    parent_id INTEGER REFERENCES software_efforts(id) ON DELETE SET NULL,

    inherit_statement_of_work_profile INTEGER NOT NULL DEFAULT 1,
    inherit_developer_setup INTEGER NOT NULL DEFAULT 1,
    inherit_technical_points_of_contact INTEGER NOT NULL DEFAULT 1,
    inherit_work_location INTEGER NOT NULL DEFAULT 1,

    -- Profile rows are deleted before the referencing effort row is rewritten
    local_statement_of_work_profile_id INTEGER
        REFERENCES statement_of_work_profiles(id) DEFERRABLE INITIALLY DEFERRED,
    local_developer_setup_id INTEGER
        REFERENCES developer_setup_profiles(id) DEFERRABLE INITIALLY DEFERRED,
    local_technical_points_of_contact_id INTEGER
        REFERENCES technical_point_of_contact_profiles(id) DEFERRABLE INITIALLY DEFERRED,
    local_work_location_id INTEGER
        REFERENCES work_location_profiles(id) DEFERRABLE INITIALLY DEFERRED,

    -- Identifier-list link shape
    linked_software_effort_ids TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS idx_software_efforts_program ON software_efforts(program_id);

-- Relation link shape
CREATE TABLE IF NOT EXISTS software_effort_links (
    effort_id INTEGER NOT NULL REFERENCES software_efforts(id) ON DELETE CASCADE,
    linked_effort_id INTEGER NOT NULL REFERENCES software_efforts(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    PRIMARY KEY (effort_id, linked_effort_id)
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn every_profile_kind_has_a_table() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        for kind in ProfileKind::ALL {
            let sql = format!("SELECT COUNT(*) FROM {}", profile_table(kind));
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0)).unwrap();
            assert_eq!(count, 0);
        }
    }
}
