//! SQLite catalog store
//!
//! ## Tables
//!
//! - `programs` - program version rows, never updated in place
//! - `software_efforts` - efforts with inherit flags and local profile ids
//! - `*_profiles` - one table per profile aspect, attributes as JSON
//! - `software_effort_links` - relation link shape
//!
//! Timestamps are stored as unix microseconds, UUIDs as hyphenated text.

pub mod schema;

use crate::error::{StoreError, StoreResult};
use crate::store::{CatalogStore, CatalogTx};
use catalog_model::{
    EffortAttributes, EffortKey, EffortRecord, NewProgram, Program, ProfileData, ProfileKey,
    ProfileKind, ProgramDetails, ProgramKey, ProgramPath,
};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension, Row};
use schema::profile_table;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Catalog store backed by one SQLite connection
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database file
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or the schema cannot be created
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening catalog database");

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    /// Returns error if the schema cannot be created
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("opening in-memory catalog database");
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl CatalogStore for SqliteStore {
    fn begin(&self) -> StoreResult<Box<dyn CatalogTx + '_>> {
        let conn = self.conn.lock();
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Box::new(SqliteTx {
            conn,
            finished: false,
        }))
    }
}

/// Open transaction; rolls back on drop unless committed
struct SqliteTx<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl Drop for SqliteTx<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %e, "rollback failed");
            }
        }
    }
}

const PROGRAM_COLUMNS: &str = "id, program_id, path, name, date, active, expect_software_effort, \
     description, aliases, status, primary_location, organization_leader_name, \
     chief_engineer_name, program_affiliation, program_type, program_value";

const EFFORT_COLUMNS: &str = "id, uuid, name, program_id, parent_id, \
     inherit_statement_of_work_profile, inherit_developer_setup, \
     inherit_technical_points_of_contact, inherit_work_location, \
     local_statement_of_work_profile_id, local_developer_setup_id, \
     local_technical_points_of_contact_id, local_work_location_id";

struct ProgramRow {
    id: i64,
    program_id: String,
    path: String,
    name: String,
    date: i64,
    active: bool,
    expect_software_effort: bool,
    description: Option<String>,
    aliases: String,
    status: Option<String>,
    primary_location: Option<String>,
    organization_leader_name: Option<String>,
    chief_engineer_name: Option<String>,
    program_affiliation: Option<String>,
    program_type: Option<String>,
    program_value: Option<String>,
}

impl ProgramRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            program_id: row.get(1)?,
            path: row.get(2)?,
            name: row.get(3)?,
            date: row.get(4)?,
            active: row.get(5)?,
            expect_software_effort: row.get(6)?,
            description: row.get(7)?,
            aliases: row.get(8)?,
            status: row.get(9)?,
            primary_location: row.get(10)?,
            organization_leader_name: row.get(11)?,
            chief_engineer_name: row.get(12)?,
            program_affiliation: row.get(13)?,
            program_type: row.get(14)?,
            program_value: row.get(15)?,
        })
    }

    fn into_program(self) -> StoreResult<Program> {
        Ok(Program {
            key: ProgramKey(self.id),
            date: micros_to_date("programs", self.date)?,
            path: ProgramPath::lexical(&self.path),
            program_id: self.program_id,
            name: self.name,
            active: self.active,
            expect_software_effort: self.expect_software_effort,
            details: ProgramDetails {
                description: self.description,
                aliases: serde_json::from_str(&self.aliases)?,
                status: self.status,
                primary_location: self.primary_location,
                organization_leader_name: self.organization_leader_name,
                chief_engineer_name: self.chief_engineer_name,
                program_affiliation: self.program_affiliation,
                program_type: self.program_type,
                program_value: self.program_value,
            },
        })
    }
}

struct EffortRow {
    id: i64,
    uuid: String,
    attributes: EffortAttributes,
}

impl EffortRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            uuid: row.get(1)?,
            attributes: EffortAttributes {
                name: row.get(2)?,
                program_id: row.get(3)?,
                parent: row.get::<_, Option<i64>>(4)?.map(EffortKey),
                inherit_statement_of_work_profile: row.get(5)?,
                inherit_developer_setup: row.get(6)?,
                inherit_technical_points_of_contact: row.get(7)?,
                inherit_work_location: row.get(8)?,
                local_statement_of_work_profile: row.get::<_, Option<i64>>(9)?.map(ProfileKey),
                local_developer_setup: row.get::<_, Option<i64>>(10)?.map(ProfileKey),
                local_technical_points_of_contact: row
                    .get::<_, Option<i64>>(11)?
                    .map(ProfileKey),
                local_work_location: row.get::<_, Option<i64>>(12)?.map(ProfileKey),
            },
        })
    }

    fn into_record(self) -> StoreResult<EffortRecord> {
        let uuid = Uuid::parse_str(&self.uuid)
            .map_err(|e| StoreError::corrupt("software_efforts", format!("{}: {e}", self.uuid)))?;
        Ok(EffortRecord {
            key: EffortKey(self.id),
            uuid,
            attributes: self.attributes,
        })
    }
}

fn micros_to_date(table: &'static str, micros: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::corrupt(table, format!("timestamp out of range: {micros}")))
}

impl SqliteTx<'_> {
    fn query_efforts(
        &self,
        filter: &str,
        param: &dyn rusqlite::ToSql,
    ) -> StoreResult<Vec<EffortRecord>> {
        let sql =
            format!("SELECT {EFFORT_COLUMNS} FROM software_efforts WHERE {filter} ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([param], EffortRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(EffortRow::into_record).collect()
    }

    fn require_effort(&self, key: EffortKey) -> StoreResult<()> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM software_efforts WHERE id = ?1",
                [key.0],
                |_| Ok(()),
            )
            .optional()?;
        found.ok_or_else(|| StoreError::not_found("software effort", key))
    }
}

impl CatalogTx for SqliteTx<'_> {
    fn latest_active_dates(&self) -> StoreResult<HashMap<String, DateTime<Utc>>> {
        let mut stmt = self.conn.prepare(
            "SELECT program_id, MAX(date) FROM programs WHERE active = 1 GROUP BY program_id",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, micros)| -> StoreResult<_> {
                Ok((id, micros_to_date("programs", micros)?))
            })
            .collect()
    }

    fn active_program_versions(&self) -> StoreResult<Vec<Program>> {
        let sql = format!(
            "SELECT {PROGRAM_COLUMNS} FROM programs WHERE active = 1 \
             ORDER BY program_id ASC, date DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], ProgramRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ProgramRow::into_program).collect()
    }

    fn insert_program(&mut self, program: &NewProgram) -> StoreResult<ProgramKey> {
        let details = &program.details;
        self.conn.execute(
            "INSERT INTO programs (program_id, path, name, date, active, expect_software_effort, \
             description, aliases, status, primary_location, organization_leader_name, \
             chief_engineer_name, program_affiliation, program_type, program_value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                program.program_id,
                program.path.to_string(),
                program.name,
                program.date.timestamp_micros(),
                program.active,
                program.expect_software_effort,
                details.description,
                serde_json::to_string(&details.aliases)?,
                details.status,
                details.primary_location,
                details.organization_leader_name,
                details.chief_engineer_name,
                details.program_affiliation,
                details.program_type,
                details.program_value,
            ],
        )?;
        Ok(ProgramKey(self.conn.last_insert_rowid()))
    }

    fn effort_by_uuid(&self, uuid: &Uuid) -> StoreResult<Option<EffortRecord>> {
        Ok(self
            .query_efforts("uuid = ?1", &uuid.to_string())?
            .into_iter()
            .next())
    }

    fn effort_by_key(&self, key: EffortKey) -> StoreResult<Option<EffortRecord>> {
        Ok(self.query_efforts("id = ?1", &key.0)?.into_iter().next())
    }

    fn efforts_for_program(&self, program_id: &str) -> StoreResult<Vec<EffortRecord>> {
        self.query_efforts("program_id = ?1", &program_id)
    }

    fn insert_effort(
        &mut self,
        uuid: Uuid,
        attributes: &EffortAttributes,
    ) -> StoreResult<EffortKey> {
        let a = attributes;
        self.conn.execute(
            "INSERT INTO software_efforts (uuid, name, program_id, parent_id, \
             inherit_statement_of_work_profile, inherit_developer_setup, \
             inherit_technical_points_of_contact, inherit_work_location, \
             local_statement_of_work_profile_id, local_developer_setup_id, \
             local_technical_points_of_contact_id, local_work_location_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                uuid.to_string(),
                a.name,
                a.program_id,
                a.parent.map(|k| k.0),
                a.inherit_statement_of_work_profile,
                a.inherit_developer_setup,
                a.inherit_technical_points_of_contact,
                a.inherit_work_location,
                a.local_statement_of_work_profile.map(|k| k.0),
                a.local_developer_setup.map(|k| k.0),
                a.local_technical_points_of_contact.map(|k| k.0),
                a.local_work_location.map(|k| k.0),
            ],
        )?;
        Ok(EffortKey(self.conn.last_insert_rowid()))
    }

    fn update_effort(&mut self, key: EffortKey, attributes: &EffortAttributes) -> StoreResult<()> {
        let a = attributes;
        let changed = self.conn.execute(
            "UPDATE software_efforts SET name = ?2, program_id = ?3, parent_id = ?4, \
             inherit_statement_of_work_profile = ?5, inherit_developer_setup = ?6, \
             inherit_technical_points_of_contact = ?7, inherit_work_location = ?8, \
             local_statement_of_work_profile_id = ?9, local_developer_setup_id = ?10, \
             local_technical_points_of_contact_id = ?11, local_work_location_id = ?12 \
             WHERE id = ?1",
            params![
                key.0,
                a.name,
                a.program_id,
                a.parent.map(|k| k.0),
                a.inherit_statement_of_work_profile,
                a.inherit_developer_setup,
                a.inherit_technical_points_of_contact,
                a.inherit_work_location,
                a.local_statement_of_work_profile.map(|k| k.0),
                a.local_developer_setup.map(|k| k.0),
                a.local_technical_points_of_contact.map(|k| k.0),
                a.local_work_location.map(|k| k.0),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("software effort", key));
        }
        Ok(())
    }

    fn delete_effort(&mut self, key: EffortKey) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM software_efforts WHERE id = ?1", [key.0])?;
        if changed == 0 {
            return Err(StoreError::not_found("software effort", key));
        }
        Ok(())
    }

    fn profile(&self, kind: ProfileKind, key: ProfileKey) -> StoreResult<Option<ProfileData>> {
        let sql = format!("SELECT attributes FROM {} WHERE id = ?1", profile_table(kind));
        let raw: Option<String> = self
            .conn
            .query_row(&sql, [key.0], |row| row.get(0))
            .optional()?;
        raw.map(|text| -> StoreResult<ProfileData> {
            let attributes: serde_json::Value = serde_json::from_str(&text)?;
            Ok(ProfileData::from_attributes(kind, attributes)?)
        })
        .transpose()
    }

    fn insert_profile(&mut self, data: &ProfileData) -> StoreResult<ProfileKey> {
        let sql = format!(
            "INSERT INTO {} (attributes) VALUES (?1)",
            profile_table(data.kind())
        );
        let attributes = serde_json::to_string(&data.to_attributes()?)?;
        self.conn.execute(&sql, [attributes])?;
        Ok(ProfileKey(self.conn.last_insert_rowid()))
    }

    fn update_profile(&mut self, key: ProfileKey, data: &ProfileData) -> StoreResult<()> {
        let kind = data.kind();
        let sql = format!("UPDATE {} SET attributes = ?2 WHERE id = ?1", profile_table(kind));
        let attributes = serde_json::to_string(&data.to_attributes()?)?;
        let changed = self.conn.execute(&sql, params![key.0, attributes])?;
        if changed == 0 {
            return Err(StoreError::not_found(kind.as_str(), key));
        }
        Ok(())
    }

    fn delete_profile(&mut self, kind: ProfileKind, key: ProfileKey) -> StoreResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", profile_table(kind));
        let changed = self.conn.execute(&sql, [key.0])?;
        if changed == 0 {
            return Err(StoreError::not_found(kind.as_str(), key));
        }
        debug!(kind = %kind, key = key.0, "deleted local profile");
        Ok(())
    }

    fn profile_count(&self, kind: ProfileKind) -> StoreResult<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", profile_table(kind));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| StoreError::corrupt(profile_table(kind), format!("row count {count}")))
    }

    fn linked_effort_keys(&self, key: EffortKey) -> StoreResult<Vec<EffortKey>> {
        let mut stmt = self.conn.prepare(
            "SELECT linked_effort_id FROM software_effort_links \
             WHERE effort_id = ?1 ORDER BY position",
        )?;
        let keys = stmt
            .query_map([key.0], |row| row.get::<_, i64>(0))?
            .map(|r| r.map(EffortKey))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn set_linked_effort_keys(
        &mut self,
        key: EffortKey,
        targets: &[EffortKey],
    ) -> StoreResult<()> {
        self.require_effort(key)?;
        for target in targets {
            self.require_effort(*target)?;
        }
        self.conn
            .execute("DELETE FROM software_effort_links WHERE effort_id = ?1", [key.0])?;
        let mut stmt = self.conn.prepare(
            "INSERT OR IGNORE INTO software_effort_links (effort_id, linked_effort_id, position) \
             VALUES (?1, ?2, ?3)",
        )?;
        for (position, target) in targets.iter().enumerate() {
            stmt.execute(params![key.0, target.0, position as i64])?;
        }
        Ok(())
    }

    fn link_identifiers(&self, key: EffortKey) -> StoreResult<Vec<String>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT linked_software_effort_ids FROM software_efforts WHERE id = ?1",
                [key.0],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(text) => Ok(serde_json::from_str(&text)?),
            None => Ok(Vec::new()),
        }
    }

    fn set_link_identifiers(
        &mut self,
        key: EffortKey,
        identifiers: &[String],
    ) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE software_efforts SET linked_software_effort_ids = ?2 WHERE id = ?1",
            params![key.0, serde_json::to_string(identifiers)?],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("software effort", key));
        }
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_round_trip_through_micros() {
        let date = DateTime::from_timestamp_micros(1_736_000_000_123_456).unwrap();
        assert_eq!(micros_to_date("programs", date.timestamp_micros()).unwrap(), date);
        assert!(micros_to_date("programs", i64::MAX).is_err());
    }

    #[test]
    fn corrupt_uuid_is_reported() {
        let row = EffortRow {
            id: 1,
            uuid: "not-a-uuid".into(),
            attributes: EffortAttributes::new("x", "1"),
        };
        let err = row.into_record().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { table: "software_efforts", .. }));
    }
}
