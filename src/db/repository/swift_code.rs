use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::{BulkInsertError, RegistryStore};
use crate::db::{open_database, open_memory_database, DatabaseError};
use crate::models::{headquarter_code_for, BankRecord, NewBankRecord};

/// Rows committed per transaction during a bulk load.
const BULK_INSERT_CHUNK: usize = 500;

const SELECT_COLUMNS: &str = "id, swift_code, bank_name, address, country_iso2, country_name,
     is_headquarter, headquarter_id";

/// SQLite-backed registry store. One connection, serialized behind a mutex.
pub struct SqliteRegistryStore {
    conn: Mutex<Connection>,
}

impl SqliteRegistryStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (or create) the database file and run migrations.
    pub fn open(path: &std::path::Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(open_memory_database()?))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

impl RegistryStore for SqliteRegistryStore {
    fn find_by_code(&self, code: &str) -> Result<Option<BankRecord>, DatabaseError> {
        let conn = self.lock()?;
        get_by_code(&conn, code)
    }

    fn find_by_country(&self, country_iso2: &str) -> Result<Vec<BankRecord>, DatabaseError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM swift_codes
             WHERE country_iso2 = ?1 ORDER BY swift_code"
        ))?;
        let rows = stmt.query_map(params![country_iso2], record_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn find_branches(&self, headquarter_code: &str) -> Result<Vec<BankRecord>, DatabaseError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM swift_codes
             WHERE headquarter_id = (SELECT id FROM swift_codes WHERE swift_code = ?1)
             ORDER BY swift_code"
        ))?;
        let rows = stmt.query_map(params![headquarter_code], record_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn insert(&self, record: NewBankRecord) -> Result<BankRecord, DatabaseError> {
        let conn = self.lock()?;
        let id = insert_new(&conn, &record)?;
        Ok(record.into_record(id))
    }

    fn delete(&self, code: &str) -> Result<bool, DatabaseError> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM swift_codes WHERE swift_code = ?1", params![code])?;
        Ok(removed > 0)
    }

    fn detach_branches(&self, headquarter_id: i64) -> Result<usize, DatabaseError> {
        let conn = self.lock()?;
        detach(&conn, headquarter_id)
    }

    fn count(&self) -> Result<usize, DatabaseError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM swift_codes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn bulk_insert(&self, records: &[BankRecord]) -> Result<usize, BulkInsertError> {
        let mut conn = self
            .lock()
            .map_err(|source| BulkInsertError { inserted: 0, source })?;

        let mut inserted = 0;
        for chunk in records.chunks(BULK_INSERT_CHUNK) {
            insert_chunk(&mut conn, chunk)
                .map_err(|source| BulkInsertError { inserted, source })?;
            inserted += chunk.len();
            tracing::debug!(inserted, total = records.len(), "Bulk insert chunk committed");
        }
        Ok(inserted)
    }

    fn create_linked(&self, record: NewBankRecord) -> Result<BankRecord, DatabaseError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if get_by_code(&tx, &record.swift_code)?.is_some() {
            return Err(DatabaseError::Duplicate(record.swift_code));
        }

        let headquarter_id = if record.is_headquarter {
            None
        } else {
            match headquarter_code_for(&record.swift_code) {
                Some(hq_code) => get_by_code(&tx, &hq_code)?
                    .filter(|hq| hq.is_headquarter)
                    .map(|hq| hq.id),
                None => None,
            }
        };

        let record = NewBankRecord {
            headquarter_id,
            ..record
        };
        let id = insert_new(&tx, &record)?;
        tx.commit()?;

        Ok(record.into_record(id))
    }

    fn delete_cascading(&self, code: &str) -> Result<Option<BankRecord>, DatabaseError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(existing) = get_by_code(&tx, code)? else {
            return Ok(None);
        };

        if existing.is_headquarter {
            let detached = detach(&tx, existing.id)?;
            tracing::debug!(code, detached, "Branches detached from headquarter");
        }
        tx.execute("DELETE FROM swift_codes WHERE id = ?1", params![existing.id])?;
        tx.commit()?;

        Ok(Some(existing))
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<BankRecord> {
    Ok(BankRecord {
        id: row.get(0)?,
        swift_code: row.get(1)?,
        bank_name: row.get(2)?,
        address: row.get(3)?,
        country_iso2: row.get(4)?,
        country_name: row.get(5)?,
        is_headquarter: row.get(6)?,
        headquarter_id: row.get(7)?,
    })
}

fn get_by_code(conn: &Connection, code: &str) -> Result<Option<BankRecord>, DatabaseError> {
    let record = conn
        .query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM swift_codes WHERE swift_code = ?1"),
            params![code],
            record_from_row,
        )
        .optional()?;
    Ok(record)
}

fn insert_new(conn: &Connection, record: &NewBankRecord) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO swift_codes (swift_code, bank_name, address, country_iso2, country_name,
         is_headquarter, headquarter_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.swift_code,
            record.bank_name,
            record.address,
            record.country_iso2,
            record.country_name,
            record.is_headquarter,
            if record.is_headquarter { None } else { record.headquarter_id },
        ],
    )
    .map_err(|e| map_insert_error(e, &record.swift_code))?;
    Ok(conn.last_insert_rowid())
}

fn detach(conn: &Connection, headquarter_id: i64) -> Result<usize, DatabaseError> {
    let detached = conn.execute(
        "UPDATE swift_codes SET headquarter_id = NULL WHERE headquarter_id = ?1",
        params![headquarter_id],
    )?;
    Ok(detached)
}

/// One transaction per chunk; a failure rolls back only this chunk.
fn insert_chunk(conn: &mut Connection, chunk: &[BankRecord]) -> Result<(), DatabaseError> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO swift_codes (id, swift_code, bank_name, address, country_iso2,
             country_name, is_headquarter, headquarter_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for record in chunk {
            stmt.execute(params![
                record.id,
                record.swift_code,
                record.bank_name,
                record.address,
                record.country_iso2,
                record.country_name,
                record.is_headquarter,
                record.headquarter_id,
            ])
            .map_err(|e| map_insert_error(e, &record.swift_code))?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn map_insert_error(err: rusqlite::Error, code: &str) -> DatabaseError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            DatabaseError::Duplicate(code.to_string())
        }
        rusqlite::Error::SqliteFailure(failure, detail)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!(
                "{code}: {}",
                detail.as_deref().unwrap_or("constraint failed")
            ))
        }
        _ => DatabaseError::Sqlite(err),
    }
}
