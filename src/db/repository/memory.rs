use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{BulkInsertError, RegistryStore};
use crate::db::DatabaseError;
use crate::models::{headquarter_code_for, BankRecord, NewBankRecord};

/// In-memory registry store. Lookups, create and delete behave like the
/// SQLite store. Every operation runs under a single mutex, which also
/// makes the compound operations atomic.
///
/// `bulk_insert` differs: it has no chunk transactions, so on failure every
/// record before the failing one stays, where SQLite rolls back the whole
/// failing chunk.
#[derive(Default)]
pub struct MemoryRegistryStore {
    records: Mutex<BTreeMap<i64, BankRecord>>,
}

impl MemoryRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<i64, BankRecord>>, DatabaseError> {
        self.records.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

fn by_code<'a>(records: &'a BTreeMap<i64, BankRecord>, code: &str) -> Option<&'a BankRecord> {
    records.values().find(|r| r.swift_code == code)
}

fn next_id(records: &BTreeMap<i64, BankRecord>) -> i64 {
    records.keys().next_back().map_or(1, |last| last + 1)
}

fn sorted_by_code(mut records: Vec<BankRecord>) -> Vec<BankRecord> {
    records.sort_by(|a, b| a.swift_code.cmp(&b.swift_code));
    records
}

fn detach(records: &mut BTreeMap<i64, BankRecord>, headquarter_id: i64) -> usize {
    let mut detached = 0;
    for record in records.values_mut() {
        if record.headquarter_id == Some(headquarter_id) {
            record.headquarter_id = None;
            detached += 1;
        }
    }
    detached
}

impl RegistryStore for MemoryRegistryStore {
    fn find_by_code(&self, code: &str) -> Result<Option<BankRecord>, DatabaseError> {
        let records = self.lock()?;
        Ok(by_code(&records, code).cloned())
    }

    fn find_by_country(&self, country_iso2: &str) -> Result<Vec<BankRecord>, DatabaseError> {
        let records = self.lock()?;
        Ok(sorted_by_code(
            records
                .values()
                .filter(|r| r.country_iso2 == country_iso2)
                .cloned()
                .collect(),
        ))
    }

    fn find_branches(&self, headquarter_code: &str) -> Result<Vec<BankRecord>, DatabaseError> {
        let records = self.lock()?;
        let Some(hq_id) = by_code(&records, headquarter_code).map(|hq| hq.id) else {
            return Ok(Vec::new());
        };
        Ok(sorted_by_code(
            records
                .values()
                .filter(|r| r.headquarter_id == Some(hq_id))
                .cloned()
                .collect(),
        ))
    }

    fn insert(&self, record: NewBankRecord) -> Result<BankRecord, DatabaseError> {
        let mut records = self.lock()?;
        if by_code(&records, &record.swift_code).is_some() {
            return Err(DatabaseError::Duplicate(record.swift_code));
        }
        let record = record.into_record(next_id(&records));
        records.insert(record.id, record.clone());
        Ok(record)
    }

    fn delete(&self, code: &str) -> Result<bool, DatabaseError> {
        let mut records = self.lock()?;
        let id = by_code(&records, code).map(|r| r.id);
        Ok(id.and_then(|id| records.remove(&id)).is_some())
    }

    fn detach_branches(&self, headquarter_id: i64) -> Result<usize, DatabaseError> {
        let mut records = self.lock()?;
        Ok(detach(&mut records, headquarter_id))
    }

    fn count(&self) -> Result<usize, DatabaseError> {
        Ok(self.lock()?.len())
    }

    fn bulk_insert(&self, batch: &[BankRecord]) -> Result<usize, BulkInsertError> {
        let mut records = self
            .lock()
            .map_err(|source| BulkInsertError { inserted: 0, source })?;

        for (inserted, record) in batch.iter().enumerate() {
            let conflict = if by_code(&records, &record.swift_code).is_some() {
                Some(DatabaseError::Duplicate(record.swift_code.clone()))
            } else if records.contains_key(&record.id) {
                Some(DatabaseError::ConstraintViolation(format!(
                    "{}: identifier {} already in use",
                    record.swift_code, record.id
                )))
            } else {
                None
            };
            if let Some(source) = conflict {
                return Err(BulkInsertError { inserted, source });
            }
            records.insert(record.id, record.clone());
        }
        Ok(batch.len())
    }

    fn create_linked(&self, record: NewBankRecord) -> Result<BankRecord, DatabaseError> {
        let mut records = self.lock()?;
        if by_code(&records, &record.swift_code).is_some() {
            return Err(DatabaseError::Duplicate(record.swift_code));
        }

        let headquarter_id = if record.is_headquarter {
            None
        } else {
            headquarter_code_for(&record.swift_code)
                .and_then(|hq_code| by_code(&records, &hq_code))
                .filter(|hq| hq.is_headquarter)
                .map(|hq| hq.id)
        };

        let record = NewBankRecord {
            headquarter_id,
            ..record
        }
        .into_record(next_id(&records));
        records.insert(record.id, record.clone());
        Ok(record)
    }

    fn delete_cascading(&self, code: &str) -> Result<Option<BankRecord>, DatabaseError> {
        let mut records = self.lock()?;
        let Some(existing) = by_code(&records, code).cloned() else {
            return Ok(None);
        };
        if existing.is_headquarter {
            detach(&mut records, existing.id);
        }
        records.remove(&existing.id);
        Ok(Some(existing))
    }
}
