//! Repository layer: the registry store abstraction and its backends.
//!
//! `RegistryStore` is the seam between the importer / HTTP handlers and
//! persistence. `SqliteRegistryStore` backs the running service;
//! `MemoryRegistryStore` gives tests the same semantics without a file.

mod memory;
mod swift_code;

use thiserror::Error;

use super::DatabaseError;
use crate::models::{BankRecord, NewBankRecord};

pub use memory::*;
pub use swift_code::*;

/// Failure part-way through a bulk insert. Records committed before the
/// failure stay in the store.
#[derive(Error, Debug)]
#[error("bulk insert stopped after {inserted} records: {source}")]
pub struct BulkInsertError {
    pub inserted: usize,
    #[source]
    pub source: DatabaseError,
}

/// Persistence operations for the `swift_codes` registry.
///
/// Codes passed in are expected to be normalized already (trimmed,
/// uppercase). `create_linked` and `delete_cascading` are atomic: no
/// caller observes a half-applied create or delete.
pub trait RegistryStore: Send + Sync {
    fn find_by_code(&self, code: &str) -> Result<Option<BankRecord>, DatabaseError>;

    /// All records for an ISO2 country, ordered by code.
    fn find_by_country(&self, country_iso2: &str) -> Result<Vec<BankRecord>, DatabaseError>;

    /// Records whose `headquarter_id` points at the record with this code,
    /// ordered by code.
    fn find_branches(&self, headquarter_code: &str) -> Result<Vec<BankRecord>, DatabaseError>;

    /// Insert as given, letting the store assign `id`.
    fn insert(&self, record: NewBankRecord) -> Result<BankRecord, DatabaseError>;

    /// Returns whether a row was removed.
    fn delete(&self, code: &str) -> Result<bool, DatabaseError>;

    /// Clear `headquarter_id` on every record pointing at `headquarter_id`.
    /// Returns the number of records detached.
    fn detach_branches(&self, headquarter_id: i64) -> Result<usize, DatabaseError>;

    fn count(&self) -> Result<usize, DatabaseError>;

    fn is_empty(&self) -> Result<bool, DatabaseError> {
        Ok(self.count()? == 0)
    }

    /// Insert records keeping their supplied identifiers. No all-or-nothing
    /// guarantee: on failure, `BulkInsertError::inserted` records remain.
    fn bulk_insert(&self, records: &[BankRecord]) -> Result<usize, BulkInsertError>;

    /// Existence check, headquarter lookup (`key + "XXX"`) and insert as one
    /// atomic unit. Fails with `DatabaseError::Duplicate` when the code exists.
    fn create_linked(&self, record: NewBankRecord) -> Result<BankRecord, DatabaseError>;

    /// Read, detach branches (for a headquarter) and delete as one atomic
    /// unit. Returns the removed record, or `None` when the code is unknown.
    fn delete_cascading(&self, code: &str) -> Result<Option<BankRecord>, DatabaseError>;
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn backends() -> Vec<(&'static str, Box<dyn RegistryStore>)> {
        vec![
            (
                "sqlite",
                Box::new(SqliteRegistryStore::new(open_memory_database().unwrap())),
            ),
            ("memory", Box::new(MemoryRegistryStore::new())),
        ]
    }

    fn seeded_backends() -> Vec<(&'static str, Box<dyn RegistryStore>)> {
        let backends = backends();
        for (_, store) in &backends {
            store.bulk_insert(&sample_registry()).unwrap();
        }
        backends
    }

    fn new_record(code: &str, is_headquarter: bool) -> NewBankRecord {
        NewBankRecord {
            swift_code: code.into(),
            bank_name: "New Bank".into(),
            address: "UNKNOWN".into(),
            country_iso2: "PL".into(),
            country_name: "POLAND".into(),
            is_headquarter,
            headquarter_id: None,
        }
    }

    #[test]
    fn empty_store_reports_empty() {
        for (name, store) in backends() {
            assert!(store.is_empty().unwrap(), "{name}");
            assert_eq!(store.count().unwrap(), 0, "{name}");
        }
    }

    #[test]
    fn bulk_insert_keeps_supplied_identifiers() {
        for (name, store) in seeded_backends() {
            assert!(!store.is_empty().unwrap(), "{name}");
            assert_eq!(store.count().unwrap(), 5, "{name}");
            let branch = store.find_by_code("ABCDPLPW002").unwrap().unwrap();
            assert_eq!(branch.id, 4, "{name}");
            assert_eq!(branch.headquarter_id, Some(1), "{name}");
        }
    }

    #[test]
    fn find_by_code_misses_unknown_code() {
        for (name, store) in seeded_backends() {
            assert!(store.find_by_code("NOPEPLPWXXX").unwrap().is_none(), "{name}");
        }
    }

    #[test]
    fn find_by_country_orders_by_code() {
        for (name, store) in seeded_backends() {
            let codes: Vec<String> = store
                .find_by_country("PL")
                .unwrap()
                .into_iter()
                .map(|r| r.swift_code)
                .collect();
            assert_eq!(
                codes,
                vec!["ABCDPLPW001", "ABCDPLPW002", "ABCDPLPWXXX", "QRSTPLPW123"],
                "{name}"
            );
            assert!(store.find_by_country("DE").unwrap().is_empty(), "{name}");
        }
    }

    #[test]
    fn find_branches_follows_headquarter_link() {
        for (name, store) in seeded_backends() {
            let branches = store.find_branches("ABCDPLPWXXX").unwrap();
            assert_eq!(branches.len(), 2, "{name}");
            assert!(branches.iter().all(|b| b.headquarter_id == Some(1)), "{name}");
            assert!(store.find_branches("XYZWUS33XXX").unwrap().is_empty(), "{name}");
            assert!(store.find_branches("NOPEPLPWXXX").unwrap().is_empty(), "{name}");
        }
    }

    #[test]
    fn insert_assigns_next_identifier() {
        for (name, store) in seeded_backends() {
            let inserted = store.insert(new_record("EFGHPLPWXXX", true)).unwrap();
            assert_eq!(inserted.id, 6, "{name}");
            assert_eq!(
                store.find_by_code("EFGHPLPWXXX").unwrap(),
                Some(inserted),
                "{name}"
            );
        }
    }

    #[test]
    fn delete_and_detach_primitives() {
        for (name, store) in seeded_backends() {
            assert_eq!(store.detach_branches(1).unwrap(), 2, "{name}");
            assert!(store.find_branches("ABCDPLPWXXX").unwrap().is_empty(), "{name}");
            assert!(store.delete("ABCDPLPWXXX").unwrap(), "{name}");
            assert!(!store.delete("ABCDPLPWXXX").unwrap(), "{name}");
            assert_eq!(store.count().unwrap(), 4, "{name}");
        }
    }

    #[test]
    fn bulk_insert_stops_at_duplicate_and_keeps_prefix() {
        for (name, store) in backends() {
            let mut records = sample_registry();
            records.push(record(6, "ABCDPLPWXXX", "PL", None));
            records.push(record(7, "LMNOPLPWXXX", "PL", None));

            let err = store.bulk_insert(&records).unwrap_err();
            assert!(matches!(err.source, DatabaseError::Duplicate(ref code) if code == "ABCDPLPWXXX"), "{name}: {err}");
            // SQLite commits per chunk, so the failing chunk rolls back whole;
            // the in-memory store keeps every record before the failure.
            match name {
                "sqlite" => assert_eq!(err.inserted, 0, "{name}"),
                _ => assert_eq!(err.inserted, 5, "{name}"),
            }
            assert_eq!(store.count().unwrap(), err.inserted, "{name}");
        }
    }

    #[test]
    fn create_linked_attaches_branch_to_existing_headquarter() {
        for (name, store) in seeded_backends() {
            let created = store.create_linked(new_record("ABCDPLPW003", false)).unwrap();
            assert!(!created.is_headquarter, "{name}");
            assert_eq!(created.headquarter_id, Some(1), "{name}");
            assert_eq!(store.find_branches("ABCDPLPWXXX").unwrap().len(), 3, "{name}");
        }
    }

    #[test]
    fn create_linked_leaves_orphan_branch_unlinked() {
        for (name, store) in seeded_backends() {
            let created = store.create_linked(new_record("ZZZZPLPW001", false)).unwrap();
            assert_eq!(created.headquarter_id, None, "{name}");
        }
    }

    #[test]
    fn create_linked_headquarter_has_no_link() {
        for (name, store) in seeded_backends() {
            let mut new = new_record("ZZZZPLPWXXX", true);
            new.headquarter_id = Some(1);
            let created = store.create_linked(new).unwrap();
            assert!(created.is_headquarter, "{name}");
            assert_eq!(created.headquarter_id, None, "{name}");
        }
    }

    #[test]
    fn create_linked_rejects_existing_code() {
        for (name, store) in seeded_backends() {
            let err = store.create_linked(new_record("ABCDPLPW001", false)).unwrap_err();
            assert!(matches!(err, DatabaseError::Duplicate(_)), "{name}: {err}");
            assert_eq!(store.count().unwrap(), 5, "{name}");
        }
    }

    #[test]
    fn delete_cascading_detaches_every_branch() {
        for (name, store) in seeded_backends() {
            let removed = store.delete_cascading("ABCDPLPWXXX").unwrap().unwrap();
            assert_eq!(removed.id, 1, "{name}");
            assert!(store.find_by_code("ABCDPLPWXXX").unwrap().is_none(), "{name}");
            for code in ["ABCDPLPW001", "ABCDPLPW002"] {
                let branch = store.find_by_code(code).unwrap().unwrap();
                assert_eq!(branch.headquarter_id, None, "{name}: {code}");
            }
        }
    }

    #[test]
    fn delete_cascading_branch_leaves_headquarter_alone() {
        for (name, store) in seeded_backends() {
            store.delete_cascading("ABCDPLPW001").unwrap().unwrap();
            let branches = store.find_branches("ABCDPLPWXXX").unwrap();
            assert_eq!(branches.len(), 1, "{name}");
            assert_eq!(branches[0].swift_code, "ABCDPLPW002", "{name}");
        }
    }

    #[test]
    fn delete_cascading_unknown_code_is_none() {
        for (name, store) in seeded_backends() {
            assert!(store.delete_cascading("NOPEPLPWXXX").unwrap().is_none(), "{name}");
            assert_eq!(store.count().unwrap(), 5, "{name}");
        }
    }
}
