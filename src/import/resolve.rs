//! Headquarter/branch linking for one import run.
//!
//! Two passes over the validated rows. Pass one claims an identifier for
//! every distinct headquarter key (first 8 characters of a code ending in
//! `XXX`); the resulting index is never modified afterwards. Pass two
//! emits one record per row, in input order, reading the index to link
//! branches.
//!
//! Identifier scheme: headquarters get `1..=H` in first-seen order, all
//! other records get `H+1..` in row order. A headquarter row whose key was
//! already claimed by an earlier row gets a fresh identifier in pass two,
//! so identifiers are unique across the run.

use std::collections::HashMap;

use crate::models::{headquarter_key, is_headquarter_code, BankRecord};

use super::ValidRow;

/// Hands out sequential identifiers. Scoped to a single import run.
#[derive(Debug)]
pub struct IdAllocator {
    next: i64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: i64) -> Self {
        Self { next: first }
    }

    pub fn allocate(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
struct HeadquarterClaim {
    id: i64,
    row: usize,
}

/// Headquarter key → identifier, built once by pass one.
#[derive(Debug, Default)]
pub struct HeadquarterIndex {
    claims: HashMap<String, HeadquarterClaim>,
}

impl HeadquarterIndex {
    /// Pass one: claim an identifier per distinct headquarter key,
    /// first-seen-wins.
    pub fn build(rows: &[ValidRow], ids: &mut IdAllocator) -> Self {
        let mut claims = HashMap::new();
        for (row, valid) in rows.iter().enumerate() {
            if !is_headquarter_code(&valid.swift_code) {
                continue;
            }
            let Some(key) = headquarter_key(&valid.swift_code) else {
                continue;
            };
            claims
                .entry(key.to_string())
                .or_insert_with(|| HeadquarterClaim {
                    id: ids.allocate(),
                    row,
                });
        }
        Self { claims }
    }

    /// Identifier of the headquarter owning this key, if any.
    pub fn lookup(&self, key: &str) -> Option<i64> {
        self.claims.get(key).map(|claim| claim.id)
    }

    /// Identifier claimed by this exact row.
    fn claimed_by(&self, key: &str, row: usize) -> Option<i64> {
        self.claims
            .get(key)
            .filter(|claim| claim.row == row)
            .map(|claim| claim.id)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

/// Build the final records for a run. Output order matches `rows`.
pub fn resolve_relationships(rows: Vec<ValidRow>, ids: &mut IdAllocator) -> Vec<BankRecord> {
    let index = HeadquarterIndex::build(&rows, ids);
    tracing::debug!(headquarters = index.len(), rows = rows.len(), "Headquarter index built");

    rows.into_iter()
        .enumerate()
        .map(|(row, valid)| {
            let is_headquarter = is_headquarter_code(&valid.swift_code);
            let key = headquarter_key(&valid.swift_code);

            let (id, headquarter_id) = if is_headquarter {
                let claimed = key.and_then(|k| index.claimed_by(k, row));
                (claimed.unwrap_or_else(|| ids.allocate()), None)
            } else {
                (ids.allocate(), key.and_then(|k| index.lookup(k)))
            };

            BankRecord {
                id,
                swift_code: valid.swift_code,
                bank_name: valid.bank_name,
                address: valid.address,
                country_iso2: valid.country_iso2,
                country_name: valid.country_name,
                is_headquarter,
                headquarter_id,
            }
        })
        .collect()
}
