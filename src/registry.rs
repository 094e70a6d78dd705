//! Request-level registry operations over any `RegistryStore`.
//!
//! Lookups normalize their input (trim + uppercase) before hitting the
//! store. Creation validates the payload with the same code rules the
//! importer uses and links branches to an existing headquarter.

use serde::Deserialize;
use thiserror::Error;

use crate::db::{DatabaseError, RegistryStore};
use crate::models::{
    has_valid_code_length, is_headquarter_code, is_valid_country_iso2, is_valid_swift_code,
    normalize_address, normalize_code, normalize_country, BankRecord, NewBankRecord,
};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for RegistryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Duplicate(code) => {
                RegistryError::Conflict(format!("SWIFT code {code} already exists"))
            }
            other => RegistryError::Database(other),
        }
    }
}

/// A record plus, for headquarters, the branches linked to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwiftCodeDetails {
    pub record: BankRecord,
    /// `Some` (possibly empty) for headquarters, `None` for branches.
    pub branches: Option<Vec<BankRecord>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryListing {
    pub country_iso2: String,
    pub country_name: String,
    pub records: Vec<BankRecord>,
}

/// Payload for creating a single record. Every field is optional so a
/// missing field is reported as a validation error, not a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwiftCodeInput {
    pub address: Option<String>,
    pub bank_name: Option<String>,
    #[serde(rename = "countryISO2")]
    pub country_iso2: Option<String>,
    pub country_name: Option<String>,
    pub is_headquarter: Option<bool>,
    pub swift_code: Option<String>,
}

pub fn swift_code_details(
    store: &dyn RegistryStore,
    code: &str,
) -> Result<SwiftCodeDetails, RegistryError> {
    let code = normalize_code(code);
    let record = store
        .find_by_code(&code)?
        .ok_or_else(|| RegistryError::NotFound(format!("SWIFT code {code} not found")))?;

    let branches = if record.is_headquarter {
        Some(store.find_branches(&record.swift_code)?)
    } else {
        None
    };

    Ok(SwiftCodeDetails { record, branches })
}

pub fn swift_codes_by_country(
    store: &dyn RegistryStore,
    country_iso2: &str,
) -> Result<CountryListing, RegistryError> {
    let country_iso2 = normalize_country(country_iso2);
    let records = store.find_by_country(&country_iso2)?;

    let Some(first) = records.first() else {
        return Err(RegistryError::NotFound(format!(
            "No SWIFT codes found for country {country_iso2}"
        )));
    };

    Ok(CountryListing {
        country_name: first.country_name.clone(),
        country_iso2,
        records,
    })
}

/// Normalize and validate a create payload.
pub fn validate_input(input: SwiftCodeInput) -> Result<NewBankRecord, RegistryError> {
    let required = |value: Option<String>, field: &str| {
        value.ok_or_else(|| RegistryError::Invalid(format!("Field '{field}' is required")))
    };

    let swift_code = normalize_code(&required(input.swift_code, "swiftCode")?);
    let country_iso2 = normalize_country(&required(input.country_iso2, "countryISO2")?);
    let bank_name = required(input.bank_name, "bankName")?.trim().to_string();
    let country_name = required(input.country_name, "countryName")?.trim().to_string();
    let is_headquarter = input.is_headquarter.ok_or_else(|| {
        RegistryError::Invalid("Field 'isHeadquarter' is required".into())
    })?;
    let address = normalize_address(input.address.as_deref().unwrap_or_default());

    if !has_valid_code_length(&swift_code) {
        return Err(RegistryError::Invalid(
            "Invalid SWIFT code length. Must be between 8 and 11 characters.".into(),
        ));
    }
    if !is_valid_swift_code(&swift_code) {
        return Err(RegistryError::Invalid(
            "Invalid SWIFT code format. Expected 4 letters, 2 letters, 2 alphanumeric \
             characters and optional 3 alphanumeric characters."
                .into(),
        ));
    }
    if !is_valid_country_iso2(&country_iso2) {
        return Err(RegistryError::Invalid(
            "Invalid country ISO2 code. Must be exactly 2 uppercase letters.".into(),
        ));
    }
    if bank_name.is_empty() {
        return Err(RegistryError::Invalid("Bank name cannot be empty.".into()));
    }
    if country_name.is_empty() {
        return Err(RegistryError::Invalid("Country name cannot be empty.".into()));
    }
    if is_headquarter != is_headquarter_code(&swift_code) {
        return Err(RegistryError::Invalid(
            "Field 'isHeadquarter' must be true exactly when the SWIFT code ends with 'XXX'."
                .into(),
        ));
    }

    Ok(NewBankRecord {
        swift_code,
        bank_name,
        address,
        country_iso2,
        country_name,
        is_headquarter,
        headquarter_id: None,
    })
}

/// Validate and insert a record, linking a branch to its headquarter
/// when one exists.
pub fn add_swift_code(
    store: &dyn RegistryStore,
    input: SwiftCodeInput,
) -> Result<BankRecord, RegistryError> {
    let record = validate_input(input)?;
    let created = store.create_linked(record)?;
    tracing::info!(
        code = %created.swift_code,
        id = created.id,
        headquarter_id = ?created.headquarter_id,
        "SWIFT code added"
    );
    Ok(created)
}

/// Delete a record; deleting a headquarter detaches its branches.
pub fn delete_swift_code(
    store: &dyn RegistryStore,
    code: &str,
) -> Result<BankRecord, RegistryError> {
    let code = normalize_code(code);
    let removed = store
        .delete_cascading(&code)?
        .ok_or_else(|| RegistryError::NotFound(format!("SWIFT code {code} not found")))?;
    tracing::info!(code = %removed.swift_code, "SWIFT code deleted");
    Ok(removed)
}
