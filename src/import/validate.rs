//! Row admission for the CSV import.
//!
//! Column layout of the source file:
//! `COUNTRY ISO2 CODE, SWIFT CODE, CODE TYPE, NAME, ADDRESS, TOWN NAME,
//! COUNTRY NAME[, TIME ZONE]`. Town name and time zone are not stored.

use csv::StringRecord;
use thiserror::Error;

use crate::models::{
    has_valid_code_length, is_valid_country_iso2, is_valid_swift_code, normalize_address,
    normalize_code, normalize_country,
};

pub const COL_COUNTRY_ISO2: usize = 0;
pub const COL_SWIFT_CODE: usize = 1;
pub const COL_CODE_TYPE: usize = 2;
pub const COL_BANK_NAME: usize = 3;
pub const COL_ADDRESS: usize = 4;
pub const COL_COUNTRY_NAME: usize = 6;

/// Rows shorter than this are rejected outright.
pub const MIN_FIELDS: usize = 7;

/// A row that passed validation, with every field normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRow {
    pub swift_code: String,
    pub country_iso2: String,
    pub bank_name: String,
    pub address: String,
    pub country_name: String,
}

/// Why a row was dropped from the import.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("expected at least 7 fields, found {0}")]
    TooFewFields(usize),

    #[error("missing SWIFT code type")]
    MissingCodeType,

    #[error("invalid country code {0:?}")]
    InvalidCountry(String),

    #[error("invalid SWIFT code length {length} for {code:?}")]
    InvalidCodeLength { code: String, length: usize },

    #[error("invalid SWIFT code format {0:?}")]
    InvalidCodeFormat(String),

    #[error("missing bank name")]
    MissingBankName,
}

/// Apply the admission rules in order; the first failing rule decides.
pub fn validate_row(row: &StringRecord) -> Result<ValidRow, Rejection> {
    if row.len() < MIN_FIELDS {
        return Err(Rejection::TooFewFields(row.len()));
    }
    let field = |idx: usize| row.get(idx).unwrap_or_default();

    if field(COL_CODE_TYPE).trim().is_empty() {
        return Err(Rejection::MissingCodeType);
    }

    let country_iso2 = normalize_country(field(COL_COUNTRY_ISO2));
    if !is_valid_country_iso2(&country_iso2) {
        return Err(Rejection::InvalidCountry(country_iso2));
    }

    let swift_code = normalize_code(field(COL_SWIFT_CODE));
    if !has_valid_code_length(&swift_code) {
        let length = swift_code.chars().count();
        return Err(Rejection::InvalidCodeLength {
            code: swift_code,
            length,
        });
    }
    if !is_valid_swift_code(&swift_code) {
        return Err(Rejection::InvalidCodeFormat(swift_code));
    }

    let bank_name = field(COL_BANK_NAME).trim();
    if bank_name.is_empty() {
        return Err(Rejection::MissingBankName);
    }

    Ok(ValidRow {
        swift_code,
        country_iso2,
        bank_name: bank_name.to_string(),
        address: normalize_address(field(COL_ADDRESS)),
        country_name: field(COL_COUNTRY_NAME).trim().to_string(),
    })
}
