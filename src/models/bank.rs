/// One row of the registry.
///
/// `headquarter_id` is only ever set on branch records and points at the
/// `id` of the headquarter sharing the first 8 characters of `swift_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankRecord {
    pub id: i64,
    pub swift_code: String,
    pub bank_name: String,
    pub address: String,
    pub country_iso2: String,
    pub country_name: String,
    pub is_headquarter: bool,
    pub headquarter_id: Option<i64>,
}

/// Insert shape for single-record creation; the store assigns `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBankRecord {
    pub swift_code: String,
    pub bank_name: String,
    pub address: String,
    pub country_iso2: String,
    pub country_name: String,
    pub is_headquarter: bool,
    pub headquarter_id: Option<i64>,
}

impl NewBankRecord {
    /// Materialize with a store-assigned identifier.
    pub fn into_record(self, id: i64) -> BankRecord {
        BankRecord {
            id,
            swift_code: self.swift_code,
            bank_name: self.bank_name,
            address: self.address,
            country_iso2: self.country_iso2,
            country_name: self.country_name,
            is_headquarter: self.is_headquarter,
            headquarter_id: if self.is_headquarter {
                None
            } else {
                self.headquarter_id
            },
        }
    }
}
