//! `/v1/swift-codes` endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::BankRecord;
use crate::registry::{self, SwiftCodeInput};

/// Full record, plus `branches` when the record is a headquarter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwiftCodeDetailResponse {
    pub address: String,
    pub bank_name: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    pub country_name: String,
    pub is_headquarter: bool,
    pub swift_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<SwiftCodeSummary>>,
}

/// Record shape used inside branch lists and country listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwiftCodeSummary {
    pub address: String,
    pub bank_name: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    pub is_headquarter: bool,
    pub swift_code: String,
}

impl From<BankRecord> for SwiftCodeSummary {
    fn from(record: BankRecord) -> Self {
        Self {
            address: record.address,
            bank_name: record.bank_name,
            country_iso2: record.country_iso2,
            is_headquarter: record.is_headquarter,
            swift_code: record.swift_code,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryResponse {
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    pub country_name: String,
    pub swift_codes: Vec<SwiftCodeSummary>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `GET /v1/swift-codes/:swift_code`
pub async fn details(
    State(ctx): State<ApiContext>,
    Path(swift_code): Path<String>,
) -> Result<Json<SwiftCodeDetailResponse>, ApiError> {
    let details = registry::swift_code_details(ctx.store.as_ref(), &swift_code)?;
    let record = details.record;

    Ok(Json(SwiftCodeDetailResponse {
        address: record.address,
        bank_name: record.bank_name,
        country_iso2: record.country_iso2,
        country_name: record.country_name,
        is_headquarter: record.is_headquarter,
        swift_code: record.swift_code,
        branches: details
            .branches
            .map(|branches| branches.into_iter().map(SwiftCodeSummary::from).collect()),
    }))
}

/// `GET /v1/swift-codes/country/:country_iso2`
pub async fn by_country(
    State(ctx): State<ApiContext>,
    Path(country_iso2): Path<String>,
) -> Result<Json<CountryResponse>, ApiError> {
    let listing = registry::swift_codes_by_country(ctx.store.as_ref(), &country_iso2)?;

    Ok(Json(CountryResponse {
        country_iso2: listing.country_iso2,
        country_name: listing.country_name,
        swift_codes: listing
            .records
            .into_iter()
            .map(SwiftCodeSummary::from)
            .collect(),
    }))
}

/// `POST /v1/swift-codes`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<SwiftCodeInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(input) = payload?;
    let created = registry::add_swift_code(ctx.store.as_ref(), input)?;

    Ok(Json(MessageResponse {
        message: format!("SWIFT code {} added successfully", created.swift_code),
    }))
}

/// `DELETE /v1/swift-codes/:swift_code`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(swift_code): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = registry::delete_swift_code(ctx.store.as_ref(), &swift_code)?;

    Ok(Json(MessageResponse {
        message: format!("SWIFT code {} deleted successfully", removed.swift_code),
    }))
}
