use crate::core::error::ApiError;
use crate::models::prescription::{din, Prescription};
use serde::{Deserialize, Serialize};

/// The only protocol version this service speaks
pub const API_VERSION: &str = "0";

/// Reject requests that omit the version or name another one
pub fn check_version(version: Option<&str>) -> Result<(), ApiError> {
    match version {
        None => Err(ApiError::MissingField("version")),
        Some(API_VERSION) => Ok(()),
        Some(other) => Err(ApiError::UnsupportedVersion(other.to_string())),
    }
}

/// Body of an authorization request.
///
/// Every field is optional here so that absence can be reported as a
/// `MissingField` error instead of a generic body rejection.
#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeRequest {
    pub version: Option<String>,
    /// Base64-encoded 256-byte fingerprint
    pub fingerprint: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    pub version: String,
    pub success: bool,
    pub transaction_id: String,
    pub prescriptions: Vec<Prescription>,
}

/// Body of a dispense confirmation
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub version: Option<String>,
    #[serde(alias = "id")]
    pub transaction_id: Option<String>,
    /// One din or a list of dins that were physically dispensed
    #[serde(default, deserialize_with = "deserialize_dins")]
    pub din: Option<Vec<String>>,
    /// Unix time of the dispense event; kiosks may send fractional seconds
    pub timestamp: Option<f64>,
}

fn deserialize_dins<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    din::deserialize_list(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmResponse {
    pub version: String,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub version: String,
    pub success: bool,
    pub error: String,
    pub message: String,
}
