use crate::models::prescription::din;
use serde::{Deserialize, Serialize};

/// What a ledger entry records
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Written when prescriptions are handed out for authorization.
    /// Entries without a kind predate dispense tracking and count as access.
    #[default]
    Access,
    /// Written when the kiosk confirms medication physically left the machine
    Dispense,
}

/// One append-only ledger entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "din::deserialize_list")]
    pub dins: Vec<String>,
    pub timestamp: i64,
    #[serde(default)]
    pub kind: RecordKind,
}

impl Record {
    pub fn access(dins: Vec<String>, timestamp: i64) -> Self {
        Self {
            dins,
            timestamp,
            kind: RecordKind::Access,
        }
    }

    pub fn dispense(dins: Vec<String>, timestamp: i64) -> Self {
        Self {
            dins,
            timestamp,
            kind: RecordKind::Dispense,
        }
    }
}
