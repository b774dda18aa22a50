use serde::{Deserialize, Deserializer, Serialize};

/// A prescription a user may collect from the kiosk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    /// Drug identification number
    #[serde(deserialize_with = "din::deserialize")]
    pub din: String,
    /// Unix timestamp after which the prescription can no longer be filled
    pub expires: i64,
    /// Free-form drug type as entered by the prescriber
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub drug_type: Option<String>,
    /// Unix timestamp the prescription was issued
    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<i64>,
}

impl Prescription {
    pub fn new(din: impl Into<String>, expires: i64) -> Self {
        Self {
            din: din.into(),
            expires,
            drug_type: None,
            issued: None,
        }
    }
}

/// Drug identification numbers arrive either as strings or as bare integers.
/// Integers are rendered in the kiosk's canonical 8-digit form.
pub mod din {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDin {
        Text(String),
        Number(u64),
    }

    impl From<RawDin> for String {
        fn from(raw: RawDin) -> Self {
            match raw {
                RawDin::Text(text) => text,
                RawDin::Number(n) => format!("{:08}", n),
            }
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawDin::deserialize(deserializer).map(String::from)
    }

    /// Accepts a single din or a list of them
    pub fn deserialize_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(RawDin),
            Many(Vec<RawDin>),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(raw) => vec![raw.into()],
            OneOrMany::Many(raws) => raws.into_iter().map(String::from).collect(),
        })
    }
}
