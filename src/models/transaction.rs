use rand::Rng;
use std::fmt;

const ID_BYTES: usize = 16;
const MAX_ID_LEN: usize = 128;

/// Opaque handle returned to the kiosk at authorization time
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(String);

impl TransactionId {
    /// Fresh random id: 128 bits, hex-encoded
    pub fn generate() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        rand::rng().fill(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Accept a client-supplied id if it could name a stored transaction.
    /// Ids are used as storage path segments, so only `[A-Za-z0-9_-]` passes.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable link between one authorization and the user it authorized.
/// Never modified after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: String,
    /// Unix timestamp of the authorization
    pub timestamp: i64,
    /// Dins handed out by the authorization. `None` for transactions
    /// created before this was tracked; `Some` of an empty list when
    /// nothing was eligible.
    pub dins: Option<Vec<String>>,
}

impl Transaction {
    pub fn new(id: TransactionId, user_id: impl Into<String>, timestamp: i64, dins: Vec<String>) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            timestamp,
            dins: Some(dins),
        }
    }

    /// A transaction stored without its din list
    pub fn legacy(id: TransactionId, user_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            timestamp,
            dins: None,
        }
    }

    /// Whether `din` may be confirmed as dispensed against this transaction
    pub fn authorizes(&self, din: &str) -> bool {
        match &self.dins {
            Some(dins) => dins.iter().any(|d| d == din),
            None => true,
        }
    }
}
