use crate::biometrics::codec::BiometricVector;
use crate::models::prescription::Prescription;
use crate::models::record::Record;

/// An enrolled kiosk user as seen by the core
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Stable storage key
    pub id: String,
    /// Display name
    pub name: String,
    /// Enrolled biometric vector
    pub fingerprint: BiometricVector,
    pub prescriptions: Vec<Prescription>,
    /// Access and dispense history, oldest first
    pub ledger: Vec<Record>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, fingerprint: BiometricVector) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fingerprint,
            prescriptions: Vec::new(),
            ledger: Vec::new(),
        }
    }

    pub fn with_prescriptions(mut self, prescriptions: Vec<Prescription>) -> Self {
        self.prescriptions = prescriptions;
        self
    }

    pub fn with_ledger(mut self, ledger: Vec<Record>) -> Self {
        self.ledger = ledger;
        self
    }
}
