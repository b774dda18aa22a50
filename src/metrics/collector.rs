use crate::utils::time::current_timestamp;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Metrics {
    pub total_authorizations: AtomicU64,
    pub successful_authorizations: AtomicU64,
    pub failed_authorizations: AtomicU64,
    pub total_confirmations: AtomicU64,
    pub successful_confirmations: AtomicU64,
    pub failed_confirmations: AtomicU64,
    pub access_record_failures: AtomicU64,
    pub start_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_authorizations: u64,
    pub successful_authorizations: u64,
    pub failed_authorizations: u64,
    pub total_confirmations: u64,
    pub successful_confirmations: u64,
    pub failed_confirmations: u64,
    pub access_record_failures: u64,
    pub authorization_success_rate: f64,
    pub uptime_seconds: i64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total_authorizations: AtomicU64::new(0),
            successful_authorizations: AtomicU64::new(0),
            failed_authorizations: AtomicU64::new(0),
            total_confirmations: AtomicU64::new(0),
            successful_confirmations: AtomicU64::new(0),
            failed_confirmations: AtomicU64::new(0),
            access_record_failures: AtomicU64::new(0),
            start_time: current_timestamp(),
        }
    }

    pub fn increment_authorizations(&self) {
        self.total_authorizations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_successful_authorizations(&self) {
        self.successful_authorizations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed_authorizations(&self) {
        self.failed_authorizations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_confirmations(&self) {
        self.total_confirmations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_successful_confirmations(&self) {
        self.successful_confirmations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed_confirmations(&self) {
        self.failed_confirmations.fetch_add(1, Ordering::Relaxed);
    }

    /// Best-effort access-record writes that did not land
    pub fn increment_access_record_failures(&self) {
        self.access_record_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_authorizations = self.total_authorizations.load(Ordering::Relaxed);
        let successful_authorizations = self.successful_authorizations.load(Ordering::Relaxed);

        let authorization_success_rate = if total_authorizations > 0 {
            (successful_authorizations as f64 / total_authorizations as f64) * 100.0
        } else {
            0.0
        };

        MetricsSnapshot {
            total_authorizations,
            successful_authorizations,
            failed_authorizations: self.failed_authorizations.load(Ordering::Relaxed),
            total_confirmations: self.total_confirmations.load(Ordering::Relaxed),
            successful_confirmations: self.successful_confirmations.load(Ordering::Relaxed),
            failed_confirmations: self.failed_confirmations.load(Ordering::Relaxed),
            access_record_failures: self.access_record_failures.load(Ordering::Relaxed),
            authorization_success_rate,
            uptime_seconds: current_timestamp() - self.start_time,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
