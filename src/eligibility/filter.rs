use crate::core::config::EligibilityConfig;
use crate::models::prescription::Prescription;
use crate::models::record::{Record, RecordKind};
use std::collections::HashSet;

/// Cooldown windows, in seconds, per ledger record kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CooldownPolicy {
    /// Suppresses rapid re-authorization (sensor jitter, double taps)
    pub access: i64,
    /// Prevents dispensing the same medication twice in a short span
    pub dispense: i64,
}

impl CooldownPolicy {
    pub fn new(access: i64, dispense: i64) -> Self {
        Self { access, dispense }
    }

    pub fn window(&self, kind: RecordKind) -> i64 {
        match kind {
            RecordKind::Access => self.access,
            RecordKind::Dispense => self.dispense,
        }
    }

    /// A record blocks its dins up to and including `timestamp + window`
    pub fn is_cooling_down(&self, record: &Record, now: i64) -> bool {
        now <= record.timestamp.saturating_add(self.window(record.kind))
    }
}

impl From<&EligibilityConfig> for CooldownPolicy {
    fn from(config: &EligibilityConfig) -> Self {
        Self::new(config.access_cooldown, config.dispense_cooldown)
    }
}

/// Dins named by any ledger record whose cooldown has not elapsed at `now`
pub fn blocked_dins<'a>(now: i64, ledger: &'a [Record], policy: &CooldownPolicy) -> HashSet<&'a str> {
    ledger
        .iter()
        .filter(|record| policy.is_cooling_down(record, now))
        .flat_map(|record| record.dins.iter().map(String::as_str))
        .collect()
}

/// Prescriptions that may be released at `now`.
///
/// Expired prescriptions (`expires < now`) are dropped regardless of the
/// ledger, then anything whose din is still cooling down. Input order is kept.
pub fn eligible(
    now: i64,
    prescriptions: &[Prescription],
    ledger: &[Record],
    policy: &CooldownPolicy,
) -> Vec<Prescription> {
    let blocked = blocked_dins(now, ledger, policy);

    prescriptions
        .iter()
        .filter(|p| p.expires >= now)
        .filter(|p| !blocked.contains(p.din.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CooldownPolicy {
        CooldownPolicy::new(30, 3600)
    }

    fn dins(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn result_dins(result: &[Prescription]) -> Vec<&str> {
        result.iter().map(|p| p.din.as_str()).collect()
    }

    #[test]
    fn test_expired_prescription_excluded() {
        let prescriptions = vec![Prescription::new("A1", 100)];
        assert!(eligible(101, &prescriptions, &[], &policy()).is_empty());
    }

    #[test]
    fn test_prescription_expiring_now_is_eligible() {
        let prescriptions = vec![Prescription::new("A1", 100)];
        assert_eq!(eligible(100, &prescriptions, &[], &policy()).len(), 1);
    }

    #[test]
    fn test_expired_excluded_even_with_empty_ledger_and_old_records() {
        let prescriptions = vec![Prescription::new("A1", 100), Prescription::new("B2", 10_000)];
        let ledger = vec![Record::access(dins(&["B2"]), 0)];
        assert_eq!(result_dins(&eligible(5000, &prescriptions, &ledger, &policy())), vec!["B2"]);
    }

    #[test]
    fn test_access_cooldown_window() {
        let prescriptions = vec![Prescription::new("A1", i64::MAX)];
        let ledger = vec![Record::access(dins(&["A1"]), 1000)];

        assert!(eligible(1020, &prescriptions, &ledger, &policy()).is_empty());
        // boundary is inclusive
        assert!(eligible(1030, &prescriptions, &ledger, &policy()).is_empty());
        assert_eq!(eligible(1031, &prescriptions, &ledger, &policy()).len(), 1);
    }

    #[test]
    fn test_dispense_cooldown_is_independent() {
        let prescriptions = vec![Prescription::new("A1", i64::MAX)];
        let ledger = vec![Record::dispense(dins(&["A1"]), 1000)];

        // well past the access window, still inside the dispense window
        assert!(eligible(1031, &prescriptions, &ledger, &policy()).is_empty());
        assert!(eligible(4600, &prescriptions, &ledger, &policy()).is_empty());
        assert_eq!(eligible(4601, &prescriptions, &ledger, &policy()).len(), 1);
    }

    #[test]
    fn test_only_listed_dins_are_blocked() {
        let prescriptions = vec![
            Prescription::new("A1", i64::MAX),
            Prescription::new("B2", i64::MAX),
            Prescription::new("C3", i64::MAX),
        ];
        let ledger = vec![
            Record::access(dins(&["A1"]), 990),
            Record::dispense(dins(&["C3"]), 100),
        ];

        assert_eq!(result_dins(&eligible(1000, &prescriptions, &ledger, &policy())), vec!["B2"]);
    }

    #[test]
    fn test_any_record_can_block() {
        let prescriptions = vec![Prescription::new("A1", i64::MAX)];
        // an old record followed by a recent one
        let ledger = vec![
            Record::access(dins(&["A1"]), 0),
            Record::access(dins(&["A1"]), 995),
        ];
        assert!(eligible(1000, &prescriptions, &ledger, &policy()).is_empty());
    }

    #[test]
    fn test_zero_cooldown_blocks_only_same_second() {
        let policy = CooldownPolicy::new(0, 0);
        let prescriptions = vec![Prescription::new("A1", i64::MAX)];
        let ledger = vec![Record::access(dins(&["A1"]), 1000)];

        assert!(eligible(1000, &prescriptions, &ledger, &policy).is_empty());
        assert_eq!(eligible(1001, &prescriptions, &ledger, &policy).len(), 1);
    }

    #[test]
    fn test_cooldown_does_not_overflow() {
        let policy = CooldownPolicy::new(i64::MAX, i64::MAX);
        let record = Record::access(dins(&["A1"]), i64::MAX - 5);
        assert!(policy.is_cooling_down(&record, i64::MAX));
    }

    #[test]
    fn test_blocked_dins_collects_active_records() {
        let ledger = vec![
            Record::access(dins(&["A1", "B2"]), 990),
            Record::access(dins(&["C3"]), 0),
        ];
        let blocked = blocked_dins(1000, &ledger, &policy());
        assert!(blocked.contains("A1"));
        assert!(blocked.contains("B2"));
        assert!(!blocked.contains("C3"));
    }

    #[test]
    fn test_order_is_preserved() {
        let prescriptions = vec![
            Prescription::new("Z9", i64::MAX),
            Prescription::new("A1", i64::MAX),
            Prescription::new("M5", i64::MAX),
        ];
        assert_eq!(
            result_dins(&eligible(0, &prescriptions, &[], &policy())),
            vec!["Z9", "A1", "M5"]
        );
    }
}
