/// Check a caller-supplied key against the configured one.
///
/// Compares in constant time for equal-length keys. With no key configured
/// every request is refused.
pub fn verify_api_key(provided: &str, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return false;
    };

    provided.len() == expected.len()
        && provided
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_api_key_valid() {
        assert!(verify_api_key("kiosk-ops", Some("kiosk-ops")));
    }

    #[test]
    fn test_verify_api_key_invalid() {
        assert!(!verify_api_key("wrong-key", Some("kiosk-ops")));
        assert!(!verify_api_key("Kiosk-Ops", Some("kiosk-ops")));
    }

    #[test]
    fn test_verify_api_key_different_length() {
        assert!(!verify_api_key("short", Some("much-longer-key")));
    }

    #[test]
    fn test_verify_api_key_unconfigured() {
        assert!(!verify_api_key("", None));
        assert!(!verify_api_key("anything", None));
    }
}
