//! Random identifier generation.
//!
//! Identifiers are RFC 4122-shaped random strings (`8-4-4-4-12` hex digits).
//! Uniqueness is probabilistic, not guaranteed — callers tolerate the rare
//! duplicate without correctness failure, only cosmetic risk.

use uuid::Uuid;

/// Produce a random, collision-improbable 36-character identifier.
pub fn uid() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_uid_shape() {
        let re = Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .unwrap();
        for _ in 0..64 {
            let id = uid();
            assert!(re.is_match(&id), "unexpected identifier shape: {}", id);
        }
    }

    #[test]
    fn test_uid_not_constant() {
        assert_ne!(uid(), uid());
    }
}
