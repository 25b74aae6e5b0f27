//! Registry names and the digests used as directory keys.

use crate::hash::{keccak256, DIGEST_BYTES};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Names must be strictly shorter than this many bytes.
pub const MAX_NAME_BYTES: usize = 100;

/// Fixed-size directory key derived from a name.
///
/// Directories never store raw names as keys, so enumerating keys does not
/// reveal which names are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameHash(pub [u8; DIGEST_BYTES]);

impl NameHash {
    /// Digest of the UTF-8 bytes of `name`.
    pub fn of(name: &str) -> Self {
        Self(keccak256(name.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_BYTES] {
        &self.0
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; DIGEST_BYTES]> for NameHash {
    fn from(value: [u8; DIGEST_BYTES]) -> Self {
        Self(value)
    }
}

/// Whether `name` fits the registry's length limit.
pub fn is_valid_name_length(name: &str) -> bool {
    name.len() < MAX_NAME_BYTES
}

/// True when `s` contains no uppercase character.
///
/// Digits, punctuation and caseless scripts are accepted; only characters
/// with an uppercase property are rejected.
pub fn is_all_lowercase(s: &str) -> bool {
    !s.chars().any(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn digest_is_stable_per_name() {
        assert_eq!(NameHash::of("hydro"), NameHash::of("hydro"));
        assert_ne!(NameHash::of("hydro"), NameHash::of("Hydro"));
    }

    #[test]
    fn length_boundary() {
        assert!(is_valid_name_length(&"a".repeat(99)));
        assert!(!is_valid_name_length(&"a".repeat(100)));
        // byte length, not character count
        assert!(!is_valid_name_length(&"é".repeat(50)));
    }

    #[test]
    fn lowercase_predicate() {
        assert!(is_all_lowercase("hydro"));
        assert!(is_all_lowercase("hydro-2_app.v1"));
        assert!(is_all_lowercase(""));
        assert!(!is_all_lowercase("Hydro"));
        assert!(!is_all_lowercase("hydrO"));
        assert!(!is_all_lowercase("ÉCOLE"));
    }

    proptest! {
        #[test]
        fn inserting_an_uppercase_letter_fails_predicate(
            prefix in "[a-z0-9]{0,20}",
            upper in "[A-Z]",
            suffix in "[a-z0-9]{0,20}",
        ) {
            let name = format!("{prefix}{upper}{suffix}");
            prop_assert!(!is_all_lowercase(&name));
            prop_assert!(is_all_lowercase(&name.to_lowercase()));
        }
    }
}
