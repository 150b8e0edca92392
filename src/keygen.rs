//! API key generation.
//!
//! Keys are `<prefix>` followed by 32 characters from `[A-Za-z0-9]`, drawn
//! from the OS CSPRNG. The shape matches keys issued by earlier versions of
//! the dashboard, so existing keys stay recognisable.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "ingest_";

/// Number of random characters after the prefix.
pub const KEY_RANDOM_LEN: usize = 32;

/// Generate a new API key with the given prefix.
pub fn generate_api_key(prefix: &str) -> String {
    let random_part: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(KEY_RANDOM_LEN)
        .map(char::from)
        .collect();

    format!("{}{}", prefix, random_part)
}

/// True if `key` is `prefix` followed by exactly 32 ASCII alphanumerics.
pub fn is_well_formed(key: &str, prefix: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some(rest) => rest.len() == KEY_RANDOM_LEN && rest.bytes().all(|b| b.is_ascii_alphanumeric()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_api_key_format() {
        let key = generate_api_key(DEFAULT_KEY_PREFIX);
        assert!(key.starts_with("ingest_"));
        assert_eq!(key.len(), "ingest_".len() + KEY_RANDOM_LEN);
        assert!(is_well_formed(&key, DEFAULT_KEY_PREFIX));
    }

    #[test]
    fn test_generate_api_key_custom_prefix() {
        let key = generate_api_key("sk_live_");
        assert!(is_well_formed(&key, "sk_live_"));
        assert!(!is_well_formed(&key, DEFAULT_KEY_PREFIX));
    }

    #[test]
    fn test_generate_api_key_unique() {
        let a = generate_api_key(DEFAULT_KEY_PREFIX);
        let b = generate_api_key(DEFAULT_KEY_PREFIX);
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_well_formed_rejects_bad_shapes() {
        assert!(!is_well_formed("ingest_short", DEFAULT_KEY_PREFIX));
        assert!(!is_well_formed(
            "ingest_abcdefghijklmnopqrstuvwxyz01234-",
            DEFAULT_KEY_PREFIX
        ));
        assert!(!is_well_formed(
            "other_abcdefghijklmnopqrstuvwxyz012345",
            DEFAULT_KEY_PREFIX
        ));
        assert!(is_well_formed(
            "ingest_abcdefghijklmnopqrstuvwxyzABCDEF",
            DEFAULT_KEY_PREFIX
        ));
    }

    #[test]
    fn test_suffix_uses_full_alphabet_range() {
        // 50 keys * 32 chars = 1600 draws; missing a whole class is vanishingly unlikely.
        let joined: String = (0..50).map(|_| generate_api_key("")).collect();
        assert!(joined.bytes().any(|b| b.is_ascii_uppercase()));
        assert!(joined.bytes().any(|b| b.is_ascii_lowercase()));
        assert!(joined.bytes().any(|b| b.is_ascii_digit()));
    }
}
