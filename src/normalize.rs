// Field normalization and hashing. The matching API only ever sees
// SHA-256 hex digests of identity fields; the raw values never leave
// this process. The rules are fixed by the platform:
//   - emails and names: trim, lowercase, SHA-256
//   - phone numbers: reduce to digits, canonical "+<digits>" form, SHA-256
//   - country codes, zip codes and list names are never hashed

use sha2::{Digest, Sha256};

/// SHA-256 of the input, rendered as a lowercase hex string.
pub fn sha256_hex(s: &str) -> String {
    Sha256::digest(s.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Normalize (trim, lowercase) and hash a case-insensitive identity
/// field such as an email address or a name.
pub fn normalize_and_sha256(s: &str) -> String {
    sha256_hex(&s.trim().to_lowercase())
}

/// Reduce a phone number to its canonical numeric form: every non-digit
/// character is dropped and a single `+` prefix is added. Applying this
/// to an already-normalized number returns it unchanged.
pub fn normalize_phone(s: &str) -> String {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("+{digits}")
}

/// Normalize and hash a phone number.
pub fn phone_sha256(s: &str) -> String {
    sha256_hex(&normalize_phone(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization_example() {
        // Mixed case and padding collapse to the digest of the
        // canonical lowercase form.
        assert_eq!(
            normalize_and_sha256("  Test@Example.com  "),
            "973dfe463ec85785f5f95af5ba3906eedb2d931c24e69824a89ea65dba4e813b"
        );
        assert_eq!(
            normalize_and_sha256("test@example.com"),
            "973dfe463ec85785f5f95af5ba3906eedb2d931c24e69824a89ea65dba4e813b"
        );
    }

    #[test]
    fn phone_normalization_strips_formatting() {
        assert_eq!(normalize_phone("(415) 555-0123"), "+4155550123");
        assert_eq!(normalize_phone("+1 415 555 0123"), "+14155550123");
    }

    #[test]
    fn phone_normalization_is_idempotent() {
        let once = normalize_phone("+1 (415) 555-0123");
        assert_eq!(normalize_phone(&once), once);
    }

    #[test]
    fn phone_hash_uses_canonical_form() {
        // "(415) 555-0123" with a country code and "+14155550123" hash
        // identically once normalized.
        assert_eq!(
            phone_sha256("+1 415-555-0123"),
            "36a2cef4ff9bf7a1abd2a93359136b870393be4106e6c5d19b72ff564f9deca4"
        );
        assert_eq!(phone_sha256("+14155550123"), phone_sha256("1 (415) 555 0123"));
    }

    #[test]
    fn digest_is_lowercase_hex() {
        let d = normalize_and_sha256("someone@example.org");
        assert_eq!(d.len(), 64);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
