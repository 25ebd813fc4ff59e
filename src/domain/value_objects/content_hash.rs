use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Separates fields when hashing multi-field content so that
/// ("ab", "c") and ("a", "bc") never collide.
const FIELD_SEPARATOR: &[u8] = b"\x1f";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    pub fn new(hash: String) -> Result<Self, String> {
        if hash.len() != 64 {
            return Err("Hash must be 64 characters long (SHA-256)".to_string());
        }

        if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("Hash must contain only hexadecimal characters".to_string());
        }

        Ok(Self(hash.to_lowercase()))
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        Self(format!("{:x}", result))
    }

    /// Hash of résumé-style free text: trimmed, lowercased, whitespace collapsed.
    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(normalize_text(text).as_bytes())
    }

    /// Hash of the canonical concatenation of several text fields, in order.
    pub fn from_fields(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(FIELD_SEPARATOR);
            }
            hasher.update(field.trim().as_bytes());
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &ContentHash) -> bool {
        self.0 == other.0
    }

    /// Point id used by the vector stores: the first 128 bits of the digest.
    pub fn point_id(&self) -> Uuid {
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&self.0[i * 2..i * 2 + 2], 16).unwrap_or_default();
        }
        Uuid::from_bytes(bytes)
    }
}

pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl TryFrom<String> for ContentHash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_hash() {
        let hash_str = "a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3";
        let hash = ContentHash::new(hash_str.to_string()).unwrap();
        assert_eq!(hash.as_str(), hash_str);
    }

    #[test]
    fn test_invalid_hash_length() {
        assert!(ContentHash::new("invalid".to_string()).is_err());
    }

    #[test]
    fn test_invalid_hash_characters() {
        let hash_str = "g665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3";
        assert!(ContentHash::new(hash_str.to_string()).is_err());
    }

    #[test]
    fn test_text_hash_ignores_case_and_spacing() {
        let a = ContentHash::from_text("  Jane Doe\n\nRust   Engineer ");
        let b = ContentHash::from_text("jane doe rust engineer");
        assert!(a.matches(&b));
        assert!(!a.matches(&ContentHash::from_text("jane doe go engineer")));
    }

    #[test]
    fn test_field_hash_is_order_and_boundary_sensitive() {
        let a = ContentHash::from_fields(&["ab", "c"]);
        let b = ContentHash::from_fields(&["a", "bc"]);
        let c = ContentHash::from_fields(&["c", "ab"]);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, ContentHash::from_fields(&["ab", "c"]));
    }

    #[test]
    fn test_point_id_uses_digest_prefix() {
        let hash = ContentHash::new(
            "a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3".to_string(),
        )
        .unwrap();
        assert_eq!(
            hash.point_id().simple().to_string(),
            "a665a45920422f9d417e4867efdc4fb8"
        );
    }

    #[test]
    fn test_serde_rejects_malformed_hash() {
        let parsed: Result<ContentHash, _> = serde_json::from_str("\"nothex\"");
        assert!(parsed.is_err());
    }
}
