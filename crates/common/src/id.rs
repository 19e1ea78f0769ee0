//! ID and token generation.
//!
//! Questions, choices and votes use database-assigned integer keys so that
//! insertion order doubles as a tie-breaker. Accounts use ULIDs and carry an
//! opaque bearer token.

use ulid::Ulid;
use uuid::Uuid;

/// Generator for account identifiers and access tokens.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a lowercase ULID for a new account.
    #[must_use]
    pub fn user_id(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a random bearer token.
    #[must_use]
    pub fn access_token(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_ids_are_ulids() {
        let id_gen = IdGenerator::new();
        let first = id_gen.user_id();
        let second = id_gen.user_id();

        assert_eq!(first.len(), 26);
        assert_eq!(first, first.to_lowercase());
        assert_ne!(first, second);
    }

    #[test]
    fn test_access_tokens_are_hex() {
        let id_gen = IdGenerator::new();
        let token = id_gen.access_token();

        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, id_gen.access_token());
    }
}
