//! Row identifiers.
//!
//! Questions, answers, votes, tags, reports and notifications are keyed by a
//! lowercase ULID. Ids minted in different milliseconds compare in creation
//! order, which the newest-first listings rely on as a tiebreak.

use ulid::Ulid;
use uuid::Uuid;

/// Mints row ids and collision-free name suffixes.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator;

impl IdGenerator {
    /// Create a generator. It holds no state.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// A fresh row id: 26 lowercase Crockford base32 characters.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_ascii_lowercase()
    }

    /// 32 random lowercase hex characters with no time component.
    ///
    /// Per-run test databases take their name suffix from this.
    #[must_use]
    pub fn generate_token(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
