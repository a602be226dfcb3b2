//! Resolved identity of the user performing an operation.

use stackit_db::entities::user::{self, UserRole};

/// The caller of a core operation, as supplied by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: UserRole,
}

impl Caller {
    #[must_use]
    pub fn new(id: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether the caller may edit or delete content owned by `owner_id`.
    #[must_use]
    pub fn can_modify(&self, owner_id: &str) -> bool {
        self.id == owner_id || self.is_admin()
    }
}

impl From<&user::Model> for Caller {
    fn from(user: &user::Model) -> Self {
        Self::new(user.id.clone(), user.role)
    }
}
