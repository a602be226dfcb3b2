//! Tag service.

use crate::services::caller::Caller;
use sea_orm::Set;
use serde::Deserialize;
use stackit_common::{AppError, AppResult};
use stackit_db::{
    entities::tag,
    repositories::{TagRepository, TagWithCount},
};
use tracing::info;
use validator::{Validate, ValidationError};

const DEFAULT_LIST_LIMIT: u64 = 20;
const MAX_LIST_LIMIT: u64 = 50;

/// Input for creating or editing a tag.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TagInput {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(custom(function = "validate_color"))]
    pub color: String,
}

/// Accept `#rrggbb` hex colours.
fn validate_color(color: &str) -> Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("color").with_message("color must be #rrggbb".into()))
    }
}

/// Tag service for business logic.
#[derive(Clone)]
pub struct TagService {
    tag_repo: TagRepository,
}

impl TagService {
    /// Create a new tag service.
    #[must_use]
    pub const fn new(tag_repo: TagRepository) -> Self {
        Self { tag_repo }
    }

    /// Tags with their question counts, most used first.
    pub async fn list(&self, search: Option<&str>, limit: Option<u64>) -> AppResult<Vec<TagWithCount>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        self.tag_repo.list_with_counts(search, limit).await
    }

    /// Create a tag, or recolour the existing tag of that name.
    pub async fn create(&self, caller: &Caller, input: TagInput) -> AppResult<tag::Model> {
        require_admin(caller)?;
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let name = input.name.trim().to_lowercase();
        let tag = self.tag_repo.upsert(&name, &input.color.to_lowercase()).await?;

        info!(tag_id = %tag.id, name = %tag.name, "Tag saved");
        Ok(tag)
    }

    /// Rename or recolour a tag.
    pub async fn update(&self, caller: &Caller, id: &str, input: TagInput) -> AppResult<tag::Model> {
        require_admin(caller)?;
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let current = self
            .tag_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag not found: {id}")))?;

        let name = input.name.trim().to_lowercase();
        if let Some(existing) = self.tag_repo.find_by_name(&name).await?
            && existing.id != current.id
        {
            return Err(AppError::Conflict(format!("Tag already exists: {name}")));
        }

        let mut active: tag::ActiveModel = current.into();
        active.name = Set(name);
        active.color = Set(input.color.to_lowercase());
        self.tag_repo.update(active).await
    }

    /// Delete a tag. Its question links cascade.
    pub async fn delete(&self, caller: &Caller, id: &str) -> AppResult<()> {
        require_admin(caller)?;

        if self.tag_repo.delete(id).await? {
            info!(tag_id = %id, "Tag deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Tag not found: {id}")))
        }
    }
}

fn require_admin(caller: &Caller) -> AppResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admins only".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{empty_db, exec};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use stackit_db::entities::user::UserRole;
    use std::sync::Arc;

    fn admin() -> Caller {
        Caller::new("root", UserRole::Admin)
    }

    fn tag_model(id: &str, name: &str, color: &str) -> tag::Model {
        tag::Model {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("#A1b2C3").is_ok());
        assert!(validate_color("#abc").is_err());
        assert!(validate_color("123456").is_err());
        assert!(validate_color("#12345g").is_err());
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let service = TagService::new(TagRepository::new(empty_db()));

        let result = service
            .create(
                &Caller::new("u1", UserRole::User),
                TagInput {
                    name: "rust".to_string(),
                    color: "#000000".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_upserts_color() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .append_query_results([[tag_model("t1", "rust", "#ff0000")]])
                .into_connection(),
        );
        let service = TagService::new(TagRepository::new(db));

        let tag = service
            .create(
                &admin(),
                TagInput {
                    name: " Rust ".to_string(),
                    color: "#FF0000".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(tag.name, "rust");
        assert_eq!(tag.color, "#ff0000");
    }

    #[tokio::test]
    async fn test_update_to_taken_name_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[tag_model("t1", "rust", "#000000")]])
                .append_query_results([[tag_model("t2", "go", "#000000")]])
                .into_connection(),
        );
        let service = TagService::new(TagRepository::new(db));

        let result = service
            .update(
                &admin(),
                "t1",
                TagInput {
                    name: "go".to_string(),
                    color: "#000000".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_tag() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(0)])
                .into_connection(),
        );
        let service = TagService::new(TagRepository::new(db));

        let result = service.delete(&admin(), "nope").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
