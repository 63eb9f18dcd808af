use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::error::{DomainError, FormErrors};

pub const GROUP_TITLE_MAX_LEN: usize = 200;

/// A named category posts can be filed under. The slug never changes once the
/// group exists, so there is no update path for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    pub fn new(title: String, slug: String, description: String) -> Result<Self, DomainError> {
        let title = title.trim().to_string();
        let mut errors = FormErrors::default();
        if title.is_empty() {
            errors.add("title", "This field is required.");
        } else if title.chars().count() > GROUP_TITLE_MAX_LEN {
            errors.add(
                "title",
                format!("Ensure this value has at most {GROUP_TITLE_MAX_LEN} characters."),
            );
        }
        if !is_valid_slug(&slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }
        errors.into_result()?;

        Ok(Self {
            id: Uuid::new_v4(),
            title,
            slug,
            description,
        })
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Letters, digits, underscores and hyphens only.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}
