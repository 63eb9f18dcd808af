use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

const DISPLAY_CHARS: usize = 15;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub text: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author_id: Uuid, changes: PostChanges) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            group_id: changes.group_id,
            text: changes.text,
            image: changes.image,
            created_at: Utc::now(),
        }
    }

    /// Applies an edit. Author and creation time are not part of `PostChanges`
    /// and stay as they are; a missing image keeps the current one.
    pub fn apply(&mut self, changes: PostChanges) {
        self.text = changes.text;
        self.group_id = changes.group_id;
        if changes.image.is_some() {
            self.image = changes.image;
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&truncate_chars(&self.text, DISPLAY_CHARS))
    }
}

/// Validated editable fields of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

/// A post joined with its author and group, produced by a single query.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PostView {
    pub id: Uuid,
    pub text: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<Uuid>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

/// Which posts a feed is made of. Every feed is ordered newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(Uuid),
    Author(Uuid),
    /// Posts by authors the given user follows.
    FollowedBy(Uuid),
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
