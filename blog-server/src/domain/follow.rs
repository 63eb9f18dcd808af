use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Directed edge: `user_id` receives `author_id`'s posts in their follow feed.
/// At most one edge per pair, and never `user_id == author_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Follow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Follow {
    /// Returns `None` for a self-follow.
    pub fn between(user_id: Uuid, author_id: Uuid) -> Option<Self> {
        if user_id == author_id {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            user_id,
            author_id,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_follow_has_no_edge() {
        let id = Uuid::new_v4();
        assert!(Follow::between(id, id).is_none());
        assert!(Follow::between(id, Uuid::new_v4()).is_some());
    }
}
