use crate::data::violated_constraint;
use crate::domain::error::DomainError;
use crate::domain::follow::Follow;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error, info};
use uuid::Uuid;

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Create-or-get. The `(user_id, author_id)` uniqueness constraint is the
    /// source of truth: a duplicate is reported as `Ok(false)`, not an error.
    async fn create_if_absent(&self, follow: Follow) -> Result<bool, DomainError>;
    /// `Ok(false)` when there was no edge to remove.
    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError>;
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError>;
    async fn count_followers(&self, author_id: Uuid) -> Result<u64, DomainError>;
    async fn count_following(&self, user_id: Uuid) -> Result<u64, DomainError>;
}

#[derive(Clone)]
pub struct PostgresFollowRepository {
    pool: PgPool,
}

impl PostgresFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count_where(&self, column: &str, id: Uuid) -> Result<u64, DomainError> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM follows WHERE {column} = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to count follows by {} {}: {}", column, id, e);
            DomainError::Internal(e.to_string())
        })?;
        Ok(total.max(0) as u64)
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn create_if_absent(&self, follow: Follow) -> Result<bool, DomainError> {
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO follows (id, user_id, author_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, author_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(follow.id)
        .bind(follow.user_id)
        .bind(follow.author_id)
        .bind(follow.created_at)
        .fetch_optional(&self.pool)
        .await;

        match inserted {
            Ok(Some(_)) => {
                info!(user_id = %follow.user_id, author_id = %follow.author_id, "follow created");
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) if violated_constraint(&e).as_deref() == Some("follows_no_self_follow") => {
                debug!(user_id = %follow.user_id, "self-follow rejected by store");
                Ok(false)
            }
            Err(e) => {
                error!("failed to create follow: {}", e);
                Err(DomainError::Internal(format!("database error: {}", e)))
            }
        }
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(user_id = %user_id, author_id = %author_id, "follow removed");
        }
        Ok(removed)
    }

    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Internal(e.to_string()))
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<u64, DomainError> {
        self.count_where("author_id", author_id).await
    }

    async fn count_following(&self, user_id: Uuid) -> Result<u64, DomainError> {
        self.count_where("user_id", user_id).await
    }
}
