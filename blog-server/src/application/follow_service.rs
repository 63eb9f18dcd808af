use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::data::Repositories;
use crate::data::follow_repository::FollowRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::follow::Follow;
use crate::domain::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    /// Following yourself is silently ignored.
    SelfFollow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Removed,
    NotFollowing,
}

/// Creates and removes follow edges. Both mutations are idempotent and only
/// fail when the target user does not exist.
#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl FollowService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: Arc::clone(&repos.users),
            follows: Arc::clone(&repos.follows),
        }
    }

    async fn resolve(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn follow(&self, viewer: Uuid, target: &str) -> Result<FollowOutcome, DomainError> {
        let author = self.resolve(target).await?;
        let Some(edge) = Follow::between(viewer, author.id) else {
            return Ok(FollowOutcome::SelfFollow);
        };

        if self.follows.create_if_absent(edge).await? {
            info!(user_id = %viewer, author = %author.username, "now following");
            Ok(FollowOutcome::Created)
        } else {
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    #[instrument(skip(self))]
    pub async fn unfollow(
        &self,
        viewer: Uuid,
        target: &str,
    ) -> Result<UnfollowOutcome, DomainError> {
        let author = self.resolve(target).await?;

        if self.follows.delete(viewer, author.id).await? {
            info!(user_id = %viewer, author = %author.username, "unfollowed");
            Ok(UnfollowOutcome::Removed)
        } else {
            Ok(UnfollowOutcome::NotFollowing)
        }
    }

    /// False for anonymous viewers. Store failures are logged and read as false.
    pub async fn is_following(&self, viewer: Option<Uuid>, author_id: Uuid) -> bool {
        let Some(viewer) = viewer else {
            return false;
        };
        match self.follows.exists(viewer, author_id).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(user_id = %viewer, author_id = %author_id, "follow lookup failed: {}", e);
                false
            }
        }
    }
}
