//! Process-local implementation of every repository trait, used by the test
//! suite and by `serve --in-memory`. It enforces the same uniqueness rules as
//! the Postgres schema and cascades comment deletion with its post.

use std::cmp::Reverse;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::follow_repository::FollowRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::comment::{Comment, CommentView};
use crate::domain::error::DomainError;
use crate::domain::follow::Follow;
use crate::domain::group::Group;
use crate::domain::post::{Post, PostChanges, PostFilter, PostView};
use crate::domain::user::User;

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    // insertion sequence breaks ties between equal timestamps
    posts: Vec<(u64, Post)>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
    next_seq: u64,
}

impl Tables {
    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self
                .follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == post.author_id),
        }
    }

    fn view(&self, post: &Post) -> Option<PostView> {
        let author = self.users.iter().find(|u| u.id == post.author_id)?;
        let group = post
            .group_id
            .and_then(|id| self.groups.iter().find(|g| g.id == id));

        Some(PostView {
            id: post.id,
            text: post.text.clone(),
            image: post.image.clone(),
            created_at: post.created_at,
            author_id: author.id,
            author_username: author.username.clone(),
            group_id: group.map(|g| g.id),
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
        })
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_count(&self) -> usize {
        self.tables.lock().posts.len()
    }

    pub fn comment_count(&self) -> usize {
        self.tables.lock().comments.len()
    }

    pub fn follow_count(&self) -> usize {
        self.tables.lock().follows.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut tables = self.tables.lock();
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(DomainError::UserAlreadyExists(user.username));
        }
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn create(&self, group: Group) -> Result<Group, DomainError> {
        let mut tables = self.tables.lock();
        if tables.groups.iter().any(|g| g.slug == group.slug) {
            return Err(DomainError::GroupAlreadyExists(group.slug));
        }
        tables.groups.push(group.clone());
        Ok(group)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Group>, DomainError> {
        let mut groups = self.tables.lock().groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.slug.cmp(&b.slug)));
        Ok(groups)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        let mut tables = self.tables.lock();
        if !tables.users.iter().any(|u| u.id == post.author_id) {
            return Err(DomainError::Internal(format!(
                "post author {} does not exist",
                post.author_id
            )));
        }
        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.posts.push((seq, post.clone()));
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables
            .posts
            .iter()
            .find(|(_, p)| p.id == id)
            .map(|(_, p)| p.clone()))
    }

    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, DomainError> {
        let tables = self.tables.lock();
        Ok(tables
            .posts
            .iter()
            .find(|(_, p)| p.id == id)
            .and_then(|(_, p)| tables.view(p)))
    }

    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        changes: PostChanges,
    ) -> Result<Option<Post>, DomainError> {
        let mut tables = self.tables.lock();
        let Some((_, post)) = tables
            .posts
            .iter_mut()
            .find(|(_, p)| p.id == id && p.author_id == author_id)
        else {
            return Ok(None);
        };
        post.apply(changes);
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.lock();
        let before = tables.posts.len();
        tables
            .posts
            .retain(|(_, p)| !(p.id == id && p.author_id == author_id));
        let removed = tables.posts.len() < before;
        if removed {
            tables.comments.retain(|c| c.post_id != id);
        }
        Ok(removed)
    }

    async fn count(&self, filter: PostFilter) -> Result<u64, DomainError> {
        let tables = self.tables.lock();
        Ok(tables
            .posts
            .iter()
            .filter(|(_, p)| tables.matches(p, filter))
            .count() as u64)
    }

    async fn list(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostView>, DomainError> {
        let tables = self.tables.lock();
        let mut selected: Vec<&(u64, Post)> = tables
            .posts
            .iter()
            .filter(|(_, p)| tables.matches(p, filter))
            .collect();
        selected.sort_by_key(|(seq, p)| Reverse((p.created_at, *seq)));

        Ok(selected
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .filter_map(|(_, p)| tables.view(p))
            .collect())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError> {
        let mut tables = self.tables.lock();
        if !tables.posts.iter().any(|(_, p)| p.id == comment.post_id) {
            return Err(DomainError::PostNotFound(comment.post_id));
        }
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, DomainError> {
        let tables = self.tables.lock();
        let mut comments: Vec<CommentView> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let author = tables.users.iter().find(|u| u.id == c.author_id)?;
                Some(CommentView {
                    id: c.id,
                    post_id: c.post_id,
                    author_id: c.author_id,
                    author_username: author.username.clone(),
                    text: c.text.clone(),
                    created_at: c.created_at,
                })
            })
            .collect();
        // stable sort keeps insertion order for equal timestamps
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn create_if_absent(&self, follow: Follow) -> Result<bool, DomainError> {
        if follow.user_id == follow.author_id {
            return Ok(false);
        }
        let mut tables = self.tables.lock();
        if tables
            .follows
            .iter()
            .any(|f| f.user_id == follow.user_id && f.author_id == follow.author_id)
        {
            return Ok(false);
        }
        tables.follows.push(follow);
        Ok(true)
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.lock();
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(tables.follows.len() < before)
    }

    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        let tables = self.tables.lock();
        Ok(tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<u64, DomainError> {
        let tables = self.tables.lock();
        Ok(tables.follows.iter().filter(|f| f.author_id == author_id).count() as u64)
    }

    async fn count_following(&self, user_id: Uuid) -> Result<u64, DomainError> {
        let tables = self.tables.lock();
        Ok(tables.follows.iter().filter(|f| f.user_id == user_id).count() as u64)
    }
}
