use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::application::pagination::{Page, PageSource, Paginator};
use crate::data::Repositories;
use crate::data::follow_repository::FollowRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::post::{PostFilter, PostView};
use crate::domain::user::User;

/// Binds a filter to the post store so the paginator can count and slice it.
struct PostQuery<'a> {
    posts: &'a dyn PostRepository,
    filter: PostFilter,
}

#[async_trait]
impl<'a> PageSource for PostQuery<'a> {
    type Item = PostView;

    async fn count(&self) -> Result<u64, DomainError> {
        self.posts.count(self.filter).await
    }

    async fn slice(&self, offset: u64, limit: u64) -> Result<Vec<PostView>, DomainError> {
        self.posts.list(self.filter, offset, limit).await
    }
}

#[derive(Debug)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<PostView>,
}

#[derive(Debug)]
pub struct ProfileFeed {
    pub author: User,
    pub page: Page<PostView>,
    pub followers: u64,
    pub following: u64,
}

/// Builds the four post feeds. Every feed is newest first and paginated with
/// the shared page capacity.
#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
    paginator: Paginator,
}

impl FeedService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            posts: Arc::clone(&repos.posts),
            groups: Arc::clone(&repos.groups),
            users: Arc::clone(&repos.users),
            follows: Arc::clone(&repos.follows),
            paginator: Paginator::default(),
        }
    }

    async fn page(&self, filter: PostFilter, page: Option<&str>) -> Result<Page<PostView>, DomainError> {
        let query = PostQuery {
            posts: self.posts.as_ref(),
            filter,
        };
        let page = self.paginator.paginate(&query, page).await?;
        debug!(?filter, number = page.number, count = page.count, "feed page assembled");
        Ok(page)
    }

    pub async fn index(&self, page: Option<&str>) -> Result<Page<PostView>, DomainError> {
        self.page(PostFilter::All, page).await
    }

    pub async fn group_feed(&self, slug: &str, page: Option<&str>) -> Result<GroupFeed, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))?;
        let page = self.page(PostFilter::Group(group.id), page).await?;

        Ok(GroupFeed { group, page })
    }

    pub async fn profile_feed(
        &self,
        username: &str,
        page: Option<&str>,
    ) -> Result<ProfileFeed, DomainError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))?;
        let page = self.page(PostFilter::Author(author.id), page).await?;
        let followers = self.follows.count_followers(author.id).await?;
        let following = self.follows.count_following(author.id).await?;

        Ok(ProfileFeed {
            author,
            page,
            followers,
            following,
        })
    }

    /// Posts by the authors `viewer` follows. An anonymous viewer is an
    /// authorization failure, not an empty feed.
    pub async fn follow_feed(
        &self,
        viewer: Option<Uuid>,
        page: Option<&str>,
    ) -> Result<Page<PostView>, DomainError> {
        let viewer = viewer.ok_or(DomainError::Unauthorized)?;
        self.page(PostFilter::FollowedBy(viewer), page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;
    use crate::domain::follow::Follow;
    use crate::domain::post::{Post, PostChanges};

    struct Fixture {
        store: Arc<InMemoryStore>,
        feeds: FeedService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let feeds = FeedService::new(&Repositories::in_memory(store.clone()));
        Fixture { store, feeds }
    }

    impl Fixture {
        async fn user(&self, name: &str) -> User {
            UserRepository::create(
                self.store.as_ref(),
                User::new(name.into(), format!("{name}@example.com"), "x".into()),
            )
            .await
            .unwrap()
        }

        async fn group(&self, slug: &str) -> Group {
            let group = Group::new(slug.to_uppercase(), slug.into(), String::new()).unwrap();
            GroupRepository::create(self.store.as_ref(), group).await.unwrap()
        }

        async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
            let post = Post::new(
                author.id,
                PostChanges {
                    text: text.into(),
                    group_id: group.map(|g| g.id),
                    image: None,
                },
            );
            PostRepository::create(self.store.as_ref(), post).await.unwrap()
        }
    }

    #[actix_web::test]
    async fn group_feed_filters_by_slug() {
        let fx = fixture();
        let author = fx.user("u1").await;
        let tech = fx.group("tech").await;
        let other = fx.group("other").await;
        fx.post(&author, "hello", Some(&tech)).await;
        fx.post(&author, "elsewhere", Some(&other)).await;
        fx.post(&author, "no group", None).await;

        let feed = fx.feeds.group_feed("tech", None).await.unwrap();
        assert_eq!(feed.group.slug, "tech");
        assert_eq!(feed.page.count, 1);
        assert_eq!(feed.page.items[0].text, "hello");
        assert_eq!(feed.page.items[0].group_slug.as_deref(), Some("tech"));

        let err = fx.feeds.group_feed("unknown", None).await.unwrap_err();
        assert!(matches!(err, DomainError::GroupNotFound(_)));
    }

    #[actix_web::test]
    async fn profile_feed_filters_by_author() {
        let fx = fixture();
        let u1 = fx.user("u1").await;
        let u2 = fx.user("u2").await;
        fx.post(&u1, "mine", None).await;
        fx.post(&u2, "theirs", None).await;

        let feed = fx.feeds.profile_feed("u1", None).await.unwrap();
        assert_eq!(feed.author.id, u1.id);
        assert_eq!(feed.page.count, 1);
        assert_eq!(feed.page.items[0].author_username, "u1");

        let err = fx.feeds.profile_feed("ghost", None).await.unwrap_err();
        assert!(matches!(err, DomainError::UserNotFound(_)));
    }

    #[actix_web::test]
    async fn follow_feed_tracks_edges_at_read_time() {
        let fx = fixture();
        let u1 = fx.user("u1").await;
        let u2 = fx.user("u2").await;
        fx.post(&u1, "by u1", None).await;

        assert_eq!(fx.feeds.follow_feed(Some(u2.id), None).await.unwrap().count, 0);

        fx.store
            .create_if_absent(Follow::between(u2.id, u1.id).unwrap())
            .await
            .unwrap();
        let feed = fx.feeds.follow_feed(Some(u2.id), None).await.unwrap();
        assert_eq!(feed.count, 1);
        assert_eq!(feed.items[0].text, "by u1");
        assert_eq!(fx.feeds.follow_feed(Some(u1.id), None).await.unwrap().count, 0);

        fx.store.delete(u2.id, u1.id).await.unwrap();
        assert_eq!(fx.feeds.follow_feed(Some(u2.id), None).await.unwrap().count, 0);
    }

    #[actix_web::test]
    async fn follow_feed_requires_a_viewer() {
        let fx = fixture();
        let err = fx.feeds.follow_feed(None, None).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }

    #[actix_web::test]
    async fn index_pages_through_everything() {
        let fx = fixture();
        let author = fx.user("u1").await;
        for i in 0..13 {
            fx.post(&author, &format!("post {i}"), None).await;
        }

        let first = fx.feeds.index(None).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first.items[0].text, "post 12");
        let second = fx.feeds.index(Some("2")).await.unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(second.items[2].text, "post 0");
    }
}
