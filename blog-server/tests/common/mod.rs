#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::header;
use actix_web::web::Bytes;
use blog_server::data::Repositories;
use blog_server::data::group_repository::GroupRepository;
use blog_server::data::memory::InMemoryStore;
use blog_server::data::post_repository::PostRepository;
use blog_server::data::user_repository::UserRepository;
use blog_server::domain::group::Group;
use blog_server::domain::post::{Post, PostChanges};
use blog_server::domain::user::User;
use blog_server::infrastructure::page_cache::{DEFAULT_PAGE_TTL, InMemoryPageCache};
use blog_server::infrastructure::security::JwtKeys;
use blog_server::server::AppServices;
use serde_json::Value;

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub page_cache: Arc<InMemoryPageCache>,
    pub services: AppServices,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_PAGE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let page_cache = Arc::new(InMemoryPageCache::new());
        let services = AppServices::new(
            &Repositories::in_memory(store.clone()),
            JwtKeys::new("test-secret".into()),
            page_cache.clone(),
            ttl,
        );
        Self {
            store,
            page_cache,
            services,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        let user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "not-a-real-hash".into(),
        );
        UserRepository::create(self.store.as_ref(), user)
            .await
            .unwrap()
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        let group = Group::new(title.into(), slug.into(), format!("{title} talk")).unwrap();
        GroupRepository::create(self.store.as_ref(), group)
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        let post = Post::new(
            author.id,
            PostChanges {
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            },
        );
        PostRepository::create(self.store.as_ref(), post)
            .await
            .unwrap()
    }

    pub async fn stored_post(&self, id: uuid::Uuid) -> Option<Post> {
        PostRepository::find_by_id(self.store.as_ref(), id)
            .await
            .unwrap()
    }

    pub fn bearer(&self, user: &User) -> (header::HeaderName, String) {
        let token = self.services.auth.issue_token(user).unwrap();
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }
}

pub fn json(body: &Bytes) -> Value {
    serde_json::from_slice(body).expect("response body is JSON")
}

pub fn texts(page: &Value) -> Vec<String> {
    page["page_obj"]["items"]
        .as_array()
        .expect("page items")
        .iter()
        .map(|item| item["text"].as_str().unwrap_or_default().to_string())
        .collect()
}
