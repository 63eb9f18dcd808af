use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::pagination::Page;
use crate::domain::comment::CommentView;
use crate::domain::error::FormErrors;
use crate::domain::group::Group;
use crate::domain::post::PostView;
use crate::domain::user::AuthorSummary;

// ======================= FORMS =======================
// Every field is optional at the wire level so a missing field becomes an
// inline validation error instead of a rejected request.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: Option<String>,
    /// Group id as submitted by the choice field; empty means "no group".
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// The `page` query parameter as sent. A malformed query or a repeated key
/// never rejects the request: the last `page` value wins.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn from_query(query: &str) -> Self {
        let page = web::Query::<Vec<(String, String)>>::from_query(query)
            .ok()
            .and_then(|pairs| {
                pairs
                    .into_inner()
                    .into_iter()
                    .filter(|(key, _)| key == "page")
                    .map(|(_, value)| value)
                    .last()
            });
        Self { page }
    }
}

impl FromRequest for PageQuery {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self::from_query(req.query_string())))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// ======================= PAGES =======================

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct GroupPage {
    pub group: Group,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub author: AuthorSummary,
    pub following: bool,
    pub post_count: u64,
    pub followers_count: u64,
    pub following_count: u64,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct FollowPage {
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailPage {
    pub title: String,
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub is_author: bool,
    pub form: CommentForm,
}

#[derive(Debug, Serialize)]
pub struct GroupChoice {
    pub id: Uuid,
    pub title: String,
}

impl From<Group> for GroupChoice {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            title: group.title,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostFormPage {
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostView>,
    pub form: PostForm,
    pub errors: FormErrors,
    pub groups: Vec<GroupChoice>,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub next: Option<String>,
    pub errors: FormErrors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_value_wins() {
        assert_eq!(PageQuery::from_query("page=1&page=2").page.as_deref(), Some("2"));
        assert_eq!(PageQuery::from_query("x=1&page=3&y=2").page.as_deref(), Some("3"));
        assert_eq!(PageQuery::from_query("page=%FF").page.as_deref(), Some("\u{FFFD}"));
    }

    #[test]
    fn missing_page_is_none() {
        assert_eq!(PageQuery::from_query(""), PageQuery::default());
        assert_eq!(PageQuery::from_query("other=1").page, None);
    }
}
