use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::data::Repositories;
use crate::data::comment_repository::CommentRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::{Comment, CommentView};
use crate::domain::error::{DomainError, FormErrors};
use crate::domain::group::Group;
use crate::domain::post::{Post, PostChanges, PostView, truncate_chars};
use crate::presentation::dto::{CommentForm, PostForm};

const TITLE_CHARS: usize = 30;
const IMAGE_EXTENSIONS: &[&str] = &["gif", "jpg", "jpeg", "png", "webp"];

const REQUIRED: &str = "This field is required.";
const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

#[derive(Debug)]
pub struct PostDetail {
    pub title: String,
    pub post: PostView,
    pub comments: Vec<CommentView>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    groups: Arc<dyn GroupRepository>,
}

pub fn ensure_author(post: &Post, editor: Option<Uuid>) -> Result<(), DomainError> {
    if editor == Some(post.author_id) {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_image_reference(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(stem, ext)| {
            !stem.is_empty() && IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        })
        .unwrap_or(false)
}

impl PostService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            posts: Arc::clone(&repos.posts),
            comments: Arc::clone(&repos.comments),
            groups: Arc::clone(&repos.groups),
        }
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    pub async fn get_post_view(&self, id: Uuid) -> Result<PostView, DomainError> {
        self.posts
            .find_view(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    pub async fn post_detail(&self, id: Uuid) -> Result<PostDetail, DomainError> {
        let post = self.get_post_view(id).await?;
        let comments = self.comments.list_for_post(id).await?;

        Ok(PostDetail {
            title: format!("Post {}", truncate_chars(&post.text, TITLE_CHARS)),
            post,
            comments,
        })
    }

    /// Choices for the group field of the post form.
    pub async fn groups(&self) -> Result<Vec<Group>, DomainError> {
        self.groups.list().await
    }

    /// Checks a submitted post form. Text is required, a group must exist,
    /// an image reference must name an image file.
    pub async fn validate(&self, form: &PostForm) -> Result<PostChanges, DomainError> {
        let mut errors = FormErrors::default();

        let text = non_blank(form.text.as_deref());
        if text.is_none() {
            errors.add("text", REQUIRED);
        }

        let mut group_id = None;
        if let Some(raw) = non_blank(form.group.as_deref()) {
            let found = match Uuid::parse_str(raw) {
                Ok(id) => self.groups.find_by_id(id).await?.map(|g| g.id),
                Err(_) => None,
            };
            match found {
                Some(id) => group_id = Some(id),
                None => errors.add("group", INVALID_CHOICE),
            }
        }

        let image = non_blank(form.image.as_deref());
        if let Some(path) = image {
            if !is_image_reference(path) {
                errors.add("image", INVALID_IMAGE);
            }
        }

        errors.into_result()?;
        Ok(PostChanges {
            text: text.unwrap_or_default().to_string(),
            group_id,
            image: image.map(str::to_string),
        })
    }

    #[instrument(skip(self, form))]
    pub async fn create_post(&self, author_id: Uuid, form: &PostForm) -> Result<Post, DomainError> {
        let changes = self.validate(form).await?;
        self.posts.create(Post::new(author_id, changes)).await
    }

    /// The post as it stands, provided `editor` wrote it.
    pub async fn editable_post(&self, editor: Option<Uuid>, id: Uuid) -> Result<Post, DomainError> {
        let post = self.get_post(id).await?;
        ensure_author(&post, editor)?;
        Ok(post)
    }

    #[instrument(skip(self, form))]
    pub async fn update_post(
        &self,
        editor: Option<Uuid>,
        id: Uuid,
        form: &PostForm,
    ) -> Result<Post, DomainError> {
        let post = self.editable_post(editor, id).await?;
        let changes = self.validate(form).await?;

        self.posts
            .update_post(id, post.author_id, changes)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, editor: Option<Uuid>, id: Uuid) -> Result<(), DomainError> {
        let post = self.editable_post(editor, id).await?;
        if !self.posts.delete_post(id, post.author_id).await? {
            return Err(DomainError::PostNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self, form))]
    pub async fn add_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        form: &CommentForm,
    ) -> Result<Comment, DomainError> {
        self.get_post(post_id).await?;
        let text = non_blank(form.text.as_deref())
            .ok_or_else(|| DomainError::Validation(FormErrors::single("text", REQUIRED)))?;

        let comment = self
            .comments
            .create(Comment::new(post_id, author_id, text.to_string()))
            .await?;
        info!(comment_id = %comment.id, post_id = %post_id, "comment added");
        Ok(comment)
    }
}
