use crate::application::feed_service::FeedService;
use crate::application::follow_service::FollowService;
use crate::application::post_service::PostService;
use crate::domain::error::{DomainError, FormErrors};
use crate::domain::user::AuthorSummary;
use crate::infrastructure::page_cache::ResponseCache;
use crate::presentation::dto::{
    CommentForm, GroupChoice, GroupPage, IndexPage, PageQuery, PostDetailPage, PostForm,
    PostFormPage, ProfilePage,
};
use crate::presentation::handlers::render;
use crate::presentation::middleware::RequestId;
use crate::presentation::utils::{AuthenticatedUser, post_url, profile_url, redirect, request_target};
use actix_web::http::header::ContentType;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, get, post, web};
use tracing::{debug, info};
use uuid::Uuid;

/// Global feed. The rendered body is cached per request path and query.
#[get("/")]
async fn index(
    req: HttpRequest,
    query: PageQuery,
    feed: web::Data<FeedService>,
    cache: web::Data<ResponseCache>,
) -> Result<HttpResponse, DomainError> {
    let key = request_target(&req);
    let feed = feed.get_ref();
    let page = query.page.as_deref();

    let body = cache
        .get_or_render(&key, move || async move {
            let page_obj = feed.index(page).await?;
            render(&IndexPage { page_obj })
        })
        .await?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}

#[get("/group/{slug}/")]
async fn group_posts(
    path: web::Path<String>,
    query: PageQuery,
    feed: web::Data<FeedService>,
) -> Result<HttpResponse, DomainError> {
    let slug = path.into_inner();
    let group_feed = feed.group_feed(&slug, query.page.as_deref()).await?;

    Ok(HttpResponse::Ok().json(GroupPage {
        group: group_feed.group,
        page_obj: group_feed.page,
    }))
}

#[get("/profile/{username}/")]
async fn profile(
    path: web::Path<String>,
    query: PageQuery,
    viewer: Option<AuthenticatedUser>,
    feed: web::Data<FeedService>,
    follows: web::Data<FollowService>,
) -> Result<HttpResponse, DomainError> {
    let username = path.into_inner();
    let profile = feed.profile_feed(&username, query.page.as_deref()).await?;
    let following = follows
        .is_following(viewer.map(|v| v.id), profile.author.id)
        .await;

    Ok(HttpResponse::Ok().json(ProfilePage {
        author: AuthorSummary::from(&profile.author),
        following,
        post_count: profile.page.count,
        followers_count: profile.followers,
        following_count: profile.following,
        page_obj: profile.page,
    }))
}

#[get("/posts/{id}/")]
async fn post_detail(
    path: web::Path<Uuid>,
    viewer: Option<AuthenticatedUser>,
    posts: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    let detail = posts.post_detail(path.into_inner()).await?;
    let is_author = viewer.is_some_and(|v| v.id == detail.post.author_id);

    Ok(HttpResponse::Ok().json(PostDetailPage {
        title: detail.title,
        post: detail.post,
        comments: detail.comments,
        is_author,
        form: CommentForm::default(),
    }))
}

/// Invalid comments are dropped; the viewer lands back on the post either way.
async fn submit_comment(
    user: &AuthenticatedUser,
    post_id: Uuid,
    form: &CommentForm,
    posts: &PostService,
) -> Result<HttpResponse, DomainError> {
    match posts.add_comment(user.id, post_id, form).await {
        Ok(_) => {}
        Err(DomainError::Validation(errors)) => {
            debug!(username = %user.username, post_id = %post_id, ?errors, "comment dropped");
        }
        Err(err) => return Err(err),
    }
    Ok(redirect(post_url(post_id)))
}

#[post("/posts/{id}/comment/")]
async fn add_comment(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    form: web::Form<CommentForm>,
    posts: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    submit_comment(&user, path.into_inner(), &form, &posts).await
}

#[post("/posts/{id}/")]
async fn post_detail_comment(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    form: web::Form<CommentForm>,
    posts: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    submit_comment(&user, path.into_inner(), &form, &posts).await
}

async fn form_page(
    posts: &PostService,
    is_edit: bool,
    post_id: Option<Uuid>,
    form: PostForm,
    errors: FormErrors,
) -> Result<HttpResponse, DomainError> {
    let post = match post_id {
        Some(id) => Some(posts.get_post_view(id).await?),
        None => None,
    };
    let groups = posts
        .groups()
        .await?
        .into_iter()
        .map(GroupChoice::from)
        .collect();

    Ok(HttpResponse::Ok().json(PostFormPage {
        is_edit,
        post,
        form,
        errors,
        groups,
    }))
}

#[get("/create/")]
async fn post_create_form(
    _user: AuthenticatedUser,
    posts: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    form_page(&posts, false, None, PostForm::default(), FormErrors::default()).await
}

#[post("/create/")]
async fn post_create(
    req: HttpRequest,
    user: AuthenticatedUser,
    form: web::Form<PostForm>,
    posts: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    let form = form.into_inner();
    match posts.create_post(user.id, &form).await {
        Ok(post) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = %post.id,
                "post created"
            );
            Ok(redirect(profile_url(&user.username)))
        }
        Err(DomainError::Validation(errors)) => form_page(&posts, false, None, form, errors).await,
        Err(err) => Err(err),
    }
}

#[get("/posts/{id}/edit/")]
async fn post_edit_form(
    path: web::Path<Uuid>,
    viewer: Option<AuthenticatedUser>,
    posts: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let post = match posts.editable_post(viewer.map(|v| v.id), post_id).await {
        Ok(post) => post,
        Err(DomainError::Forbidden) => return Ok(redirect(post_url(post_id))),
        Err(err) => return Err(err),
    };

    let form = PostForm {
        text: Some(post.text),
        group: post.group_id.map(|id| id.to_string()),
        image: post.image,
    };
    form_page(&posts, true, Some(post_id), form, FormErrors::default()).await
}

#[post("/posts/{id}/edit/")]
async fn post_edit(
    req: HttpRequest,
    path: web::Path<Uuid>,
    viewer: Option<AuthenticatedUser>,
    form: web::Form<PostForm>,
    posts: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let form = form.into_inner();

    match posts.update_post(viewer.as_ref().map(|v| v.id), post_id, &form).await {
        Ok(post) => {
            info!(
                request_id = %request_id(&req),
                post_id = %post.id,
                "post updated"
            );
            Ok(redirect(post_url(post_id)))
        }
        Err(DomainError::Forbidden) => Ok(redirect(post_url(post_id))),
        Err(DomainError::Validation(errors)) => {
            form_page(&posts, true, Some(post_id), form, errors).await
        }
        Err(err) => Err(err),
    }
}

#[post("/posts/{id}/delete/")]
async fn post_delete(
    req: HttpRequest,
    path: web::Path<Uuid>,
    viewer: Option<AuthenticatedUser>,
    posts: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let Some(user) = viewer else {
        return Ok(redirect(post_url(post_id)));
    };

    match posts.delete_post(Some(user.id), post_id).await {
        Ok(()) => {
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = %post_id,
                "post deleted"
            );
            Ok(redirect(profile_url(&user.username)))
        }
        Err(DomainError::Forbidden) => Ok(redirect(post_url(post_id))),
        Err(err) => Err(err),
    }
}

pub(crate) fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}
