use crate::application::feed_service::FeedService;
use crate::application::follow_service::{FollowOutcome, FollowService, UnfollowOutcome};
use crate::domain::error::DomainError;
use crate::presentation::dto::{FollowPage, PageQuery};
use crate::presentation::handlers::posts::request_id;
use crate::presentation::utils::{AuthenticatedUser, profile_url, redirect};
use actix_web::{HttpRequest, HttpResponse, get, web};
use tracing::debug;

#[get("/follow/")]
async fn follow_index(
    user: AuthenticatedUser,
    query: PageQuery,
    feed: web::Data<FeedService>,
) -> Result<HttpResponse, DomainError> {
    let page_obj = feed.follow_feed(Some(user.id), query.page.as_deref()).await?;
    Ok(HttpResponse::Ok().json(FollowPage { page_obj }))
}

#[get("/profile/{username}/follow/")]
async fn profile_follow(
    req: HttpRequest,
    user: AuthenticatedUser,
    path: web::Path<String>,
    follows: web::Data<FollowService>,
) -> Result<HttpResponse, DomainError> {
    let username = path.into_inner();
    let outcome = follows.follow(user.id, &username).await?;
    if outcome != FollowOutcome::Created {
        debug!(
            request_id = %request_id(&req),
            follower = %user.username,
            author = %username,
            ?outcome,
            "follow left unchanged"
        );
    }
    Ok(redirect(profile_url(&username)))
}

#[get("/profile/{username}/unfollow/")]
async fn profile_unfollow(
    req: HttpRequest,
    user: AuthenticatedUser,
    path: web::Path<String>,
    follows: web::Data<FollowService>,
) -> Result<HttpResponse, DomainError> {
    let username = path.into_inner();
    if follows.unfollow(user.id, &username).await? == UnfollowOutcome::NotFollowing {
        debug!(
            request_id = %request_id(&req),
            follower = %user.username,
            author = %username,
            "nothing to unfollow"
        );
    }
    Ok(redirect(profile_url(&username)))
}
