use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpServer, web};
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::application::feed_service::FeedService;
use crate::application::follow_service::FollowService;
use crate::application::post_service::PostService;
use crate::data::Repositories;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::page_cache::{PageCache, ResponseCache};
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers::{auth, follow, posts, system};
use crate::presentation::middleware::{IdentityMiddleware, RequestIdMiddleware, TimingMiddleware};

/// Everything a worker needs, built once and shared across workers.
#[derive(Clone)]
pub struct AppServices {
    pub auth: web::Data<AuthService>,
    pub feed: web::Data<FeedService>,
    pub follow: web::Data<FollowService>,
    pub posts: web::Data<PostService>,
    pub cache: web::Data<ResponseCache>,
}

impl AppServices {
    pub fn new(
        repos: &Repositories,
        keys: JwtKeys,
        page_cache: Arc<dyn PageCache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            auth: web::Data::new(AuthService::new(repos, keys)),
            feed: web::Data::new(FeedService::new(repos)),
            follow: web::Data::new(FollowService::new(repos)),
            posts: web::Data::new(PostService::new(repos)),
            cache: web::Data::new(ResponseCache::new(page_cache, cache_ttl)),
        }
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(system::health)
        .service(posts::index)
        .service(posts::group_posts)
        .service(posts::profile)
        .service(follow::profile_follow)
        .service(follow::profile_unfollow)
        .service(follow::follow_index)
        .service(posts::post_create_form)
        .service(posts::post_create)
        .service(posts::post_detail)
        .service(posts::post_detail_comment)
        .service(posts::post_edit_form)
        .service(posts::post_edit)
        .service(posts::post_delete)
        .service(posts::add_comment)
        .service(auth::scope());
}

pub fn build_app(
    services: AppServices,
    cors_origins: &[String],
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody + use<>>,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    App::new()
        .app_data(services.auth)
        .app_data(services.feed)
        .app_data(services.follow)
        .app_data(services.posts)
        .app_data(services.cache)
        .configure(routes)
        .default_service(web::to(system::not_found))
        .wrap(IdentityMiddleware)
        .wrap(TimingMiddleware)
        .wrap(RequestIdMiddleware)
        .wrap(
            DefaultHeaders::new()
                .add(("X-Content-Type-Options", "nosniff"))
                .add(("Referrer-Policy", "same-origin"))
                .add(("Permissions-Policy", "geolocation=()"))
                .add(("Cross-Origin-Opener-Policy", "same-origin")),
        )
        .wrap(build_cors(cors_origins))
}

pub async fn start_rest_server(config: &AppConfig, services: AppServices) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);
    let cors_origins = config.cors_origins.clone();

    info!(
        host = %bind_address.0,
        port = bind_address.1,
        cache_ttl_secs = services.cache.ttl().as_secs(),
        "HTTP server starting"
    );

    HttpServer::new(move || build_app(services.clone(), &cors_origins))
        .bind(bind_address)?
        .run()
        .await
        .map_err(anyhow::Error::new)?;

    Ok(())
}

fn build_cors(origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .supports_credentials()
        .max_age(3600);

    for origin in origins {
        cors = if origin == "*" {
            cors.allow_any_origin()
        } else {
            cors.allowed_origin(origin)
        };
    }

    cors
}
