mod common;

use actix_web::http::{StatusCode, header};
use actix_web::test;
use blog_server::server::build_app;
use common::{TestApp, json, texts};

#[actix_web::test]
async fn follow_and_unfollow_over_http() {
    let t = TestApp::new();
    let author = t.user("author").await;
    let reader = t.user("reader").await;
    let app = test::init_service(build_app(t.services.clone(), &[])).await;

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/profile/author/follow/")
            .insert_header(t.bearer(&reader))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/profile/author/");
    }
    assert_eq!(t.store.follow_count(), 1);
    assert!(t.services.follow.is_following(Some(reader.id), author.id).await);

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/profile/author/unfollow/")
            .insert_header(t.bearer(&reader))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }
    assert_eq!(t.store.follow_count(), 0);
}

#[actix_web::test]
async fn following_yourself_changes_nothing() {
    let t = TestApp::new();
    let author = t.user("author").await;
    let app = test::init_service(build_app(t.services.clone(), &[])).await;

    let req = test::TestRequest::get()
        .uri("/profile/author/follow/")
        .insert_header(t.bearer(&author))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/profile/author/");
    assert_eq!(t.store.follow_count(), 0);
}

#[actix_web::test]
async fn following_an_unknown_user_is_not_found() {
    let t = TestApp::new();
    let reader = t.user("reader").await;
    let app = test::init_service(build_app(t.services.clone(), &[])).await;

    for uri in ["/profile/ghost/follow/", "/profile/ghost/unfollow/"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(t.bearer(&reader))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn anonymous_follow_routes_go_to_login() {
    let t = TestApp::new();
    t.user("author").await;
    let app = test::init_service(build_app(t.services.clone(), &[])).await;

    for uri in ["/follow/", "/profile/author/follow/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
            format!("/auth/login/?next={uri}")
        );
    }
    assert_eq!(t.store.follow_count(), 0);
}

#[actix_web::test]
async fn new_posts_reach_followers_only() {
    let t = TestApp::new();
    let u1 = t.user("u1").await;
    let u2 = t.user("u2").await;
    let app = test::init_service(build_app(t.services.clone(), &[])).await;

    let req = test::TestRequest::get()
        .uri("/profile/u1/follow/")
        .insert_header(t.bearer(&u2))
        .to_request();
    test::call_service(&app, req).await;
    t.post(&u1, "for my followers", None).await;

    let req = test::TestRequest::get()
        .uri("/follow/")
        .insert_header(t.bearer(&u2))
        .to_request();
    let follower_feed = json(&test::call_and_read_body(&app, req).await);
    assert_eq!(texts(&follower_feed), vec!["for my followers"]);

    let req = test::TestRequest::get()
        .uri("/follow/")
        .insert_header(t.bearer(&u1))
        .to_request();
    let author_feed = json(&test::call_and_read_body(&app, req).await);
    assert!(texts(&author_feed).is_empty());

    let req = test::TestRequest::get()
        .uri("/profile/u1/unfollow/")
        .insert_header(t.bearer(&u2))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/follow/")
        .insert_header(t.bearer(&u2))
        .to_request();
    let after = json(&test::call_and_read_body(&app, req).await);
    assert!(texts(&after).is_empty());
}
