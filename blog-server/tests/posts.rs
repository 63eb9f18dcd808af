mod common;

use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::test;
use blog_server::server::build_app;
use common::{TestApp, json};
use uuid::Uuid;

fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn anonymous_create_goes_to_login() {
    let t = TestApp::new();
    let app = test::init_service(build_app(t.services.clone(), &[])).await;

    let req = test::TestRequest::get().uri("/create/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
}

#[actix_web::test]
async fn create_form_offers_groups() {
    let t = TestApp::new();
    let author = t.user("author").await;
    t.group("Tech", "tech").await;
    let app = test::init_service(build_app(t.services.clone(), &[])).await;

    let req = test::TestRequest::get()
        .uri("/create/")
        .insert_header(t.bearer(&author))
        .to_request();
    let page = json(&test::call_and_read_body(&app, req).await);
    assert_eq!(page["is_edit"], false);
    assert_eq!(page["groups"][0]["title"], "Tech");
}

#[actix_web::test]
async fn created_post_lands_on_the_author_profile() {
    let t = TestApp::new();
    let author = t.user("author").await;
    let tech = t.group("Tech", "tech").await;
    let app = test::init_service(build_app(t.services.clone(), &[])).await;

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(t.bearer(&author))
        .set_form([
            ("text", "fresh post".to_string()),
            ("group", tech.id.to_string()),
            ("image", "posts/cat.png".to_string()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/author/");
    assert_eq!(t.store.post_count(), 1);

    let req = test::TestRequest::get().uri("/group/tech/").to_request();
    let page = json(&test::call_and_read_body(&app, req).await);
    let item = &page["page_obj"]["items"][0];
    assert_eq!(item["text"], "fresh post");
    assert_eq!(item["image"], "posts/cat.png");
    assert_eq!(item["author_username"], "author");
}

#[actix_web::test]
async fn invalid_post_form_is_shown_again() {
    let t = TestApp::new();
    let author = t.user("author").await;
    let app = test::init_service(build_app(t.services.clone(), &[])).await;

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(t.bearer(&author))
        .set_form([("text", "   "), ("image", "notes.txt")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let page = json(&test::read_body(resp).await);
    assert_eq!(page["errors"]["text"][0], "This field is required.");
    assert!(page["errors"]["image"].is_array());
    assert_eq!(page["form"]["image"], "notes.txt");
    assert_eq!(t.store.post_count(), 0);
}

#[actix_web::test]
async fn anonymous_edit_goes_back_to_the_post() {
    let t = TestApp::new();
    let author = t.user("author").await;
    let post = t.post(&author, "original", None).await;
    let app = test::init_service(build_app(t.services.clone(), &[])).await;

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit/", post.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
}

#[actix_web::test]
async fn only_the_author_can_edit() {
    let t = TestApp::new();
    let author = t.user("author").await;
    let other = t.user("other").await;
    let post = t.post(&author, "original", None).await;
    let app = test::init_service(build_app(t.services.clone(), &[])).await;
    let edit_uri = format!("/posts/{}/edit/", post.id);

    let req = test::TestRequest::post()
        .uri(&edit_uri)
        .insert_header(t.bearer(&other))
        .set_form([("text", "hijacked")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(t.stored_post(post.id).await.unwrap().text, "original");

    let req = test::TestRequest::get()
        .uri(&edit_uri)
        .insert_header(t.bearer(&author))
        .to_request();
    let page = json(&test::call_and_read_body(&app, req).await);
    assert_eq!(page["is_edit"], true);
    assert_eq!(page["form"]["text"], "original");

    let req = test::TestRequest::post()
        .uri(&edit_uri)
        .insert_header(t.bearer(&author))
        .set_form([("text", "edited")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let stored = t.stored_post(post.id).await.unwrap();
    assert_eq!(stored.text, "edited");
    assert_eq!(stored.author_id, author.id);
    assert_eq!(stored.created_at, post.created_at);
}

#[actix_web::test]
async fn comments_show_up_on_the_post() {
    let t = TestApp::new();
    let author = t.user("author").await;
    let reader = t.user("reader").await;
    let post = t.post(&author, "discuss", None).await;
    let app = test::init_service(build_app(t.services.clone(), &[])).await;
    let detail_uri = format!("/posts/{}/", post.id);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header(t.bearer(&reader))
        .set_form([("text", "first!")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail_uri);

    // the detail page accepts the same form
    let req = test::TestRequest::post()
        .uri(&detail_uri)
        .insert_header(t.bearer(&author))
        .set_form([("text", "thanks")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let req = test::TestRequest::post()
        .uri(&detail_uri)
        .insert_header(t.bearer(&reader))
        .set_form([("text", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(t.store.comment_count(), 2);

    let req = test::TestRequest::get()
        .uri(&detail_uri)
        .insert_header(t.bearer(&author))
        .to_request();
    let page = json(&test::call_and_read_body(&app, req).await);
    assert_eq!(page["title"], "Post discuss");
    assert_eq!(page["is_author"], true);
    assert_eq!(page["comments"][0]["text"], "first!");
    assert_eq!(page["comments"][0]["author_username"], "reader");
    assert_eq!(page["comments"][1]["text"], "thanks");
}

#[actix_web::test]
async fn anonymous_comment_goes_to_login() {
    let t = TestApp::new();
    let author = t.user("author").await;
    let post = t.post(&author, "discuss", None).await;
    let app = test::init_service(build_app(t.services.clone(), &[])).await;

    let uri = format!("/posts/{}/comment/", post.id);
    let req = test::TestRequest::post()
        .uri(&uri)
        .set_form([("text", "drive-by")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/auth/login/?next={uri}"));
    assert_eq!(t.store.comment_count(), 0);
}

#[actix_web::test]
async fn deleting_a_post_takes_its_comments() {
    let t = TestApp::new();
    let author = t.user("author").await;
    let other = t.user("other").await;
    let post = t.post(&author, "short lived", None).await;
    t.services
        .posts
        .add_comment(
            other.id,
            post.id,
            &blog_server::presentation::dto::CommentForm {
                text: Some("bye".into()),
            },
        )
        .await
        .unwrap();
    let app = test::init_service(build_app(t.services.clone(), &[])).await;
    let delete_uri = format!("/posts/{}/delete/", post.id);

    let req = test::TestRequest::post()
        .uri(&delete_uri)
        .insert_header(t.bearer(&other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(t.store.post_count(), 1);

    let req = test::TestRequest::post()
        .uri(&delete_uri)
        .insert_header(t.bearer(&author))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/author/");
    assert_eq!(t.store.post_count(), 0);
    assert_eq!(t.store.comment_count(), 0);
}

#[actix_web::test]
async fn missing_post_is_not_found() {
    let t = TestApp::new();
    let app = test::init_service(build_app(t.services.clone(), &[])).await;

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
