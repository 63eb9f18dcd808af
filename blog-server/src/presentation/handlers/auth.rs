use crate::application::auth_service::AuthService;
use crate::domain::error::{DomainError, FormErrors};
use crate::infrastructure::security::TOKEN_TTL_HOURS;
use crate::presentation::dto::{LoginForm, LoginPage, NextQuery, SignupForm};
use crate::presentation::middleware::SESSION_COOKIE;
use crate::presentation::utils::safe_next;
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{HttpResponse, Scope, get, post, web};
use tracing::info;

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(login_form)
        .service(login)
        .service(signup)
        .service(logout)
}

/// Sets the session cookie and sends the browser on to `next`.
fn start_session(next: Option<&str>, token: String) -> HttpResponse {
    let cookie = Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(TOKEN_TTL_HOURS))
        .finish();

    HttpResponse::Found()
        .insert_header((header::LOCATION, safe_next(next).to_owned()))
        .cookie(cookie)
        .finish()
}

#[get("/login/")]
async fn login_form(query: web::Query<NextQuery>) -> HttpResponse {
    HttpResponse::Ok().json(LoginPage {
        next: query.into_inner().next,
        errors: FormErrors::default(),
    })
}

#[post("/login/")]
async fn login(
    form: web::Form<LoginForm>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, DomainError> {
    let form = form.into_inner();
    match auth.login(&form.username, &form.password).await {
        Ok((_, token)) => Ok(start_session(form.next.as_deref(), token)),
        Err(DomainError::Unauthorized) => Ok(HttpResponse::Ok().json(LoginPage {
            next: form.next,
            errors: FormErrors::single(
                FormErrors::NON_FIELD,
                "Please enter a correct username and password.",
            ),
        })),
        Err(err) => Err(err),
    }
}

#[post("/signup/")]
async fn signup(
    form: web::Form<SignupForm>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, DomainError> {
    let form = form.into_inner();
    match auth
        .register(&form.username, &form.email, &form.password)
        .await
    {
        Ok(user) => {
            info!(user_id = %user.id, username = %user.username, "user registered");
            let token = auth.issue_token(&user)?;
            Ok(start_session(form.next.as_deref(), token))
        }
        Err(DomainError::Validation(errors)) => Ok(HttpResponse::Ok().json(LoginPage {
            next: form.next,
            errors,
        })),
        Err(DomainError::UserAlreadyExists(_)) => Ok(HttpResponse::Conflict().json(LoginPage {
            next: form.next,
            errors: FormErrors::single("username", "A user with that username already exists."),
        })),
        Err(err) => Err(err),
    }
}

#[get("/logout/")]
async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();

    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(cookie)
        .finish()
}
