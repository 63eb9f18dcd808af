use std::sync::Arc;

use tracing::{info, instrument};

use crate::data::Repositories;
use crate::data::user_repository::UserRepository;
use crate::domain::error::{DomainError, FormErrors};
use crate::domain::user::User;
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

const USERNAME_MAX_LEN: usize = 150;
const PASSWORD_MIN_LEN: usize = 8;

/// Thin identity layer: accounts, password checks and session tokens.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

fn validate_signup(username: &str, email: &str, password: &str) -> Result<(), DomainError> {
    let mut errors = FormErrors::default();

    if username.is_empty() {
        errors.add("username", "This field is required.");
    } else if username.chars().count() > USERNAME_MAX_LEN
        || !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
    if !email.contains('@') {
        errors.add("email", "Enter a valid email address.");
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            "password",
            format!("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."),
        );
    }

    errors.into_result()
}

impl AuthService {
    pub fn new(repos: &Repositories, keys: JwtKeys) -> Self {
        Self {
            users: Arc::clone(&repos.users),
            keys,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, DomainError> {
        let username = username.trim();
        let email = email.trim();
        validate_signup(username, email, password)?;

        let hash =
            hash_password(password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(username.to_string(), email.to_lowercase(), hash);
        self.users.create(user).await
    }

    /// Checks credentials and issues a session token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), DomainError> {
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }

    pub fn issue_token(&self, user: &User) -> Result<String, DomainError> {
        self.keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }

    /// Resolves a session token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, DomainError> {
        let claims = self
            .keys
            .verify_token(token)
            .map_err(|_| DomainError::Unauthorized)?;

        self.users
            .find_by_id(claims.sub)
            .await?
            .ok_or(DomainError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;
    use uuid::Uuid;

    fn service() -> AuthService {
        let store = Arc::new(InMemoryStore::new());
        AuthService::new(
            &Repositories::in_memory(store),
            JwtKeys::new("test-secret".into()),
        )
    }

    #[actix_web::test]
    async fn register_login_authenticate() {
        let auth = service();
        let user = auth
            .register("leo", "Leo@Example.com", "long enough")
            .await
            .unwrap();
        assert_eq!(user.email, "leo@example.com");

        let (logged_in, token) = auth.login("leo", "long enough").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(auth.authenticate(&token).await.unwrap().username, "leo");

        let err = auth.login("leo", "wrong password").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
        let err = auth.login("nobody", "long enough").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized));
    }

    #[actix_web::test]
    async fn signup_fields_are_validated() {
        let auth = service();
        let err = auth.register("has space", "no-at", "short").await.unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.field("username").len(), 1);
        assert_eq!(errors.field("email").len(), 1);
        assert_eq!(errors.field("password").len(), 1);
    }

    #[actix_web::test]
    async fn garbage_tokens_do_not_authenticate() {
        let auth = service();
        assert!(matches!(
            auth.authenticate("not-a-jwt").await.unwrap_err(),
            DomainError::Unauthorized
        ));
        let orphan = auth.keys().generate_token(Uuid::new_v4()).unwrap();
        assert!(matches!(
            auth.authenticate(&orphan).await.unwrap_err(),
            DomainError::Unauthorized
        ));
    }
}
