use tracing::{info, warn};

use crate::{
    auth::{
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
        repo::UserStore,
        repo_types::User,
    },
    error::AppError,
};

const MAX_USERNAME_CHARS: usize = 256;

pub(crate) fn is_valid_username(username: &str) -> bool {
    !username.trim().is_empty() && username.chars().count() <= MAX_USERNAME_CHARS
}

pub async fn register(
    users: &dyn UserStore,
    username: &str,
    password: String,
) -> Result<User, AppError> {
    if !is_valid_username(username) {
        return Err(AppError::Validation(format!(
            "username is required and at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password is required".into()));
    }

    let hash = hash_password_blocking(password).await?;
    let user = users.create(username, &hash).await.map_err(|e| {
        if matches!(e, AppError::DuplicateUser) {
            warn!(username, "username already registered");
        }
        e
    })?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Check credentials and issue a token. Returns the token with the user.
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    username: &str,
    password: String,
) -> Result<(String, User), AppError> {
    let user = users.find_by_username(username).await?.ok_or_else(|| {
        warn!(username, "login unknown username");
        AppError::UserNotFound
    })?;

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok((token, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo::MemoryUserStore, state::AppState};

    #[test]
    fn username_rules() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("José"));
        assert!(is_valid_username("has space"));
        assert!(is_valid_username(&"é".repeat(256)));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("   "));
        assert!(!is_valid_username(&"x".repeat(257)));
    }

    #[tokio::test]
    async fn any_non_blank_username_registers() {
        let keys = AppState::fake().keys;
        let users = MemoryUserStore::default();
        for name in ["José", "mary jane", "用户"] {
            let user = register(&users, name, "pw".into()).await.unwrap();
            assert_eq!(user.username, name);
            let (_, logged_in) = login(&users, &keys, name, "pw".into()).await.unwrap();
            assert_eq!(logged_in.id, user.id);
        }
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_first_record() {
        let users = MemoryUserStore::default();
        let first = register(&users, "alice", "pw1".into()).await.unwrap();
        let err = register(&users, "alice", "other".into()).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUser));

        let stored = users.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.password_hash, first.password_hash);
    }

    #[tokio::test]
    async fn register_rejects_bad_input() {
        let users = MemoryUserStore::default();
        let err = register(&users, "", "pw".into()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = register(&users, "alice", String::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(users.find_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_token_verifies_to_same_user() {
        let keys = AppState::fake().keys;
        let users = MemoryUserStore::default();
        let user = register(&users, "alice", "pw1".into()).await.unwrap();

        let (token, logged_in) = login(&users, &keys, "alice", "pw1".into()).await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(keys.verify(&token).unwrap().sub, user.id);
    }

    #[tokio::test]
    async fn login_wrong_password_is_invalid_credentials() {
        let keys = AppState::fake().keys;
        let users = MemoryUserStore::default();
        register(&users, "alice", "pw1".into()).await.unwrap();

        let err = login(&users, &keys, "alice", "pw2".into()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_unknown_user_is_not_found() {
        let keys = AppState::fake().keys;
        let users = MemoryUserStore::default();
        let err = login(&users, &keys, "ghost", "pw".into()).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }
}
