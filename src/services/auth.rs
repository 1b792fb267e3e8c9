//! Username/password accounts. Passwords are stored as salted SHA-256 digests
//! in `salt$digest` form, never as plaintext.

use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{Credentials, LoginResponse, UserDto};
use crate::error::{ObjectDesignError, Result};
use crate::store::Store;

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"$");
    hasher.update(password.as_bytes());
    general_purpose::STANDARD.encode(hasher.finalize())
}

fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    digest(salt, password) == expected
}

pub async fn register(store: &Store, credentials: Credentials) -> Result<UserDto> {
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        return Err(ObjectDesignError::InvalidFormat(
            "username and password are required".to_string(),
        ));
    }
    if store
        .get_user_by_username(&credentials.username)
        .await?
        .is_some()
    {
        return Err(ObjectDesignError::Conflict(format!(
            "username '{}' is already taken",
            credentials.username
        )));
    }

    let hash = hash_password(&credentials.password);
    store.create_user(&credentials.username, &hash).await
}

/// Failed logins report which check failed, matching the envelope the web
/// client renders. The result is always a 200-level response body.
pub async fn login(store: &Store, credentials: Credentials) -> Result<LoginResponse> {
    let Some(user) = store.get_user_by_username(&credentials.username).await? else {
        return Ok(LoginResponse {
            success: false,
            message: "User not found".to_string(),
            user: None,
        });
    };

    if !verify_password(&credentials.password, &user.password_hash) {
        return Ok(LoginResponse {
            success: false,
            message: "Invalid password".to_string(),
            user: None,
        });
    }

    Ok(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        user: Some(user.into_dto()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_and_salts_differ() {
        let first = hash_password("hunter2");
        let second = hash_password("hunter2");
        assert_ne!(first, second);
        assert!(verify_password("hunter2", &first));
        assert!(verify_password("hunter2", &second));
        assert!(!verify_password("hunter3", &first));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("anything", "no-separator"));
    }
}
