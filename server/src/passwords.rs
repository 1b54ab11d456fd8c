use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use color_eyre::eyre::eyre;

use crate::Result;

/// Argon2id hash in PHC string format, salted per call.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| eyre!("Argon2 password hashing failed: {e}"))?;

    Ok(hash.to_string())
}

/// A stored hash that can't be parsed never verifies.
pub(crate) fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = match PasswordHash::new(password_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse stored password hash");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hashing is CPU bound, so keep it off the async workers.
pub(crate) async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub(crate) async fn verify_password_blocking(password: String, password_hash: String) -> Result<bool> {
    let verified =
        tokio::task::spawn_blocking(move || verify_password(&password, &password_hash)).await?;

    Ok(verified)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse battery staple").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("Correct horse battery staple", &hash));
    }

    #[test]
    fn salts_differ_between_calls() {
        let first = hash_password("hunter22").unwrap();
        let second = hash_password("hunter22").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }

    #[tokio::test]
    async fn blocking_helpers_agree() {
        let hash = hash_password_blocking("pa55word".to_string()).await.unwrap();

        assert!(verify_password_blocking("pa55word".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("password".to_string(), hash)
            .await
            .unwrap());
    }
}
