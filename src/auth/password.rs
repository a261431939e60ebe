//! bcrypt hashing, run off the async executor

use crate::error::Result;

/// Hash a password with a fresh salt at the given cost
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_owned();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// Check a password against a stored bcrypt hash
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("pw1", 4).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("pw1", &hash).await.unwrap());
        assert!(!verify_password("pw2", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let first = hash_password("same", 4).await.unwrap();
        let second = hash_password("same", 4).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_malformed_hash() {
        let result = verify_password("pw", "not-a-bcrypt-hash").await;
        assert!(matches!(result, Err(Error::Hash(_))));
    }
}
