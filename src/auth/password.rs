//! Salted password hashing. bcrypt embeds the salt and cost in the hash string
//! and compares in constant time on verify.

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// `Ok(false)` on mismatch, `Err` only when the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn hash_verifies_original_password() {
        let hash = hash_password("pw", TEST_COST).unwrap();
        assert!(verify_password("pw", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let h1 = hash_password("pw", TEST_COST).unwrap();
        let h2 = hash_password("pw", TEST_COST).unwrap();
        assert_ne!(h1, h2);
        assert!(verify_password("pw", &h2).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("pw", "not-a-hash").is_err());
    }
}
