//! Password storage as PHC strings:
//! `$pbkdf2-sha256$i=<rounds>,l=32$<salt>$<hash>`.

use pbkdf2::password_hash::{
    Error as PhcError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use pbkdf2::{Algorithm, Params, Pbkdf2};

use super::CryptoError;

pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Hash a password with PBKDF2-SHA256 at `iterations` rounds.
pub fn hash_password(password: &str, iterations: u32) -> Result<String, CryptoError> {
    let salt = SaltString::encode_b64(&generate_salt())
        .map_err(|e| CryptoError::Hashing(e.to_string()))?;
    let params = Params {
        rounds: iterations,
        output_length: HASH_LENGTH,
    };
    let hash = Pbkdf2
        .hash_password_customized(
            password.as_bytes(),
            Some(Algorithm::Pbkdf2Sha256.ident()),
            None,
            params,
            &salt,
        )
        .map_err(|e| CryptoError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC hash. Rounds and salt come from
/// the stored string, so older hashes keep verifying after the configured
/// cost changes.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CryptoError> {
    let parsed = PasswordHash::new(stored).map_err(|_| CryptoError::MalformedHash)?;
    if parsed.algorithm != Algorithm::Pbkdf2Sha256.ident() {
        return Err(CryptoError::UnsupportedScheme(parsed.algorithm.to_string()));
    }

    match Pbkdf2.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PhcError::Password) => Ok(false),
        Err(_) => Err(CryptoError::MalformedHash),
    }
}
