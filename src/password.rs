use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a plain-text password into an argon2 PHC string
pub fn hash(password: &str) -> Result<String, password_hash::Error> {
	let salt = SaltString::generate(&mut OsRng);
	let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
	Ok(hash.to_string())
}

/// Check a plain-text password against a stored PHC string
///
/// A malformed stored hash never verifies.
pub fn verify(password: &str, stored: &str) -> bool {
	match PasswordHash::new(stored) {
		Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
		Err(_) => false,
	}
}
