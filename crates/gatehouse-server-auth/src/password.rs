// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential hashing, verification, and password policy.
//!
//! Hashing uses Argon2id with production-strength parameters in release
//! builds and reduced-cost parameters under `#[cfg(test)]` so the suite
//! stays fast. Verification goes through [`argon2::PasswordVerifier`],
//! which compares in constant time.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
#[cfg(test)]
use argon2::{Algorithm, Params, Version};
use std::fmt;
use thiserror::Error;

/// Minimum password length accepted by the policy.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Why a candidate password failed the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPolicyViolation {
	TooShort,
	MissingUppercase,
	MissingLowercase,
	MissingDigit,
}

impl fmt::Display for PasswordPolicyViolation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PasswordPolicyViolation::TooShort => {
				write!(f, "must be at least {MIN_PASSWORD_LENGTH} characters")
			}
			PasswordPolicyViolation::MissingUppercase => {
				write!(f, "must contain an uppercase letter")
			}
			PasswordPolicyViolation::MissingLowercase => {
				write!(f, "must contain a lowercase letter")
			}
			PasswordPolicyViolation::MissingDigit => write!(f, "must contain a digit"),
		}
	}
}

/// Errors from hashing or verifying credentials.
#[derive(Debug, Error)]
pub enum PasswordError {
	#[error("weak password: {0}")]
	Weak(PasswordPolicyViolation),

	#[error("credential hashing failed: {0}")]
	Hash(String),
}

/// Returns an Argon2 instance configured appropriately for the build context.
///
/// Tests use intentionally weak parameters (1 MiB memory, 1 iteration) for
/// speed; they MUST NOT be used in production. Release builds get the
/// Argon2id defaults (~19 MiB memory, 2 iterations).
#[inline]
fn argon2_instance() -> Argon2<'static> {
	#[cfg(test)]
	{
		let params = Params::new(
			1024, // memory_kib: 1 MiB
			1,    // iterations
			1,    // parallelism
			None, // output length = default
		)
		.expect("valid Argon2 params for tests");
		Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
	}

	#[cfg(not(test))]
	{
		Argon2::default()
	}
}

/// Hash a plaintext password into an opaque PHC string with a fresh salt.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
	let salt = SaltString::generate(&mut OsRng);
	argon2_instance()
		.hash_password(plaintext.as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a plaintext password against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only a malformed hash or an internal argon2
/// failure is an error.
pub fn verify_password(plaintext: &str, password_hash: &str) -> Result<bool, PasswordError> {
	let parsed =
		PasswordHash::new(password_hash).map_err(|e| PasswordError::Hash(e.to_string()))?;
	match argon2_instance().verify_password(plaintext.as_bytes(), &parsed) {
		Ok(()) => Ok(true),
		Err(argon2::password_hash::Error::Password) => Ok(false),
		Err(e) => Err(PasswordError::Hash(e.to_string())),
	}
}

/// Validate a candidate password against the gateway policy.
///
/// Policy: at least [`MIN_PASSWORD_LENGTH`] characters and at least one
/// uppercase letter, one lowercase letter, and one digit.
pub fn validate_password_policy(candidate: &str) -> Result<(), PasswordPolicyViolation> {
	if candidate.chars().count() < MIN_PASSWORD_LENGTH {
		return Err(PasswordPolicyViolation::TooShort);
	}
	if !candidate.chars().any(|c| c.is_uppercase()) {
		return Err(PasswordPolicyViolation::MissingUppercase);
	}
	if !candidate.chars().any(|c| c.is_lowercase()) {
		return Err(PasswordPolicyViolation::MissingLowercase);
	}
	if !candidate.chars().any(|c| c.is_ascii_digit()) {
		return Err(PasswordPolicyViolation::MissingDigit);
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	mod hashing {
		use super::*;

		#[test]
		fn hash_then_verify_roundtrips() {
			let hash = hash_password("Str0ngP@ss").unwrap();
			assert!(verify_password("Str0ngP@ss", &hash).unwrap());
		}

		#[test]
		fn wrong_password_fails_verification() {
			let hash = hash_password("Str0ngP@ss").unwrap();
			assert!(!verify_password("WrongP4ss", &hash).unwrap());
		}

		#[test]
		fn hashes_are_salted() {
			let first = hash_password("Str0ngP@ss").unwrap();
			let second = hash_password("Str0ngP@ss").unwrap();
			assert_ne!(first, second);
		}

		#[test]
		fn malformed_hash_is_an_error_not_a_mismatch() {
			let result = verify_password("anything", "not-a-phc-string");
			assert!(matches!(result, Err(PasswordError::Hash(_))));
		}

		#[test]
		fn hash_is_a_phc_string() {
			let hash = hash_password("Str0ngP@ss").unwrap();
			assert!(hash.starts_with("$argon2id$"));
		}
	}

	mod policy {
		use super::*;

		#[test]
		fn accepts_conforming_password() {
			assert!(validate_password_policy("Str0ngP@ss").is_ok());
		}

		#[test]
		fn rejects_short_password() {
			assert_eq!(
				validate_password_policy("Ab1"),
				Err(PasswordPolicyViolation::TooShort)
			);
		}

		#[test]
		fn rejects_missing_character_classes() {
			assert_eq!(
				validate_password_policy("lowercase1"),
				Err(PasswordPolicyViolation::MissingUppercase)
			);
			assert_eq!(
				validate_password_policy("UPPERCASE1"),
				Err(PasswordPolicyViolation::MissingLowercase)
			);
			assert_eq!(
				validate_password_policy("NoDigitsHere"),
				Err(PasswordPolicyViolation::MissingDigit)
			);
		}

		proptest! {
			#[test]
			fn conforming_passwords_pass(
				upper in "[A-Z]{1,4}",
				lower in "[a-z]{1,8}",
				digit in "[0-9]{1,4}",
				pad in "[a-z0-9]{4,8}"
			) {
				let candidate = format!("{upper}{lower}{digit}{pad}");
				prop_assert!(validate_password_policy(&candidate).is_ok());
			}

			#[test]
			fn short_passwords_always_rejected(s in ".{0,7}") {
				prop_assert_eq!(
					validate_password_policy(&s),
					Err(PasswordPolicyViolation::TooShort)
				);
			}
		}
	}
}
