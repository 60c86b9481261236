// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Account entity and identity validation.
//!
//! This module provides:
//! - [`Account`] - the core account entity with approval state
//! - [`AccountView`] - outward representation with credential fields omitted
//! - [`NewAccount`] - creation payload for the account store
//! - Username/email validation and home-directory derivation
//!
//! # PII Handling
//!
//! `username` and `email` are user-provided PII and should be redacted in
//! logs. `password_hash` is an opaque PHC string; the plaintext never
//! reaches this type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::types::{AccountId, ApprovalState};

/// A registered account in the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
	/// Unique identifier for this account.
	pub id: AccountId,

	/// Unique login/provisioning username.
	pub username: String,

	/// Unique email address, stored lowercased and trimmed.
	pub email: String,

	/// Opaque argon2 PHC string. Never exposed through [`AccountView`].
	pub password_hash: String,

	/// Global approval gate.
	pub approval_state: ApprovalState,

	/// Administrators bypass the approval gate and may act on other accounts.
	pub is_admin: bool,

	/// Per-application entitlements, keyed by catalog app name.
	pub app_approvals: BTreeMap<String, bool>,

	/// Home directory assigned at approval time; `None` until approved.
	pub home_directory: Option<PathBuf>,

	/// When the account was created.
	pub created_at: DateTime<Utc>,

	/// When the account was last modified.
	pub updated_at: DateTime<Utc>,
}

impl Account {
	/// Returns true if the approval gate permits this account to log in.
	pub fn may_login(&self) -> bool {
		self.is_admin || self.approval_state == ApprovalState::Approved
	}

	/// Outward representation, credential fields omitted.
	pub fn to_view(&self) -> AccountView {
		AccountView {
			id: self.id,
			username: self.username.clone(),
			email: self.email.clone(),
			approval_state: self.approval_state,
			is_admin: self.is_admin,
			app_approvals: self.app_approvals.clone(),
			home_directory: self.home_directory.clone(),
			created_at: self.created_at,
			updated_at: self.updated_at,
		}
	}
}

/// Public view of an account, safe to return to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
	pub id: AccountId,
	pub username: String,
	pub email: String,
	pub approval_state: ApprovalState,
	pub is_admin: bool,
	pub app_approvals: BTreeMap<String, bool>,
	pub home_directory: Option<PathBuf>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Payload for creating an account in the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
	pub username: String,
	pub email: String,
	pub password_hash: String,
	pub app_approvals: BTreeMap<String, bool>,
}

/// Validates a username.
///
/// Rules:
/// - 2-32 characters
/// - ASCII letters, digits, underscores, and dashes only
///
/// The charset matches what the downstream provisioning worker accepts, so
/// anything that passes here is safe to hand to it verbatim.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
	if username.len() < 2 {
		return Err("Username must be at least 2 characters");
	}
	if username.len() > 32 {
		return Err("Username must be at most 32 characters");
	}
	if !username
		.chars()
		.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
	{
		return Err("Username can only contain letters, numbers, underscores, and dashes");
	}
	Ok(())
}

/// Lowercase and trim an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

/// Validates the shape of an email address.
///
/// Deliberately minimal: one `@`, non-empty local part, and a domain
/// containing a dot. Deliverability is the mail system's problem.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
	let mut parts = email.splitn(2, '@');
	let local = parts.next().unwrap_or_default();
	let domain = parts.next().unwrap_or_default();

	if local.is_empty() || domain.is_empty() {
		return Err("Valid email is required");
	}
	if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
		return Err("Valid email is required");
	}
	if email.chars().any(char::is_whitespace) {
		return Err("Valid email is required");
	}
	Ok(())
}

/// Derive the home directory for `username` under `base`.
///
/// The username must already satisfy [`validate_username`]; this re-checks
/// the charset so the resulting path can never contain separators or `..`
/// components, then verifies containment under `base`.
pub fn derive_home_directory(base: &Path, username: &str) -> Result<PathBuf, &'static str> {
	validate_username(username)?;
	let dir = base.join(username);
	if !dir.starts_with(base) {
		return Err("Derived home directory escapes the base directory");
	}
	Ok(dir)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn make_test_account() -> Account {
		Account {
			id: AccountId::generate(),
			username: "alice".to_string(),
			email: "alice@example.com".to_string(),
			password_hash: "$argon2id$stub".to_string(),
			approval_state: ApprovalState::Pending,
			is_admin: false,
			app_approvals: BTreeMap::new(),
			home_directory: None,
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	mod account {
		use super::*;

		#[test]
		fn pending_non_admin_may_not_login() {
			let account = make_test_account();
			assert!(!account.may_login());
		}

		#[test]
		fn approved_account_may_login() {
			let mut account = make_test_account();
			account.approval_state = ApprovalState::Approved;
			assert!(account.may_login());
		}

		#[test]
		fn admin_bypasses_approval_gate() {
			let mut account = make_test_account();
			account.is_admin = true;
			assert_eq!(account.approval_state, ApprovalState::Pending);
			assert!(account.may_login());
		}

		#[test]
		fn denied_non_admin_may_not_login() {
			let mut account = make_test_account();
			account.approval_state = ApprovalState::Denied;
			assert!(!account.may_login());
		}

		#[test]
		fn view_omits_password_hash() {
			let account = make_test_account();
			let json = serde_json::to_string(&account.to_view()).unwrap();
			assert!(!json.contains("password_hash"));
			assert!(!json.contains("argon2"));
			assert!(json.contains("\"username\":\"alice\""));
		}
	}

	mod usernames {
		use super::*;

		#[test]
		fn accepts_typical_usernames() {
			assert!(validate_username("alice").is_ok());
			assert!(validate_username("bob-smith").is_ok());
			assert!(validate_username("user_01").is_ok());
		}

		#[test]
		fn rejects_too_short_and_too_long() {
			assert!(validate_username("a").is_err());
			assert!(validate_username(&"a".repeat(33)).is_err());
		}

		#[test]
		fn rejects_path_and_shell_metacharacters() {
			assert!(validate_username("../etc").is_err());
			assert!(validate_username("alice/..").is_err());
			assert!(validate_username("a b").is_err());
			assert!(validate_username("alice;rm").is_err());
		}

		proptest! {
			#[test]
			fn valid_usernames_pass(name in "[a-zA-Z0-9_-]{2,32}") {
				prop_assert!(validate_username(&name).is_ok());
			}
		}
	}

	mod emails {
		use super::*;

		#[test]
		fn normalizes_case_and_whitespace() {
			assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
		}

		#[test]
		fn accepts_plain_addresses() {
			assert!(validate_email("alice@example.com").is_ok());
			assert!(validate_email("a.b+tag@sub.example.org").is_ok());
		}

		#[test]
		fn rejects_malformed_addresses() {
			assert!(validate_email("").is_err());
			assert!(validate_email("alice").is_err());
			assert!(validate_email("@example.com").is_err());
			assert!(validate_email("alice@").is_err());
			assert!(validate_email("alice@nodot").is_err());
			assert!(validate_email("alice@.com").is_err());
			assert!(validate_email("al ice@example.com").is_err());
		}
	}

	mod home_directory {
		use super::*;

		#[test]
		fn derives_under_base() {
			let dir = derive_home_directory(Path::new("/storage"), "alice").unwrap();
			assert_eq!(dir, PathBuf::from("/storage/alice"));
		}

		#[test]
		fn rejects_traversal_attempts() {
			assert!(derive_home_directory(Path::new("/storage"), "../root").is_err());
			assert!(derive_home_directory(Path::new("/storage"), "a/../../b").is_err());
			assert!(derive_home_directory(Path::new("/storage"), "..").is_err());
		}

		proptest! {
			#[test]
			fn derived_path_always_contained(name in "[a-zA-Z0-9_-]{2,32}") {
				let base = Path::new("/storage");
				let dir = derive_home_directory(base, &name).unwrap();
				prop_assert!(dir.starts_with(base));
			}
		}
	}
}
