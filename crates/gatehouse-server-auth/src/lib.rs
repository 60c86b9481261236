// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity, credentials, and session tokens for the Gatehouse server.
//!
//! This crate provides the account entity and the two collaborators that
//! sit beside every authenticated request:
//!
//! - [`password`] - Argon2id credential hashing and the password policy
//! - [`token`] - stateless HS256 session tokens
//!
//! plus the core type vocabulary ([`types`]) shared across the workspace.

pub mod account;
pub mod password;
pub mod token;
pub mod types;

pub use account::{
	derive_home_directory, normalize_email, validate_email, validate_username, Account,
	AccountView, NewAccount,
};
pub use password::{
	hash_password, validate_password_policy, verify_password, PasswordError,
	PasswordPolicyViolation, MIN_PASSWORD_LENGTH,
};
pub use token::{Claims, SessionIssuer, TokenError};
pub use types::{AccountId, AppCatalog, ApprovalState, AuditEventId, SecurityEventId};
