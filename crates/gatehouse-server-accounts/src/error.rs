// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gatehouse_server_auth::{AccountView, PasswordPolicyViolation};
use gatehouse_server_db::DbError;
use gatehouse_server_provisioning::ProvisioningError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AccountsError>;

/// Errors surfaced at the account-service boundary.
#[derive(Debug, Error)]
pub enum AccountsError {
	#[error("invalid {field}: {message}")]
	Validation { field: String, message: String },

	#[error("username or email already registered")]
	DuplicateIdentity,

	#[error("account not found")]
	NotFound,

	#[error("account is already approved")]
	AlreadyApproved,

	#[error("account is already denied")]
	AlreadyDenied,

	#[error("invalid approval transition")]
	InvalidTransition,

	#[error("authentication required")]
	Unauthorized,

	#[error("admin capability required")]
	Forbidden,

	#[error("admin accounts cannot be deleted")]
	ForbiddenAdminDeletion,

	#[error("weak password: {0}")]
	WeakPassword(PasswordPolicyViolation),

	#[error("new password must differ from the current password")]
	PasswordReuse,

	#[error("current password is incorrect")]
	WrongCurrentPassword,

	#[error("invalid email or password")]
	InvalidCredentials,

	#[error("account is not approved")]
	NotApproved,

	#[error("unknown application: {0}")]
	UnknownApp(String),

	/// The approval committed but the job file could not be written.
	/// The account stays approved; the worker handoff must be retried
	/// out of band.
	#[error("account approved but provisioning handoff failed: {source}")]
	ProvisioningWriteFailure {
		account: Box<AccountView>,
		#[source]
		source: ProvisioningError,
	},

	#[error("store error: {0}")]
	Store(#[from] DbError),

	#[error("internal error: {0}")]
	Internal(String),
}

impl From<gatehouse_server_auth::PasswordError> for AccountsError {
	fn from(e: gatehouse_server_auth::PasswordError) -> Self {
		match e {
			gatehouse_server_auth::PasswordError::Weak(v) => AccountsError::WeakPassword(v),
			gatehouse_server_auth::PasswordError::Hash(m) => AccountsError::Internal(m),
		}
	}
}
