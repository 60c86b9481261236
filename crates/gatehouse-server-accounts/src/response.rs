// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outward response contract.
//!
//! Every operation resolves to `ApiResponse<T>`; failures carry a
//! machine-readable [`ErrorKind`] plus a human message. Internal detail
//! (store errors, hashing failures) is logged where it occurs and mapped
//! to `ServerError` with a generic message.

use serde::Serialize;

use crate::error::AccountsError;

/// Machine-readable discriminant for a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	Validation,
	DuplicateIdentity,
	NotFound,
	AlreadyApproved,
	AlreadyDenied,
	InvalidTransition,
	Unauthorized,
	Forbidden,
	WeakPassword,
	PasswordReuse,
	WrongCurrentPassword,
	InvalidCredentials,
	NotApproved,
	UnknownApp,
	ProvisioningFailure,
	ServerError,
}

impl From<&AccountsError> for ErrorKind {
	fn from(e: &AccountsError) -> Self {
		match e {
			AccountsError::Validation { .. } => ErrorKind::Validation,
			AccountsError::DuplicateIdentity => ErrorKind::DuplicateIdentity,
			AccountsError::NotFound => ErrorKind::NotFound,
			AccountsError::AlreadyApproved => ErrorKind::AlreadyApproved,
			AccountsError::AlreadyDenied => ErrorKind::AlreadyDenied,
			AccountsError::InvalidTransition => ErrorKind::InvalidTransition,
			AccountsError::Unauthorized => ErrorKind::Unauthorized,
			AccountsError::Forbidden | AccountsError::ForbiddenAdminDeletion => ErrorKind::Forbidden,
			AccountsError::WeakPassword(_) => ErrorKind::WeakPassword,
			AccountsError::PasswordReuse => ErrorKind::PasswordReuse,
			AccountsError::WrongCurrentPassword => ErrorKind::WrongCurrentPassword,
			AccountsError::InvalidCredentials => ErrorKind::InvalidCredentials,
			AccountsError::NotApproved => ErrorKind::NotApproved,
			AccountsError::UnknownApp(_) => ErrorKind::UnknownApp,
			AccountsError::ProvisioningWriteFailure { .. } => ErrorKind::ProvisioningFailure,
			AccountsError::Store(_) | AccountsError::Internal(_) => ErrorKind::ServerError,
		}
	}
}

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
	pub success: bool,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorKind>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
}

impl<T> ApiResponse<T> {
	pub fn ok(message: impl Into<String>, data: T) -> Self {
		Self {
			success: true,
			message: message.into(),
			error: None,
			data: Some(data),
		}
	}

	pub fn ok_empty(message: impl Into<String>) -> Self {
		Self {
			success: true,
			message: message.into(),
			error: None,
			data: None,
		}
	}

	pub fn from_error(e: &AccountsError) -> Self {
		let kind = ErrorKind::from(e);
		let message = match kind {
			// Internal detail stays in the logs.
			ErrorKind::ServerError => "internal server error".to_string(),
			_ => e.to_string(),
		};
		Self {
			success: false,
			message,
			error: Some(kind),
			data: None,
		}
	}
}
