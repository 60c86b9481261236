// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed inbound payloads with pure validation.
//!
//! Validation here covers shape only (charset, length, required fields);
//! policy checks that need other state (password policy, catalog lookups,
//! uniqueness) happen in the service.

use gatehouse_server_auth::{normalize_email, validate_email, validate_username};
use serde::Deserialize;

use crate::error::AccountsError;

fn invalid(field: &str, message: impl Into<String>) -> AccountsError {
	AccountsError::Validation {
		field: field.to_string(),
		message: message.into(),
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
	pub username: String,
	pub email: String,
	pub password: String,
}

impl RegisterRequest {
	pub fn validate(&self) -> Result<(), AccountsError> {
		validate_username(&self.username).map_err(|m| invalid("username", m))?;
		// Validate the form the address will be stored in.
		validate_email(&self.normalized_email()).map_err(|m| invalid("email", m))?;
		if self.password.is_empty() {
			return Err(invalid("password", "is required"));
		}
		Ok(())
	}

	/// Email as stored: trimmed and lowercased.
	pub fn normalized_email(&self) -> String {
		normalize_email(&self.email)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

impl LoginRequest {
	pub fn validate(&self) -> Result<(), AccountsError> {
		if self.email.trim().is_empty() {
			return Err(invalid("email", "is required"));
		}
		if self.password.is_empty() {
			return Err(invalid("password", "is required"));
		}
		Ok(())
	}

	pub fn normalized_email(&self) -> String {
		normalize_email(&self.email)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
	pub current_password: String,
	pub new_password: String,
}

impl ChangePasswordRequest {
	pub fn validate(&self) -> Result<(), AccountsError> {
		if self.current_password.is_empty() {
			return Err(invalid("current_password", "is required"));
		}
		if self.new_password.is_empty() {
			return Err(invalid("new_password", "is required"));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppApprovalRequest {
	pub app: String,
	pub granted: bool,
}

impl AppApprovalRequest {
	pub fn validate(&self) -> Result<(), AccountsError> {
		if self.app.trim().is_empty() {
			return Err(invalid("app", "is required"));
		}
		Ok(())
	}
}
