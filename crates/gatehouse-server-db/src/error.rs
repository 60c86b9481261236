// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store-level errors.
//!
//! `Conflict` and `NotFound` are the two variants the account service
//! maps to caller-visible failures (duplicate identity, missing
//! account); everything else surfaces as a generic server error with
//! the detail kept in the logs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
	#[error("query failed: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("conflict: {0}")]
	Conflict(String),

	#[error("internal store error: {0}")]
	Internal(String),

	#[error("stored value could not be decoded: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages_use_the_gateway_register() {
		let e = DbError::Conflict("username or email already exists".to_string());
		assert_eq!(e.to_string(), "conflict: username or email already exists");

		let e = DbError::NotFound("account 42".to_string());
		assert_eq!(e.to_string(), "not found: account 42");

		let e = DbError::Internal("bad row".to_string());
		assert!(e.to_string().starts_with("internal store error"));
	}
}
