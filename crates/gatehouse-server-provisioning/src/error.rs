// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Errors that can occur while handing off provisioning jobs.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
	#[error("failed to write job file: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to serialize job: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("invalid job field '{field}': {message}")]
	InvalidJob { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, ProvisioningError>;
