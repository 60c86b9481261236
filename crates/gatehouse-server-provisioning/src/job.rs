// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ProvisioningError, Result};

/// The payload handed to the external privileged worker.
///
/// Everything the worker needs to create the system user, samba share and
/// home directory lives in this file; the gateway itself never executes
/// privileged commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningJob {
	pub username: String,
	pub email: String,
	/// One-time secret for the worker to set up the system credential.
	/// Present only in the job file, never in the account store.
	pub secret: String,
	pub created_at: DateTime<Utc>,
}

impl ProvisioningJob {
	pub fn new(username: &str, email: &str, secret: &str) -> Result<Self> {
		if !is_valid_job_username(username) {
			return Err(ProvisioningError::InvalidJob {
				field: "username".to_string(),
				message: format!("'{username}' contains characters unsafe for a job file name"),
			});
		}
		Ok(Self {
			username: username.to_string(),
			email: email.to_string(),
			secret: secret.to_string(),
			created_at: Utc::now(),
		})
	}

	/// File name for this job at the given timestamp:
	/// `job_<unix_millis>_<username>.json`.
	pub fn file_name(&self, unix_millis: i64) -> String {
		format!("job_{unix_millis}_{}.json", self.username)
	}
}

/// The username doubles as a path component of the job file, so the queue
/// re-checks the charset even though the service validated it at
/// registration.
pub fn is_valid_job_username(username: &str) -> bool {
	!username.is_empty()
		&& username
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_name_embeds_millis_and_username() {
		let job = ProvisioningJob::new("alice", "alice@example.com", "s3cretS3cretAb12").unwrap();
		assert_eq!(job.file_name(1700000000000), "job_1700000000000_alice.json");
	}

	#[test]
	fn rejects_usernames_with_path_characters() {
		for bad in ["../etc", "a/b", "a b", "", "a\0b"] {
			assert!(
				ProvisioningJob::new(bad, "x@example.com", "s").is_err(),
				"{bad:?} should be rejected"
			);
		}
	}

	#[test]
	fn accepts_sanitized_usernames() {
		for good in ["alice", "bob_smith", "carol-7", "X"] {
			assert!(is_valid_job_username(good), "{good:?} should be accepted");
		}
	}

	#[test]
	fn serializes_the_worker_contract() {
		let job = ProvisioningJob::new("alice", "alice@example.com", "s3cretS3cretAb12").unwrap();
		let json = serde_json::to_value(&job).unwrap();
		assert_eq!(json["username"], "alice");
		assert_eq!(json["email"], "alice@example.com");
		assert_eq!(json["secret"], "s3cretS3cretAb12");
		assert!(json["created_at"].is_string());
	}
}
