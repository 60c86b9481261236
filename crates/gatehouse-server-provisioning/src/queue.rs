// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable job handoff through the pending-jobs directory.
//!
//! Enqueue writes a temp file, fsyncs it and renames it into place, so the
//! external worker scanning the directory only ever observes complete job
//! files. The worker consumes files out of band; this crate never deletes
//! or claims them.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::job::ProvisioningJob;

/// File-system backed queue of pending provisioning jobs.
#[derive(Debug, Clone)]
pub struct JobQueue {
	pending_dir: PathBuf,
}

impl JobQueue {
	pub fn new(pending_dir: impl Into<PathBuf>) -> Self {
		Self {
			pending_dir: pending_dir.into(),
		}
	}

	pub fn pending_dir(&self) -> &Path {
		&self.pending_dir
	}

	/// Write one job file into the pending directory, returning its path.
	///
	/// Same-millisecond name collisions are resolved by bumping the
	/// timestamp; `create_new` on the temp file is the reservation. The
	/// approval path enqueues at most one job per account, so collisions
	/// only occur between distinct usernames racing the same millisecond.
	#[tracing::instrument(skip(self, job), fields(username = %job.username))]
	pub async fn enqueue(&self, job: &ProvisioningJob) -> Result<PathBuf> {
		tokio::fs::create_dir_all(&self.pending_dir).await?;

		let payload = serde_json::to_vec_pretty(job)?;

		let mut millis = Utc::now().timestamp_millis();
		loop {
			let file_name = job.file_name(millis);
			let final_path = self.pending_dir.join(&file_name);
			let tmp_path = self.pending_dir.join(format!(".{file_name}.tmp"));

			if tokio::fs::try_exists(&final_path).await? {
				millis += 1;
				continue;
			}

			let mut tmp = match OpenOptions::new()
				.write(true)
				.create_new(true)
				.open(&tmp_path)
				.await
			{
				Ok(file) => file,
				Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
					millis += 1;
					continue;
				}
				Err(e) => return Err(e.into()),
			};

			tmp.write_all(&payload).await?;
			tmp.sync_all().await?;
			drop(tmp);

			tokio::fs::rename(&tmp_path, &final_path).await?;

			tracing::debug!(path = %final_path.display(), "provisioning job enqueued");
			return Ok(final_path);
		}
	}

	/// List job files currently awaiting pickup, oldest name first.
	///
	/// Temp files still being written are excluded. This is the input to
	/// any reconciliation sweep over approved accounts.
	#[tracing::instrument(skip(self))]
	pub async fn list_pending(&self) -> Result<Vec<PathBuf>> {
		let mut jobs = Vec::new();

		let mut entries = match tokio::fs::read_dir(&self.pending_dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(jobs),
			Err(e) => return Err(e.into()),
		};

		while let Some(entry) = entries.next_entry().await? {
			let path = entry.path();
			let name = entry.file_name();
			let name = name.to_string_lossy();
			if name.starts_with("job_") && name.ends_with(".json") {
				jobs.push(path);
			}
		}

		jobs.sort();
		Ok(jobs)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::secret::generate_secret;

	fn sample_job(username: &str) -> ProvisioningJob {
		let secret = generate_secret();
		ProvisioningJob::new(username, &format!("{username}@example.com"), &secret).unwrap()
	}

	#[tokio::test]
	async fn enqueue_creates_directory_and_named_file() {
		let dir = tempfile::tempdir().unwrap();
		let queue = JobQueue::new(dir.path().join("pending"));

		let path = queue.enqueue(&sample_job("alice")).await.unwrap();
		let name = path.file_name().unwrap().to_string_lossy().into_owned();
		assert!(name.starts_with("job_"));
		assert!(name.ends_with("_alice.json"));

		let contents = tokio::fs::read_to_string(&path).await.unwrap();
		let parsed: ProvisioningJob = serde_json::from_str(&contents).unwrap();
		assert_eq!(parsed.username, "alice");
		assert_eq!(parsed.secret.len(), 16);
	}

	#[tokio::test]
	async fn enqueue_never_overwrites_an_existing_job() {
		let dir = tempfile::tempdir().unwrap();
		let queue = JobQueue::new(dir.path());

		let first = queue.enqueue(&sample_job("alice")).await.unwrap();
		let second = queue.enqueue(&sample_job("alice")).await.unwrap();
		assert_ne!(first, second);

		assert_eq!(queue.list_pending().await.unwrap().len(), 2);
	}

	#[tokio::test]
	async fn list_pending_ignores_temp_and_foreign_files() {
		let dir = tempfile::tempdir().unwrap();
		let queue = JobQueue::new(dir.path());

		queue.enqueue(&sample_job("alice")).await.unwrap();
		tokio::fs::write(dir.path().join(".job_1_x.json.tmp"), b"partial")
			.await
			.unwrap();
		tokio::fs::write(dir.path().join("README"), b"not a job")
			.await
			.unwrap();

		let pending = queue.list_pending().await.unwrap();
		assert_eq!(pending.len(), 1);
	}

	#[tokio::test]
	async fn list_pending_on_missing_directory_is_empty() {
		let dir = tempfile::tempdir().unwrap();
		let queue = JobQueue::new(dir.path().join("never-created"));
		assert!(queue.list_pending().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn concurrent_enqueues_produce_distinct_files() {
		let dir = tempfile::tempdir().unwrap();
		let queue = JobQueue::new(dir.path());

		let job_a = sample_job("alice");
		let job_b = sample_job("bob");
		let a = queue.enqueue(&job_a);
		let b = queue.enqueue(&job_b);
		let (a, b) = tokio::join!(a, b);

		assert_ne!(a.unwrap(), b.unwrap());
		assert_eq!(queue.list_pending().await.unwrap().len(), 2);
	}
}
