// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::AuditSinkError;
use crate::event::AuditLogEntry;
use crate::sink::AuditSink;

/// Appends audit entries to a file as JSON lines.
///
/// The file is opened lazily on first publish and kept open; every line is
/// flushed before publish returns so a crash loses at most the entry in
/// flight.
pub struct FileAuditSink {
	path: PathBuf,
	file: Mutex<Option<tokio::fs::File>>,
}

impl FileAuditSink {
	pub fn new(path: PathBuf) -> Self {
		Self {
			path,
			file: Mutex::new(None),
		}
	}

	async fn write_line(&self, line: &str) -> Result<(), AuditSinkError> {
		let mut guard = self.file.lock().await;

		if guard.is_none() {
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(&self.path)
				.await
				.map_err(|e| AuditSinkError::Transient(format!("failed to open file: {e}")))?;
			*guard = Some(file);
		}

		let file = guard
			.as_mut()
			.ok_or_else(|| AuditSinkError::Permanent("file handle not initialized".to_string()))?;

		file
			.write_all(line.as_bytes())
			.await
			.map_err(|e| AuditSinkError::Transient(format!("failed to write to file: {e}")))?;

		file
			.flush()
			.await
			.map_err(|e| AuditSinkError::Transient(format!("failed to flush file: {e}")))?;

		Ok(())
	}
}

#[async_trait]
impl AuditSink for FileAuditSink {
	fn name(&self) -> &str {
		"file"
	}

	async fn publish(&self, entry: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		let line = format_json_line(&entry)?;
		self.write_line(&line).await
	}
}

pub fn format_json_line(entry: &AuditLogEntry) -> Result<String, AuditSinkError> {
	let json = serde_json::to_string(entry)
		.map_err(|e| AuditSinkError::Permanent(format!("JSON serialization failed: {e}")))?;
	Ok(format!("{json}\n"))
}
