// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fire-and-forget audit pipeline.
//!
//! Callers hand entries to [`AuditService::record`], which never blocks and
//! never fails the calling operation: a full queue drops the entry with a
//! warning, and sink failures are logged by the background task.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{instrument, warn};

use crate::error::{AuditError, AuditResult};
use crate::event::AuditLogEntry;
use crate::sink::AuditSink;

pub struct AuditService {
	tx: mpsc::Sender<AuditLogEntry>,
}

impl AuditService {
	/// Spawn the background task and return a handle that feeds it.
	pub fn new(queue_capacity: usize, sinks: Vec<Arc<dyn AuditSink>>) -> Self {
		let (tx, rx) = mpsc::channel(queue_capacity);

		tokio::spawn(Self::background_task(rx, sinks));

		Self { tx }
	}

	async fn background_task(mut rx: mpsc::Receiver<AuditLogEntry>, sinks: Vec<Arc<dyn AuditSink>>) {
		while let Some(entry) = rx.recv().await {
			let entry = Arc::new(entry);

			for sink in &sinks {
				let sink = Arc::clone(sink);
				let entry = Arc::clone(&entry);

				tokio::spawn(async move {
					if let Err(source) = sink.publish(entry).await {
						let e = AuditError::SinkError {
							sink: sink.name().to_string(),
							source,
						};
						warn!(error = %e, "audit sink publish failed");
					}
				});
			}
		}
	}

	/// Queue an audit entry, reporting exactly why queueing failed.
	pub fn try_record(&self, entry: AuditLogEntry) -> AuditResult<()> {
		self.tx.try_send(entry).map_err(|e| match e {
			TrySendError::Full(_) => AuditError::QueueFull,
			TrySendError::Closed(_) => AuditError::Shutdown,
		})
	}

	/// Queue an audit entry for processing.
	///
	/// Returns `true` if the entry was queued, `false` if it was dropped.
	/// Callers treat both as success; the trail is best-effort by design of
	/// the recording path, not of the sinks.
	#[instrument(skip(self, entry), fields(event_type = %entry.event_type))]
	pub fn record(&self, entry: AuditLogEntry) -> bool {
		match self.try_record(entry) {
			Ok(()) => true,
			Err(e) => {
				warn!(error = %e, "audit entry dropped");
				false
			}
		}
	}

	/// Queue an entry, waiting for capacity. Used by tests and shutdown paths
	/// that must not lose the entry.
	pub async fn record_blocking(&self, entry: AuditLogEntry) -> AuditResult<()> {
		self.tx.send(entry).await.map_err(|_| AuditError::Shutdown)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::AuditSinkError;
	use crate::event::AuditEventType;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use tokio::time::{sleep, Duration};

	struct CountingSink {
		publish_count: Arc<AtomicUsize>,
	}

	#[async_trait]
	impl AuditSink for CountingSink {
		fn name(&self) -> &str {
			"counting"
		}

		async fn publish(&self, _entry: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
			self.publish_count.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}
	}

	struct FailingSink;

	#[async_trait]
	impl AuditSink for FailingSink {
		fn name(&self) -> &str {
			"failing"
		}

		async fn publish(&self, _entry: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
			Err(AuditSinkError::Transient("boom".to_string()))
		}
	}

	async fn drain() {
		// Let the background task and per-sink spawns run.
		sleep(Duration::from_millis(50)).await;
	}

	#[tokio::test]
	async fn entries_reach_every_sink() {
		let count_a = Arc::new(AtomicUsize::new(0));
		let count_b = Arc::new(AtomicUsize::new(0));
		let service = AuditService::new(
			16,
			vec![
				Arc::new(CountingSink {
					publish_count: Arc::clone(&count_a),
				}),
				Arc::new(CountingSink {
					publish_count: Arc::clone(&count_b),
				}),
			],
		);

		for _ in 0..3 {
			assert!(service.record(AuditLogEntry::builder(AuditEventType::Login).build()));
		}
		drain().await;

		assert_eq!(count_a.load(Ordering::SeqCst), 3);
		assert_eq!(count_b.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn sink_failure_does_not_stop_other_sinks() {
		let count = Arc::new(AtomicUsize::new(0));
		let service = AuditService::new(
			16,
			vec![
				Arc::new(FailingSink),
				Arc::new(CountingSink {
					publish_count: Arc::clone(&count),
				}),
			],
		);

		service.record(AuditLogEntry::builder(AuditEventType::LoginFailed).build());
		drain().await;

		assert_eq!(count.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn full_queue_reports_queue_full_and_drops() {
		let count = Arc::new(AtomicUsize::new(0));
		let service = AuditService::new(
			1,
			vec![Arc::new(CountingSink {
				publish_count: Arc::clone(&count),
			})],
		);

		// On the single-threaded test runtime the background task has not
		// been polled yet, so the second entry finds the queue still full.
		assert!(service
			.try_record(AuditLogEntry::builder(AuditEventType::Login).build())
			.is_ok());
		assert!(matches!(
			service.try_record(AuditLogEntry::builder(AuditEventType::Login).build()),
			Err(AuditError::QueueFull)
		));
		assert!(!service.record(AuditLogEntry::builder(AuditEventType::Login).build()));

		drain().await;
		assert_eq!(count.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn record_blocking_delivers() {
		let count = Arc::new(AtomicUsize::new(0));
		let service = AuditService::new(
			1,
			vec![Arc::new(CountingSink {
				publish_count: Arc::clone(&count),
			})],
		);

		service
			.record_blocking(AuditLogEntry::builder(AuditEventType::AccountRegistered).build())
			.await
			.unwrap();
		drain().await;

		assert_eq!(count.load(Ordering::SeqCst), 1);
	}
}
