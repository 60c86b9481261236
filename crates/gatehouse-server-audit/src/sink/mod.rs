// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit sinks: destinations for published audit entries.

pub mod file;
pub mod tracing;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuditSinkError;
use crate::event::AuditLogEntry;

/// A destination that audit entries are published to.
///
/// Sinks must tolerate transient failure: the pipeline logs a warning and
/// moves on, it never retries and never surfaces the failure to the caller
/// that recorded the event.
#[async_trait]
pub trait AuditSink: Send + Sync {
	/// Short name used in log messages when publishing fails.
	fn name(&self) -> &str;

	/// Deliver one entry to the sink.
	async fn publish(&self, entry: Arc<AuditLogEntry>) -> Result<(), AuditSinkError>;
}
