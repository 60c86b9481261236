// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuditSinkError;
use crate::event::{AuditLogEntry, AuditSeverity};
use crate::sink::AuditSink;

/// Emits audit entries as structured tracing events.
///
/// Always available; the file sink is the durable trail, this one feeds
/// whatever subscriber the process has installed.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		"tracing"
	}

	async fn publish(&self, entry: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		let actor = entry
			.actor_account_id
			.map(|id| id.to_string())
			.unwrap_or_else(|| "-".to_string());

		match entry.severity {
			AuditSeverity::Critical | AuditSeverity::Error => {
				::tracing::error!(
					target: "audit",
					event_type = %entry.event_type,
					actor = %actor,
					action = %entry.action,
					"audit event"
				);
			}
			AuditSeverity::Warning | AuditSeverity::Notice => {
				::tracing::warn!(
					target: "audit",
					event_type = %entry.event_type,
					actor = %actor,
					action = %entry.action,
					"audit event"
				);
			}
			AuditSeverity::Info | AuditSeverity::Debug => {
				::tracing::info!(
					target: "audit",
					event_type = %entry.event_type,
					actor = %actor,
					action = %entry.action,
					"audit event"
				);
			}
		}

		Ok(())
	}
}
