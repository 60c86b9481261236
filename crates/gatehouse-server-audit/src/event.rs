// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core event types for audit logging.
//!
//! This module provides the foundational types for the audit trail:
//!
//! - [`AuditEventType`]: Enumeration of all auditable gateway events
//! - [`AuditSeverity`]: RFC 5424-compatible severity levels
//! - [`AuditLogEntry`]: Complete audit record
//! - [`AuditLogBuilder`]: Fluent API for constructing entries

use chrono::{DateTime, Utc};
use gatehouse_server_auth::{AccountId, AuditEventId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Types of events that can be recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
	// Authentication events
	Login,
	LoginFailed,

	// Lifecycle events
	AccountRegistered,
	AccountApproved,
	AccountDenied,
	AccountDeleted,

	// Entitlement events
	AppApprovalGranted,
	AppApprovalRevoked,
	AdminGranted,
	AdminRevoked,

	// Credential events
	PasswordChanged,
	PasswordReset,

	// Provisioning events
	ProvisioningJobQueued,
	ProvisioningWriteFailed,

	// Perimeter events
	OriginBlocked,
	RateLimitTripped,
}

impl fmt::Display for AuditEventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditEventType::Login => "login",
			AuditEventType::LoginFailed => "login_failed",
			AuditEventType::AccountRegistered => "account_registered",
			AuditEventType::AccountApproved => "account_approved",
			AuditEventType::AccountDenied => "account_denied",
			AuditEventType::AccountDeleted => "account_deleted",
			AuditEventType::AppApprovalGranted => "app_approval_granted",
			AuditEventType::AppApprovalRevoked => "app_approval_revoked",
			AuditEventType::AdminGranted => "admin_granted",
			AuditEventType::AdminRevoked => "admin_revoked",
			AuditEventType::PasswordChanged => "password_changed",
			AuditEventType::PasswordReset => "password_reset",
			AuditEventType::ProvisioningJobQueued => "provisioning_job_queued",
			AuditEventType::ProvisioningWriteFailed => "provisioning_write_failed",
			AuditEventType::OriginBlocked => "origin_blocked",
			AuditEventType::RateLimitTripped => "rate_limit_tripped",
		};
		write!(f, "{s}")
	}
}

impl AuditEventType {
	/// Returns the default severity for this event type.
	///
	/// Mapping follows RFC 5424 conventions:
	/// - `Info`: Normal operations (login, registration, job queued)
	/// - `Warning`: Security-relevant failures (login failed, blocked origin)
	/// - `Notice`: Administrative actions (approvals, deletions, admin grants)
	/// - `Error`: Operation failures (provisioning write failed)
	pub fn default_severity(&self) -> AuditSeverity {
		match self {
			AuditEventType::Login
			| AuditEventType::AccountRegistered
			| AuditEventType::PasswordChanged
			| AuditEventType::ProvisioningJobQueued => AuditSeverity::Info,

			AuditEventType::LoginFailed
			| AuditEventType::OriginBlocked
			| AuditEventType::RateLimitTripped => AuditSeverity::Warning,

			AuditEventType::AccountApproved
			| AuditEventType::AccountDenied
			| AuditEventType::AccountDeleted
			| AuditEventType::AppApprovalGranted
			| AuditEventType::AppApprovalRevoked
			| AuditEventType::AdminGranted
			| AuditEventType::AdminRevoked
			| AuditEventType::PasswordReset => AuditSeverity::Notice,

			AuditEventType::ProvisioningWriteFailed => AuditSeverity::Error,
		}
	}
}

/// Severity levels for audit events, compatible with RFC 5424 syslog.
///
/// The numeric values correspond to syslog severity codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
	Debug = 7,
	#[default]
	Info = 6,
	Notice = 5,
	Warning = 4,
	Error = 3,
	Critical = 2,
}

impl AuditSeverity {
	/// Returns the RFC 5424 numeric severity code.
	pub fn as_syslog_code(&self) -> u8 {
		*self as u8
	}
}

impl PartialOrd for AuditSeverity {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for AuditSeverity {
	fn cmp(&self, other: &Self) -> Ordering {
		// Lower numeric value = higher severity (Critical=2 > Debug=7)
		(*other as u8).cmp(&(*self as u8))
	}
}

impl fmt::Display for AuditSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditSeverity::Debug => "debug",
			AuditSeverity::Info => "info",
			AuditSeverity::Notice => "notice",
			AuditSeverity::Warning => "warning",
			AuditSeverity::Error => "error",
			AuditSeverity::Critical => "critical",
		};
		write!(f, "{s}")
	}
}

/// An entry in the audit trail recording a security-relevant event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
	/// Unique identifier for this audit entry.
	pub id: AuditEventId,
	/// When the event occurred.
	pub timestamp: DateTime<Utc>,
	/// The type of event.
	pub event_type: AuditEventType,
	/// The severity level of this event.
	pub severity: AuditSeverity,

	/// The account that performed the action (if known).
	pub actor_account_id: Option<AccountId>,
	/// The account affected by the action, when different from the actor.
	pub subject_account_id: Option<AccountId>,

	/// Human-readable description of the action.
	pub action: String,
	/// IP address of the request origin.
	pub ip_address: Option<String>,
	/// Additional event-specific details.
	pub details: serde_json::Value,
}

impl AuditLogEntry {
	/// Create a new audit log builder for the given event type.
	pub fn builder(event_type: AuditEventType) -> AuditLogBuilder {
		AuditLogBuilder::new(event_type)
	}
}

/// Builder for constructing audit log entries with a fluent API.
#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
	event_type: AuditEventType,
	severity: Option<AuditSeverity>,
	actor_account_id: Option<AccountId>,
	subject_account_id: Option<AccountId>,
	action: Option<String>,
	ip_address: Option<String>,
	details: serde_json::Value,
}

impl AuditLogBuilder {
	/// Create a new builder for the given event type.
	pub fn new(event_type: AuditEventType) -> Self {
		Self {
			event_type,
			severity: None,
			actor_account_id: None,
			subject_account_id: None,
			action: None,
			ip_address: None,
			details: serde_json::Value::Null,
		}
	}

	/// Set the severity level. Defaults to the event type's default severity.
	pub fn severity(mut self, severity: AuditSeverity) -> Self {
		self.severity = Some(severity);
		self
	}

	/// Set the account that performed the action.
	pub fn actor(mut self, account_id: AccountId) -> Self {
		self.actor_account_id = Some(account_id);
		self
	}

	/// Set the account affected by the action.
	pub fn subject(mut self, account_id: AccountId) -> Self {
		self.subject_account_id = Some(account_id);
		self
	}

	/// Set the human-readable action description.
	pub fn action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	/// Set the IP address of the request origin.
	pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
		self.ip_address = Some(ip.into());
		self
	}

	/// Set additional event-specific details.
	pub fn details(mut self, details: serde_json::Value) -> Self {
		self.details = details;
		self
	}

	/// Build the audit log entry.
	pub fn build(self) -> AuditLogEntry {
		AuditLogEntry {
			id: AuditEventId::generate(),
			timestamp: Utc::now(),
			event_type: self.event_type,
			severity: self
				.severity
				.unwrap_or_else(|| self.event_type.default_severity()),
			actor_account_id: self.actor_account_id,
			subject_account_id: self.subject_account_id,
			action: self.action.unwrap_or_else(|| self.event_type.to_string()),
			ip_address: self.ip_address,
			details: self.details,
		}
	}
}
