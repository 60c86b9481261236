// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Security event store.
//!
//! The perimeter records anomalies here (blocked origins, rate-limit trips)
//! so operators can review them later. Rows are periodically purged after a
//! configurable retention window.

use chrono::{DateTime, Utc};
use gatehouse_server_auth::SecurityEventId;
use sqlx::{sqlite::SqlitePool, Row};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DbError;

/// What kind of anomaly was observed at the perimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventKind {
	/// A request arrived with an origin outside the allow-list.
	BlockedOrigin,
	/// A client tripped the request rate limit.
	RateLimited,
}

impl fmt::Display for SecurityEventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::BlockedOrigin => write!(f, "blocked_origin"),
			Self::RateLimited => write!(f, "rate_limited"),
		}
	}
}

impl FromStr for SecurityEventKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"blocked_origin" => Ok(Self::BlockedOrigin),
			"rate_limited" => Ok(Self::RateLimited),
			other => Err(format!("unknown security event kind: {other}")),
		}
	}
}

/// A recorded perimeter anomaly.
#[derive(Debug, Clone)]
pub struct SecurityEvent {
	pub id: SecurityEventId,
	pub kind: SecurityEventKind,
	pub ip_address: Option<String>,
	pub detail: Option<String>,
	pub created_at: DateTime<Utc>,
}

/// SQLite repository for security events.
#[derive(Clone)]
pub struct SecurityEventRepository {
	pool: SqlitePool,
}

impl SecurityEventRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Record a perimeter anomaly.
	#[tracing::instrument(skip(self, detail), fields(kind = %kind))]
	pub async fn record(
		&self,
		kind: SecurityEventKind,
		ip_address: Option<&str>,
		detail: Option<&str>,
	) -> Result<SecurityEvent, DbError> {
		let id = SecurityEventId::generate();
		let now = Utc::now();

		sqlx::query(
			"INSERT INTO security_events (id, kind, ip_address, detail, created_at) VALUES (?, ?, ?, ?, ?)",
		)
		.bind(id.to_string())
		.bind(kind.to_string())
		.bind(ip_address)
		.bind(detail)
		.bind(now.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(event_id = %id, "security event recorded");

		Ok(SecurityEvent {
			id,
			kind,
			ip_address: ip_address.map(str::to_string),
			detail: detail.map(str::to_string),
			created_at: now,
		})
	}

	/// List the most recent events, newest first.
	#[tracing::instrument(skip(self))]
	pub async fn list_recent(&self, limit: u32) -> Result<Vec<SecurityEvent>, DbError> {
		let rows = sqlx::query(
			"SELECT id, kind, ip_address, detail, created_at FROM security_events \
			 ORDER BY created_at DESC LIMIT ?",
		)
		.bind(limit)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_event).collect()
	}

	/// Delete events older than the cutoff, returning how many were removed.
	#[tracing::instrument(skip(self))]
	pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM security_events WHERE created_at < ?")
			.bind(cutoff.to_rfc3339())
			.execute(&self.pool)
			.await?;

		let purged = result.rows_affected();
		if purged > 0 {
			tracing::debug!(purged, "expired security events purged");
		}
		Ok(purged)
	}
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<SecurityEvent, DbError> {
	let id_str: String = row.get("id");
	let id = Uuid::parse_str(&id_str)
		.map(SecurityEventId::new)
		.map_err(|e| DbError::Internal(format!("invalid security event id {id_str}: {e}")))?;

	let kind_str: String = row.get("kind");
	let kind = SecurityEventKind::from_str(&kind_str).map_err(DbError::Internal)?;

	let created_raw: String = row.get("created_at");
	let created_at = DateTime::parse_from_rfc3339(&created_raw)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid timestamp {created_raw}: {e}")))?;

	Ok(SecurityEvent {
		id,
		kind,
		ip_address: row.get("ip_address"),
		detail: row.get("detail"),
		created_at,
	})
}
