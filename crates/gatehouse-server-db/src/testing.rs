// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Test helpers for in-memory database setup.
//!
//! Shared by this crate's unit tests and by downstream crates that need a
//! real store behind their service-level tests.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Create an in-memory pool limited to a single connection so every query
/// sees the same database.
pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str("sqlite::memory:")
		.expect("valid in-memory URL")
		.create_if_missing(true);

	SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await
		.expect("in-memory pool")
}

/// Create the `accounts` table on a test pool.
pub async fn with_accounts_table(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS accounts (
			id TEXT PRIMARY KEY,
			username TEXT NOT NULL UNIQUE,
			email TEXT NOT NULL UNIQUE,
			password_hash TEXT NOT NULL,
			approval_state TEXT NOT NULL DEFAULT 'pending',
			is_admin INTEGER NOT NULL DEFAULT 0,
			app_approvals TEXT NOT NULL DEFAULT '{}',
			home_directory TEXT,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await
	.expect("create accounts table");
}

/// Create the `security_events` table on a test pool.
pub async fn with_security_events_table(pool: &SqlitePool) {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS security_events (
			id TEXT PRIMARY KEY,
			kind TEXT NOT NULL,
			ip_address TEXT,
			detail TEXT,
			created_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await
	.expect("create security_events table");
}
