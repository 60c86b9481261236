// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Account repository for database operations.
//!
//! This module provides database access for account management including:
//! - Account CRUD with unique username/email enforcement
//! - The conditional approval transition (the per-account atomic
//!   read-modify-write that serializes concurrent approvals)
//! - Per-application entitlement updates
//!
//! All IDs are UUIDs stored as strings; timestamps are RFC 3339 strings;
//! the `app_approvals` column is a JSON object of `name -> bool`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_server_auth::{Account, AccountId, ApprovalState, NewAccount};
use sqlx::{sqlite::SqlitePool, Row};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DbError;

#[async_trait]
pub trait AccountStore: Send + Sync {
	async fn create_account(&self, new: &NewAccount) -> Result<Account, DbError>;
	async fn get_by_id(&self, id: &AccountId) -> Result<Option<Account>, DbError>;
	async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DbError>;
	async fn get_by_username(&self, username: &str) -> Result<Option<Account>, DbError>;
	async fn list_accounts(&self) -> Result<Vec<Account>, DbError>;
	async fn list_pending(&self) -> Result<Vec<Account>, DbError>;
	async fn approve_if_pending(
		&self,
		id: &AccountId,
		home_directory: &Path,
	) -> Result<bool, DbError>;
	async fn deny_if_pending(&self, id: &AccountId) -> Result<bool, DbError>;
	async fn set_app_approval(
		&self,
		id: &AccountId,
		app: &str,
		granted: bool,
	) -> Result<Account, DbError>;
	async fn update_password_hash(&self, id: &AccountId, hash: &str) -> Result<bool, DbError>;
	async fn set_admin(&self, id: &AccountId, is_admin: bool) -> Result<bool, DbError>;
	async fn delete_account(&self, id: &AccountId) -> Result<bool, DbError>;
}

/// SQLite repository for account records.
#[derive(Clone)]
pub struct AccountRepository {
	pool: SqlitePool,
}

impl AccountRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	// =========================================================================
	// Account CRUD
	// =========================================================================

	/// Create a new account in `pending` state.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the username or email is already taken.
	#[tracing::instrument(skip(self, new), fields(username = %new.username))]
	pub async fn create_account(&self, new: &NewAccount) -> Result<Account, DbError> {
		let id = AccountId::generate();
		let now = Utc::now();
		let approvals_json = serde_json::to_string(&new.app_approvals)?;

		sqlx::query(
			r#"
			INSERT INTO accounts (
				id, username, email, password_hash, approval_state, is_admin,
				app_approvals, home_directory, created_at, updated_at
			) VALUES (?, ?, ?, ?, 'pending', 0, ?, NULL, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(&new.username)
		.bind(&new.email)
		.bind(&new.password_hash)
		.bind(&approvals_json)
		.bind(now.to_rfc3339())
		.bind(now.to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(map_unique_violation)?;

		tracing::debug!(account_id = %id, "account created");

		Ok(Account {
			id,
			username: new.username.clone(),
			email: new.email.clone(),
			password_hash: new.password_hash.clone(),
			approval_state: ApprovalState::Pending,
			is_admin: false,
			app_approvals: new.app_approvals.clone(),
			home_directory: None,
			created_at: now,
			updated_at: now,
		})
	}

	/// Get an account by ID.
	#[tracing::instrument(skip(self), fields(account_id = %id))]
	pub async fn get_by_id(&self, id: &AccountId) -> Result<Option<Account>, DbError> {
		let row = sqlx::query(&select_account_where("id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_account(&r)).transpose()
	}

	/// Get an account by normalized email.
	#[tracing::instrument(skip(self, email))]
	pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DbError> {
		let row = sqlx::query(&select_account_where("email = ?"))
			.bind(email)
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_account(&r)).transpose()
	}

	/// Get an account by username.
	#[tracing::instrument(skip(self, username))]
	pub async fn get_by_username(&self, username: &str) -> Result<Option<Account>, DbError> {
		let row = sqlx::query(&select_account_where("username = ?"))
			.bind(username)
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_account(&r)).transpose()
	}

	/// List all accounts, newest first.
	#[tracing::instrument(skip(self))]
	pub async fn list_accounts(&self) -> Result<Vec<Account>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, username, email, password_hash, approval_state, is_admin,
			       app_approvals, home_directory, created_at, updated_at
			FROM accounts
			ORDER BY created_at DESC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_account).collect()
	}

	/// List accounts awaiting review, oldest first.
	#[tracing::instrument(skip(self))]
	pub async fn list_pending(&self) -> Result<Vec<Account>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, username, email, password_hash, approval_state, is_admin,
			       app_approvals, home_directory, created_at, updated_at
			FROM accounts
			WHERE approval_state = 'pending'
			ORDER BY created_at ASC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_account).collect()
	}

	// =========================================================================
	// Approval transitions
	// =========================================================================

	/// Flip a pending account to approved, assigning its home directory.
	///
	/// The update is conditional on the stored state still being `pending`,
	/// so two concurrent approvals of the same account serialize at the
	/// store and at most one caller observes `true`. That caller — and only
	/// that caller — goes on to enqueue the provisioning job.
	#[tracing::instrument(skip(self, home_directory), fields(account_id = %id))]
	pub async fn approve_if_pending(
		&self,
		id: &AccountId,
		home_directory: &Path,
	) -> Result<bool, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			UPDATE accounts
			SET approval_state = 'approved', home_directory = ?, updated_at = ?
			WHERE id = ? AND approval_state = 'pending'
			"#,
		)
		.bind(home_directory.to_string_lossy().into_owned())
		.bind(&now)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		let won = result.rows_affected() == 1;
		if won {
			tracing::debug!(account_id = %id, "account approved");
		}
		Ok(won)
	}

	/// Flip a pending account to denied. Same conditional shape as approval.
	#[tracing::instrument(skip(self), fields(account_id = %id))]
	pub async fn deny_if_pending(&self, id: &AccountId) -> Result<bool, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			UPDATE accounts
			SET approval_state = 'denied', updated_at = ?
			WHERE id = ? AND approval_state = 'pending'
			"#,
		)
		.bind(&now)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		let won = result.rows_affected() == 1;
		if won {
			tracing::debug!(account_id = %id, "account denied");
		}
		Ok(won)
	}

	// =========================================================================
	// Entitlements and credentials
	// =========================================================================

	/// Set a single app entitlement inside a transaction.
	///
	/// The caller has already checked the app against the catalog; this
	/// method only guarantees the read-modify-write of the JSON column is
	/// atomic per account.
	#[tracing::instrument(skip(self), fields(account_id = %id, app = %app, granted = granted))]
	pub async fn set_app_approval(
		&self,
		id: &AccountId,
		app: &str,
		granted: bool,
	) -> Result<Account, DbError> {
		let mut tx = self.pool.begin().await?;

		let row = sqlx::query("SELECT app_approvals FROM accounts WHERE id = ?")
			.bind(id.to_string())
			.fetch_optional(&mut *tx)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("account {id}")))?;

		let approvals_json: String = row.get("app_approvals");
		let mut approvals: BTreeMap<String, bool> = serde_json::from_str(&approvals_json)?;
		approvals.insert(app.to_string(), granted);

		let now = Utc::now().to_rfc3339();
		sqlx::query("UPDATE accounts SET app_approvals = ?, updated_at = ? WHERE id = ?")
			.bind(serde_json::to_string(&approvals)?)
			.bind(&now)
			.bind(id.to_string())
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		tracing::debug!(account_id = %id, app = %app, granted = granted, "app approval updated");

		self
			.get_by_id(id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("account {id}")))
	}

	/// Replace the stored credential hash.
	#[tracing::instrument(skip(self, hash), fields(account_id = %id))]
	pub async fn update_password_hash(&self, id: &AccountId, hash: &str) -> Result<bool, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query("UPDATE accounts SET password_hash = ?, updated_at = ? WHERE id = ?")
			.bind(hash)
			.bind(&now)
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() == 1)
	}

	/// Grant or drop admin capability (bootstrap and admin promotion).
	#[tracing::instrument(skip(self), fields(account_id = %id, is_admin = is_admin))]
	pub async fn set_admin(&self, id: &AccountId, is_admin: bool) -> Result<bool, DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query("UPDATE accounts SET is_admin = ?, updated_at = ? WHERE id = ?")
			.bind(is_admin as i32)
			.bind(&now)
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() == 1)
	}

	/// Delete an account outright.
	///
	/// The admin-deletion guard lives in the service layer, which has the
	/// loaded account in hand; the store deletes whatever it is told to.
	#[tracing::instrument(skip(self), fields(account_id = %id))]
	pub async fn delete_account(&self, id: &AccountId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() == 1;
		if deleted {
			tracing::debug!(account_id = %id, "account deleted");
		}
		Ok(deleted)
	}
}

#[async_trait]
impl AccountStore for AccountRepository {
	async fn create_account(&self, new: &NewAccount) -> Result<Account, DbError> {
		self.create_account(new).await
	}

	async fn get_by_id(&self, id: &AccountId) -> Result<Option<Account>, DbError> {
		self.get_by_id(id).await
	}

	async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DbError> {
		self.get_by_email(email).await
	}

	async fn get_by_username(&self, username: &str) -> Result<Option<Account>, DbError> {
		self.get_by_username(username).await
	}

	async fn list_accounts(&self) -> Result<Vec<Account>, DbError> {
		self.list_accounts().await
	}

	async fn list_pending(&self) -> Result<Vec<Account>, DbError> {
		self.list_pending().await
	}

	async fn approve_if_pending(
		&self,
		id: &AccountId,
		home_directory: &Path,
	) -> Result<bool, DbError> {
		self.approve_if_pending(id, home_directory).await
	}

	async fn deny_if_pending(&self, id: &AccountId) -> Result<bool, DbError> {
		self.deny_if_pending(id).await
	}

	async fn set_app_approval(
		&self,
		id: &AccountId,
		app: &str,
		granted: bool,
	) -> Result<Account, DbError> {
		self.set_app_approval(id, app, granted).await
	}

	async fn update_password_hash(&self, id: &AccountId, hash: &str) -> Result<bool, DbError> {
		self.update_password_hash(id, hash).await
	}

	async fn set_admin(&self, id: &AccountId, is_admin: bool) -> Result<bool, DbError> {
		self.set_admin(id, is_admin).await
	}

	async fn delete_account(&self, id: &AccountId) -> Result<bool, DbError> {
		self.delete_account(id).await
	}
}

fn select_account_where(predicate: &str) -> String {
	// Only called with fixed predicates; values still go through binds.
	format!(
		"SELECT id, username, email, password_hash, approval_state, is_admin, \
		 app_approvals, home_directory, created_at, updated_at FROM accounts WHERE {predicate}"
	)
}

fn map_unique_violation(e: sqlx::Error) -> DbError {
	match &e {
		sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed") => {
			DbError::Conflict("username or email already exists".to_string())
		}
		_ => DbError::Sqlx(e),
	}
}

fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account, DbError> {
	let id_str: String = row.get("id");
	let id = Uuid::parse_str(&id_str)
		.map(AccountId::new)
		.map_err(|e| DbError::Internal(format!("invalid account id {id_str}: {e}")))?;

	let state_str: String = row.get("approval_state");
	let approval_state = ApprovalState::from_str(&state_str).map_err(DbError::Internal)?;

	let approvals_json: String = row.get("app_approvals");
	let app_approvals: BTreeMap<String, bool> = serde_json::from_str(&approvals_json)?;

	let home_directory: Option<String> = row.get("home_directory");

	Ok(Account {
		id,
		username: row.get("username"),
		email: row.get("email"),
		password_hash: row.get("password_hash"),
		approval_state,
		is_admin: row.get::<i32, _>("is_admin") != 0,
		app_approvals,
		home_directory: home_directory.map(PathBuf::from),
		created_at: parse_timestamp(row.get("created_at"))?,
		updated_at: parse_timestamp(row.get("updated_at"))?,
	})
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(&raw)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid timestamp {raw}: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_test_pool, with_accounts_table};

	async fn make_repo() -> AccountRepository {
		let pool = create_test_pool().await;
		with_accounts_table(&pool).await;
		AccountRepository::new(pool)
	}

	fn new_account(username: &str, email: &str) -> NewAccount {
		let mut approvals = BTreeMap::new();
		approvals.insert("filebrowser".to_string(), false);
		approvals.insert("o365mail".to_string(), false);
		NewAccount {
			username: username.to_string(),
			email: email.to_string(),
			password_hash: "$argon2id$stub".to_string(),
			app_approvals: approvals,
		}
	}

	#[tokio::test]
	async fn create_and_get_roundtrip() {
		let repo = make_repo().await;
		let created = repo
			.create_account(&new_account("alice", "alice@example.com"))
			.await
			.unwrap();

		assert_eq!(created.approval_state, ApprovalState::Pending);
		assert!(!created.is_admin);
		assert!(created.home_directory.is_none());

		let by_id = repo.get_by_id(&created.id).await.unwrap().unwrap();
		assert_eq!(by_id.username, "alice");
		assert_eq!(by_id.app_approvals.len(), 2);
		assert!(by_id.app_approvals.values().all(|granted| !granted));

		let by_email = repo.get_by_email("alice@example.com").await.unwrap().unwrap();
		assert_eq!(by_email.id, created.id);

		let by_username = repo.get_by_username("alice").await.unwrap().unwrap();
		assert_eq!(by_username.id, created.id);
	}

	#[tokio::test]
	async fn duplicate_email_conflicts() {
		let repo = make_repo().await;
		repo
			.create_account(&new_account("alice", "alice@example.com"))
			.await
			.unwrap();

		let err = repo
			.create_account(&new_account("alice2", "alice@example.com"))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));
	}

	#[tokio::test]
	async fn duplicate_username_conflicts() {
		let repo = make_repo().await;
		repo
			.create_account(&new_account("alice", "alice@example.com"))
			.await
			.unwrap();

		let err = repo
			.create_account(&new_account("alice", "other@example.com"))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));
	}

	#[tokio::test]
	async fn approve_if_pending_wins_once() {
		let repo = make_repo().await;
		let account = repo
			.create_account(&new_account("alice", "alice@example.com"))
			.await
			.unwrap();
		let home = Path::new("/storage/alice");

		assert!(repo.approve_if_pending(&account.id, home).await.unwrap());
		// Second attempt sees 'approved', not 'pending'.
		assert!(!repo.approve_if_pending(&account.id, home).await.unwrap());

		let stored = repo.get_by_id(&account.id).await.unwrap().unwrap();
		assert_eq!(stored.approval_state, ApprovalState::Approved);
		assert_eq!(stored.home_directory, Some(PathBuf::from("/storage/alice")));
	}

	#[tokio::test]
	async fn concurrent_approvals_serialize() {
		let repo = make_repo().await;
		let account = repo
			.create_account(&new_account("alice", "alice@example.com"))
			.await
			.unwrap();

		let first = repo.approve_if_pending(&account.id, Path::new("/storage/alice"));
		let second = repo.approve_if_pending(&account.id, Path::new("/storage/alice"));
		let (a, b) = tokio::join!(first, second);

		let wins = [a.unwrap(), b.unwrap()];
		assert_eq!(wins.iter().filter(|w| **w).count(), 1);
	}

	#[tokio::test]
	async fn deny_if_pending_is_terminal() {
		let repo = make_repo().await;
		let account = repo
			.create_account(&new_account("bob", "bob@example.com"))
			.await
			.unwrap();

		assert!(repo.deny_if_pending(&account.id).await.unwrap());
		assert!(!repo.deny_if_pending(&account.id).await.unwrap());
		// Denied accounts cannot be approved either.
		assert!(!repo
			.approve_if_pending(&account.id, Path::new("/storage/bob"))
			.await
			.unwrap());

		let stored = repo.get_by_id(&account.id).await.unwrap().unwrap();
		assert_eq!(stored.approval_state, ApprovalState::Denied);
	}

	#[tokio::test]
	async fn set_app_approval_updates_one_key() {
		let repo = make_repo().await;
		let account = repo
			.create_account(&new_account("alice", "alice@example.com"))
			.await
			.unwrap();

		let updated = repo
			.set_app_approval(&account.id, "filebrowser", true)
			.await
			.unwrap();
		assert_eq!(updated.app_approvals.get("filebrowser"), Some(&true));
		assert_eq!(updated.app_approvals.get("o365mail"), Some(&false));

		let reverted = repo
			.set_app_approval(&account.id, "filebrowser", false)
			.await
			.unwrap();
		assert_eq!(reverted.app_approvals.get("filebrowser"), Some(&false));
	}

	#[tokio::test]
	async fn set_app_approval_missing_account_is_not_found() {
		let repo = make_repo().await;
		let err = repo
			.set_app_approval(&AccountId::generate(), "filebrowser", true)
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::NotFound(_)));
	}

	#[tokio::test]
	async fn update_password_hash_replaces_credential() {
		let repo = make_repo().await;
		let account = repo
			.create_account(&new_account("alice", "alice@example.com"))
			.await
			.unwrap();

		assert!(repo
			.update_password_hash(&account.id, "$argon2id$new")
			.await
			.unwrap());
		let stored = repo.get_by_id(&account.id).await.unwrap().unwrap();
		assert_eq!(stored.password_hash, "$argon2id$new");
	}

	#[tokio::test]
	async fn set_admin_and_delete() {
		let repo = make_repo().await;
		let account = repo
			.create_account(&new_account("root-ish", "admin@example.com"))
			.await
			.unwrap();

		assert!(repo.set_admin(&account.id, true).await.unwrap());
		let stored = repo.get_by_id(&account.id).await.unwrap().unwrap();
		assert!(stored.is_admin);

		assert!(repo.delete_account(&account.id).await.unwrap());
		assert!(repo.get_by_id(&account.id).await.unwrap().is_none());
		assert!(!repo.delete_account(&account.id).await.unwrap());
	}

	#[tokio::test]
	async fn list_pending_excludes_decided_accounts() {
		let repo = make_repo().await;
		let a = repo
			.create_account(&new_account("alice", "alice@example.com"))
			.await
			.unwrap();
		let b = repo
			.create_account(&new_account("bob", "bob@example.com"))
			.await
			.unwrap();
		repo
			.create_account(&new_account("carol", "carol@example.com"))
			.await
			.unwrap();

		repo
			.approve_if_pending(&a.id, Path::new("/storage/alice"))
			.await
			.unwrap();
		repo.deny_if_pending(&b.id).await.unwrap();

		let pending = repo.list_pending().await.unwrap();
		assert_eq!(pending.len(), 1);
		assert_eq!(pending[0].username, "carol");

		let all = repo.list_accounts().await.unwrap();
		assert_eq!(all.len(), 3);
	}
}
