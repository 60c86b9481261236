// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Account lifecycle orchestration.
//!
//! `AccountService` ties the store, credential manager, session issuer,
//! provisioning queue and audit pipeline together. Every mutation is
//! audited fire-and-forget; audit failure never fails the operation.
//!
//! Registration never provisions. The only path that touches the job
//! queue is the winning approval, after its state transition has
//! committed.

use std::path::PathBuf;
use std::sync::Arc;

use gatehouse_server_audit::{AuditEventType, AuditLogEntry, AuditService};
use gatehouse_server_auth::{
	derive_home_directory, hash_password, validate_password_policy, verify_password, Account,
	AccountId, AccountView, AppCatalog, ApprovalState, NewAccount, SessionIssuer,
};
use gatehouse_server_db::{AccountStore, DbError};
use gatehouse_server_provisioning::{generate_secret, JobQueue, ProvisioningJob};
use serde::Serialize;

use crate::approval::check_transition;
use crate::error::{AccountsError, Result};
use crate::requests::{AppApprovalRequest, ChangePasswordRequest, LoginRequest, RegisterRequest};

/// A successful login: the account and its bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
	pub account: AccountView,
	pub token: String,
}

pub struct AccountService {
	store: Arc<dyn AccountStore>,
	issuer: SessionIssuer,
	queue: JobQueue,
	audit: Arc<AuditService>,
	catalog: AppCatalog,
	home_base_dir: PathBuf,
}

impl AccountService {
	pub fn new(
		store: Arc<dyn AccountStore>,
		issuer: SessionIssuer,
		queue: JobQueue,
		audit: Arc<AuditService>,
		catalog: AppCatalog,
		home_base_dir: PathBuf,
	) -> Self {
		Self {
			store,
			issuer,
			queue,
			audit,
			catalog,
			home_base_dir,
		}
	}

	fn require_admin(actor: &Account) -> Result<()> {
		if actor.is_admin {
			Ok(())
		} else {
			Err(AccountsError::Forbidden)
		}
	}

	fn record(&self, entry: AuditLogEntry) {
		self.audit.record(entry);
	}

	/// Translate a lost approval race into the decision the other caller
	/// committed.
	async fn losing_decision(&self, id: &AccountId) -> Result<AccountsError> {
		let state = self
			.store
			.get_by_id(id)
			.await?
			.map(|account| account.approval_state);
		Ok(match state {
			Some(ApprovalState::Denied) => AccountsError::AlreadyDenied,
			_ => AccountsError::AlreadyApproved,
		})
	}

	fn audit_entry(
		event_type: AuditEventType,
		origin: Option<&str>,
	) -> gatehouse_server_audit::AuditLogBuilder {
		let builder = AuditLogEntry::builder(event_type);
		match origin {
			Some(ip) => builder.ip_address(ip),
			None => builder,
		}
	}

	// =========================================================================
	// Registration and login
	// =========================================================================

	/// Register a new account. It starts Pending with every catalog app
	/// denied; nothing is provisioned until an admin approves.
	#[tracing::instrument(skip(self, req), fields(username = %req.username))]
	pub async fn register(&self, req: &RegisterRequest, origin: Option<&str>) -> Result<AccountView> {
		req.validate()?;
		validate_password_policy(&req.password).map_err(AccountsError::WeakPassword)?;

		let password_hash = hash_password(&req.password)?;
		let new = NewAccount {
			username: req.username.clone(),
			email: req.normalized_email(),
			password_hash,
			app_approvals: self.catalog.default_approvals(),
		};

		let account = match self.store.create_account(&new).await {
			Ok(account) => account,
			Err(DbError::Conflict(_)) => return Err(AccountsError::DuplicateIdentity),
			Err(e) => return Err(e.into()),
		};

		self.record(
			Self::audit_entry(AuditEventType::AccountRegistered, origin)
				.subject(account.id)
				.action(format!("registered account {}", account.username))
				.build(),
		);

		Ok(account.to_view())
	}

	/// Authenticate by email and password.
	///
	/// A missing account and a wrong password produce the same
	/// `InvalidCredentials`; only an existing account with a verified
	/// password learns it is gated (`NotApproved`).
	#[tracing::instrument(skip(self, req))]
	pub async fn login(&self, req: &LoginRequest, origin: Option<&str>) -> Result<LoginOutcome> {
		req.validate()?;

		let email = req.normalized_email();
		let account = match self.store.get_by_email(&email).await? {
			Some(account) => account,
			None => {
				self.record(
					Self::audit_entry(AuditEventType::LoginFailed, origin)
						.action("login failed: unknown email")
						.build(),
				);
				return Err(AccountsError::InvalidCredentials);
			}
		};

		let verified = verify_password(&req.password, &account.password_hash)
			.map_err(|e| AccountsError::Internal(e.to_string()))?;
		if !verified {
			self.record(
				Self::audit_entry(AuditEventType::LoginFailed, origin)
					.subject(account.id)
					.action("login failed: wrong password")
					.build(),
			);
			return Err(AccountsError::InvalidCredentials);
		}

		if !account.may_login() {
			self.record(
				Self::audit_entry(AuditEventType::LoginFailed, origin)
					.subject(account.id)
					.action("login refused: account not approved")
					.build(),
			);
			return Err(AccountsError::NotApproved);
		}

		let token = self
			.issuer
			.issue(&account)
			.map_err(|e| AccountsError::Internal(e.to_string()))?;

		self.record(
			Self::audit_entry(AuditEventType::Login, origin)
				.actor(account.id)
				.action(format!("login by {}", account.username))
				.build(),
		);

		Ok(LoginOutcome {
			account: account.to_view(),
			token,
		})
	}

	// =========================================================================
	// Approval decisions
	// =========================================================================

	/// Approve a pending account and hand it off to the provisioning
	/// worker.
	///
	/// The store's conditional update picks a single winner among
	/// concurrent approvals; only the winner derives a home directory and
	/// enqueues the job, so one approval yields exactly one job file. If
	/// the job write fails after the transition committed, the approval
	/// stands and the failure is surfaced as `ProvisioningWriteFailure`.
	#[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id, account_id = %id))]
	pub async fn approve(
		&self,
		actor: &Account,
		id: &AccountId,
		origin: Option<&str>,
	) -> Result<AccountView> {
		Self::require_admin(actor)?;

		let account = self
			.store
			.get_by_id(id)
			.await?
			.ok_or(AccountsError::NotFound)?;
		check_transition(account.approval_state, ApprovalState::Approved)?;

		let home_directory =
			derive_home_directory(&self.home_base_dir, &account.username).map_err(|m| {
				AccountsError::Validation {
					field: "username".to_string(),
					message: m.to_string(),
				}
			})?;

		let won = self.store.approve_if_pending(id, &home_directory).await?;
		if !won {
			// Lost the race: report the decision that actually landed.
			return Err(self.losing_decision(id).await?);
		}

		self.record(
			Self::audit_entry(AuditEventType::AccountApproved, origin)
				.actor(actor.id)
				.subject(account.id)
				.action(format!("approved account {}", account.username))
				.details(serde_json::json!({
					"home_directory": home_directory.display().to_string(),
				}))
				.build(),
		);

		// Re-read so the returned view carries the committed row, including
		// the post-transition `updated_at`.
		let approved = self
			.store
			.get_by_id(id)
			.await?
			.ok_or(AccountsError::NotFound)?;

		let secret = generate_secret();
		let enqueued = match ProvisioningJob::new(&approved.username, &approved.email, &secret) {
			Ok(job) => self.queue.enqueue(&job).await,
			Err(e) => Err(e),
		};

		match enqueued {
			Ok(path) => {
				self.record(
					Self::audit_entry(AuditEventType::ProvisioningJobQueued, origin)
						.actor(actor.id)
						.subject(approved.id)
						.details(serde_json::json!({
							"job_file": path.display().to_string(),
						}))
						.build(),
				);
				Ok(approved.to_view())
			}
			Err(source) => {
				tracing::error!(
					account_id = %approved.id,
					error = %source,
					"approval committed but provisioning handoff failed"
				);
				self.record(
					Self::audit_entry(AuditEventType::ProvisioningWriteFailed, origin)
						.actor(actor.id)
						.subject(approved.id)
						.action(format!(
							"provisioning handoff failed for {}",
							approved.username
						))
						.build(),
				);
				Err(AccountsError::ProvisioningWriteFailure {
					account: Box::new(approved.to_view()),
					source,
				})
			}
		}
	}

	/// Deny a pending account. Terminal; no job is written.
	#[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id, account_id = %id))]
	pub async fn deny(
		&self,
		actor: &Account,
		id: &AccountId,
		origin: Option<&str>,
	) -> Result<AccountView> {
		Self::require_admin(actor)?;

		let account = self
			.store
			.get_by_id(id)
			.await?
			.ok_or(AccountsError::NotFound)?;
		check_transition(account.approval_state, ApprovalState::Denied)?;

		let won = self.store.deny_if_pending(id).await?;
		if !won {
			return Err(self.losing_decision(id).await?);
		}

		self.record(
			Self::audit_entry(AuditEventType::AccountDenied, origin)
				.actor(actor.id)
				.subject(account.id)
				.action(format!("denied account {}", account.username))
				.build(),
		);

		let mut denied = account;
		denied.approval_state = ApprovalState::Denied;
		Ok(denied.to_view())
	}

	// =========================================================================
	// Entitlements
	// =========================================================================

	/// Toggle a single per-application entitlement.
	///
	/// The catalog check happens before any store access; an unknown app
	/// leaves the account untouched. Independent of the global approval
	/// gate.
	#[tracing::instrument(skip(self, actor, req), fields(actor_id = %actor.id, account_id = %id))]
	pub async fn set_app_approval(
		&self,
		actor: &Account,
		id: &AccountId,
		req: &AppApprovalRequest,
		origin: Option<&str>,
	) -> Result<AccountView> {
		Self::require_admin(actor)?;
		req.validate()?;

		if !self.catalog.contains(&req.app) {
			return Err(AccountsError::UnknownApp(req.app.clone()));
		}

		let account = match self.store.set_app_approval(id, &req.app, req.granted).await {
			Ok(account) => account,
			Err(DbError::NotFound(_)) => return Err(AccountsError::NotFound),
			Err(e) => return Err(e.into()),
		};

		let event_type = if req.granted {
			AuditEventType::AppApprovalGranted
		} else {
			AuditEventType::AppApprovalRevoked
		};
		self.record(
			Self::audit_entry(event_type, origin)
				.actor(actor.id)
				.subject(account.id)
				.details(serde_json::json!({ "app": req.app, "granted": req.granted }))
				.build(),
		);

		Ok(account.to_view())
	}

	/// Grant or revoke admin capability.
	#[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id, account_id = %id))]
	pub async fn set_admin(
		&self,
		actor: &Account,
		id: &AccountId,
		is_admin: bool,
		origin: Option<&str>,
	) -> Result<AccountView> {
		Self::require_admin(actor)?;

		if !self.store.set_admin(id, is_admin).await? {
			return Err(AccountsError::NotFound);
		}
		let account = self
			.store
			.get_by_id(id)
			.await?
			.ok_or(AccountsError::NotFound)?;

		let event_type = if is_admin {
			AuditEventType::AdminGranted
		} else {
			AuditEventType::AdminRevoked
		};
		self.record(
			Self::audit_entry(event_type, origin)
				.actor(actor.id)
				.subject(account.id)
				.build(),
		);

		Ok(account.to_view())
	}

	// =========================================================================
	// Credentials
	// =========================================================================

	/// Change a password on behalf of its owner.
	#[tracing::instrument(skip(self, req), fields(account_id = %id))]
	pub async fn change_password(
		&self,
		id: &AccountId,
		req: &ChangePasswordRequest,
		origin: Option<&str>,
	) -> Result<()> {
		req.validate()?;

		let account = self
			.store
			.get_by_id(id)
			.await?
			.ok_or(AccountsError::NotFound)?;

		let verified = verify_password(&req.current_password, &account.password_hash)
			.map_err(|e| AccountsError::Internal(e.to_string()))?;
		if !verified {
			return Err(AccountsError::WrongCurrentPassword);
		}
		if req.new_password == req.current_password {
			return Err(AccountsError::PasswordReuse);
		}
		validate_password_policy(&req.new_password).map_err(AccountsError::WeakPassword)?;

		let hash = hash_password(&req.new_password)?;
		if !self.store.update_password_hash(id, &hash).await? {
			return Err(AccountsError::NotFound);
		}

		self.record(
			Self::audit_entry(AuditEventType::PasswordChanged, origin)
				.actor(account.id)
				.action(format!("password changed for {}", account.username))
				.build(),
		);

		Ok(())
	}

	/// Admin-side password reset; no current-password check.
	#[tracing::instrument(skip(self, actor, new_password), fields(actor_id = %actor.id, account_id = %id))]
	pub async fn reset_password(
		&self,
		actor: &Account,
		id: &AccountId,
		new_password: &str,
		origin: Option<&str>,
	) -> Result<()> {
		Self::require_admin(actor)?;
		validate_password_policy(new_password).map_err(AccountsError::WeakPassword)?;

		let account = self
			.store
			.get_by_id(id)
			.await?
			.ok_or(AccountsError::NotFound)?;

		let hash = hash_password(new_password)?;
		if !self.store.update_password_hash(id, &hash).await? {
			return Err(AccountsError::NotFound);
		}

		self.record(
			Self::audit_entry(AuditEventType::PasswordReset, origin)
				.actor(actor.id)
				.subject(account.id)
				.action(format!("password reset for {}", account.username))
				.build(),
		);

		Ok(())
	}

	// =========================================================================
	// Deletion and listings
	// =========================================================================

	/// Delete a non-admin account.
	#[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id, account_id = %id))]
	pub async fn delete_account(
		&self,
		actor: &Account,
		id: &AccountId,
		origin: Option<&str>,
	) -> Result<()> {
		Self::require_admin(actor)?;

		let account = self
			.store
			.get_by_id(id)
			.await?
			.ok_or(AccountsError::NotFound)?;
		if account.is_admin {
			return Err(AccountsError::ForbiddenAdminDeletion);
		}

		if !self.store.delete_account(id).await? {
			return Err(AccountsError::NotFound);
		}

		self.record(
			Self::audit_entry(AuditEventType::AccountDeleted, origin)
				.actor(actor.id)
				.subject(account.id)
				.action(format!("deleted account {}", account.username))
				.build(),
		);

		Ok(())
	}

	/// Own profile, credentials omitted.
	#[tracing::instrument(skip(self), fields(account_id = %id))]
	pub async fn get_profile(&self, id: &AccountId) -> Result<AccountView> {
		let account = self
			.store
			.get_by_id(id)
			.await?
			.ok_or(AccountsError::NotFound)?;
		Ok(account.to_view())
	}

	/// All accounts; admin only.
	#[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
	pub async fn list_accounts(&self, actor: &Account) -> Result<Vec<AccountView>> {
		Self::require_admin(actor)?;
		let accounts = self.store.list_accounts().await?;
		Ok(accounts.iter().map(Account::to_view).collect())
	}

	/// Accounts awaiting review; admin only.
	#[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
	pub async fn list_pending(&self, actor: &Account) -> Result<Vec<AccountView>> {
		Self::require_admin(actor)?;
		let accounts = self.store.list_pending().await?;
		Ok(accounts.iter().map(Account::to_view).collect())
	}
}
