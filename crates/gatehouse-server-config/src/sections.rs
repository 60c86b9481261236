// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the Gatehouse server.
//!
//! Each section maps to a `[table]` in the TOML config file and a
//! `GATEHOUSE_<SECTION>_<KEY>` environment variable family. Fields are
//! optional during loading; `finalize()` fills in defaults.

use gatehouse_server_auth::AppCatalog;
use serde::Deserialize;
use zeroize::Zeroizing;

/// Default location of the pending provisioning jobs drop folder.
pub const DEFAULT_PENDING_JOBS_DIR: &str = "/opt/provision_jobs/pending";

/// Default base directory under which account home directories are created.
pub const DEFAULT_HOME_BASE_DIR: &str = "/storage";

/// Default session token lifetime in hours.
pub const DEFAULT_TOKEN_TTL_HOURS: u64 = 8;

/// Default retention for perimeter security events, in days.
pub const DEFAULT_SECURITY_RETENTION_DAYS: i64 = 30;

/// Downstream applications an admin can grant per-account access to.
///
/// This is the deployment default; operators can replace the list in the
/// config file without touching approval logic.
pub const DEFAULT_ALLOWED_APPS: &[&str] = &[
	"filebrowser",
	"o365mail",
	"zohomail",
	"truenasCloud",
	"truenasLocal",
];

// =============================================================================
// Database
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseLayer {
	pub url: Option<String>,
}

impl DatabaseLayer {
	pub fn finalize(self) -> DatabaseConfig {
		DatabaseConfig {
			url: self.url.unwrap_or_else(|| "sqlite:./gatehouse.db".to_string()),
		}
	}
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	/// SQLite connection string (e.g., "sqlite:./gatehouse.db").
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		DatabaseLayer::default().finalize()
	}
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthLayer {
	pub token_ttl_hours: Option<u64>,
}

impl AuthLayer {
	pub fn finalize(self, jwt_secret: Zeroizing<String>) -> AuthConfig {
		AuthConfig {
			jwt_secret,
			token_ttl_hours: self.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS),
		}
	}
}

/// Authentication settings.
///
/// The signing secret is never read from the config file; it comes from
/// the `GATEHOUSE_AUTH_JWT_SECRET` environment variable only.
#[derive(Clone)]
pub struct AuthConfig {
	/// HMAC secret for session token signing.
	pub jwt_secret: Zeroizing<String>,
	/// Session token lifetime in hours.
	pub token_ttl_hours: u64,
}

impl std::fmt::Debug for AuthConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthConfig")
			.field("jwt_secret", &"[redacted]")
			.field("token_ttl_hours", &self.token_ttl_hours)
			.finish()
	}
}

// =============================================================================
// Provisioning
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisioningLayer {
	pub pending_jobs_dir: Option<String>,
	pub home_base_dir: Option<String>,
}

impl ProvisioningLayer {
	pub fn finalize(self) -> ProvisioningConfig {
		ProvisioningConfig {
			pending_jobs_dir: self
				.pending_jobs_dir
				.unwrap_or_else(|| DEFAULT_PENDING_JOBS_DIR.to_string()),
			home_base_dir: self
				.home_base_dir
				.unwrap_or_else(|| DEFAULT_HOME_BASE_DIR.to_string()),
		}
	}
}

/// Settings for the provisioning handoff to the external worker.
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
	/// Drop folder the privileged worker polls for job files.
	pub pending_jobs_dir: String,
	/// Base directory for derived account home directories.
	pub home_base_dir: String,
}

impl Default for ProvisioningConfig {
	fn default() -> Self {
		ProvisioningLayer::default().finalize()
	}
}

// =============================================================================
// Apps
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppsLayer {
	pub allowed: Option<Vec<String>>,
}

impl AppsLayer {
	pub fn finalize(self) -> AppsConfig {
		AppsConfig {
			allowed: self.allowed.unwrap_or_else(|| {
				DEFAULT_ALLOWED_APPS.iter().map(|s| s.to_string()).collect()
			}),
		}
	}
}

/// The per-deployment allow-list of downstream applications.
#[derive(Debug, Clone)]
pub struct AppsConfig {
	pub allowed: Vec<String>,
}

impl Default for AppsConfig {
	fn default() -> Self {
		AppsLayer::default().finalize()
	}
}

impl From<&AppsConfig> for AppCatalog {
	fn from(apps: &AppsConfig) -> Self {
		AppCatalog::new(apps.allowed.iter().cloned())
	}
}

// =============================================================================
// Audit
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLayer {
	pub enabled: Option<bool>,
	pub log_path: Option<String>,
	pub queue_capacity: Option<usize>,
}

impl AuditLayer {
	pub fn finalize(self) -> AuditConfig {
		AuditConfig {
			enabled: self.enabled.unwrap_or(true),
			log_path: self.log_path,
			queue_capacity: self.queue_capacity.unwrap_or(1024),
		}
	}
}

/// Audit trail settings.
#[derive(Debug, Clone)]
pub struct AuditConfig {
	pub enabled: bool,
	/// Optional JSON-lines audit log file; tracing sink is always on.
	pub log_path: Option<String>,
	pub queue_capacity: usize,
}

impl Default for AuditConfig {
	fn default() -> Self {
		AuditLayer::default().finalize()
	}
}

// =============================================================================
// Security
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityLayer {
	pub retention_days: Option<i64>,
}

impl SecurityLayer {
	pub fn finalize(self) -> SecurityConfig {
		SecurityConfig {
			retention_days: self
				.retention_days
				.unwrap_or(DEFAULT_SECURITY_RETENTION_DAYS),
		}
	}
}

/// Retention policy for perimeter security events.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
	pub retention_days: i64,
}

impl Default for SecurityConfig {
	fn default() -> Self {
		SecurityLayer::default().finalize()
	}
}
