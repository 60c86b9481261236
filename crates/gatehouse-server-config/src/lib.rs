// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Gatehouse server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`GATEHOUSE_*`)
//!
//! # Usage
//!
//! ```ignore
//! use gatehouse_server_config::load_config;
//!
//! let config = load_config(None)?;
//! println!("pending jobs at {}", config.provisioning.pending_jobs_dir);
//! ```

pub mod error;
pub mod sections;

pub use error::ConfigError;
pub use sections::*;

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
	pub database: DatabaseConfig,
	pub auth: AuthConfig,
	pub provisioning: ProvisioningConfig,
	pub apps: AppsConfig,
	pub audit: AuditConfig,
	pub security: SecurityConfig,
}

/// Raw TOML config file shape; every section and field is optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFileLayer {
	#[serde(default)]
	database: DatabaseLayer,
	#[serde(default)]
	auth: AuthLayer,
	#[serde(default)]
	provisioning: ProvisioningLayer,
	#[serde(default)]
	apps: AppsLayer,
	#[serde(default)]
	audit: AuditLayer,
	#[serde(default)]
	security: SecurityLayer,
}

/// Load configuration with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`GATEHOUSE_*`)
/// 2. Config file, if a path is given
/// 3. Built-in defaults
///
/// The JWT signing secret is environment-only (`GATEHOUSE_AUTH_JWT_SECRET`)
/// and required.
pub fn load_config(config_path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
	let mut layer = match config_path {
		Some(path) => {
			debug!(path = %path.display(), "loading configuration file");
			load_file(path)?
		}
		None => ConfigFileLayer::default(),
	};

	apply_env(&mut layer)?;

	let jwt_secret = Zeroizing::new(
		std::env::var("GATEHOUSE_AUTH_JWT_SECRET")
			.map_err(|_| ConfigError::Missing("GATEHOUSE_AUTH_JWT_SECRET".to_string()))?,
	);

	finalize(layer, jwt_secret)
}

fn load_file(path: &Path) -> Result<ConfigFileLayer, ConfigError> {
	let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
		path: path.display().to_string(),
		source,
	})?;
	toml::from_str(&raw).map_err(|source| ConfigError::Parse {
		path: path.display().to_string(),
		source,
	})
}

fn apply_env(layer: &mut ConfigFileLayer) -> Result<(), ConfigError> {
	if let Ok(url) = std::env::var("GATEHOUSE_DATABASE_URL") {
		layer.database.url = Some(url);
	}
	if let Ok(ttl) = std::env::var("GATEHOUSE_AUTH_TOKEN_TTL_HOURS") {
		let parsed = ttl.parse::<u64>().map_err(|_| ConfigError::Invalid {
			key: "GATEHOUSE_AUTH_TOKEN_TTL_HOURS".to_string(),
			message: format!("expected an integer number of hours, got {ttl:?}"),
		})?;
		layer.auth.token_ttl_hours = Some(parsed);
	}
	if let Ok(dir) = std::env::var("GATEHOUSE_PROVISIONING_PENDING_JOBS_DIR") {
		layer.provisioning.pending_jobs_dir = Some(dir);
	}
	if let Ok(dir) = std::env::var("GATEHOUSE_PROVISIONING_HOME_BASE_DIR") {
		layer.provisioning.home_base_dir = Some(dir);
	}
	if let Ok(path) = std::env::var("GATEHOUSE_AUDIT_LOG_PATH") {
		layer.audit.log_path = Some(path);
	}
	if let Ok(days) = std::env::var("GATEHOUSE_SECURITY_RETENTION_DAYS") {
		let parsed = days.parse::<i64>().map_err(|_| ConfigError::Invalid {
			key: "GATEHOUSE_SECURITY_RETENTION_DAYS".to_string(),
			message: format!("expected an integer number of days, got {days:?}"),
		})?;
		layer.security.retention_days = Some(parsed);
	}
	Ok(())
}

fn finalize(
	layer: ConfigFileLayer,
	jwt_secret: Zeroizing<String>,
) -> Result<GatewayConfig, ConfigError> {
	let database = layer.database.finalize();
	let auth = layer.auth.finalize(jwt_secret);
	let provisioning = layer.provisioning.finalize();
	let apps = layer.apps.finalize();
	let audit = layer.audit.finalize();
	let security = layer.security.finalize();

	validate(&auth, &apps, &security)?;

	info!(
		database = %database.url,
		token_ttl_hours = auth.token_ttl_hours,
		pending_jobs_dir = %provisioning.pending_jobs_dir,
		home_base_dir = %provisioning.home_base_dir,
		allowed_apps = apps.allowed.len(),
		audit_enabled = audit.enabled,
		security_retention_days = security.retention_days,
		"configuration loaded"
	);

	Ok(GatewayConfig {
		database,
		auth,
		provisioning,
		apps,
		audit,
		security,
	})
}

fn validate(
	auth: &AuthConfig,
	apps: &AppsConfig,
	security: &SecurityConfig,
) -> Result<(), ConfigError> {
	if auth.jwt_secret.is_empty() {
		return Err(ConfigError::Invalid {
			key: "GATEHOUSE_AUTH_JWT_SECRET".to_string(),
			message: "secret must not be empty".to_string(),
		});
	}
	if auth.token_ttl_hours == 0 {
		return Err(ConfigError::Invalid {
			key: "auth.token_ttl_hours".to_string(),
			message: "token lifetime must be at least one hour".to_string(),
		});
	}
	if apps.allowed.is_empty() {
		return Err(ConfigError::Invalid {
			key: "apps.allowed".to_string(),
			message: "the app allow-list must not be empty".to_string(),
		});
	}
	if security.retention_days <= 0 {
		return Err(ConfigError::Invalid {
			key: "security.retention_days".to_string(),
			message: "retention must be a positive number of days".to_string(),
		});
	}
	Ok(())
}
