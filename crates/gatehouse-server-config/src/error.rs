// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config file {path}: {source}")]
	Io {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config file {path}: {source}")]
	Parse {
		path: String,
		#[source]
		source: toml::de::Error,
	},

	#[error("invalid value for {key}: {message}")]
	Invalid { key: String, message: String },

	#[error("missing required setting: {0}")]
	Missing(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
