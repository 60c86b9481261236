// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for accounts and approval.
//!
//! This module defines the foundational types used throughout the gateway:
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs ([`AccountId`],
//!   [`AuditEventId`], [`SecurityEventId`]) preventing accidental mixing
//! - **[`ApprovalState`]**: the global approval gate for an account
//! - **[`AppCatalog`]**: the per-deployment allow-list of downstream apps
//!
//! All ID types implement transparent serde serialization (as UUID strings)
//! and provide conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(AccountId, "Unique identifier for an account.");
define_id_type!(AuditEventId, "Unique identifier for an audit event.");
define_id_type!(SecurityEventId, "Unique identifier for a security event.");

// =============================================================================
// Approval State
// =============================================================================

/// The global approval gate for an account.
///
/// New registrations start `Pending`. An administrator moves them to
/// `Approved` (which triggers provisioning) or `Denied`. Both outcomes are
/// terminal; there is no automatic path back to `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
	/// Awaiting administrator review.
	#[default]
	Pending,
	/// Admitted; downstream provisioning has been queued.
	Approved,
	/// Rejected by an administrator.
	Denied,
}

impl ApprovalState {
	/// Returns true if this state permits no further global transitions.
	pub fn is_terminal(&self) -> bool {
		matches!(self, ApprovalState::Approved | ApprovalState::Denied)
	}
}

impl fmt::Display for ApprovalState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ApprovalState::Pending => write!(f, "pending"),
			ApprovalState::Approved => write!(f, "approved"),
			ApprovalState::Denied => write!(f, "denied"),
		}
	}
}

impl std::str::FromStr for ApprovalState {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(ApprovalState::Pending),
			"approved" => Ok(ApprovalState::Approved),
			"denied" => Ok(ApprovalState::Denied),
			other => Err(format!("unknown approval state: {other}")),
		}
	}
}

// =============================================================================
// App Catalog
// =============================================================================

/// The allow-list of downstream applications an account can be entitled to.
///
/// The catalog is deployment configuration, not code: approval logic only
/// ever consults [`AppCatalog::contains`], so swapping the list never
/// touches transition logic. Unknown app names are a hard validation
/// failure everywhere, never silently ignored or stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCatalog {
	names: BTreeSet<String>,
}

impl AppCatalog {
	/// Build a catalog from the configured app names.
	pub fn new<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			names: names.into_iter().map(Into::into).collect(),
		}
	}

	/// Returns true if `app` is a known downstream application.
	pub fn contains(&self, app: &str) -> bool {
		self.names.contains(app)
	}

	/// Iterate the catalog in stable (sorted) order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.names.iter().map(String::as_str)
	}

	/// Number of apps in the catalog.
	pub fn len(&self) -> usize {
		self.names.len()
	}

	/// Returns true if the catalog has no entries.
	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	/// Fresh per-account entitlement map: every catalog app, all false.
	pub fn default_approvals(&self) -> BTreeMap<String, bool> {
		self.names.iter().map(|a| (a.clone(), false)).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	mod id_types {
		use super::*;

		#[test]
		fn account_id_roundtrips() {
			let uuid = Uuid::new_v4();
			let id = AccountId::new(uuid);
			assert_eq!(id.into_inner(), uuid);
		}

		#[test]
		fn account_id_generates_unique() {
			assert_ne!(AccountId::generate(), AccountId::generate());
		}

		#[test]
		fn account_id_serializes_as_uuid() {
			let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
			let id = AccountId::new(uuid);
			let json = serde_json::to_string(&id).unwrap();
			assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
		}

		proptest! {
			#[test]
			fn account_id_serde_roundtrip(a: u128) {
				let id = AccountId::new(Uuid::from_u128(a));
				let json = serde_json::to_string(&id).unwrap();
				let back: AccountId = serde_json::from_str(&json).unwrap();
				prop_assert_eq!(id, back);
			}

			#[test]
			fn account_id_display_matches_uuid(a: u128) {
				let uuid = Uuid::from_u128(a);
				prop_assert_eq!(AccountId::new(uuid).to_string(), uuid.to_string());
			}
		}
	}

	mod approval_state {
		use super::*;
		use std::str::FromStr;

		#[test]
		fn default_is_pending() {
			assert_eq!(ApprovalState::default(), ApprovalState::Pending);
		}

		#[test]
		fn display_and_parse_roundtrip() {
			for state in [
				ApprovalState::Pending,
				ApprovalState::Approved,
				ApprovalState::Denied,
			] {
				let parsed = ApprovalState::from_str(&state.to_string()).unwrap();
				assert_eq!(parsed, state);
			}
		}

		#[test]
		fn unknown_state_fails_to_parse() {
			assert!(ApprovalState::from_str("revoked").is_err());
		}

		#[test]
		fn terminal_states() {
			assert!(!ApprovalState::Pending.is_terminal());
			assert!(ApprovalState::Approved.is_terminal());
			assert!(ApprovalState::Denied.is_terminal());
		}

		#[test]
		fn serializes_snake_case() {
			let json = serde_json::to_string(&ApprovalState::Approved).unwrap();
			assert_eq!(json, "\"approved\"");
		}
	}

	mod app_catalog {
		use super::*;

		fn catalog() -> AppCatalog {
			AppCatalog::new(["filebrowser", "o365mail", "zohomail"])
		}

		#[test]
		fn contains_known_apps() {
			let catalog = catalog();
			assert!(catalog.contains("filebrowser"));
			assert!(!catalog.contains("unknownApp"));
		}

		#[test]
		fn lookup_is_case_sensitive() {
			assert!(!catalog().contains("FileBrowser"));
		}

		#[test]
		fn default_approvals_cover_catalog_all_false() {
			let approvals = catalog().default_approvals();
			assert_eq!(approvals.len(), 3);
			assert!(approvals.values().all(|granted| !granted));
		}

		#[test]
		fn duplicate_names_collapse() {
			let catalog = AppCatalog::new(["filebrowser", "filebrowser"]);
			assert_eq!(catalog.len(), 1);
		}
	}
}
