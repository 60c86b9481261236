// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pure approval transition rules.
//!
//! `Pending` is the only state a decision can leave; `Approved` and
//! `Denied` are terminal. The store enforces this again with a conditional
//! update, so these checks exist to give callers a precise error before
//! any write is attempted.

use gatehouse_server_auth::ApprovalState;

use crate::error::AccountsError;

/// Check whether an account in `current` state may move to `requested`.
pub fn check_transition(
	current: ApprovalState,
	requested: ApprovalState,
) -> Result<(), AccountsError> {
	match (current, requested) {
		(ApprovalState::Pending, ApprovalState::Approved)
		| (ApprovalState::Pending, ApprovalState::Denied) => Ok(()),
		(ApprovalState::Approved, _) => Err(AccountsError::AlreadyApproved),
		(ApprovalState::Denied, _) => Err(AccountsError::AlreadyDenied),
		(ApprovalState::Pending, ApprovalState::Pending) => Err(AccountsError::InvalidTransition),
	}
}
