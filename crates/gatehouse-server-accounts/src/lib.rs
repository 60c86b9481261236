// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Account lifecycle service for the Gatehouse server.
//!
//! Registration, the admin approval gate, per-application entitlements,
//! credentials, and the provisioning handoff, orchestrated over the
//! store, session issuer, job queue and audit pipeline.

pub mod approval;
pub mod error;
pub mod requests;
pub mod response;
pub mod service;

pub use approval::check_transition;
pub use error::{AccountsError, Result};
pub use requests::{AppApprovalRequest, ChangePasswordRequest, LoginRequest, RegisterRequest};
pub use response::{ApiResponse, ErrorKind};
pub use service::{AccountService, LoginOutcome};
