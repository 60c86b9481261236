// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable provisioning handoff for the Gatehouse server.
//!
//! Approved accounts are provisioned by an external privileged worker.
//! The contract between the gateway and that worker is a directory of JSON
//! job files: the gateway enqueues, the worker consumes. Nothing in this
//! process runs privileged commands.

pub mod error;
pub mod job;
pub mod queue;
pub mod secret;

pub use error::{ProvisioningError, Result};
pub use job::ProvisioningJob;
pub use queue::JobQueue;
pub use secret::{generate_secret, SECRET_LENGTH};
