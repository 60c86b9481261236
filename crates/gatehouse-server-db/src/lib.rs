// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database layer for the Gatehouse server.
//!
//! SQLite-backed stores for accounts and perimeter security events, plus
//! pool construction and schema migration. Higher layers talk to the
//! [`AccountStore`] trait; the concrete [`AccountRepository`] is wired in
//! at startup.

pub mod account;
pub mod error;
pub mod schema;
pub mod security;
pub mod testing;

pub use account::{AccountRepository, AccountStore};
pub use error::{DbError, Result};
pub use schema::{create_pool, migrate};
pub use security::{SecurityEvent, SecurityEventKind, SecurityEventRepository};
