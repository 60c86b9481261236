// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stateless session tokens.
//!
//! The issuer signs HS256 JWTs carrying identity and authorization claims.
//! Tokens are stateless: once issued they remain valid until expiry, and
//! there is no revocation path. The default lifetime is 8 hours
//! (configurable through `auth.token_ttl_hours`).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::account::Account;
use crate::types::AccountId;

/// Errors from verifying a session token.
#[derive(Debug, Error)]
pub enum TokenError {
	#[error("token has expired")]
	Expired,

	#[error("token is malformed")]
	Malformed,

	#[error("token signature does not match the configured signing key")]
	UnknownSigningKey,

	#[error("token signing failed: {0}")]
	Signing(String),
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// The account this token authenticates.
	pub sub: AccountId,
	/// Username at issue time, for log context only.
	pub username: String,
	/// Whether the account held admin capability at issue time.
	pub is_admin: bool,
	/// Whether the global approval gate was passed at issue time.
	pub is_approved: bool,
	/// Issued-at, seconds since epoch.
	pub iat: i64,
	/// Expiry, seconds since epoch.
	pub exp: i64,
}

/// Issues and verifies bearer session tokens.
pub struct SessionIssuer {
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
	ttl: Duration,
}

impl SessionIssuer {
	/// Create an issuer from the configured HMAC secret and token lifetime.
	pub fn new(secret: &[u8], ttl: Duration) -> Self {
		Self {
			encoding_key: EncodingKey::from_secret(secret),
			decoding_key: DecodingKey::from_secret(secret),
			ttl,
		}
	}

	/// Issue a token for `account`, embedding the approval and admin flags.
	#[instrument(skip(self, account), fields(account_id = %account.id))]
	pub fn issue(&self, account: &Account) -> Result<String, TokenError> {
		let now = Utc::now();
		let claims = Claims {
			sub: account.id,
			username: account.username.clone(),
			is_admin: account.is_admin,
			is_approved: account.may_login(),
			iat: now.timestamp(),
			exp: (now + self.ttl).timestamp(),
		};

		encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
			.map_err(|e| TokenError::Signing(e.to_string()))
	}

	/// Verify a bearer token and return its claims.
	///
	/// Expiry is exact (no leeway); `Expired`, `Malformed`, and
	/// `UnknownSigningKey` are distinct so the boundary can answer
	/// differently for each.
	pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
		let mut validation = Validation::new(Algorithm::HS256);
		validation.leeway = 0;

		decode::<Claims>(token, &self.decoding_key, &validation)
			.map(|data| data.claims)
			.map_err(|e| match e.kind() {
				jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
				jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::UnknownSigningKey,
				_ => TokenError::Malformed,
			})
	}
}
