// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use rand::distributions::Alphanumeric;
use rand::Rng;
use zeroize::Zeroizing;

/// Length of generated provisioning secrets.
pub const SECRET_LENGTH: usize = 16;

/// Generate a fresh one-time provisioning secret.
///
/// The secret travels only through the job file handed to the external
/// worker. It is independent of the account's login credential and is
/// never written to the account store; the `Zeroizing` wrapper wipes the
/// plaintext when the enqueue path drops it.
pub fn generate_secret() -> Zeroizing<String> {
	let secret: String = rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(SECRET_LENGTH)
		.map(char::from)
		.collect();
	Zeroizing::new(secret)
}
