// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for crash core types.

use thiserror::Error;

/// Result type alias for crash core operations.
pub type Result<T> = std::result::Result<T, CrashError>;

/// Errors that can occur when working with crash core types.
#[derive(Debug, Error)]
pub enum CrashError {
	/// Unknown crash kind string.
	#[error("invalid crash kind: {0}")]
	InvalidCrashKind(String),

	/// Unknown actor role string.
	#[error("invalid actor role: {0}")]
	InvalidActorRole(String),

	/// Failed to serialize or deserialize a report.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}
