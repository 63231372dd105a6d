// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the crash recorder.
//!
//! These errors never escape the public capture or query surface — the
//! recorder is fail-soft by contract. They exist for the storage seam and
//! the builder.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for recorder operations.
pub type Result<T> = std::result::Result<T, RecorderError>;

/// Errors that can occur inside the crash recorder.
#[derive(Debug, Error)]
pub enum RecorderError {
	/// A crash store is required to build a recorder.
	#[error("a crash store is required")]
	MissingStore,

	/// App version metadata is required.
	#[error("app version is required")]
	MissingAppVersion,

	/// Platform metadata is required.
	#[error("platform is required")]
	MissingPlatform,

	/// The underlying store rejected an operation.
	#[error("crash store error: {0}")]
	Storage(String),

	/// A store operation exceeded the configured timeout.
	#[error("crash store operation timed out after {0:?}")]
	StorageTimeout(Duration),

	/// Failed to serialize or deserialize the working set.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// The host runtime refused a hook registration.
	#[error("hook registration failed: {0}")]
	HookRegistration(String),

	/// Filesystem error from the file-backed store.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}
