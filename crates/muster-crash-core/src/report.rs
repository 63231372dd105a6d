// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Crash report record and capture-kind tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::actor::ActorRole;
use crate::error::CrashError;
use crate::CrashReportId;

/// Screen name recorded when no screen was ever set.
pub const UNKNOWN_SCREEN: &str = "Unknown";

/// The capture path a report entered through. Never changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrashKind {
	/// Uncaught synchronous script error.
	ScriptError,
	/// Platform-level native fault (string payload only).
	NativeFault,
	/// Unhandled asynchronous rejection.
	UnhandledRejection,
	/// Handled exception reported explicitly by application code.
	ManualReport,
}

impl fmt::Display for CrashKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ScriptError => write!(f, "script_error"),
			Self::NativeFault => write!(f, "native_fault"),
			Self::UnhandledRejection => write!(f, "unhandled_rejection"),
			Self::ManualReport => write!(f, "manual_report"),
		}
	}
}

impl FromStr for CrashKind {
	type Err = CrashError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"script_error" => Ok(Self::ScriptError),
			"native_fault" => Ok(Self::NativeFault),
			"unhandled_rejection" => Ok(Self::UnhandledRejection),
			"manual_report" => Ok(Self::ManualReport),
			_ => Err(CrashError::InvalidCrashKind(s.to_string())),
		}
	}
}

/// One observed failure.
///
/// Reports are immutable after construction except for `resolved`, which
/// only ever transitions `false → true` via [`CrashReport::mark_resolved`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashReport {
	pub id: CrashReportId,
	/// Capture time. Immutable.
	pub timestamp: DateTime<Utc>,
	pub kind: CrashKind,
	/// Human-readable description. Always non-empty; capture paths fall back
	/// to a stringified representation when no message is available.
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stack_trace: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub actor_role: Option<ActorRole>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub actor_id: Option<String>,
	/// Active UI surface at capture time, or [`UNKNOWN_SCREEN`].
	pub screen: String,
	pub app_version: String,
	pub platform: String,
	#[serde(default)]
	pub resolved: bool,
	/// Open key-value bag for capture-path-specific detail.
	#[serde(default)]
	pub metadata: serde_json::Value,
}

impl CrashReport {
	#[must_use]
	pub fn is_resolved(&self) -> bool {
		self.resolved
	}

	/// Marks the report resolved. One-way; calling this on an already
	/// resolved report is a no-op.
	pub fn mark_resolved(&mut self) {
		self.resolved = true;
	}
}
