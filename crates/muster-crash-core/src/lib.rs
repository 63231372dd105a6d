// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Muster crash recording system.
//!
//! This crate provides shared types for on-device crash recording: crash
//! reports, capture kinds, actor snapshots, and derived statistics. It is
//! consumed by the recorder implementation (`muster-crash`) and by any
//! presentation surface that renders crash data.
//!
//! # Overview
//!
//! The crash recording system supports:
//! - Capture of script errors, platform-native faults, and unhandled
//!   asynchronous rejections
//! - Manual error reports from application code with caller-supplied context
//! - Actor and screen snapshots attached at capture time
//! - A one-way unresolved → resolved lifecycle per report
//! - On-demand statistics (totals, per-role and per-screen counts, recent
//!   reports)

pub mod actor;
pub mod error;
pub mod report;
pub mod stats;

pub use actor::{Actor, ActorRole};
pub use error::{CrashError, Result};
pub use report::{CrashKind, CrashReport};
pub use stats::CrashStats;

use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a crash report.
///
/// Generated at capture time from a v7 UUID, which is time-ordered with a
/// random suffix and therefore unique without any coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CrashReportId(pub Uuid);

impl CrashReportId {
	#[must_use]
	pub fn new() -> Self {
		Self(Uuid::now_v7())
	}

	#[must_use]
	pub fn as_uuid(&self) -> &Uuid {
		&self.0
	}
}

impl Default for CrashReportId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for CrashReportId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for CrashReportId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}
