// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Derived crash statistics, computed on demand and never stored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::actor::ActorRole;
use crate::report::CrashReport;

/// How many reports `recent_crashes` holds.
pub const RECENT_CRASHES: usize = 10;

/// Aggregate view over a set of crash reports.
///
/// `Default` yields the zeroed aggregate, which doubles as the fail-soft
/// fallback when the recorder is degraded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrashStats {
	pub total_crashes: u64,
	pub resolved_crashes: u64,
	pub admin_crashes: u64,
	pub member_crashes: u64,
	pub crashes_by_screen: HashMap<String, u64>,
	/// Most recent reports, newest first.
	pub recent_crashes: Vec<CrashReport>,
}

impl CrashStats {
	/// Computes the aggregate from reports already sorted newest-first.
	#[must_use]
	pub fn from_reports(reports: &[CrashReport]) -> Self {
		let mut stats = Self {
			total_crashes: reports.len() as u64,
			..Self::default()
		};

		for report in reports {
			if report.resolved {
				stats.resolved_crashes += 1;
			}
			match report.actor_role {
				Some(ActorRole::Admin) => stats.admin_crashes += 1,
				Some(ActorRole::Member) => stats.member_crashes += 1,
				None => {}
			}
			*stats.crashes_by_screen.entry(report.screen.clone()).or_insert(0) += 1;
		}

		stats.recent_crashes = reports.iter().take(RECENT_CRASHES).cloned().collect();
		stats
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::report::CrashKind;
	use crate::CrashReportId;
	use chrono::Utc;

	fn report(role: Option<ActorRole>, resolved: bool, screen: &str) -> CrashReport {
		CrashReport {
			id: CrashReportId::new(),
			timestamp: Utc::now(),
			kind: CrashKind::ScriptError,
			message: "boom".to_string(),
			stack_trace: None,
			actor_role: role,
			actor_id: None,
			screen: screen.to_string(),
			app_version: "1.0.0".to_string(),
			platform: "mobile".to_string(),
			resolved,
			metadata: serde_json::Value::Object(serde_json::Map::new()),
		}
	}

	#[test]
	fn aggregates_counts_by_role_and_resolution() {
		let reports = vec![
			report(Some(ActorRole::Admin), true, "AdminDashboard"),
			report(Some(ActorRole::Member), false, "EventDetails"),
			report(Some(ActorRole::Member), false, "EventDetails"),
		];

		let stats = CrashStats::from_reports(&reports);
		assert_eq!(stats.total_crashes, 3);
		assert_eq!(stats.resolved_crashes, 1);
		assert_eq!(stats.admin_crashes, 1);
		assert_eq!(stats.member_crashes, 2);
		assert_eq!(stats.crashes_by_screen["AdminDashboard"], 1);
		assert_eq!(stats.crashes_by_screen["EventDetails"], 2);
	}

	#[test]
	fn anonymous_reports_count_toward_totals_only() {
		let reports = vec![report(None, false, "Login")];
		let stats = CrashStats::from_reports(&reports);
		assert_eq!(stats.total_crashes, 1);
		assert_eq!(stats.admin_crashes, 0);
		assert_eq!(stats.member_crashes, 0);
	}

	#[test]
	fn recent_crashes_is_capped() {
		let reports: Vec<_> = (0..25)
			.map(|_| report(Some(ActorRole::Member), false, "Splash"))
			.collect();
		let stats = CrashStats::from_reports(&reports);
		assert_eq!(stats.recent_crashes.len(), RECENT_CRASHES);
		// Input order is newest-first; the cap must keep the head.
		assert_eq!(stats.recent_crashes[0].id, reports[0].id);
	}

	#[test]
	fn default_is_zeroed() {
		let stats = CrashStats::default();
		assert_eq!(stats.total_crashes, 0);
		assert_eq!(stats.resolved_crashes, 0);
		assert!(stats.crashes_by_screen.is_empty());
		assert!(stats.recent_crashes.is_empty());
	}
}
