// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The crash recorder: capture, normalize, guard, persist, serve.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use muster_crash_core::report::UNKNOWN_SCREEN;
use muster_crash_core::{Actor, CrashKind, CrashReport, CrashReportId, CrashStats};
use tokio::sync::RwLock as AsyncRwLock;
use tracing::{debug, error, info, warn};

use crate::capture::CapturedError;
use crate::error::{RecorderError, Result};
use crate::guard::{Admission, FloodGuard};
use crate::source::ErrorSource;
use crate::store::CrashStore;

/// Storage key holding the JSON-serialized working set.
const STORAGE_KEY: &str = "crash_reports";

/// Maximum number of reports retained in the working set.
const MAX_REPORTS: usize = 100;

/// Bound on every call into durable storage.
const STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Sliding window of the capture circuit breaker.
const FLOOD_WINDOW: Duration = Duration::from_secs(1);

/// Captures admitted per window before the breaker trips.
const FLOOD_MAX: usize = 5;

/// Configuration for the crash recorder.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
	/// Working set retention cap (oldest evicted first).
	pub max_reports: usize,
	/// Timeout applied to every storage operation.
	pub storage_timeout: Duration,
	/// Sliding window of the capture circuit breaker.
	pub flood_window: Duration,
	/// Captures admitted per window before further ones are dropped.
	pub flood_max: usize,
}

impl Default for RecorderConfig {
	fn default() -> Self {
		Self {
			max_reports: MAX_REPORTS,
			storage_timeout: STORAGE_TIMEOUT,
			flood_window: FLOOD_WINDOW,
			flood_max: FLOOD_MAX,
		}
	}
}

/// Builder for constructing a CrashRecorder.
pub struct CrashRecorderBuilder {
	app_version: Option<String>,
	platform: Option<String>,
	store: Option<Arc<dyn CrashStore>>,
	suppressed_screens: HashSet<String>,
	config: RecorderConfig,
}

impl CrashRecorderBuilder {
	/// Creates a new builder with default settings.
	#[must_use]
	pub fn new() -> Self {
		Self {
			app_version: None,
			platform: None,
			store: None,
			suppressed_screens: HashSet::new(),
			config: RecorderConfig::default(),
		}
	}

	/// Sets the application version stamped on every report.
	pub fn app_version(mut self, version: impl Into<String>) -> Self {
		self.app_version = Some(version.into());
		self
	}

	/// Sets the platform name stamped on every report.
	///
	/// Example: `mobile`, `ios`, `android`
	pub fn platform(mut self, platform: impl Into<String>) -> Self {
		self.platform = Some(platform.into());
		self
	}

	/// Sets the durable store backing the recorder.
	pub fn store(mut self, store: Arc<dyn CrashStore>) -> Self {
		self.store = Some(store);
		self
	}

	/// Suppresses message-less captures originating from the named screen.
	///
	/// Intended for the crash-viewing screen itself: a failure inside the
	/// crash viewer with nothing to say about itself would otherwise spawn
	/// further captures about its own rendering.
	pub fn suppress_screen(mut self, screen: impl Into<String>) -> Self {
		self.suppressed_screens.insert(screen.into());
		self
	}

	/// Sets the working set retention cap.
	pub fn max_reports(mut self, max: usize) -> Self {
		self.config.max_reports = max;
		self
	}

	/// Sets the timeout applied to storage operations.
	pub fn storage_timeout(mut self, timeout: Duration) -> Self {
		self.config.storage_timeout = timeout;
		self
	}

	/// Sets the circuit breaker window.
	pub fn flood_window(mut self, window: Duration) -> Self {
		self.config.flood_window = window;
		self
	}

	/// Sets how many captures the breaker admits per window.
	pub fn flood_max(mut self, max: usize) -> Self {
		self.config.flood_max = max;
		self
	}

	/// Builds the CrashRecorder.
	pub fn build(self) -> Result<CrashRecorder> {
		let app_version = self.app_version.ok_or(RecorderError::MissingAppVersion)?;
		let platform = self.platform.ok_or(RecorderError::MissingPlatform)?;
		let store = self.store.ok_or(RecorderError::MissingStore)?;

		let guard = FloodGuard::new(self.config.flood_window, self.config.flood_max);

		let inner = Arc::new(RecorderInner {
			app_version,
			platform,
			store,
			suppressed_screens: self.suppressed_screens,
			config: self.config,
			initialized: AtomicBool::new(false),
			actor: RwLock::new(None),
			screen: RwLock::new(None),
			screen_changes: AtomicU64::new(0),
			reports: AsyncRwLock::new(Vec::new()),
			guard,
		});

		Ok(CrashRecorder { inner })
	}
}

impl Default for CrashRecorderBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Internal recorder state.
struct RecorderInner {
	app_version: String,
	platform: String,
	store: Arc<dyn CrashStore>,
	suppressed_screens: HashSet<String>,
	config: RecorderConfig,
	initialized: AtomicBool,
	actor: RwLock<Option<Actor>>,
	screen: RwLock<Option<String>>,
	screen_changes: AtomicU64,
	reports: AsyncRwLock<Vec<CrashReport>>,
	guard: FloodGuard,
}

/// Records crashes observed on the device and serves them to the
/// presentation layer.
///
/// One recorder exists per process, constructed by the composition root and
/// handed out by clone. Nothing inside it propagates a failure to a caller:
/// a degraded recorder answers queries with empty defaults and drops
/// captures it cannot persist.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use muster_crash::{CrashRecorder, FileStore};
///
/// let recorder = CrashRecorder::builder()
///     .app_version("1.4.2")
///     .platform("mobile")
///     .store(Arc::new(FileStore::open_default()?))
///     .suppress_screen("CrashReports")
///     .build()?;
///
/// // Wire it to the host runtime's error hooks
/// recorder.initialize(&runtime_hooks).await;
///
/// // Push context as the session changes
/// recorder.set_current_user(Some(Actor::new("user_1", ActorRole::Member)));
/// recorder.set_current_screen("EventDetails");
///
/// // Report a handled failure
/// if let Err(e) = refresh_events().await {
///     recorder.report_error(CapturedError::from_error(&e), None).await;
/// }
/// ```
#[derive(Clone)]
pub struct CrashRecorder {
	inner: Arc<RecorderInner>,
}

impl CrashRecorder {
	/// Creates a new builder for constructing a CrashRecorder.
	#[must_use]
	pub fn builder() -> CrashRecorderBuilder {
		CrashRecorderBuilder::new()
	}

	/// Loads persisted reports and registers the capture hooks.
	///
	/// Idempotent: a second call returns immediately. Load and registration
	/// failures are logged and swallowed — a crash-reporting failure must
	/// never crash the app it is monitoring.
	pub async fn initialize(&self, source: &dyn ErrorSource) {
		if self.inner.initialized.swap(true, Ordering::SeqCst) {
			return;
		}

		self.load_persisted().await;
		self.register_hooks(source);

		info!("crash recorder initialized");
	}

	/// Stores or clears the acting user snapshot. No validation.
	pub fn set_current_user(&self, actor: Option<Actor>) {
		let mut slot = self
			.inner
			.actor
			.write()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		*slot = actor;
	}

	/// Records the active screen name.
	///
	/// A call with the name already stored is a no-op; UI effect hooks fire
	/// on every render and a naive setter would feed an update/re-render
	/// cycle. Callers still coalesce bursts before invoking this.
	pub fn set_current_screen(&self, name: &str) {
		let mut slot = self
			.inner
			.screen
			.write()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		if slot.as_deref() == Some(name) {
			return;
		}
		*slot = Some(name.to_string());
		self.inner.screen_changes.fetch_add(1, Ordering::SeqCst);
	}

	/// Captures an uncaught synchronous script error.
	///
	/// This is the path a bug in the recorder's own persistence code would
	/// re-enter, so it is the one behind the reentrancy latch and the
	/// circuit breaker.
	pub async fn handle_script_error(&self, err: CapturedError, is_fatal: bool) {
		let _permit = match self.inner.guard.admit() {
			Admission::Admitted(permit) => permit,
			Admission::DroppedReentrant => {
				warn!("dropping re-entrant script error capture");
				return;
			}
			Admission::DroppedFlooded => {
				warn!("capture circuit breaker open, dropping script error");
				return;
			}
		};

		if !err.has_content() {
			debug!("dropping script error capture with no message or stack");
			return;
		}

		if err.message().is_none() && self.current_screen_is_suppressed() {
			debug!("suppressing self-referential capture from crash viewer");
			return;
		}

		let message = err.message().unwrap_or("Unknown script error").to_string();
		let stack = err.stack().map(str::to_string);
		let report = self.build_report(
			CrashKind::ScriptError,
			message,
			stack,
			serde_json::json!({ "is_fatal": is_fatal }),
		);

		error!(
			report_id = %report.id,
			message = %report.message,
			screen = %report.screen,
			is_fatal,
			"script error captured"
		);

		self.save_crash_report(report).await;
	}

	/// Captures a platform-native fault. Only a string payload exists at
	/// this boundary; there is no stack trace to copy.
	pub async fn handle_native_fault(&self, payload: &str) {
		let message = if payload.is_empty() {
			"Unknown native fault".to_string()
		} else {
			payload.to_string()
		};
		let report = self.build_report(
			CrashKind::NativeFault,
			message,
			None,
			serde_json::json!({ "native_fault": true }),
		);

		error!(
			report_id = %report.id,
			message = %report.message,
			screen = %report.screen,
			"native fault captured"
		);

		self.save_crash_report(report).await;
	}

	/// Captures an unhandled asynchronous rejection. The reason may or may
	/// not be error-shaped; either way it was decided at the boundary.
	pub async fn handle_unhandled_rejection(&self, reason: CapturedError) {
		let message = reason
			.message()
			.unwrap_or("Unhandled rejection")
			.to_string();
		let stack = reason.stack().map(str::to_string);
		let report = self.build_report(
			CrashKind::UnhandledRejection,
			message,
			stack,
			serde_json::json!({ "unhandled_rejection": true }),
		);

		error!(
			report_id = %report.id,
			message = %report.message,
			screen = %report.screen,
			"unhandled rejection captured"
		);

		self.save_crash_report(report).await;
	}

	/// Reports a handled exception that never reached an uncaught-error
	/// boundary. Caller-supplied context lands in the report metadata.
	pub async fn report_error(&self, err: CapturedError, context: Option<serde_json::Value>) {
		let message = err.message().unwrap_or("Manual error report").to_string();
		let stack = err.stack().map(str::to_string);
		let mut metadata = serde_json::Map::new();
		metadata.insert("manual".to_string(), serde_json::Value::Bool(true));
		if let Some(context) = context {
			metadata.insert("context".to_string(), context);
		}
		let report = self.build_report(
			CrashKind::ManualReport,
			message,
			stack,
			serde_json::Value::Object(metadata),
		);

		debug!(report_id = %report.id, message = %report.message, "manual error reported");

		self.save_crash_report(report).await;
	}

	/// Returns the working set, newest first.
	pub async fn get_crash_reports(&self) -> Vec<CrashReport> {
		let mut reports = self.inner.reports.read().await.clone();
		reports.sort_by(|a, b| {
			b.timestamp
				.cmp(&a.timestamp)
				.then_with(|| b.id.0.cmp(&a.id.0))
		});
		reports
	}

	/// Computes the aggregate view over the working set.
	pub async fn get_crash_stats(&self) -> CrashStats {
		CrashStats::from_reports(&self.get_crash_reports().await)
	}

	/// Marks the matching report resolved and persists. No-op for an
	/// unknown id or an already resolved report.
	pub async fn mark_crash_resolved(&self, id: CrashReportId) {
		let snapshot = {
			let mut reports = self.inner.reports.write().await;
			match reports.iter_mut().find(|r| r.id == id) {
				Some(report) if !report.is_resolved() => {
					report.mark_resolved();
					Some(reports.clone())
				}
				Some(_) => None,
				None => {
					debug!(report_id = %id, "resolve requested for unknown crash report");
					None
				}
			}
		};

		if let Some(snapshot) = snapshot {
			self.persist(&snapshot).await;
		}
	}

	/// Removes every resolved report and persists the remainder.
	pub async fn clear_resolved_crashes(&self) {
		let snapshot = {
			let mut reports = self.inner.reports.write().await;
			let before = reports.len();
			reports.retain(|r| !r.is_resolved());
			debug!(removed = before - reports.len(), "cleared resolved crash reports");
			reports.clone()
		};

		self.persist(&snapshot).await;
	}

	/// Empties the working set and removes the persisted record entirely.
	pub async fn clear_all_crashes(&self) {
		self.inner.reports.write().await.clear();

		let timeout = self.inner.config.storage_timeout;
		match tokio::time::timeout(timeout, self.inner.store.delete(STORAGE_KEY)).await {
			Err(_) => warn!(?timeout, "crash report delete timed out"),
			Ok(Err(err)) => warn!(error = %err, "failed to delete persisted crash reports"),
			Ok(Ok(())) => debug!("cleared all crash reports"),
		}
	}

	async fn load_persisted(&self) {
		let timeout = self.inner.config.storage_timeout;
		let loaded = tokio::time::timeout(timeout, self.inner.store.get(STORAGE_KEY)).await;

		let reports: Vec<CrashReport> = match loaded {
			Err(_) => {
				warn!(?timeout, "crash report load timed out, starting empty");
				Vec::new()
			}
			Ok(Err(err)) => {
				warn!(error = %err, "failed to load crash reports, starting empty");
				Vec::new()
			}
			Ok(Ok(None)) => Vec::new(),
			Ok(Ok(Some(json))) => match serde_json::from_str(&json) {
				Ok(reports) => reports,
				Err(err) => {
					warn!(error = %err, "discarding corrupt crash report data");
					Vec::new()
				}
			},
		};

		debug!(count = reports.len(), "loaded persisted crash reports");
		*self.inner.reports.write().await = reports;
	}

	fn register_hooks(&self, source: &dyn ErrorSource) {
		let recorder = self.clone();
		let registered = source.on_script_error(Box::new(move |err, is_fatal| {
			let recorder = recorder.clone();
			tokio::spawn(async move {
				recorder.handle_script_error(err, is_fatal).await;
			});
		}));
		if let Err(err) = registered {
			warn!(error = %err, "failed to register script error hook");
		}

		let recorder = self.clone();
		let registered = source.on_native_fault(Box::new(move |payload| {
			let recorder = recorder.clone();
			tokio::spawn(async move {
				recorder.handle_native_fault(&payload).await;
			});
		}));
		if let Err(err) = registered {
			warn!(error = %err, "failed to register native fault hook");
		}

		let recorder = self.clone();
		let registered = source.on_unhandled_rejection(Box::new(move |reason| {
			let recorder = recorder.clone();
			tokio::spawn(async move {
				recorder.handle_unhandled_rejection(reason).await;
			});
		}));
		if let Err(err) = registered {
			warn!(error = %err, "failed to register unhandled rejection hook");
		}
	}

	fn build_report(
		&self,
		kind: CrashKind,
		message: String,
		stack_trace: Option<String>,
		metadata: serde_json::Value,
	) -> CrashReport {
		let actor = self
			.inner
			.actor
			.read()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.clone();
		let screen = self
			.inner
			.screen
			.read()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.clone()
			.unwrap_or_else(|| UNKNOWN_SCREEN.to_string());

		CrashReport {
			id: CrashReportId::new(),
			timestamp: Utc::now(),
			kind,
			message,
			stack_trace,
			actor_role: actor.as_ref().map(|a| a.role),
			actor_id: actor.map(|a| a.id),
			screen,
			app_version: self.inner.app_version.clone(),
			platform: self.inner.platform.clone(),
			resolved: false,
			metadata,
		}
	}

	fn current_screen_is_suppressed(&self) -> bool {
		let screen = self
			.inner
			.screen
			.read()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		screen
			.as_deref()
			.is_some_and(|name| self.inner.suppressed_screens.contains(name))
	}

	async fn save_crash_report(&self, report: CrashReport) {
		let snapshot = {
			let mut reports = self.inner.reports.write().await;
			reports.push(report);
			while reports.len() > self.inner.config.max_reports {
				reports.remove(0);
			}
			reports.clone()
		};

		self.persist(&snapshot).await;
	}

	async fn persist(&self, reports: &[CrashReport]) {
		let json = match serde_json::to_string(reports) {
			Ok(json) => json,
			Err(err) => {
				warn!(error = %err, "failed to serialize crash reports");
				return;
			}
		};

		let timeout = self.inner.config.storage_timeout;
		match tokio::time::timeout(timeout, self.inner.store.set(STORAGE_KEY, &json)).await {
			Err(_) => warn!(?timeout, "crash report write timed out"),
			Ok(Err(err)) => warn!(error = %err, "failed to persist crash reports"),
			Ok(Ok(())) => debug!(count = reports.len(), "persisted crash reports"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::source::StaticErrorSource;
	use crate::store::MemoryStore;
	use muster_crash_core::ActorRole;

	fn recorder_over(store: Arc<MemoryStore>) -> CrashRecorder {
		CrashRecorder::builder()
			.app_version("1.0.0")
			.platform("mobile")
			.store(store)
			.build()
			.unwrap()
	}

	fn script_error(message: &str) -> CapturedError {
		CapturedError::structured(message, Some(format!("at {message}")))
	}

	#[test]
	fn builder_requires_app_version() {
		let result = CrashRecorder::builder()
			.platform("mobile")
			.store(Arc::new(MemoryStore::new()))
			.build();
		assert!(matches!(result, Err(RecorderError::MissingAppVersion)));
	}

	#[test]
	fn builder_requires_platform() {
		let result = CrashRecorder::builder()
			.app_version("1.0.0")
			.store(Arc::new(MemoryStore::new()))
			.build();
		assert!(matches!(result, Err(RecorderError::MissingPlatform)));
	}

	#[test]
	fn builder_requires_store() {
		let result = CrashRecorder::builder()
			.app_version("1.0.0")
			.platform("mobile")
			.build();
		assert!(matches!(result, Err(RecorderError::MissingStore)));
	}

	#[tokio::test]
	async fn captures_have_unique_ids() {
		let recorder = recorder_over(Arc::new(MemoryStore::new()));

		for i in 0..20 {
			recorder
				.report_error(CapturedError::structured(format!("error {i}"), None), None)
				.await;
		}

		let reports = recorder.get_crash_reports().await;
		let mut ids: Vec<_> = reports.iter().map(|r| r.id).collect();
		ids.sort_by_key(|id| id.0);
		ids.dedup();
		assert_eq!(ids.len(), 20);
	}

	#[tokio::test]
	async fn working_set_retains_most_recent_hundred() {
		let store = Arc::new(MemoryStore::new());
		let recorder = recorder_over(Arc::clone(&store));

		for i in 0..150 {
			recorder
				.report_error(CapturedError::structured(format!("error {i}"), None), None)
				.await;
		}

		let reports = recorder.get_crash_reports().await;
		assert_eq!(reports.len(), 100);
		assert_eq!(reports[0].message, "error 149");
		assert_eq!(reports[99].message, "error 50");

		// Persisted mirror carries the same cap.
		let stored = store.get(STORAGE_KEY).await.unwrap().unwrap();
		let persisted: Vec<CrashReport> = serde_json::from_str(&stored).unwrap();
		assert_eq!(persisted.len(), 100);
	}

	#[tokio::test]
	async fn reports_are_sorted_newest_first() {
		let recorder = recorder_over(Arc::new(MemoryStore::new()));

		recorder.handle_native_fault("first").await;
		recorder.handle_native_fault("second").await;
		recorder.handle_native_fault("third").await;

		let reports = recorder.get_crash_reports().await;
		let messages: Vec<_> = reports.iter().map(|r| r.message.as_str()).collect();
		assert_eq!(messages, vec!["third", "second", "first"]);
	}

	#[tokio::test]
	async fn resolve_is_idempotent() {
		let store = Arc::new(MemoryStore::new());
		let recorder = recorder_over(Arc::clone(&store));

		recorder.handle_native_fault("fault").await;
		let id = recorder.get_crash_reports().await[0].id;

		recorder.mark_crash_resolved(id).await;
		assert!(recorder.get_crash_reports().await[0].is_resolved());

		// A second resolve changes nothing and does not rewrite storage:
		// plant a sentinel value and verify it survives.
		store.set(STORAGE_KEY, "sentinel").await.unwrap();
		recorder.mark_crash_resolved(id).await;
		assert!(recorder.get_crash_reports().await[0].is_resolved());
		assert_eq!(
			store.get(STORAGE_KEY).await.unwrap().as_deref(),
			Some("sentinel")
		);
	}

	#[tokio::test]
	async fn resolving_unknown_id_is_a_noop() {
		let recorder = recorder_over(Arc::new(MemoryStore::new()));
		recorder.handle_native_fault("fault").await;

		recorder.mark_crash_resolved(CrashReportId::new()).await;

		let reports = recorder.get_crash_reports().await;
		assert_eq!(reports.len(), 1);
		assert!(!reports[0].is_resolved());
	}

	#[tokio::test]
	async fn clear_resolved_removes_only_resolved() {
		let recorder = recorder_over(Arc::new(MemoryStore::new()));

		recorder.handle_native_fault("keep me").await;
		recorder.handle_native_fault("resolve me").await;

		let resolved_id = recorder
			.get_crash_reports()
			.await
			.iter()
			.find(|r| r.message == "resolve me")
			.unwrap()
			.id;
		recorder.mark_crash_resolved(resolved_id).await;

		recorder.clear_resolved_crashes().await;

		let reports = recorder.get_crash_reports().await;
		assert_eq!(reports.len(), 1);
		assert_eq!(reports[0].message, "keep me");
	}

	#[tokio::test]
	async fn clear_all_empties_set_and_storage() {
		let store = Arc::new(MemoryStore::new());
		let recorder = recorder_over(Arc::clone(&store));

		recorder.handle_native_fault("fault").await;
		assert!(store.get(STORAGE_KEY).await.unwrap().is_some());

		recorder.clear_all_crashes().await;

		assert!(recorder.get_crash_reports().await.is_empty());
		assert_eq!(store.get(STORAGE_KEY).await.unwrap(), None);

		// A fresh recorder over the same store loads nothing.
		let fresh = recorder_over(Arc::clone(&store));
		fresh.initialize(&StaticErrorSource::new()).await;
		assert!(fresh.get_crash_reports().await.is_empty());
	}

	#[tokio::test]
	async fn circuit_breaker_bounds_rapid_captures() {
		let recorder = recorder_over(Arc::new(MemoryStore::new()));

		for i in 0..10 {
			recorder
				.handle_script_error(script_error(&format!("storm {i}")), false)
				.await;
		}

		let reports = recorder.get_crash_reports().await;
		assert_eq!(reports.len(), 5);
	}

	#[tokio::test]
	async fn storage_fault_leaves_recorder_stable() {
		let store = Arc::new(MemoryStore::new());
		let recorder = recorder_over(Arc::clone(&store));

		store.fail_next_set();
		recorder.handle_script_error(script_error("first"), true).await;

		// The capture itself is retained; only the write failed, and the
		// failure did not spawn a second report.
		assert_eq!(recorder.get_crash_reports().await.len(), 1);
		assert_eq!(store.get(STORAGE_KEY).await.unwrap(), None);

		// The recorder keeps working afterwards.
		recorder.handle_script_error(script_error("second"), false).await;
		assert_eq!(recorder.get_crash_reports().await.len(), 2);
		assert!(store.get(STORAGE_KEY).await.unwrap().is_some());
	}

	#[tokio::test]
	async fn empty_captures_are_dropped() {
		let recorder = recorder_over(Arc::new(MemoryStore::new()));

		recorder
			.handle_script_error(CapturedError::structured("", None), false)
			.await;

		assert!(recorder.get_crash_reports().await.is_empty());
	}

	#[tokio::test]
	async fn suppressed_screen_drops_messageless_captures() {
		let recorder = CrashRecorder::builder()
			.app_version("1.0.0")
			.platform("mobile")
			.store(Arc::new(MemoryStore::new()))
			.suppress_screen("CrashReports")
			.build()
			.unwrap();

		recorder.set_current_screen("CrashReports");

		// Messageless capture on the crash viewer: self-referential, dropped.
		recorder
			.handle_script_error(
				CapturedError::structured("", Some("at render".to_string())),
				false,
			)
			.await;
		assert!(recorder.get_crash_reports().await.is_empty());

		// A real message on the same screen is still captured.
		recorder
			.handle_script_error(script_error("genuine failure"), false)
			.await;
		assert_eq!(recorder.get_crash_reports().await.len(), 1);

		// The same messageless capture elsewhere is still captured.
		recorder.set_current_screen("EventDetails");
		recorder
			.handle_script_error(
				CapturedError::structured("", Some("at render".to_string())),
				false,
			)
			.await;
		assert_eq!(recorder.get_crash_reports().await.len(), 2);
	}

	#[tokio::test]
	async fn stats_aggregate_matches_expected_counts() {
		let recorder = recorder_over(Arc::new(MemoryStore::new()));

		recorder.set_current_user(Some(Actor::new("admin_1", ActorRole::Admin)));
		recorder.handle_native_fault("admin fault").await;

		recorder.set_current_user(Some(Actor::new("member_1", ActorRole::Member)));
		recorder.handle_native_fault("member fault").await;
		recorder.handle_native_fault("another member fault").await;

		let admin_report_id = recorder
			.get_crash_reports()
			.await
			.iter()
			.find(|r| r.message == "admin fault")
			.unwrap()
			.id;
		recorder.mark_crash_resolved(admin_report_id).await;

		let stats = recorder.get_crash_stats().await;
		assert_eq!(stats.total_crashes, 3);
		assert_eq!(stats.resolved_crashes, 1);
		assert_eq!(stats.admin_crashes, 1);
		assert_eq!(stats.member_crashes, 2);
	}

	#[tokio::test]
	async fn screen_setter_debounces_same_value() {
		let recorder = recorder_over(Arc::new(MemoryStore::new()));

		recorder.set_current_screen("EventDetails");
		recorder.set_current_screen("EventDetails");
		assert_eq!(recorder.inner.screen_changes.load(Ordering::SeqCst), 1);

		recorder.set_current_screen("AdminDashboard");
		assert_eq!(recorder.inner.screen_changes.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn unset_screen_reports_unknown() {
		let recorder = recorder_over(Arc::new(MemoryStore::new()));
		recorder.handle_native_fault("fault").await;

		let reports = recorder.get_crash_reports().await;
		assert_eq!(reports[0].screen, UNKNOWN_SCREEN);
	}

	#[tokio::test]
	async fn initialize_loads_persisted_reports() {
		let store = Arc::new(MemoryStore::new());

		let first = recorder_over(Arc::clone(&store));
		first.handle_native_fault("persisted fault").await;

		let second = recorder_over(Arc::clone(&store));
		second.initialize(&StaticErrorSource::new()).await;

		let reports = second.get_crash_reports().await;
		assert_eq!(reports.len(), 1);
		assert_eq!(reports[0].message, "persisted fault");
	}

	#[tokio::test]
	async fn initialize_survives_corrupt_data() {
		let store = Arc::new(MemoryStore::new());
		store.set(STORAGE_KEY, "not json at all").await.unwrap();

		let recorder = recorder_over(Arc::clone(&store));
		recorder.initialize(&StaticErrorSource::new()).await;

		assert!(recorder.get_crash_reports().await.is_empty());
	}

	#[tokio::test]
	async fn initialize_is_idempotent() {
		use std::sync::atomic::AtomicU32;

		#[derive(Default)]
		struct CountingSource {
			registrations: AtomicU32,
		}

		impl ErrorSource for CountingSource {
			fn on_script_error(&self, _handler: crate::source::ScriptErrorHandler) -> Result<()> {
				self.registrations.fetch_add(1, Ordering::SeqCst);
				Ok(())
			}

			fn on_native_fault(&self, _handler: crate::source::NativeFaultHandler) -> Result<()> {
				self.registrations.fetch_add(1, Ordering::SeqCst);
				Ok(())
			}

			fn on_unhandled_rejection(
				&self,
				_handler: crate::source::RejectionHandler,
			) -> Result<()> {
				self.registrations.fetch_add(1, Ordering::SeqCst);
				Ok(())
			}
		}

		let source = CountingSource::default();
		let recorder = recorder_over(Arc::new(MemoryStore::new()));

		recorder.initialize(&source).await;
		recorder.initialize(&source).await;

		assert_eq!(source.registrations.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn initialize_swallows_registration_failure() {
		struct RefusingSource;

		impl ErrorSource for RefusingSource {
			fn on_script_error(&self, _handler: crate::source::ScriptErrorHandler) -> Result<()> {
				Err(RecorderError::HookRegistration("no hooks here".to_string()))
			}

			fn on_native_fault(&self, _handler: crate::source::NativeFaultHandler) -> Result<()> {
				Err(RecorderError::HookRegistration("no hooks here".to_string()))
			}

			fn on_unhandled_rejection(
				&self,
				_handler: crate::source::RejectionHandler,
			) -> Result<()> {
				Err(RecorderError::HookRegistration("no hooks here".to_string()))
			}
		}

		let recorder = recorder_over(Arc::new(MemoryStore::new()));
		recorder.initialize(&RefusingSource).await;

		// Still usable.
		recorder.handle_native_fault("fault").await;
		assert_eq!(recorder.get_crash_reports().await.len(), 1);
	}

	#[tokio::test(flavor = "multi_thread")]
	async fn registered_hooks_route_into_capture_paths() {
		let recorder = recorder_over(Arc::new(MemoryStore::new()));
		let source = StaticErrorSource::new();
		recorder.initialize(&source).await;
		assert!(source.fully_registered());

		source.fire_script_error(script_error("from hook"), true);
		source.fire_native_fault("SIGSEGV");
		source.fire_unhandled_rejection(CapturedError::opaque("rejected future"));

		// Hook callbacks dispatch onto the runtime; give them a moment.
		for _ in 0..50 {
			if recorder.get_crash_reports().await.len() == 3 {
				break;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}

		let reports = recorder.get_crash_reports().await;
		assert_eq!(reports.len(), 3);

		let kinds: HashSet<_> = reports.iter().map(|r| r.kind).collect();
		assert!(kinds.contains(&CrashKind::ScriptError));
		assert!(kinds.contains(&CrashKind::NativeFault));
		assert!(kinds.contains(&CrashKind::UnhandledRejection));
	}

	#[tokio::test]
	async fn manual_report_carries_caller_context() {
		let recorder = recorder_over(Arc::new(MemoryStore::new()));

		recorder
			.report_error(
				CapturedError::structured("sync failed", None),
				Some(serde_json::json!({ "operation": "refresh_events" })),
			)
			.await;

		let reports = recorder.get_crash_reports().await;
		assert_eq!(reports[0].kind, CrashKind::ManualReport);
		assert_eq!(reports[0].metadata["manual"], true);
		assert_eq!(reports[0].metadata["context"]["operation"], "refresh_events");
	}

	#[tokio::test]
	async fn slow_store_does_not_wedge_captures() {
		struct StalledStore;

		#[async_trait::async_trait]
		impl CrashStore for StalledStore {
			async fn get(&self, _key: &str) -> Result<Option<String>> {
				std::future::pending().await
			}

			async fn set(&self, _key: &str, _value: &str) -> Result<()> {
				std::future::pending().await
			}

			async fn delete(&self, _key: &str) -> Result<()> {
				std::future::pending().await
			}
		}

		let recorder = CrashRecorder::builder()
			.app_version("1.0.0")
			.platform("mobile")
			.store(Arc::new(StalledStore))
			.storage_timeout(Duration::from_millis(50))
			.build()
			.unwrap();

		recorder.initialize(&StaticErrorSource::new()).await;
		recorder.handle_native_fault("fault").await;

		// The write timed out but the capture is in the working set.
		assert_eq!(recorder.get_crash_reports().await.len(), 1);
	}
}
