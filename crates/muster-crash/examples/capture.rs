// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: drive the crash recorder through each capture path.
//!
//! Run with:
//!   cargo run --example capture -p muster-crash

use std::sync::Arc;
use std::time::Duration;

use muster_crash::{
	Actor, ActorRole, CapturedError, CrashRecorder, MemoryStore, StaticErrorSource,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter("muster_crash=debug")
		.init();

	let store = Arc::new(MemoryStore::new());
	let recorder = CrashRecorder::builder()
		.app_version("1.0.0-example")
		.platform("mobile")
		.store(store)
		.suppress_screen("CrashReports")
		.build()?;

	// Stand-in for the host runtime's hook mechanism.
	let hooks = StaticErrorSource::new();
	recorder.initialize(&hooks).await;

	// Session context, as the identity provider and navigator would push it.
	recorder.set_current_user(Some(Actor::new("member_42", ActorRole::Member)));
	recorder.set_current_screen("EventDetails");

	println!("Firing one capture of each kind...");

	hooks.fire_script_error(
		CapturedError::structured(
			"Cannot read property 'date' of undefined",
			Some("at EventDetails.render".to_string()),
		),
		true,
	);
	hooks.fire_native_fault("SIGSEGV in libmuster.so");
	hooks.fire_unhandled_rejection(CapturedError::opaque("request timed out"));

	// Hook callbacks dispatch asynchronously; let them land.
	tokio::time::sleep(Duration::from_millis(100)).await;

	// A handled failure, reported manually with context.
	recorder
		.report_error(
			CapturedError::structured("payment status fetch failed", None),
			Some(serde_json::json!({ "operation": "load_payments" })),
		)
		.await;

	let stats = recorder.get_crash_stats().await;
	println!("\nCrash stats:");
	println!("  Total:    {}", stats.total_crashes);
	println!("  Resolved: {}", stats.resolved_crashes);
	println!("  Admin:    {}", stats.admin_crashes);
	println!("  Member:   {}", stats.member_crashes);
	for (screen, count) in &stats.crashes_by_screen {
		println!("  {screen}: {count}");
	}

	// Resolve the most recent report and clear the resolved set.
	let newest = stats.recent_crashes[0].id;
	recorder.mark_crash_resolved(newest).await;
	recorder.clear_resolved_crashes().await;

	let remaining = recorder.get_crash_reports().await;
	println!("\nAfter resolving and clearing: {} reports remain", remaining.len());

	Ok(())
}
