// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! On-device crash recorder for the Muster client.
//!
//! One [`CrashRecorder`] exists per process. It is wired to the host
//! runtime's uncaught-error hooks at startup, snapshots the acting user and
//! active screen as the session moves, and mirrors a capped working set of
//! crash reports into durable key-value storage. The presentation layer
//! reads the set and its statistics, resolves individual reports, and clears
//! them.
//!
//! The recorder is a best-effort subsystem: a failure while recording a
//! failure is logged and swallowed, never re-raised. Guards on the
//! synchronous capture path (a reentrancy latch and a sliding-window circuit
//! breaker) keep a bug in the recorder's own persistence from feeding back
//! into capture.

pub mod capture;
pub mod error;
mod guard;
pub mod recorder;
pub mod source;
pub mod store;

pub use capture::CapturedError;
pub use error::{RecorderError, Result};
pub use recorder::{CrashRecorder, CrashRecorderBuilder, RecorderConfig};
pub use source::{
	ErrorSource, NativeFaultHandler, RejectionHandler, ScriptErrorHandler, StaticErrorSource,
};
pub use store::{CrashStore, FileStore, MemoryStore};

pub use muster_crash_core::{
	Actor, ActorRole, CrashKind, CrashReport, CrashReportId, CrashStats,
};
