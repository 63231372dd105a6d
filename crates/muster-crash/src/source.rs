// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The uncaught-error source capability.
//!
//! The recorder never installs global handlers itself. The host runtime
//! exposes whatever hook mechanism it has (exception handler, native fault
//! handler, rejection tracker) behind this trait, and `initialize` registers
//! its callbacks through it. This keeps the recorder testable without a real
//! runtime.
//!
//! Registered handlers dispatch capture work onto the ambient tokio runtime,
//! so hooks must be fired from within a runtime context.

use std::sync::Mutex;

use crate::capture::CapturedError;
use crate::error::Result;

/// Callback for uncaught synchronous script errors, invoked with the error
/// and whether the runtime considers it fatal.
pub type ScriptErrorHandler = Box<dyn Fn(CapturedError, bool) + Send + Sync>;

/// Callback for platform-native faults. Only a string payload is available
/// at this boundary.
pub type NativeFaultHandler = Box<dyn Fn(String) + Send + Sync>;

/// Callback for unhandled asynchronous rejections.
pub type RejectionHandler = Box<dyn Fn(CapturedError) + Send + Sync>;

/// A source of uncaught errors that handlers can be registered with.
pub trait ErrorSource {
	fn on_script_error(&self, handler: ScriptErrorHandler) -> Result<()>;
	fn on_native_fault(&self, handler: NativeFaultHandler) -> Result<()>;
	fn on_unhandled_rejection(&self, handler: RejectionHandler) -> Result<()>;
}

/// An [`ErrorSource`] that stores registered handlers and can fire them on
/// demand. Stands in for the host runtime in tests and examples.
#[derive(Default)]
pub struct StaticErrorSource {
	script_error: Mutex<Option<ScriptErrorHandler>>,
	native_fault: Mutex<Option<NativeFaultHandler>>,
	unhandled_rejection: Mutex<Option<RejectionHandler>>,
}

impl StaticErrorSource {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether all three hooks have been registered.
	#[must_use]
	pub fn fully_registered(&self) -> bool {
		self.script_error.lock().is_ok_and(|h| h.is_some())
			&& self.native_fault.lock().is_ok_and(|h| h.is_some())
			&& self.unhandled_rejection.lock().is_ok_and(|h| h.is_some())
	}

	/// Fires the script error hook, if registered.
	pub fn fire_script_error(&self, error: CapturedError, is_fatal: bool) {
		if let Ok(handler) = self.script_error.lock() {
			if let Some(handler) = handler.as_ref() {
				handler(error, is_fatal);
			}
		}
	}

	/// Fires the native fault hook, if registered.
	pub fn fire_native_fault(&self, payload: impl Into<String>) {
		if let Ok(handler) = self.native_fault.lock() {
			if let Some(handler) = handler.as_ref() {
				handler(payload.into());
			}
		}
	}

	/// Fires the unhandled rejection hook, if registered.
	pub fn fire_unhandled_rejection(&self, reason: CapturedError) {
		if let Ok(handler) = self.unhandled_rejection.lock() {
			if let Some(handler) = handler.as_ref() {
				handler(reason);
			}
		}
	}
}

impl ErrorSource for StaticErrorSource {
	fn on_script_error(&self, handler: ScriptErrorHandler) -> Result<()> {
		if let Ok(mut slot) = self.script_error.lock() {
			*slot = Some(handler);
		}
		Ok(())
	}

	fn on_native_fault(&self, handler: NativeFaultHandler) -> Result<()> {
		if let Ok(mut slot) = self.native_fault.lock() {
			*slot = Some(handler);
		}
		Ok(())
	}

	fn on_unhandled_rejection(&self, handler: RejectionHandler) -> Result<()> {
		if let Ok(mut slot) = self.unhandled_rejection.lock() {
			*slot = Some(handler);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Arc;

	#[test]
	fn handlers_register_and_fire() {
		let source = StaticErrorSource::new();
		assert!(!source.fully_registered());

		let fired = Arc::new(AtomicU32::new(0));

		let count = Arc::clone(&fired);
		source
			.on_script_error(Box::new(move |_, _| {
				count.fetch_add(1, Ordering::SeqCst);
			}))
			.unwrap();

		let count = Arc::clone(&fired);
		source
			.on_native_fault(Box::new(move |_| {
				count.fetch_add(1, Ordering::SeqCst);
			}))
			.unwrap();

		let count = Arc::clone(&fired);
		source
			.on_unhandled_rejection(Box::new(move |_| {
				count.fetch_add(1, Ordering::SeqCst);
			}))
			.unwrap();

		assert!(source.fully_registered());

		source.fire_script_error(CapturedError::structured("boom", None), true);
		source.fire_native_fault("SIGSEGV");
		source.fire_unhandled_rejection(CapturedError::opaque("rejected"));

		assert_eq!(fired.load(Ordering::SeqCst), 3);
	}

	#[test]
	fn firing_without_registration_is_a_noop() {
		let source = StaticErrorSource::new();
		source.fire_script_error(CapturedError::structured("boom", None), false);
		source.fire_native_fault("SIGBUS");
		source.fire_unhandled_rejection(CapturedError::opaque(1));
	}
}
