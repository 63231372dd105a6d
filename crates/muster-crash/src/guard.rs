// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reentrancy and flood guards for the synchronous capture path.
//!
//! An error raised while persisting an error report must not recursively
//! trigger another capture, and an error storm must not translate into
//! unbounded storage I/O. Both guards live here so the capture path asks a
//! single question before doing any work.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Outcome of asking the guard whether a capture may proceed.
#[derive(Debug)]
pub enum Admission<'a> {
	/// Proceed. Dropping the permit releases the in-progress latch.
	Admitted(HandlingPermit<'a>),
	/// A capture is already in progress; this one is dropped, not queued.
	DroppedReentrant,
	/// Too many captures inside the sliding window.
	DroppedFlooded,
}

/// Releases the "currently handling" latch when the capture finishes.
#[derive(Debug)]
pub struct HandlingPermit<'a> {
	guard: &'a FloodGuard,
}

impl Drop for HandlingPermit<'_> {
	fn drop(&mut self) {
		self.guard.handling.store(false, Ordering::SeqCst);
	}
}

/// Combined reentrancy latch and sliding-window circuit breaker.
#[derive(Debug)]
pub struct FloodGuard {
	handling: AtomicBool,
	window: Duration,
	max_in_window: usize,
	admitted_at: Mutex<VecDeque<Instant>>,
}

impl FloodGuard {
	#[must_use]
	pub fn new(window: Duration, max_in_window: usize) -> Self {
		Self {
			handling: AtomicBool::new(false),
			window,
			max_in_window,
			admitted_at: Mutex::new(VecDeque::new()),
		}
	}

	/// Asks for admission of one capture.
	///
	/// The reentrancy latch is checked first: if a capture is already in
	/// flight the call is rejected outright. Otherwise admission times older
	/// than the window are expired and the breaker trips once the window
	/// already holds `max_in_window` captures.
	pub fn admit(&self) -> Admission<'_> {
		if self
			.handling
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			return Admission::DroppedReentrant;
		}

		let now = Instant::now();
		let mut admitted_at = self
			.admitted_at
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner());

		while let Some(front) = admitted_at.front() {
			if now.duration_since(*front) > self.window {
				admitted_at.pop_front();
			} else {
				break;
			}
		}

		if admitted_at.len() >= self.max_in_window {
			self.handling.store(false, Ordering::SeqCst);
			return Admission::DroppedFlooded;
		}

		admitted_at.push_back(now);
		Admission::Admitted(HandlingPermit { guard: self })
	}
}
