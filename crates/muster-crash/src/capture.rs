// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The shape of a value arriving at a capture boundary.
//!
//! Host runtimes hand the recorder "whatever was thrown": a structured error
//! with a message and maybe a stack trace, or an arbitrary value with only a
//! string rendering. The distinction is decided exactly once, here, so the
//! rest of the pipeline operates on a single well-typed shape.

use std::fmt;

/// A value observed at a capture boundary.
#[derive(Debug, Clone)]
pub enum CapturedError {
	/// An error-shaped value exposing a message and optionally a stack trace.
	Structured {
		message: String,
		stack: Option<String>,
	},
	/// Anything else, reduced to its string rendering.
	Opaque { repr: String },
}

impl CapturedError {
	/// Builds a structured capture from explicit parts.
	#[must_use]
	pub fn structured(message: impl Into<String>, stack: Option<String>) -> Self {
		Self::Structured {
			message: message.into(),
			stack,
		}
	}

	/// Builds an opaque capture from any displayable value.
	#[must_use]
	pub fn opaque(value: impl fmt::Display) -> Self {
		Self::Opaque {
			repr: value.to_string(),
		}
	}

	/// Builds a structured capture from a standard error. The stack is left
	/// empty; host runtimes that have one attach it via [`Self::structured`].
	#[must_use]
	pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
		Self::Structured {
			message: err.to_string(),
			stack: None,
		}
	}

	/// The usable message, if any. Empty strings count as absent.
	#[must_use]
	pub fn message(&self) -> Option<&str> {
		let text = match self {
			Self::Structured { message, .. } => message,
			Self::Opaque { repr } => repr,
		};
		if text.is_empty() {
			None
		} else {
			Some(text)
		}
	}

	/// The stack trace, if the originating value exposed one.
	#[must_use]
	pub fn stack(&self) -> Option<&str> {
		match self {
			Self::Structured { stack, .. } => stack.as_deref().filter(|s| !s.is_empty()),
			Self::Opaque { .. } => None,
		}
	}

	/// Whether there is anything worth recording.
	#[must_use]
	pub fn has_content(&self) -> bool {
		self.message().is_some() || self.stack().is_some()
	}
}
