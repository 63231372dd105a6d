// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Actor snapshot types (the authenticated user at capture time).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CrashError;

/// Role of the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
	Admin,
	Member,
}

impl fmt::Display for ActorRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Admin => write!(f, "admin"),
			Self::Member => write!(f, "member"),
		}
	}
}

impl FromStr for ActorRole {
	type Err = CrashError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"admin" => Ok(Self::Admin),
			"member" => Ok(Self::Member),
			_ => Err(CrashError::InvalidActorRole(s.to_string())),
		}
	}
}

/// Snapshot of the acting user, pushed by the identity provider whenever the
/// session changes. The recorder stores it as-is; no validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
	pub id: String,
	pub role: ActorRole,
}

impl Actor {
	#[must_use]
	pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
		Self {
			id: id.into(),
			role,
		}
	}
}
