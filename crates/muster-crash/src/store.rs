// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable key-value storage for crash reports.
//!
//! The recorder owns a single fixed key holding the JSON-serialized working
//! set. Anything that can `get`/`set`/`delete` a string under a key can back
//! it; the trait keeps the recorder testable without touching the filesystem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{RecorderError, Result};

/// Async key-value storage used by the recorder.
#[async_trait]
pub trait CrashStore: Send + Sync {
	async fn get(&self, key: &str) -> Result<Option<String>>;
	async fn set(&self, key: &str, value: &str) -> Result<()>;
	async fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory store.
///
/// Used by tests and short-lived tooling. `fail_next_set` arms a one-shot
/// write failure so guard behavior under storage faults can be exercised.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: RwLock<HashMap<String, String>>,
	fail_next_set: AtomicBool,
}

impl MemoryStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes the next `set` call fail with a storage error.
	pub fn fail_next_set(&self) {
		self.fail_next_set.store(true, Ordering::SeqCst);
	}
}

#[async_trait]
impl CrashStore for MemoryStore {
	async fn get(&self, key: &str) -> Result<Option<String>> {
		Ok(self.entries.read().await.get(key).cloned())
	}

	async fn set(&self, key: &str, value: &str) -> Result<()> {
		if self.fail_next_set.swap(false, Ordering::SeqCst) {
			return Err(RecorderError::Storage("injected write failure".to_string()));
		}
		self
			.entries
			.write()
			.await
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<()> {
		self.entries.write().await.remove(key);
		Ok(())
	}
}

/// File-backed store: one JSON document per key under a state directory.
#[derive(Debug, Clone)]
pub struct FileStore {
	root: PathBuf,
}

impl FileStore {
	/// Creates a store rooted at the given directory.
	#[must_use]
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Creates a store under the muster state directory, resolved from
	/// `XDG_STATE_HOME` with a `~/.local/state` fallback.
	pub fn open_default() -> Result<Self> {
		let state_home = std::env::var_os("XDG_STATE_HOME")
			.map(PathBuf::from)
			.or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
			.ok_or_else(|| RecorderError::Storage("home directory not found".to_string()))?;

		let root = state_home.join("muster");
		debug!(root = %root.display(), "resolved crash store directory");
		Ok(Self::new(root))
	}

	fn path_for(&self, key: &str) -> PathBuf {
		self.root.join(format!("{key}.json"))
	}

	#[must_use]
	pub fn root(&self) -> &Path {
		&self.root
	}
}

#[async_trait]
impl CrashStore for FileStore {
	async fn get(&self, key: &str) -> Result<Option<String>> {
		match tokio::fs::read_to_string(self.path_for(key)).await {
			Ok(contents) => Ok(Some(contents)),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err.into()),
		}
	}

	async fn set(&self, key: &str, value: &str) -> Result<()> {
		tokio::fs::create_dir_all(&self.root).await?;
		tokio::fs::write(self.path_for(key), value).await?;
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<()> {
		match tokio::fs::remove_file(self.path_for(key)).await {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(err) => Err(err.into()),
		}
	}
}
