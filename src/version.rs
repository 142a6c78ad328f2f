// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Version identifiers and resolution
//!
//! Versions are UTC timestamp strings whose lexicographic order equals
//! chronological order, so the latest version of a dataset is simply the
//! maximum directory name under its path. [`VersionResolver`] turns a
//! [`Version`] pin (or the absence of one) into concrete version strings,
//! holding at most one resolved load and one resolved save version per
//! dataset instance.

use crate::dataset::{DatasetError, DatasetResult};
use crate::storage::StorageProvider;
use chrono::{NaiveDateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Version timestamp layout. Dots separate the time fields so the string
/// stays a valid path component on every backend.
pub const VERSION_FORMAT: &str = "%Y-%m-%dT%H.%M.%S.%3fZ";

/// Generate a new version string from the current UTC time.
pub fn generate_version() -> String {
    Utc::now().format(VERSION_FORMAT).to_string()
}

/// Parse a directory name as a version timestamp.
///
/// Returns `None` for names that do not match [`VERSION_FORMAT`]; listing
/// scans use this to skip stray entries next to version directories.
pub fn parse_version(name: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(name, VERSION_FORMAT).ok()
}

/// An explicit version pin for a dataset.
///
/// `None` on either side means "resolve it": pick the latest existing
/// version on load, mint a fresh timestamp on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Version {
    pub load: Option<String>,
    pub save: Option<String>,
}

impl Version {
    pub fn new(load: Option<String>, save: Option<String>) -> Self {
        Self { load, save }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Version(load={}, save={})",
            self.load.as_deref().unwrap_or("None"),
            self.save.as_deref().unwrap_or("None")
        )
    }
}

/// Per-instance resolved versions. At most one load and one save entry.
#[derive(Debug, Default)]
struct VersionCache {
    load: Option<String>,
    save: Option<String>,
}

/// Resolves load and save versions for one versioned dataset instance.
///
/// Resolution is sticky: once a version is resolved it is pinned for the
/// lifetime of the resolver, so a load after a save inside one instance
/// sees the version that save just wrote. [`release`](Self::release) drops
/// the pins and the provider's listing cache for the dataset path, forcing
/// the next resolution to look at storage again. Failed resolutions are
/// never cached.
pub struct VersionResolver {
    provider: Arc<dyn StorageProvider>,
    filepath: String,
    pinned: Version,
    description: String,
    cache: VersionCache,
}

impl VersionResolver {
    pub fn new(
        provider: Arc<dyn StorageProvider>,
        filepath: impl Into<String>,
        pinned: Version,
        description: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            filepath: filepath.into(),
            pinned,
            description: description.into(),
            cache: VersionCache::default(),
        }
    }

    /// Resolve the version a load should read.
    ///
    /// An explicit load pin is returned verbatim without touching storage.
    /// Otherwise the dataset path is listed and the greatest well-formed
    /// version directory wins.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::VersionNotFound`] when no version directories
    /// exist, or [`DatasetError::Storage`] when the listing itself fails.
    pub async fn resolve_load_version(&mut self) -> DatasetResult<String> {
        if let Some(version) = &self.cache.load {
            return Ok(version.clone());
        }

        let version = match &self.pinned.load {
            Some(pinned) => pinned.clone(),
            None => self.latest_version().await?,
        };

        self.cache.load = Some(version.clone());
        Ok(version)
    }

    /// Resolve the version a save should write.
    ///
    /// An explicit save pin wins; otherwise a fresh timestamp is minted
    /// once and reused for the lifetime of this resolver.
    pub fn resolve_save_version(&mut self) -> String {
        if let Some(version) = &self.cache.save {
            return version.clone();
        }

        let version = self
            .pinned
            .save
            .clone()
            .unwrap_or_else(generate_version);
        self.cache.save = Some(version.clone());
        version
    }

    /// Drop both resolved versions and invalidate the provider's listing
    /// cache for the dataset path. Other resolvers are unaffected.
    pub fn release(&mut self) {
        self.cache = VersionCache::default();
        self.provider.invalidate_cache(&self.filepath);
    }

    /// Number of resolved versions currently held (0 to 2).
    pub fn cached_len(&self) -> usize {
        usize::from(self.cache.load.is_some()) + usize::from(self.cache.save.is_some())
    }

    async fn latest_version(&self) -> DatasetResult<String> {
        let entries = self
            .provider
            .ls(&self.filepath)
            .await
            .map_err(|source| DatasetError::Storage {
                dataset: self.description.clone(),
                operation: "version resolution".to_string(),
                source,
            })?;

        entries
            .into_iter()
            .filter(|name| parse_version(name).is_some())
            .max()
            .ok_or_else(|| DatasetError::VersionNotFound {
                dataset: self.description.clone(),
            })
    }
}

impl fmt::Debug for VersionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionResolver")
            .field("filepath", &self.filepath)
            .field("pinned", &self.pinned)
            .field("cache", &self.cache)
            .finish()
    }
}
