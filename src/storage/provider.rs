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

use async_trait::async_trait;
use object_store::path::Path as ObjectPath;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use super::error::StorageResult;

/// Generic trait for storage providers
///
/// This trait provides the narrow surface datasets need from a storage
/// backend (AWS S3, Azure Data Lake, GCS, HDFS, local filesystem): existence
/// checks, shallow directory listing, byte-level read/write, and listing
/// cache invalidation. All paths are relative to the store root configured
/// at construction time.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Get the base path/prefix for this storage provider.
    fn base_path(&self) -> &str;

    /// Get the protocol scheme of this provider ("file", "s3", ...).
    fn protocol(&self) -> &str;

    /// Check if a file exists at the given path.
    ///
    /// # Errors
    ///
    /// This function will return an error if the existence check fails for a
    /// reason other than NotFound (network errors, permission denied).
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// List the names of the immediate children of a directory.
    ///
    /// Both sub-directories and files are returned, by their final path
    /// component only. Results are cached per provider instance until
    /// [`StorageProvider::invalidate_cache`] is called for the directory,
    /// so repeated listings within one run see a consistent view.
    ///
    /// # Errors
    ///
    /// This function will return an error if the listing fails; a missing
    /// directory yields an empty list, not an error.
    async fn ls(&self, directory: &str) -> StorageResult<Vec<String>>;

    /// Drop any cached listings at or below the given path.
    fn invalidate_cache(&self, path: &str);

    /// Read the contents of a file.
    ///
    /// # Errors
    ///
    /// This function will return an error if the file does not exist or
    /// cannot be read.
    async fn read_file(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Write a file, creating parent directories as needed and replacing any
    /// existing object at the path.
    ///
    /// # Errors
    ///
    /// This function will return an error if the write fails.
    async fn write_file(&self, path: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Get a full provider-specific URL for a path
    /// (e.g. "s3://bucket/path", "file:///path").
    fn uri_from_path(&self, path: &str) -> String;
}

impl Debug for dyn StorageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "StorageProvider(protocol={}, base_path={})",
            self.protocol(),
            self.base_path()
        )
    }
}

/// Helper function to create an ObjectPath from a string
pub(crate) fn string_to_path(s: &str) -> ObjectPath {
    ObjectPath::from(s)
}
