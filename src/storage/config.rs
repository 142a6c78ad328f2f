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

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

use super::error::{StorageError, StorageResult};

/// Storage provider type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Local filesystem storage
    Local,
    /// AWS S3 storage
    Aws,
    /// Azure Data Lake Storage
    Azure,
    /// Google Cloud Storage
    Gcs,
    /// HDFS storage
    Hdfs,
}

impl StorageType {
    /// Canonical protocol scheme for this storage type, as it appears in
    /// dataset URLs and diagnostic messages.
    pub fn protocol(&self) -> &'static str {
        match self {
            StorageType::Local => "file",
            StorageType::Aws => "s3",
            StorageType::Azure => "abfss",
            StorageType::Gcs => "gs",
            StorageType::Hdfs => "hdfs",
        }
    }
}

/// Generic configuration for storage providers using object_store
///
/// This configuration uses a HashMap to store provider-specific options,
/// which are passed directly to the object_store builders. Credentials,
/// timeouts, and retry settings all travel through the same map.
///
/// # Examples
///
/// ## Local filesystem
/// ```
/// use datavault::storage::StorageConfig;
///
/// let config = StorageConfig::local();
/// ```
///
/// ## AWS S3
/// ```
/// use datavault::storage::StorageConfig;
///
/// let config = StorageConfig::aws()
///     .with_option("bucket", "my-bucket")
///     .with_option("region", "us-east-1")
///     .with_option("access_key_id", "ACCESS_KEY")
///     .with_option("secret_access_key", "SECRET_ACCESS_KEY");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage provider type
    #[serde(rename = "type")]
    pub storage_type: StorageType,

    /// Provider-specific configuration options
    ///
    /// Common options include:
    ///
    /// AWS S3:
    /// - bucket, region, access_key_id, secret_access_key, session_token,
    ///   endpoint, allow_http
    ///
    /// Azure:
    /// - container, account_name, access_key, sas_token, tenant_id,
    ///   client_id, client_secret
    ///
    /// GCS:
    /// - bucket, service_account_key_path, service_account_key
    ///
    /// HDFS:
    /// - url (e.g. "hdfs://namenode:8020")
    ///
    /// Local:
    /// - path: optional base directory; when absent, paths are resolved
    ///   from the filesystem root
    ///
    /// All providers:
    /// - timeout, connect_timeout, max_retries, retry_timeout,
    ///   pool_idle_timeout, pool_max_idle_per_host
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl StorageConfig {
    /// Create a new storage configuration for the given provider type string
    /// ("local", "aws"/"s3", "azure", "gcs"/"gcp", "hdfs").
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigError` for an unknown provider type.
    pub fn new(storage_type: impl Into<String>) -> StorageResult<Self> {
        let storage_type_str = storage_type.into();
        let storage_type = match storage_type_str.to_lowercase().as_str() {
            "local" | "file" => StorageType::Local,
            "aws" | "s3" => StorageType::Aws,
            "azure" | "abfs" | "abfss" => StorageType::Azure,
            "gcs" | "gcp" | "gs" => StorageType::Gcs,
            "hdfs" => StorageType::Hdfs,
            _ => {
                return Err(StorageError::ConfigError(format!(
                    "Unknown storage type: {storage_type_str}"
                )))
            }
        };

        Ok(Self {
            storage_type,
            options: Self::default_options(),
        })
    }

    /// Create a local filesystem storage configuration.
    pub fn local() -> Self {
        Self {
            storage_type: StorageType::Local,
            options: Self::default_options(),
        }
    }

    /// Create an AWS S3 storage configuration.
    pub fn aws() -> Self {
        Self {
            storage_type: StorageType::Aws,
            options: Self::default_options(),
        }
    }

    /// Create an Azure storage configuration.
    pub fn azure() -> Self {
        Self {
            storage_type: StorageType::Azure,
            options: Self::default_options(),
        }
    }

    /// Create a GCS storage configuration.
    pub fn gcs() -> Self {
        Self {
            storage_type: StorageType::Gcs,
            options: Self::default_options(),
        }
    }

    /// Create an HDFS storage configuration.
    pub fn hdfs() -> Self {
        Self {
            storage_type: StorageType::Hdfs,
            options: Self::default_options(),
        }
    }

    /// Resolve a protocol-qualified dataset URL into a storage configuration
    /// and a store-relative path.
    ///
    /// The protocol is taken from the `<protocol>://` prefix; a bare path or
    /// a `file://` URL maps to local storage. For bucketed backends the
    /// authority becomes the `bucket`/`container` option, so the returned
    /// path is always relative to the store root.
    ///
    /// # Arguments
    ///
    /// * `location` - Dataset URL, e.g. `s3://bucket/data/test.csv`,
    ///   `abfss://container@account.dfs.core.windows.net/data/test.csv`,
    ///   `file:///tmp/test.csv` or `/tmp/test.csv`
    ///
    /// # Returns
    ///
    /// A tuple of the resolved `StorageConfig` and the path within the store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the URL cannot be parsed or the scheme is
    /// not a supported protocol.
    pub fn from_url(location: &str) -> StorageResult<(Self, String)> {
        // Bare paths have no scheme and always mean local storage.
        if !location.contains("://") {
            return Ok((Self::local(), location.trim_start_matches('/').to_string()));
        }

        let url = Url::parse(location)?;
        let rel_path = url.path().trim_start_matches('/').to_string();

        match url.scheme() {
            "file" => Ok((Self::local(), rel_path)),
            "s3" | "s3a" => {
                let bucket = url.host_str().ok_or_else(|| {
                    StorageError::ConfigError(format!("S3 URL has no bucket: {location}"))
                })?;
                Ok((Self::aws().with_option("bucket", bucket), rel_path))
            }
            "gs" | "gcs" => {
                let bucket = url.host_str().ok_or_else(|| {
                    StorageError::ConfigError(format!("GCS URL has no bucket: {location}"))
                })?;
                Ok((Self::gcs().with_option("bucket", bucket), rel_path))
            }
            "abfs" | "abfss" => {
                // abfss://<container>@<account>.dfs.core.windows.net/<path>
                let mut config = Self::azure();
                if !url.username().is_empty() {
                    config = config.with_option("container", url.username());
                    let host = url.host_str().ok_or_else(|| {
                        StorageError::ConfigError(format!(
                            "Azure URL has no account host: {location}"
                        ))
                    })?;
                    if let Some(account) = host.split('.').next() {
                        config = config.with_option("account_name", account);
                    }
                } else {
                    let container = url.host_str().ok_or_else(|| {
                        StorageError::ConfigError(format!(
                            "Azure URL has no container: {location}"
                        ))
                    })?;
                    config = config.with_option("container", container);
                }
                Ok((config, rel_path))
            }
            "hdfs" => {
                let host = url.host_str().ok_or_else(|| {
                    StorageError::ConfigError(format!("HDFS URL has no namenode: {location}"))
                })?;
                let namenode = match url.port() {
                    Some(port) => format!("hdfs://{host}:{port}"),
                    None => format!("hdfs://{host}"),
                };
                Ok((Self::hdfs().with_option("url", namenode), rel_path))
            }
            other => Err(StorageError::ConfigError(format!(
                "Unsupported protocol '{other}' in URL: {location}"
            ))),
        }
    }

    /// Get default options for all storage types.
    pub fn default_options() -> HashMap<String, String> {
        [
            ("timeout", "1200"),
            ("connect_timeout", "30"),
            ("max_retries", "20"),
            ("retry_timeout", "1200"),
            ("pool_idle_timeout", "15"),
            ("pool_max_idle_per_host", "5"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Add a configuration option (for method chaining).
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add multiple configuration options (for method chaining).
    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    /// Get a configuration option.
    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.options.get(key)
    }

    /// Get the storage type as a string.
    pub fn storage_type_str(&self) -> &str {
        match self.storage_type {
            StorageType::Local => "local",
            StorageType::Aws => "aws",
            StorageType::Azure => "azure",
            StorageType::Gcs => "gcs",
            StorageType::Hdfs => "hdfs",
        }
    }
}
