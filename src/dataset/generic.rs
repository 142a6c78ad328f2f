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

//! Format-agnostic tabular dataset.
//!
//! A [`TableDataset`] addresses one file (or, when versioned, one family of
//! timestamped copies of that file) on any supported storage backend.
//! Versioned data is laid out as
//! `<filepath>/<version>/<basename>`, e.g.
//! `data/test.csv/2024-07-01T12.30.00.000Z/test.csv`, so every save creates
//! a new immutable copy and loads pick the latest one by name order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::error::{DatasetError, DatasetResult};
use crate::format::{FormatError, FormatOptions, FormatRegistry, TableFormat};
use crate::storage::{StorageConfig, StorageError, StorageProvider, StorageProviderFactory};
use crate::table::Table;
use crate::version::{Version, VersionResolver};

/// A dataset holding a single table in a configurable file format.
///
/// Construct one through [`TableDataset::builder`]. All I/O goes through an
/// internal [`StorageProvider`], so the same dataset code serves local
/// disk, S3, Azure, GCS and HDFS locations.
pub struct TableDataset {
    description: String,
    filepath: String,
    basename: String,
    parent: String,
    format: String,
    provider: Arc<dyn StorageProvider>,
    registry: Arc<FormatRegistry>,
    resolver: Option<VersionResolver>,
    load_options: FormatOptions,
    save_options: FormatOptions,
}

/// Builder for [`TableDataset`]
pub struct TableDatasetBuilder {
    location: String,
    format: String,
    version: Option<Version>,
    load_options: FormatOptions,
    save_options: FormatOptions,
    storage_options: HashMap<String, String>,
    registry: Option<FormatRegistry>,
}

impl TableDatasetBuilder {
    /// Pin load and/or save versions; presence of a version (even an empty
    /// one) turns versioning on.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Add a codec option applied when decoding on load.
    pub fn with_load_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.load_options.insert(key.into(), value.into());
        self
    }

    /// Add a codec option applied when encoding on save.
    pub fn with_save_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.save_options.insert(key.into(), value.into());
        self
    }

    /// Add a storage option (credentials, region, timeouts) passed through
    /// to the backend builder.
    pub fn with_storage_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.storage_options.insert(key.into(), value.into());
        self
    }

    /// Replace the default format registry.
    pub fn with_registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Construct the dataset, creating its storage provider.
    ///
    /// # Errors
    ///
    /// This function will return an error if the format cannot target a
    /// file path, the URL cannot be parsed, or the storage provider cannot
    /// be initialized.
    pub async fn build(self) -> DatasetResult<TableDataset> {
        let registry = Arc::new(self.registry.unwrap_or_default());
        ensure_filepath_target(&registry, &self.format)?;

        let (config, filepath) = StorageConfig::from_url(&self.location)
            .map_err(|err| DatasetError::Configuration(err.to_string()))?;
        if filepath.is_empty() {
            return Err(DatasetError::Configuration(format!(
                "URL '{}' has no file path",
                self.location
            )));
        }
        let config = config.with_options(self.storage_options);
        let provider = StorageProviderFactory::from_config(config)
            .await
            .map_err(|err| DatasetError::Configuration(err.to_string()))?;

        let basename = filepath
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let parent = filepath
            .rsplit_once('/')
            .map(|(parent, _)| parent.to_string())
            .unwrap_or_default();

        let description = match &self.version {
            Some(version) => format!(
                "TableDataset(filepath={}, format={}, protocol={}, version={})",
                provider.uri_from_path(&filepath),
                self.format,
                provider.protocol(),
                version
            ),
            None => format!(
                "TableDataset(filepath={}, format={}, protocol={})",
                provider.uri_from_path(&filepath),
                self.format,
                provider.protocol()
            ),
        };

        let resolver = self.version.map(|version| {
            VersionResolver::new(provider.clone(), filepath.clone(), version, description.clone())
        });

        Ok(TableDataset {
            description,
            filepath,
            basename,
            parent,
            format: self.format,
            provider,
            registry,
            resolver,
            load_options: self.load_options,
            save_options: self.save_options,
        })
    }
}

impl TableDataset {
    /// Start building a dataset at `location` (a bare path or a
    /// `file://`/`s3://`/`abfss://`/`gs://`/`hdfs://` URL) holding data in
    /// the named format.
    pub fn builder(location: impl Into<String>, format: impl Into<String>) -> TableDatasetBuilder {
        TableDatasetBuilder {
            location: location.into(),
            format: format.into(),
            version: None,
            load_options: FormatOptions::new(),
            save_options: FormatOptions::new(),
            storage_options: HashMap::new(),
            registry: None,
        }
    }

    /// Load the table from storage.
    ///
    /// For versioned datasets this reads the pinned load version, or the
    /// latest existing version when no pin was given.
    ///
    /// # Errors
    ///
    /// This function will return an error if no version exists, the read
    /// fails, or the payload cannot be decoded.
    pub async fn load(&mut self) -> DatasetResult<Table> {
        ensure_filepath_target(&self.registry, &self.format)?;
        let codec = self.codec()?;
        let path = self.load_path().await?;

        debug!("Loading {} from '{}'", self.description, path);
        let description = self.description.clone();
        let bytes = self
            .provider
            .read_file(&path)
            .await
            .map_err(|source| storage_error(&description, "load", source))?;
        codec
            .decode(&bytes, &self.load_options)
            .map_err(|source| format_error(&description, "load", source))
    }

    /// Save the table to storage.
    ///
    /// A versioned save writes to `<filepath>/<version>/<basename>` and
    /// refuses to touch a path that already holds data; afterwards the
    /// listing cache for the dataset path is invalidated so the new version
    /// is visible to fresh resolutions.
    ///
    /// # Errors
    ///
    /// This function will return an error if encoding fails, the write
    /// fails, or a versioned save would overwrite existing data.
    pub async fn save(&mut self, table: &Table) -> DatasetResult<()> {
        ensure_filepath_target(&self.registry, &self.format)?;
        let codec = self.codec()?;

        let pending_version = self.resolver.as_mut().map(VersionResolver::resolve_save_version);
        let save_path = match &pending_version {
            Some(version) => {
                self.check_save_target(version).await?;
                versioned_path(&self.filepath, version, &self.basename)
            }
            None => self.filepath.clone(),
        };

        let bytes = codec
            .encode(table, &self.save_options)
            .map_err(|source| format_error(&self.description, "save", source))?;

        debug!("Saving {} to '{}'", self.description, save_path);
        let description = self.description.clone();
        self.provider
            .write_file(&save_path, bytes)
            .await
            .map_err(|source| storage_error(&description, "save", source))?;

        if pending_version.is_some() {
            self.provider.invalidate_cache(&self.filepath);
            self.check_version_consistency().await?;
        }
        Ok(())
    }

    /// Whether the data this dataset would load actually exists.
    ///
    /// A versioned dataset with no versions yet reports `false` rather
    /// than failing.
    ///
    /// # Errors
    ///
    /// This function will return an error if storage cannot be queried.
    pub async fn exists(&mut self) -> DatasetResult<bool> {
        let path = match self.load_path().await {
            Ok(path) => path,
            Err(DatasetError::VersionNotFound { .. }) => return Ok(false),
            Err(err) => return Err(err),
        };
        let description = self.description.clone();
        self.provider
            .exists(&path)
            .await
            .map_err(|source| storage_error(&description, "exists", source))
    }

    /// Forget resolved versions and cached listings for this instance so
    /// the next operation observes storage afresh. Other instances over the
    /// same path are unaffected.
    pub fn release(&mut self) {
        match &mut self.resolver {
            Some(resolver) => resolver.release(),
            None => self.provider.invalidate_cache(&self.filepath),
        }
    }

    /// Resolve the version a load would read; `None` when unversioned.
    ///
    /// # Errors
    ///
    /// This function will return an error if no version exists or the
    /// listing fails.
    pub async fn resolve_load_version(&mut self) -> DatasetResult<Option<String>> {
        match &mut self.resolver {
            Some(resolver) => Ok(Some(resolver.resolve_load_version().await?)),
            None => Ok(None),
        }
    }

    /// Resolve the version a save would write; `None` when unversioned.
    pub fn resolve_save_version(&mut self) -> Option<String> {
        self.resolver.as_mut().map(VersionResolver::resolve_save_version)
    }

    /// Number of resolved versions currently cached (0 to 2; always 0 for
    /// unversioned datasets).
    pub fn version_cache_len(&self) -> usize {
        self.resolver.as_ref().map_or(0, VersionResolver::cached_len)
    }

    /// The store-relative path of this dataset.
    pub fn filepath(&self) -> &str {
        &self.filepath
    }

    /// The configured format name.
    pub fn format_name(&self) -> &str {
        &self.format
    }

    /// The storage protocol this dataset resolved to.
    pub fn protocol(&self) -> &str {
        self.provider.protocol()
    }

    fn codec(&self) -> DatasetResult<Arc<dyn TableFormat>> {
        self.registry
            .get(&self.format)
            .ok_or_else(|| DatasetError::UnknownFormat {
                format: self.format.clone(),
                registered: self.registry.registered_names().join(", "),
            })
    }

    async fn load_path(&mut self) -> DatasetResult<String> {
        match &mut self.resolver {
            Some(resolver) => {
                let version = resolver.resolve_load_version().await?;
                Ok(versioned_path(&self.filepath, &version, &self.basename))
            }
            None => Ok(self.filepath.clone()),
        }
    }

    /// Reject versioned saves that would collide with existing data: a
    /// plain file sitting at the dataset path, or an already-written
    /// version directory.
    async fn check_save_target(&self, version: &str) -> DatasetResult<()> {
        let base_taken = self
            .provider
            .exists(&self.filepath)
            .await
            .map_err(|source| storage_error(&self.description, "save", source))?;
        if base_taken {
            return Err(DatasetError::VersionedConflict {
                name: self.basename.clone(),
                directory: self.provider.uri_from_path(&self.parent),
            });
        }

        let save_path = versioned_path(&self.filepath, version, &self.basename);
        let taken = self
            .provider
            .exists(&save_path)
            .await
            .map_err(|source| storage_error(&self.description, "save", source))?;
        if taken {
            return Err(DatasetError::Overwrite {
                path: self.provider.uri_from_path(&save_path),
                dataset: self.description.clone(),
            });
        }
        Ok(())
    }

    /// After a versioned save, resolve what a load would now read and warn
    /// on divergence. Advisory only; pinned versions make this legitimate.
    async fn check_version_consistency(&mut self) -> DatasetResult<()> {
        let Some(resolver) = &mut self.resolver else {
            return Ok(());
        };
        let save_version = resolver.resolve_save_version();
        let load_version = resolver.resolve_load_version().await?;
        if load_version != save_version {
            warn!(
                "Save version '{}' did not match load version '{}' for {}",
                save_version, load_version, self.description
            );
        }
        Ok(())
    }
}

impl fmt::Display for TableDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl fmt::Debug for TableDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

fn versioned_path(filepath: &str, version: &str, basename: &str) -> String {
    format!("{filepath}/{version}/{basename}")
}

fn ensure_filepath_target(registry: &FormatRegistry, format: &str) -> DatasetResult<()> {
    if registry.is_non_filepath(format) {
        return Err(DatasetError::Configuration(format!(
            "Cannot create a dataset of file format '{format}' as it \
             does not support a filepath target/source"
        )));
    }
    Ok(())
}

fn storage_error(dataset: &str, operation: &str, source: StorageError) -> DatasetError {
    DatasetError::Storage {
        dataset: dataset.to_string(),
        operation: operation.to_string(),
        source,
    }
}

fn format_error(dataset: &str, operation: &str, source: FormatError) -> DatasetError {
    DatasetError::Format {
        dataset: dataset.to_string(),
        operation: operation.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::sample_table;
    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn table_of(values: &[i64]) -> Table {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, true)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Int64Array::from(values.to_vec()))],
        )
        .unwrap();
        Table::new(schema, vec![batch])
    }

    async fn dataset_at(path: &Path, format: &str) -> TableDataset {
        TableDataset::builder(path.to_str().unwrap(), format)
            .build()
            .await
            .unwrap()
    }

    async fn versioned_dataset_at(path: &Path, format: &str) -> TableDataset {
        TableDataset::builder(path.to_str().unwrap(), format)
            .with_version(Version::default())
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load_unversioned() {
        let tmp = TempDir::new().unwrap();
        let location = tmp.path().join("test.csv");
        let mut dataset = dataset_at(&location, "csv").await;

        assert!(!dataset.exists().await.unwrap());
        let table = sample_table();
        dataset.save(&table).await.unwrap();

        assert!(location.is_file());
        assert!(dataset.exists().await.unwrap());
        assert_eq!(dataset.load().await.unwrap(), table);
        assert_eq!(dataset.version_cache_len(), 0);
    }

    #[tokio::test]
    async fn test_save_and_load_versioned() {
        let tmp = TempDir::new().unwrap();
        let location = tmp.path().join("test.csv");
        let mut dataset = versioned_dataset_at(&location, "csv").await;

        let table = sample_table();
        dataset.save(&table).await.unwrap();

        let version = dataset.resolve_save_version().unwrap();
        assert!(location.join(&version).join("test.csv").is_file());
        assert_eq!(dataset.load().await.unwrap(), table);
    }

    #[tokio::test]
    async fn test_json_dataset_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mut dataset = dataset_at(&tmp.path().join("test.json"), "json").await;
        let table = sample_table();
        dataset.save(&table).await.unwrap();
        assert_eq!(dataset.load().await.unwrap(), table);
    }

    #[tokio::test]
    async fn test_parquet_dataset_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mut dataset = versioned_dataset_at(&tmp.path().join("test.parquet"), "parquet").await;
        let table = sample_table();
        dataset.save(&table).await.unwrap();
        let loaded = dataset.load().await.unwrap();
        assert_eq!(loaded.schema(), table.schema());
        assert_eq!(loaded.num_rows(), table.num_rows());
    }

    #[tokio::test]
    async fn test_resolve_save_version_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mut dataset = versioned_dataset_at(&tmp.path().join("test.csv"), "csv").await;
        let first = dataset.resolve_save_version().unwrap();
        let second = dataset.resolve_save_version().unwrap();
        assert_eq!(first, second);
        assert_eq!(dataset.version_cache_len(), 1);
    }

    #[tokio::test]
    async fn test_load_after_save_sees_saved_version() {
        let tmp = TempDir::new().unwrap();
        let mut dataset = versioned_dataset_at(&tmp.path().join("test.csv"), "csv").await;
        dataset.save(&table_of(&[1, 2, 3])).await.unwrap();
        assert_eq!(
            dataset.resolve_load_version().await.unwrap(),
            dataset.resolve_save_version()
        );
    }

    #[tokio::test]
    async fn test_prevent_overwrite() {
        let tmp = TempDir::new().unwrap();
        let mut dataset = versioned_dataset_at(&tmp.path().join("test.csv"), "csv").await;
        dataset.save(&table_of(&[1])).await.unwrap();

        let err = dataset.save(&table_of(&[2])).await.unwrap_err();
        assert!(matches!(err, DatasetError::Overwrite { .. }));
        assert!(err.to_string().contains("must not exist if versioning is enabled"));
    }

    #[tokio::test]
    async fn test_monotonic_versions_across_release() {
        let tmp = TempDir::new().unwrap();
        let mut dataset = versioned_dataset_at(&tmp.path().join("test.csv"), "csv").await;
        dataset.save(&table_of(&[1])).await.unwrap();
        let first = dataset.resolve_save_version().unwrap();

        dataset.release();
        assert_eq!(dataset.version_cache_len(), 0);
        tokio::time::sleep(Duration::from_millis(25)).await;

        dataset.save(&table_of(&[2])).await.unwrap();
        let second = dataset.resolve_save_version().unwrap();
        assert!(second > first);
        assert_eq!(dataset.load().await.unwrap(), table_of(&[2]));
    }

    #[tokio::test]
    async fn test_load_version_isolated_from_external_saves() {
        let tmp = TempDir::new().unwrap();
        let location = tmp.path().join("test.csv");

        let mut first = versioned_dataset_at(&location, "csv").await;
        first.save(&table_of(&[1])).await.unwrap();
        let pinned = first.resolve_load_version().await.unwrap().unwrap();

        tokio::time::sleep(Duration::from_millis(25)).await;
        let mut second = versioned_dataset_at(&location, "csv").await;
        second.save(&table_of(&[2])).await.unwrap();

        // The first instance keeps reading the version it already resolved.
        assert_eq!(
            first.resolve_load_version().await.unwrap().unwrap(),
            pinned
        );
        assert_eq!(first.load().await.unwrap(), table_of(&[1]));

        // A fresh instance sees the newer version.
        let mut third = versioned_dataset_at(&location, "csv").await;
        assert_eq!(
            third.resolve_load_version().await.unwrap(),
            Some(second.resolve_save_version().unwrap())
        );
        assert_eq!(third.load().await.unwrap(), table_of(&[2]));
    }

    #[tokio::test]
    async fn test_no_versions_found() {
        let tmp = TempDir::new().unwrap();
        let mut dataset = versioned_dataset_at(&tmp.path().join("test.csv"), "csv").await;

        assert!(!dataset.exists().await.unwrap());
        let err = dataset.load().await.unwrap_err();
        assert!(err.to_string().starts_with("Did not find any versions for"));
        assert!(err.to_string().contains("test.csv"));
        assert_eq!(dataset.version_cache_len(), 0);
    }

    #[tokio::test]
    async fn test_versioned_save_conflicts_with_plain_file() {
        let tmp = TempDir::new().unwrap();
        let location = tmp.path().join("test.csv");

        let mut plain = dataset_at(&location, "csv").await;
        plain.save(&table_of(&[1])).await.unwrap();

        let mut versioned = versioned_dataset_at(&location, "csv").await;
        let err = versioned.save(&table_of(&[2])).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("file with the same name already exists in the directory"));

        // Removing the plain file clears the way for versioned saves.
        std::fs::remove_file(&location).unwrap();
        versioned.save(&table_of(&[2])).await.unwrap();
        assert_eq!(versioned.load().await.unwrap(), table_of(&[2]));
    }

    #[tokio::test]
    async fn test_version_cache_bounds() {
        let tmp = TempDir::new().unwrap();
        let location = tmp.path().join("test.csv");

        let mut first = versioned_dataset_at(&location, "csv").await;
        assert_eq!(first.version_cache_len(), 0);
        first.save(&table_of(&[1])).await.unwrap();
        assert_eq!(first.version_cache_len(), 2);

        let mut second = versioned_dataset_at(&location, "csv").await;
        assert_eq!(second.version_cache_len(), 0);
        second.resolve_save_version();
        assert_eq!(second.version_cache_len(), 1);
        second.resolve_load_version().await.unwrap();
        assert_eq!(second.version_cache_len(), 2);

        first.release();
        assert_eq!(first.version_cache_len(), 0);
        assert_eq!(second.version_cache_len(), 2);
    }

    #[tokio::test]
    async fn test_non_filepath_format_rejected() {
        let tmp = TempDir::new().unwrap();
        for format in ["sql", "sql_table", "clipboard", "records", "dict"] {
            let err = TableDataset::builder(tmp.path().join("test.csv").to_str().unwrap(), format)
                .build()
                .await
                .unwrap_err();
            assert!(matches!(err, DatasetError::Configuration(_)));
            assert!(
                err.to_string().contains("does not support a filepath target/source"),
                "unexpected message for {format}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_format() {
        let tmp = TempDir::new().unwrap();
        let mut dataset = dataset_at(&tmp.path().join("test.feather"), "feather").await;
        let err = dataset.load().await.unwrap_err();
        assert!(matches!(err, DatasetError::UnknownFormat { .. }));
        assert!(err.to_string().contains("feather"));
        assert!(err.to_string().contains("csv, json, parquet"));
    }

    #[tokio::test]
    async fn test_mismatched_pinned_versions_save_is_nonfatal() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("datavault=debug")
            .try_init();

        let tmp = TempDir::new().unwrap();
        let version = Version::new(
            Some("2024-01-01T00.00.00.000Z".to_string()),
            Some("2024-06-01T00.00.00.000Z".to_string()),
        );
        let mut dataset =
            TableDataset::builder(tmp.path().join("test.csv").to_str().unwrap(), "csv")
                .with_version(version)
                .build()
                .await
                .unwrap();

        // Diverging pins only log a warning; the save itself succeeds.
        dataset.save(&table_of(&[1])).await.unwrap();
        assert!(tmp
            .path()
            .join("test.csv/2024-06-01T00.00.00.000Z/test.csv")
            .is_file());
    }

    #[tokio::test]
    async fn test_display() {
        let tmp = TempDir::new().unwrap();
        let location = tmp.path().join("test.csv");
        let dataset = dataset_at(&location, "csv").await;
        let text = dataset.to_string();
        assert!(text.starts_with("TableDataset("));
        assert!(text.contains("test.csv"));
        assert!(text.contains("format=csv"));
        assert!(text.contains("protocol=file"));
        assert!(!text.contains("version="));

        let versioned = TableDataset::builder(location.to_str().unwrap(), "csv")
            .with_version(Version::new(None, Some("2024-06-01T00.00.00.000Z".to_string())))
            .build()
            .await
            .unwrap();
        assert!(versioned
            .to_string()
            .contains("version=Version(load=None, save=2024-06-01T00.00.00.000Z)"));
    }

    #[tokio::test]
    async fn test_release_unversioned() {
        let tmp = TempDir::new().unwrap();
        let mut dataset = dataset_at(&tmp.path().join("test.csv"), "csv").await;
        assert_eq!(dataset.resolve_load_version().await.unwrap(), None);
        assert_eq!(dataset.resolve_save_version(), None);
        dataset.release();
        assert_eq!(dataset.version_cache_len(), 0);
    }

    #[tokio::test]
    async fn test_codec_options_flow_through() {
        let tmp = TempDir::new().unwrap();
        let location = tmp.path().join("test.csv");
        let mut dataset = TableDataset::builder(location.to_str().unwrap(), "csv")
            .with_save_option("delimiter", ";")
            .with_load_option("delimiter", ";")
            .build()
            .await
            .unwrap();

        let table = sample_table();
        dataset.save(&table).await.unwrap();
        let raw = std::fs::read_to_string(&location).unwrap();
        assert!(raw.contains("id;name"));
        assert_eq!(dataset.load().await.unwrap(), table);
    }
}
