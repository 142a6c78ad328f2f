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

//! # Datavault
//!
//! A Rust library for reading and writing versioned tabular datasets across
//! local and cloud object storage.
//!
//! Datavault connects pipeline code to one physical storage location and one
//! file format. A dataset is addressed by a protocol-qualified URL
//! (`file://`, `s3://`, `abfss://`, `gs://`, `hdfs://`) and a format name
//! (`csv`, `json`, `parquet`). When versioning is enabled, every save lands
//! in a fresh timestamped sub-directory under the configured path, and loads
//! resolve to the most recent snapshot:
//!
//! ```text
//! <base_path>/test.csv                                     # unversioned
//! <base_path>/test.csv/2024-07-01T12.30.00.000Z/test.csv   # versioned
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datavault::{TableDataset, Version};
//!
//! # async fn example(table: datavault::Table) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let mut dataset = TableDataset::builder("/tmp/data/reviews.csv", "csv")
//!     .with_version(Version::default())
//!     .with_save_option("has_header", "true")
//!     .build()
//!     .await?;
//!
//! dataset.save(&table).await?;
//! let reloaded = dataset.load().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### AWS S3 Example
//!
//! ```rust,no_run
//! use datavault::TableDataset;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let mut dataset = TableDataset::builder("s3://my-bucket/models/scores.parquet", "parquet")
//!     .with_storage_option("region", "us-east-1")
//!     .with_storage_option("access_key_id", "ACCESS_KEY")
//!     .with_storage_option("secret_access_key", "SECRET_KEY")
//!     .build()
//!     .await?;
//!
//! let table = dataset.load().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`dataset`] - The generic versioned dataset and its error taxonomy
//! - [`version`] - Timestamped version resolution with per-instance caching
//! - [`format`] - The closed registry of table codecs (CSV, JSON, Parquet)
//! - [`storage`] - Cloud storage abstraction layer
//! - [`table`] - The in-memory Arrow table exchanged with codecs

pub mod dataset;
pub mod format;
pub mod storage;
pub mod table;
pub mod version;

// Re-export commonly used types
pub use dataset::{DatasetError, TableDataset};
pub use format::{FormatRegistry, TableFormat};
pub use storage::StorageConfig;
pub use table::Table;
pub use version::Version;
