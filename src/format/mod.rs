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

//! Table format codecs
//!
//! This module contains the closed registry of file format codecs a dataset
//! can address by name. Each codec turns raw file bytes into a [`Table`] and
//! back; datasets never reach into format libraries directly, they go
//! through [`FormatRegistry`] lookups.
//!
//! ## Supported Formats
//!
//! - [`csv`] - Comma-separated values (arrow-csv)
//! - [`json`] - Line-delimited JSON (arrow-json)
//! - [`parquet`] - Apache Parquet
//!
//! A handful of well-known format names (`sql`, `clipboard`, ...) describe
//! data that lives behind a connection or a buffer rather than a file path;
//! the registry tracks those so datasets can reject them up front.

pub mod csv;
pub mod json;
pub mod parquet;

use crate::table::Table;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

pub use self::csv::CsvFormat;
pub use self::json::JsonFormat;
pub use self::parquet::ParquetFormat;

/// Free-form codec options, carried separately for load and save
/// (e.g. `has_header`, `delimiter`, `compression`).
pub type FormatOptions = HashMap<String, String>;

/// Errors raised by format codecs while encoding or decoding
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value for option '{option}': {message}")]
    InvalidOption { option: String, message: String },
}

/// A file format codec.
///
/// Codecs are synchronous and byte-oriented: the dataset performs storage
/// I/O and hands complete payloads in and out. Implement this trait and
/// register it to add formats beyond the built-ins.
pub trait TableFormat: Send + Sync {
    /// The registry name of this format ("csv", "parquet", ...).
    fn name(&self) -> &str;

    /// Decode file bytes into a table.
    ///
    /// # Errors
    ///
    /// This function will return an error if the payload is malformed for
    /// the format or an option value cannot be interpreted.
    fn decode(&self, data: &[u8], options: &FormatOptions) -> Result<Table, FormatError>;

    /// Encode a table into file bytes.
    ///
    /// # Errors
    ///
    /// This function will return an error if the table cannot be represented
    /// in the format or an option value cannot be interpreted.
    fn encode(&self, table: &Table, options: &FormatOptions) -> Result<Vec<u8>, FormatError>;
}

/// Registry mapping format names to codecs.
///
/// The registry is an explicit, closed mapping: a lookup either yields a
/// codec or a clear miss listing what is registered. It also knows which
/// format names need a non-filepath target (a live connection, a buffer)
/// and therefore can never be served by a file-backed dataset.
#[derive(Clone)]
pub struct FormatRegistry {
    formats: HashMap<String, Arc<dyn TableFormat>>,
    non_filepath: HashSet<String>,
}

/// Format names whose native APIs take a connection, a table name, or a
/// buffer instead of a file path.
const NON_FILEPATH_FORMATS: &[&str] = &["sql", "sql_table", "clipboard", "records", "dict"];

impl FormatRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            formats: HashMap::new(),
            non_filepath: HashSet::new(),
        }
    }

    /// Create a registry populated with the built-in codecs (csv, json,
    /// parquet) and the built-in non-filepath format names.
    pub fn with_builtin_formats() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(CsvFormat));
        registry.register(Arc::new(JsonFormat));
        registry.register(Arc::new(ParquetFormat));
        for name in NON_FILEPATH_FORMATS {
            registry.mark_non_filepath(name);
        }
        registry
    }

    /// Register a codec under its own name, replacing any previous entry.
    pub fn register(&mut self, format: Arc<dyn TableFormat>) {
        self.formats.insert(format.name().to_string(), format);
    }

    /// Mark a format name as requiring a non-filepath target.
    pub fn mark_non_filepath(&mut self, name: &str) {
        self.non_filepath.insert(name.to_string());
    }

    /// Whether the given format name requires a non-filepath target.
    pub fn is_non_filepath(&self, name: &str) -> bool {
        self.non_filepath.contains(name)
    }

    /// Look up a codec by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn TableFormat>> {
        self.formats.get(name).cloned()
    }

    /// Sorted names of all registered codecs, for diagnostics.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_builtin_formats()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FormatRegistry(formats=[{}])",
            self.registered_names().join(", ")
        )
    }
}
