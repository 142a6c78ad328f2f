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

//! Dataset error types

use crate::format::FormatError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors raised by dataset operations.
///
/// Storage and format failures keep their source error attached and carry
/// the dataset description plus the operation that failed, so a message
/// always says which dataset was being loaded or saved.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The dataset is configured in a way that can never work
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A versioned load found no version directories to pick from
    #[error("Did not find any versions for {dataset}")]
    VersionNotFound { dataset: String },

    /// A versioned save targeted a path that already holds data
    #[error("Save path '{path}' for {dataset} must not exist if versioning is enabled")]
    Overwrite { path: String, dataset: String },

    /// A versioned save collided with a plain, unversioned file
    #[error(
        "Cannot save versioned dataset '{name}' to '{directory}' because a \
         file with the same name already exists in the directory"
    )]
    VersionedConflict { name: String, directory: String },

    /// The configured format name has no registered codec
    #[error("Unknown format '{format}'; registered formats are: {registered}")]
    UnknownFormat { format: String, registered: String },

    /// A storage operation failed
    #[error("Failed during {operation} for {dataset}: {source}")]
    Storage {
        dataset: String,
        operation: String,
        #[source]
        source: StorageError,
    },

    /// A codec failed to encode or decode the payload
    #[error("Failed during {operation} for {dataset}: {source}")]
    Format {
        dataset: String,
        operation: String,
        #[source]
        source: FormatError,
    },
}

pub type DatasetResult<T> = Result<T, DatasetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_not_found_message() {
        let err = DatasetError::VersionNotFound {
            dataset: "TableDataset(filepath=data/test.csv)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Did not find any versions for TableDataset(filepath=data/test.csv)"
        );
    }

    #[test]
    fn test_overwrite_message() {
        let err = DatasetError::Overwrite {
            path: "data/test.csv/2024-01-01T00.00.00.000Z/test.csv".to_string(),
            dataset: "TableDataset(filepath=data/test.csv)".to_string(),
        };
        assert!(err.to_string().contains("must not exist if versioning is enabled"));
    }

    #[test]
    fn test_versioned_conflict_message() {
        let err = DatasetError::VersionedConflict {
            name: "test.csv".to_string(),
            directory: "data".to_string(),
        };
        assert!(err
            .to_string()
            .contains("file with the same name already exists in the directory"));
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let source = StorageError::ConfigError("bad bucket".to_string());
        let err = DatasetError::Storage {
            dataset: "TableDataset(filepath=data/test.csv)".to_string(),
            operation: "load".to_string(),
            source,
        };
        assert!(err.to_string().contains("Failed during load"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
