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

//! Datasets
//!
//! A dataset binds a storage location, a file format, and an optional
//! version pin into one load/save surface. [`TableDataset`] is the
//! format-agnostic tabular dataset; it delegates byte I/O to a
//! [`StorageProvider`](crate::storage::StorageProvider) and payload
//! encoding to the [`FormatRegistry`](crate::format::FormatRegistry).

pub mod error;
pub mod generic;

pub use error::{DatasetError, DatasetResult};
pub use generic::{TableDataset, TableDatasetBuilder};
