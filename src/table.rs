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

//! In-memory tabular data exchanged between datasets and format codecs.

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

/// An in-memory table: an Arrow schema plus zero or more record batches
/// sharing that schema.
///
/// This is the unit of data every [`crate::format::TableFormat`] codec
/// encodes and decodes, and what [`crate::dataset::TableDataset`] loads and
/// saves.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Table {
    /// Create a table from a schema and batches.
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    /// Create a table from a non-empty batch collection, taking the schema
    /// of the first batch.
    ///
    /// Returns `None` for an empty collection, where no schema can be
    /// derived.
    pub fn from_batches(batches: Vec<RecordBatch>) -> Option<Self> {
        let schema = batches.first()?.schema();
        Some(Self { schema, batches })
    }

    /// The table schema.
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// The record batches making up the table.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total number of rows across all batches.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    /// Small two-column table with nullable fields, matching what schema
    /// inference produces for the same data.
    pub(crate) fn sample_table() -> Table {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("name", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec!["alpha", "beta", "gamma"])),
            ],
        )
        .unwrap();
        Table::new(schema, vec![batch])
    }

    fn sample_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec!["a", "b", "c"])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_batches() {
        let table = Table::from_batches(vec![sample_batch(), sample_batch()]).unwrap();
        assert_eq!(table.num_rows(), 6);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.batches().len(), 2);
    }

    #[test]
    fn test_from_batches_empty() {
        assert!(Table::from_batches(vec![]).is_none());
    }

    #[test]
    fn test_empty_table_with_schema() {
        let batch = sample_batch();
        let table = Table::new(batch.schema(), vec![]);
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.num_columns(), 2);
    }

    #[test]
    fn test_equality() {
        let a = Table::from_batches(vec![sample_batch()]).unwrap();
        let b = Table::from_batches(vec![sample_batch()]).unwrap();
        assert_eq!(a, b);
    }
}
