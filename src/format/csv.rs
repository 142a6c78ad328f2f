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

//! CSV codec backed by arrow-csv.
//!
//! Schemas are inferred from the payload on decode; the sample size is
//! controlled by the `infer_records` option. Recognized options:
//!
//! - `has_header` - whether the payload carries a header row (default `true`)
//! - `delimiter` - single-byte field separator (default `,`)
//! - `infer_records` - rows sampled for schema inference on decode
//!   (default `1000`)

use super::{FormatError, FormatOptions, TableFormat};
use crate::table::Table;
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::record_batch::RecordBatch;
use std::io::Cursor;
use std::sync::Arc;

/// CSV format codec
#[derive(Debug, Default)]
pub struct CsvFormat;

const DEFAULT_INFER_RECORDS: usize = 1000;

impl TableFormat for CsvFormat {
    fn name(&self) -> &str {
        "csv"
    }

    fn decode(&self, data: &[u8], options: &FormatOptions) -> Result<Table, FormatError> {
        let has_header = parse_bool(options, "has_header", true)?;
        let delimiter = parse_delimiter(options)?;
        let infer_records = parse_usize(options, "infer_records", DEFAULT_INFER_RECORDS)?;

        let format = Format::default()
            .with_header(has_header)
            .with_delimiter(delimiter);
        let (schema, _) = format.infer_schema(Cursor::new(data), Some(infer_records))?;
        let schema = Arc::new(schema);

        let reader = ReaderBuilder::new(schema.clone())
            .with_header(has_header)
            .with_delimiter(delimiter)
            .build(Cursor::new(data))?;
        let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
        Ok(Table::new(schema, batches))
    }

    fn encode(&self, table: &Table, options: &FormatOptions) -> Result<Vec<u8>, FormatError> {
        let has_header = parse_bool(options, "has_header", true)?;
        let delimiter = parse_delimiter(options)?;

        let mut buffer = Vec::new();
        let mut writer = WriterBuilder::new()
            .with_header(has_header)
            .with_delimiter(delimiter)
            .build(&mut buffer);
        for batch in table.batches() {
            writer.write(batch)?;
        }
        drop(writer);
        Ok(buffer)
    }
}

pub(super) fn parse_bool(
    options: &FormatOptions,
    key: &str,
    default: bool,
) -> Result<bool, FormatError> {
    match options.get(key) {
        None => Ok(default),
        Some(value) => value.parse::<bool>().map_err(|_| FormatError::InvalidOption {
            option: key.to_string(),
            message: format!("expected 'true' or 'false', got '{value}'"),
        }),
    }
}

pub(super) fn parse_usize(
    options: &FormatOptions,
    key: &str,
    default: usize,
) -> Result<usize, FormatError> {
    match options.get(key) {
        None => Ok(default),
        Some(value) => value.parse::<usize>().map_err(|_| FormatError::InvalidOption {
            option: key.to_string(),
            message: format!("expected a non-negative integer, got '{value}'"),
        }),
    }
}

fn parse_delimiter(options: &FormatOptions) -> Result<u8, FormatError> {
    match options.get("delimiter") {
        None => Ok(b','),
        Some(value) if value.len() == 1 => Ok(value.as_bytes()[0]),
        Some(value) => Err(FormatError::InvalidOption {
            option: "delimiter".to_string(),
            message: format!("expected a single byte, got '{value}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::sample_table;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    #[test]
    fn test_round_trip() {
        let table = sample_table();
        let options = FormatOptions::new();
        let bytes = CsvFormat.encode(&table, &options).unwrap();
        let decoded = CsvFormat.decode(&bytes, &options).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn test_decode_without_header() {
        let mut options = FormatOptions::new();
        options.insert("has_header".to_string(), "false".to_string());
        let table = CsvFormat.decode(b"1,alpha\n2,beta\n", &options).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 2);
    }

    #[test]
    fn test_custom_delimiter() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("name", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec!["alpha", "beta"])),
            ],
        )
        .unwrap();
        let table = Table::new(schema, vec![batch]);

        let mut options = FormatOptions::new();
        options.insert("delimiter".to_string(), ";".to_string());
        let bytes = CsvFormat.encode(&table, &options).unwrap();
        assert!(String::from_utf8(bytes.clone()).unwrap().contains("1;alpha"));
        let decoded = CsvFormat.decode(&bytes, &options).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn test_invalid_bool_option() {
        let mut options = FormatOptions::new();
        options.insert("has_header".to_string(), "maybe".to_string());
        let result = CsvFormat.decode(b"a,b\n1,2\n", &options);
        assert!(matches!(
            result,
            Err(FormatError::InvalidOption { ref option, .. }) if option == "has_header"
        ));
    }

    #[test]
    fn test_invalid_delimiter_option() {
        let mut options = FormatOptions::new();
        options.insert("delimiter".to_string(), "::".to_string());
        let result = CsvFormat.decode(b"a,b\n1,2\n", &options);
        assert!(matches!(result, Err(FormatError::InvalidOption { .. })));
    }
}
