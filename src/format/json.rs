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

//! Line-delimited JSON codec backed by arrow-json.
//!
//! One JSON object per line. The schema is inferred from the payload on
//! decode; `infer_records` bounds how many lines are sampled.

use super::csv::parse_usize;
use super::{FormatError, FormatOptions, TableFormat};
use crate::table::Table;
use arrow::json::reader::infer_json_schema_from_seekable;
use arrow::json::{LineDelimitedWriter, ReaderBuilder};
use arrow::record_batch::RecordBatch;
use std::io::{BufReader, Cursor};
use std::sync::Arc;

/// Line-delimited JSON format codec
#[derive(Debug, Default)]
pub struct JsonFormat;

const DEFAULT_INFER_RECORDS: usize = 1000;

impl TableFormat for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn decode(&self, data: &[u8], options: &FormatOptions) -> Result<Table, FormatError> {
        let infer_records = parse_usize(options, "infer_records", DEFAULT_INFER_RECORDS)?;

        let mut reader = BufReader::new(Cursor::new(data));
        let (schema, _) = infer_json_schema_from_seekable(&mut reader, Some(infer_records))?;
        let schema = Arc::new(schema);

        let json_reader = ReaderBuilder::new(schema.clone()).build(reader)?;
        let batches = json_reader.collect::<Result<Vec<RecordBatch>, _>>()?;
        Ok(Table::new(schema, batches))
    }

    fn encode(&self, table: &Table, _options: &FormatOptions) -> Result<Vec<u8>, FormatError> {
        let mut buffer = Vec::new();
        let mut writer = LineDelimitedWriter::new(&mut buffer);
        let batches: Vec<&RecordBatch> = table.batches().iter().collect();
        writer.write_batches(&batches)?;
        writer.finish()?;
        drop(writer);
        Ok(buffer)
    }
}
