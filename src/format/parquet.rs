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

//! Parquet codec.
//!
//! Unlike the text codecs this one is self-describing, so no schema
//! inference options apply. Recognized options:
//!
//! - `compression` - write-side codec: `snappy` (default), `zstd`, `gzip`,
//!   `lz4`, or `uncompressed`

use super::{FormatError, FormatOptions, TableFormat};
use crate::table::Table;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;

/// Parquet format codec
#[derive(Debug, Default)]
pub struct ParquetFormat;

impl TableFormat for ParquetFormat {
    fn name(&self) -> &str {
        "parquet"
    }

    fn decode(&self, data: &[u8], _options: &FormatOptions) -> Result<Table, FormatError> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(data))?;
        let schema = builder.schema().clone();
        let reader = builder.build()?;
        let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
        Ok(Table::new(schema, batches))
    }

    fn encode(&self, table: &Table, options: &FormatOptions) -> Result<Vec<u8>, FormatError> {
        let compression = parse_compression(options)?;
        let props = WriterProperties::builder()
            .set_compression(compression)
            .build();

        let mut buffer = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buffer, table.schema(), Some(props))?;
        for batch in table.batches() {
            writer.write(batch)?;
        }
        writer.close()?;
        Ok(buffer)
    }
}

fn parse_compression(options: &FormatOptions) -> Result<Compression, FormatError> {
    match options.get("compression").map(|s| s.to_lowercase()) {
        None => Ok(Compression::SNAPPY),
        Some(value) => match value.as_str() {
            "snappy" => Ok(Compression::SNAPPY),
            "zstd" => Ok(Compression::ZSTD(ZstdLevel::default())),
            "gzip" => Ok(Compression::GZIP(GzipLevel::default())),
            "lz4" => Ok(Compression::LZ4),
            "uncompressed" | "none" => Ok(Compression::UNCOMPRESSED),
            other => Err(FormatError::InvalidOption {
                option: "compression".to_string(),
                message: format!("unsupported compression codec '{other}'"),
            }),
        },
    }
}
