use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, StringRecord};

use super::ImportError;

/// Read every row of a comma-delimited file, header included.
pub fn read_rows(path: &Path) -> Result<Vec<StringRecord>, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rows(file)
}

/// Rows may differ in width; short rows are left for the validator to
/// reject rather than failing the whole read.
///
/// No field of the import layout spans lines, so a line break inside a
/// field means a quote was never closed and the rest of the file was
/// folded into it. Invalid UTF-8 is decoded lossily and left for the
/// validator.
pub fn parse_rows<R: Read>(input: R) -> Result<Vec<StringRecord>, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut rows = Vec::new();
    for (idx, result) in reader.byte_records().enumerate() {
        let record = idx as u64 + 1;
        let row = result.map_err(|e| ImportError::Malformed {
            record,
            reason: e.to_string(),
        })?;
        if spans_lines(&row) {
            return Err(ImportError::Malformed {
                record,
                reason: "line break inside a field (unterminated quote)".into(),
            });
        }
        rows.push(decode(row, record));
    }
    Ok(rows)
}

fn spans_lines(row: &ByteRecord) -> bool {
    row.iter()
        .any(|field| field.iter().any(|&b| b == b'\n' || b == b'\r'))
}

fn decode(row: ByteRecord, record: u64) -> StringRecord {
    match StringRecord::from_byte_record(row) {
        Ok(row) => row,
        Err(err) => {
            tracing::debug!(record, "Row is not valid UTF-8, decoding lossily");
            StringRecord::from_byte_record_lossy(err.into_byte_record())
        }
    }
}
