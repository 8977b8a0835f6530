#![cfg(not(tarpaulin_include))]
#![cfg(feature = "render")]

use crate::codec::{self, DecodedFile};
use crate::error::TableError;
use crate::tables::{CellValue, Table};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use log::debug;
use std::io::Cursor;

type Parser = fn(&[u8]) -> Result<Table, String>;

/// Parsers tried in order when loading an uploaded table.
const CANDIDATES: &[(&str, Parser)] = &[("csv", from_csv), ("excel", from_excel)];

/// Load an in-memory file as a table
///
/// The file is tried as CSV first and as an Excel workbook second. The first
/// parser that succeeds wins.
///
/// # Arguments
/// * `file` - Decoded upload
///
/// # Returns
/// * `Result<Table, TableError>` - The loaded table, or `TableError::Unsupported`
///   listing why every parser rejected the file
///
/// # Examples
/// ```
/// use mecsimcalc::codec::decode;
/// use mecsimcalc::loader::file_to_table;
///
/// let file = decode("data:text/csv;base64,QSxCLEMKMSwyLDMKNCw1LDYK").unwrap();
/// let table = file_to_table(file).unwrap();
/// assert_eq!(table.columns(), ["A", "B", "C"]);
/// assert_eq!(table.height(), 2);
/// ```
pub fn file_to_table(file: DecodedFile) -> Result<Table, TableError> {
    let bytes = file.into_inner();
    let mut attempts = Vec::with_capacity(CANDIDATES.len());

    for (name, parse) in CANDIDATES {
        match parse(&bytes) {
            Ok(table) => {
                debug!(
                    "loaded {}x{} table as {}",
                    table.height(),
                    table.width(),
                    name
                );
                return Ok(table);
            }
            Err(reason) => {
                debug!("{} parser rejected upload: {}", name, reason);
                attempts.push(format!("{name}: {reason}"));
            }
        }
    }

    Err(TableError::Unsupported { attempts })
}

/// Decode a data-URI payload and load it as a table.
pub fn input_to_table(payload: &str) -> Result<Table, TableError> {
    file_to_table(codec::decode(payload)?)
}

/// Decode a data-URI payload, load it as a table and report its file-type label.
pub fn input_to_table_with_type(payload: &str) -> Result<(Table, String), TableError> {
    let (file, metadata) = codec::decode_with_metadata(payload)?;
    Ok((file_to_table(file)?, codec::classify(&metadata)))
}

// The first record is the header. Short records are padded with empty cells;
// records wider than the header are rejected.
fn from_csv(bytes: &[u8]) -> Result<Table, String> {
    if bytes.contains(&0) {
        return Err("binary content".to_string());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(str::to_string)
        .collect();
    if columns.is_empty() {
        return Err("no columns to parse".to_string());
    }

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() > columns.len() {
            return Err(TableError::Shape {
                row,
                expected: columns.len(),
                found: record.len(),
            }
            .to_string());
        }

        let mut cells: Vec<CellValue> = record.iter().map(CellValue::infer).collect();
        cells.resize(columns.len(), CellValue::Empty);
        rows.push(cells);
    }

    Table::new(columns, rows).map_err(|e| e.to_string())
}

// First worksheet only; its first row is the header.
fn from_excel(bytes: &[u8]) -> Result<Table, String> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| e.to_string())?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or("No sheets found in Excel file")?
        .map_err(|e| e.to_string())?;

    let mut rows = range.rows();
    let columns: Vec<String> = rows
        .next()
        .ok_or("Excel sheet is empty")?
        .iter()
        .map(|cell| cell.to_string())
        .collect();

    let rows = rows
        .map(|cells| cells.iter().map(excel_cell).collect())
        .collect();

    Table::new(columns, rows).map_err(|e| e.to_string())
}

fn excel_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::Text(s.clone()),
        // Dates, durations and error cells keep their display text
        other => CellValue::Text(other.to_string()),
    }
}
