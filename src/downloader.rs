#![cfg(not(tarpaulin_include))]
#![cfg(feature = "render")]

use crate::codec::{self, normalize_filetype};
use crate::error::TableError;
use crate::html::{RenderedHtml, download_anchor};
use crate::tables::{CellValue, Table};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// File-type labels that request an Excel download.
const EXCEL_LABELS: &[&str] = &[
    "excel",
    "xlsx",
    "xls",
    "xlsm",
    "xlsb",
    "odf",
    "ods",
    "odt",
    "vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// File formats a table can be downloaded as
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadFormat {
    /// Comma-separated values
    Csv,

    /// Excel Open XML workbook
    Xlsx,
}

impl DownloadFormat {
    /// Pick the download format for a user-supplied file-type label.
    ///
    /// Any spreadsheet label selects `Xlsx`; everything else falls back to `Csv`.
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if EXCEL_LABELS.contains(&label.as_str()) {
            DownloadFormat::Xlsx
        } else {
            DownloadFormat::Csv
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            DownloadFormat::Csv => "text/csv",
            DownloadFormat::Xlsx => XLSX_MIME,
        }
    }
}

/// Configuration options for table rendering
#[derive(Clone, Debug)]
pub struct TableOptions {
    /// Also produce a download link for the table
    pub download: bool,

    /// Text of the download link
    pub download_text: String,

    /// File name of the download, without extension
    pub download_file_name: String,

    /// Requested file type, e.g. "csv" or "xlsx"
    pub download_file_type: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            download: false,
            download_text: "Download Table".to_string(),
            download_file_name: "mytable".to_string(),
            download_file_type: "csv".to_string(),
        }
    }
}

/// Convert a table to CSV
///
/// The header row is written first; empty cells become empty fields and quoting is
/// handled by the `csv` writer.
///
/// # Arguments
/// * `table` - Reference to the table to convert
///
/// # Returns
/// * `Result<Vec<u8>, TableError>` - CSV content as UTF-8 bytes or an error
pub fn to_csv(table: &Table) -> Result<Vec<u8>, TableError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(table.columns())?;
    for cells in table.rows() {
        writer.write_record(cells.iter().map(|cell| cell.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| TableError::Csv(e.into_error().into()))
}

/// Convert a table to XLSX format
///
/// The header row goes into row 0, followed by one row per table row with typed
/// cells. Empty cells are left blank.
///
/// # Arguments
/// * `table` - Reference to the table to convert
///
/// # Returns
/// * `Result<Vec<u8>, TableError>` - XLSX file content as bytes or an error
pub fn to_xlsx(table: &Table) -> Result<Vec<u8>, TableError> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    // Worksheet rows are u32 and columns u16; the header takes row 0
    let too_large = || TableError::TooLarge {
        rows: table.height(),
        columns: table.width(),
    };
    let column_index = |c: usize| u16::try_from(c).map_err(|_| too_large());
    column_index(table.width().saturating_sub(1))?;
    u32::try_from(table.height()).map_err(|_| too_large())?;

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    for (c, column) in table.columns().iter().enumerate() {
        worksheet.write_string(0, column_index(c)?, column.as_str())?;
    }

    for (r, cells) in table.rows().iter().enumerate() {
        let row = r
            .checked_add(1)
            .and_then(|row| u32::try_from(row).ok())
            .ok_or_else(too_large)?;
        for (c, cell) in cells.iter().enumerate() {
            let col = column_index(c)?;
            match cell {
                CellValue::Empty => {}
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                CellValue::Int(i) => {
                    worksheet.write_number(row, col, *i as f64)?;
                }
                CellValue::Float(f) => {
                    worksheet.write_number(row, col, *f)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string(row, col, s.as_str())?;
                }
            }
        }
    }

    workbook.push_worksheet(worksheet);
    Ok(workbook.save_to_buffer()?)
}

/// Render a table as HTML, with an optional CSV or Excel download link.
///
/// The download file is named `<download_file_name>.<type>`, where the type is the
/// lowercased `download_file_type` with the xlsx MIME subtype shortened to `xlsx`.
///
/// # Examples
/// ```
/// use mecsimcalc::downloader::{TableOptions, render_table};
/// use mecsimcalc::tables::Table;
///
/// let table = Table::from_rows(&["A"], vec![vec![1.into()]]).unwrap();
/// let options = TableOptions { download: true, ..TableOptions::default() };
/// let rendered = render_table(&table, &options).unwrap();
/// assert!(rendered.download_link.unwrap().contains("download='mytable.csv'"));
/// ```
pub fn render_table(table: &Table, options: &TableOptions) -> Result<RenderedHtml, TableError> {
    let html = table.to_html();
    if !options.download {
        return Ok(RenderedHtml::new(html));
    }

    let label = options.download_file_type.to_lowercase();
    let format = DownloadFormat::from_label(&label);
    let bytes = match format {
        DownloadFormat::Csv => to_csv(table)?,
        DownloadFormat::Xlsx => to_xlsx(table)?,
    };

    let href = codec::encode(format.mime_type(), &bytes);
    let file_name = format!(
        "{}.{}",
        options.download_file_name,
        normalize_filetype(&label)
    );
    let link = download_anchor(&href, &file_name, &options.download_text);
    Ok(RenderedHtml::with_download(html, link))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_select_format() {
        assert_eq!(DownloadFormat::from_label("XLSX"), DownloadFormat::Xlsx);
        assert_eq!(DownloadFormat::from_label("ods"), DownloadFormat::Xlsx);
        assert_eq!(DownloadFormat::from_label("csv"), DownloadFormat::Csv);
        assert_eq!(DownloadFormat::from_label("whatever"), DownloadFormat::Csv);
    }

    #[test]
    fn csv_quotes_when_needed() {
        let table = Table::from_rows(
            &["label", "value"],
            vec![
                vec!["a,b".into(), 1.into()],
                vec![CellValue::Empty, 2.5.into()],
            ],
        )
        .unwrap();
        let csv = String::from_utf8(to_csv(&table).unwrap()).unwrap();
        assert_eq!(csv, "label,value\n\"a,b\",1\n,2.5\n");
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let table = Table::from_rows(&["A"], vec![vec![1.into()]]).unwrap();
        let bytes = to_xlsx(&table).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn no_download_by_default() {
        let table = Table::from_rows(&["A"], vec![vec![1.into()]]).unwrap();
        let rendered = render_table(&table, &TableOptions::default()).unwrap();
        assert!(rendered.download_link.is_none());
        assert!(rendered.html.starts_with("<table "));
    }

    #[test]
    fn mime_label_downloads_as_xlsx() {
        let table = Table::from_rows(&["A"], vec![vec![1.into()]]).unwrap();
        let options = TableOptions {
            download: true,
            download_file_type: "vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                .to_string(),
            ..TableOptions::default()
        };
        let link = render_table(&table, &options).unwrap().download_link.unwrap();
        assert!(link.starts_with(&format!("<a href='data:{XLSX_MIME};base64,")));
        assert!(link.contains("download='mytable.xlsx'>Download Table</a>"));
    }

    #[test]
    fn xlsx_rejects_columns_past_u16() {
        let columns: Vec<String> = (0..70_000).map(|c| format!("c{c}")).collect();
        let table = Table::new(columns, Vec::new()).unwrap();
        assert!(matches!(
            to_xlsx(&table),
            Err(TableError::TooLarge { rows: 0, columns: 70_000 })
        ));
    }
}
