#![cfg(feature = "render")]
use crate::error::TableError;
use crate::html::escape;
use std::fmt;

/// A single table cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Infer a typed value from raw text, the way uploaded CSV cells are read.
    ///
    /// # Examples
    /// ```
    /// use mecsimcalc::tables::CellValue;
    ///
    /// assert_eq!(CellValue::infer("42"), CellValue::Int(42));
    /// assert_eq!(CellValue::infer("2.5"), CellValue::Float(2.5));
    /// assert_eq!(CellValue::infer("TRUE"), CellValue::Bool(true));
    /// assert_eq!(CellValue::infer(""), CellValue::Empty);
    /// assert_eq!(CellValue::infer("abc"), CellValue::Text("abc".to_string()));
    /// ```
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }
        CellValue::Text(raw.to_string())
    }

    /// Numeric view of the cell, if it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Int(value.into())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// A rectangular table of named columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create a table, checking that every row has one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, TableError> {
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns.len())
        {
            return Err(TableError::Shape {
                row,
                expected: columns.len(),
                found: cells.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from a header and raw rows.
    ///
    /// # Examples
    /// ```
    /// use mecsimcalc::tables::Table;
    ///
    /// let table = Table::from_rows(&["A", "B"], vec![vec![1.into(), 2.into()]]).unwrap();
    /// assert_eq!(table.width(), 2);
    /// assert_eq!(table.height(), 1);
    /// ```
    pub fn from_rows<S: AsRef<str>>(
        header: &[S],
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self, TableError> {
        let columns = header.iter().map(|h| h.as_ref().to_string()).collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Cell at `row`, `col` (both 0-based).
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    /// All cells of the named column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&CellValue>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|cells| &cells[index]).collect())
    }

    /// Render as an HTML table with a leading row-index column.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<table border=\"1\" class=\"dataframe\">\n");

        html.push_str("  <thead>\n    <tr style=\"text-align: right;\">\n      <th></th>\n");
        for column in &self.columns {
            html.push_str(&format!("      <th>{}</th>\n", escape(column)));
        }
        html.push_str("    </tr>\n  </thead>\n");

        html.push_str("  <tbody>\n");
        for (index, cells) in self.rows.iter().enumerate() {
            html.push_str(&format!("    <tr>\n      <th>{index}</th>\n"));
            for cell in cells {
                let text = match cell {
                    CellValue::Empty => "NaN".to_string(),
                    other => escape(&other.to_string()),
                };
                html.push_str(&format!("      <td>{text}</td>\n"));
            }
            html.push_str("    </tr>\n");
        }
        html.push_str("  </tbody>\n</table>");

        html
    }
}

/// Render a header and raw rows straight to an HTML table.
pub fn render_rows<S: AsRef<str>>(
    header: &[S],
    rows: Vec<Vec<CellValue>>,
) -> Result<String, TableError> {
    Ok(Table::from_rows(header, rows)?.to_html())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            &["A", "B", "C"],
            vec![
                vec![1.into(), 2.into(), 3.into()],
                vec![4.into(), 5.into(), 6.into()],
                vec![7.into(), 8.into(), 9.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Table::from_rows(&["A", "B"], vec![vec![1.into()]]).unwrap_err();
        assert!(matches!(
            err,
            TableError::Shape {
                row: 0,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn column_lookup() {
        let table = sample();
        let b: Vec<f64> = table
            .column("B")
            .unwrap()
            .iter()
            .filter_map(|c| c.as_f64())
            .collect();
        assert_eq!(b, vec![2.0, 5.0, 8.0]);
        assert!(table.column("Z").is_none());
        assert_eq!(table.get(2, 2), Some(&CellValue::Int(9)));
        assert_eq!(table.get(3, 0), None);
    }

    #[test]
    fn html_has_header_index_and_cells() {
        let html = render_rows(&["A", "B", "C"], sample().rows().to_vec()).unwrap();
        assert!(html.starts_with("<table "));
        assert!(html.contains("<th>A</th>"));
        assert!(html.contains("<th>2</th>"));
        assert!(html.contains("<td>9</td>"));
        assert!(html.ends_with("</table>"));
    }

    #[test]
    fn html_escapes_text_and_marks_empty() {
        let table = Table::from_rows(
            &["<name>"],
            vec![vec!["a & b".into()], vec![CellValue::Empty]],
        )
        .unwrap();
        let html = table.to_html();
        assert!(html.contains("<th>&lt;name&gt;</th>"));
        assert!(html.contains("<td>a &amp; b</td>"));
        assert!(html.contains("<td>NaN</td>"));
    }

    #[test]
    fn infer_keeps_text_verbatim() {
        assert_eq!(CellValue::infer(" x "), CellValue::Text(" x ".to_string()));
        assert_eq!(CellValue::infer(" 7 "), CellValue::Int(7));
        assert_eq!(CellValue::infer("1e3"), CellValue::Float(1000.0));
    }
}
