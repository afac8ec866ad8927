use std::io::Write;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::ExtractError;
use crate::model::TableRowSet;

fn write_rows<W: Write>(writer: &mut Writer<W>, rows: &TableRowSet) -> Result<(), ExtractError> {
    let headers = rows.headers();
    writer.write_record(&headers)?;
    for row in &rows.rows {
        let record = headers
            .iter()
            .map(|header| row.get(header).map(ToString::to_string).unwrap_or_default())
            .collect::<Vec<_>>();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_rows_csv(path: &Path, rows: &TableRowSet, delimiter: u8) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_rows(&mut writer, rows)
}

pub fn rows_to_csv_string(rows: &TableRowSet, delimiter: u8) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_rows(&mut writer, rows)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

#[cfg(test)]
mod tests {
    use super::rows_to_csv_string;
    use crate::model::{CellValue, RowSetKind, TableRow, TableRowSet};

    #[test]
    fn writes_header_then_rows_in_key_order() {
        let mut first = TableRow::new();
        first.insert("Name", CellValue::from("Alice, Jr."));
        first.insert("Score", CellValue::Number(90.0));
        let mut second = TableRow::new();
        second.insert("Name", CellValue::from("Bob"));
        second.insert("Score", CellValue::Number(85.5));

        let rows = TableRowSet {
            kind: RowSetKind::Table,
            rows: vec![first, second],
        };

        let csv = rows_to_csv_string(&rows, b',').expect("csv renders");
        assert_eq!(csv, "Name,Score\n\"Alice, Jr.\",90\nBob,85.5\n");
    }

    #[test]
    fn honors_custom_delimiter() {
        let csv = rows_to_csv_string(&TableRowSet::count(7.0), b';').expect("csv renders");
        assert_eq!(csv, "count\n7\n");
    }
}
