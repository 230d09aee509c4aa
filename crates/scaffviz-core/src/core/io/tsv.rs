use super::traits::TableFile;
use crate::core::models::columns::ColumnRegistry;
use crate::core::models::frame::{Column, ColumnData, Frame, FrameError};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum TsvError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Table has no header row")]
    MissingHeader,

    #[error("Invalid table layout: {0}")]
    Frame(#[from] FrameError),
}

/// Tab-separated tables with a header row.
///
/// Empty cells are read as missing values. Every column is kept as text except
/// those the registry classifies as numeric derived columns, and those only
/// when their numbers write back to the same text.
pub struct TsvFile;

impl TableFile for TsvFile {
    type Error = TsvError;

    fn read_from(
        reader: &mut impl BufRead,
        registry: &ColumnRegistry,
    ) -> Result<Frame, Self::Error> {
        let mut tsv = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = tsv.headers()?.iter().map(String::from).collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(TsvError::MissingHeader);
        }

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for record in tsv.records() {
            let record = record?;
            for (column, value) in cells.iter_mut().zip(record.iter()) {
                column.push((!value.is_empty()).then(|| value.to_string()));
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| {
                let text = ColumnData::Text(values);
                if !registry.classify(&name).is_numeric() {
                    return Column::new(name, text);
                }
                if let Some(numeric) = text.to_numeric_exact() {
                    return Column::new(name, numeric);
                }
                if text.to_numeric().is_some() {
                    debug!(column = %name, "Numbers would be reformatted on write; keeping the original text.");
                } else {
                    warn!(column = %name, "Derived column holds non-numeric values; keeping it as text.");
                }
                Column::new(name, text)
            })
            .collect();

        Ok(Frame::from_columns(columns)?)
    }

    fn write_to(frame: &Frame, writer: &mut impl Write) -> Result<(), Self::Error> {
        let mut tsv = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);

        tsv.write_record(frame.column_names())?;
        for row in 0..frame.row_count() {
            tsv.write_record(
                frame
                    .columns()
                    .iter()
                    .map(|column| column.data.text(row).unwrap_or_default()),
            )?;
        }
        tsv.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::BufReader;
    use tempfile::tempdir;

    const TABLE: &str = "ID\tSMILES\tActivity\tDescriptor_Physchem_0\tNote\n\
                         m1\tCCO\t5.2\t46.07\tfirst\n\
                         m2\tc1ccccc1\t\t78.11\t\n";

    fn read(text: &str) -> Result<Frame, TsvError> {
        let registry = ColumnRegistry::new("SMILES");
        TsvFile::read_from(&mut BufReader::new(text.as_bytes()), &registry)
    }

    #[test]
    fn reads_derived_columns_as_numbers_and_the_rest_as_text() {
        let frame = read(TABLE).unwrap();
        assert_eq!(frame.row_count(), 2);
        assert_eq!(
            frame.column_names(),
            vec!["ID", "SMILES", "Activity", "Descriptor_Physchem_0", "Note"]
        );
        assert!(frame.column("Descriptor_Physchem_0").unwrap().data.is_numeric());
        assert!(!frame.column("Activity").unwrap().data.is_numeric());
        assert_eq!(frame.column("Activity").unwrap().data.text(1), None);
        assert_eq!(frame.column("Note").unwrap().data.text(1), None);
    }

    #[test]
    fn round_trip_preserves_rows_and_plain_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.tsv");
        fs::write(&path, TABLE).unwrap();
        let registry = ColumnRegistry::new("SMILES");

        let frame = TsvFile::read_from_path(&path, &registry).unwrap();
        let copy = dir.path().join("copy.tsv");
        TsvFile::write_to_path(&frame, &copy).unwrap();
        let reread = TsvFile::read_from_path(&copy, &registry).unwrap();

        assert_eq!(reread.row_count(), frame.row_count());
        for name in ["ID", "SMILES", "Activity", "Note"] {
            assert_eq!(reread.column(name), frame.column(name));
        }
        let written = fs::read_to_string(&copy).unwrap();
        assert!(written.starts_with("ID\tSMILES\tActivity\tDescriptor_Physchem_0\tNote\n"));
        assert!(!dir.path().join(".copy.tsv.tmp").exists());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = read("A\tB\n1\t2\t3\n");
        assert!(matches!(result, Err(TsvError::Csv(_))));
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(read(""), Err(TsvError::MissingHeader)));
    }

    #[test]
    fn numbers_that_would_be_reformatted_keep_their_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user.tsv");
        fs::write(&path, "SMILES\tPCA_1\tPCA_2\nCCO\t1.50\t1.5\nCC\t2\t-0.25\n").unwrap();
        let registry = ColumnRegistry::new("SMILES");

        let frame = TsvFile::read_from_path(&path, &registry).unwrap();
        let padded = frame.column("PCA_1").unwrap();
        assert!(!padded.data.is_numeric());
        assert_eq!(padded.data.number(0), Some(1.5));
        assert!(frame.column("PCA_2").unwrap().data.is_numeric());

        TsvFile::write_to_path(&frame, &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "SMILES\tPCA_1\tPCA_2\nCCO\t1.50\t1.5\nCC\t2\t-0.25\n"
        );
    }

    #[test]
    fn malformed_numeric_derived_column_falls_back_to_text() {
        let frame = read("SMILES\tPCA_1\nCCO\tnot-a-number\n").unwrap();
        assert!(!frame.column("PCA_1").unwrap().data.is_numeric());
    }
}
