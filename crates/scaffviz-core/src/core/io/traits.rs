use crate::core::models::columns::ColumnRegistry;
use crate::core::models::frame::Frame;
use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Defines the interface for reading and writing tabular compound files.
///
/// Implementors handle format-specific parsing and serialization. The column
/// registry passed on read decides which columns are decoded as numbers.
pub trait TableFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a frame from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    /// * `registry` - Classifies column names; derived numeric columns are parsed as numbers.
    ///
    /// # Return
    ///
    /// Returns the parsed frame.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(
        reader: &mut impl BufRead,
        registry: &ColumnRegistry,
    ) -> Result<Frame, Self::Error>;

    /// Writes a frame to a writer.
    ///
    /// # Arguments
    ///
    /// * `frame` - The frame to write.
    /// * `writer` - The writer to output to.
    ///
    /// # Return
    ///
    /// Returns `Ok(())` on success.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or I/O operations encounter issues.
    fn write_to(frame: &Frame, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a frame from a file path.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the file to read.
    /// * `registry` - Classifies column names; derived numeric columns are parsed as numbers.
    ///
    /// # Return
    ///
    /// Returns the parsed frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(
        path: P,
        registry: &ColumnRegistry,
    ) -> Result<Frame, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, registry)
    }

    /// Writes a frame to a file path.
    ///
    /// The data is first written to a hidden temporary file in the same
    /// directory and then renamed over `path`, so readers never observe a
    /// partially written table.
    ///
    /// # Arguments
    ///
    /// * `frame` - The frame to write.
    /// * `path` - The path to the file to write.
    ///
    /// # Return
    ///
    /// Returns `Ok(())` on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(frame: &Frame, path: P) -> Result<(), Self::Error> {
        let path = path.as_ref();
        let staging = staging_path(path);
        {
            let file = File::create(&staging)?;
            let mut writer = BufWriter::new(file);
            if let Err(e) = Self::write_to(frame, &mut writer) {
                let _ = fs::remove_file(&staging);
                return Err(e);
            }
            writer.flush()?;
        }
        fs::rename(&staging, path)?;
        Ok(())
    }
}

pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}
