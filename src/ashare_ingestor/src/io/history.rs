//! Gzip-compressed CSV storage for a history frame.
//!
//! Files are UTF-8 with a header row. Every column is read back as `String`
//! (schema inference is switched off) so that codes such as `000001` keep
//! their leading zeros; empty cells are nulls. Writes go to a temporary file
//! next to the target and are renamed over it, so a crash mid-write leaves
//! the previous history intact.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Cursor, Read, Write},
    path::{Path, PathBuf},
};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use polars::prelude::*;
use polars_io::{SerReader, SerWriter};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to open history file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decompress history file {path}")]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode history file {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("failed to encode history file {path}")]
    Encode {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("failed to write history file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loads the history at `path`.
///
/// A missing file, an empty file and a file with a header but no rows all
/// mean "no history yet" and yield `None`.
pub fn load_history(path: &Path) -> Result<Option<DataFrame>, HistoryError> {
    let open_err = |source: std::io::Error| HistoryError::Open {
        path: path.to_path_buf(),
        source,
    };

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no history file yet");
            return Ok(None);
        }
        Err(e) => return Err(open_err(e)),
    };
    if file.metadata().map_err(open_err)?.len() == 0 {
        return Ok(None);
    }

    let mut csv = Vec::new();
    GzDecoder::new(BufReader::new(file))
        .read_to_end(&mut csv)
        .map_err(|source| HistoryError::Decompress {
            path: path.to_path_buf(),
            source,
        })?;
    if csv.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let df = read_table(csv).map_err(|source| HistoryError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "history loaded");
    Ok((df.height() > 0).then_some(df))
}

/// Replaces the history at `path` with `df`.
pub fn persist_history(df: &DataFrame, path: &Path) -> Result<(), HistoryError> {
    let write_err = |source: std::io::Error| HistoryError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    {
        let mut encoder = GzEncoder::new(BufWriter::new(tmp.as_file_mut()), Compression::default());
        write_table(df, &mut encoder).map_err(|source| HistoryError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        encoder.finish().map_err(write_err)?.flush().map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!(path = %path.display(), rows = df.height(), "history written");
    Ok(())
}

/// Parses plain (uncompressed) CSV with a header row, every column as text.
pub fn read_table(csv: Vec<u8>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(csv))
        .finish()
}

/// Writes `df` as CSV with a header row; nulls become empty cells.
pub fn write_table<W: Write>(df: &DataFrame, writer: &mut W) -> PolarsResult<()> {
    CsvWriter::new(writer)
        .include_header(true)
        .finish(&mut df.clone())
}
