//! Dataset sources: where a raw table comes from and how it is unpacked.

use super::fetch::Fetcher;
use super::raw::{parse_text, RawTable, TextFormat};
use crate::error::DatasetError;
use std::io::{Cursor, Read, Write};
use tracing::debug;

/// A recipe for producing one [`RawTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A delimited text file.
    Text { url: String, format: TextFormat },
    /// A delimited text file inside a zip archive.
    ZipEntry {
        url: String,
        entry: String,
        format: TextFormat,
    },
    /// One worksheet of a spreadsheet; the first row is the header.
    Excel { url: String, sheet: String },
    /// The result of a query against a downloaded SQLite database.
    Sqlite { url: String, query: String },
    /// Sources whose rows are appended in order.
    Stack(Vec<Source>),
    /// Sources whose columns are placed side by side.
    Beside(Vec<Source>),
}

impl Source {
    pub fn load(&self, fetcher: &dyn Fetcher) -> Result<RawTable, DatasetError> {
        match self {
            Source::Text { url, format } => {
                let bytes = fetcher.get(url)?;
                parse_text(&bytes, format)
            }
            Source::ZipEntry { url, entry, format } => {
                let bytes = fetcher.get(url)?;
                let text = read_zip_entry(bytes, entry)?;
                parse_text(&text, format)
            }
            Source::Excel { url, sheet } => {
                let bytes = fetcher.get(url)?;
                read_worksheet(bytes, sheet)
            }
            Source::Sqlite { url, query } => {
                let bytes = fetcher.get(url)?;
                read_sqlite(&bytes, query)
            }
            Source::Stack(parts) => parts.iter().try_fold(RawTable::default(), |acc, part| {
                Ok(acc.append_rows(part.load(fetcher)?))
            }),
            Source::Beside(parts) => parts.iter().try_fold(RawTable::default(), |acc, part| {
                acc.append_columns(part.load(fetcher)?)
            }),
        }
    }

    /// Every URL this source will request, in order.
    pub fn urls(&self) -> Vec<&str> {
        match self {
            Source::Text { url, .. }
            | Source::ZipEntry { url, .. }
            | Source::Excel { url, .. }
            | Source::Sqlite { url, .. } => vec![url.as_str()],
            Source::Stack(parts) | Source::Beside(parts) => {
                parts.iter().flat_map(Source::urls).collect()
            }
        }
    }
}

fn read_zip_entry(bytes: Vec<u8>, entry: &str) -> Result<Vec<u8>, DatasetError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| DatasetError::Archive(e.to_string()))?;

    let mut file = archive.by_name(entry).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => DatasetError::MissingEntry {
            entry: entry.to_string(),
        },
        other => DatasetError::Archive(other.to_string()),
    })?;

    let mut out = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut out)?;
    debug!(entry, bytes = out.len(), "unzipped");
    Ok(out)
}

fn read_worksheet(bytes: Vec<u8>, sheet: &str) -> Result<RawTable, DatasetError> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| DatasetError::parse("workbook", e))?;
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| DatasetError::parse(format!("worksheet '{sheet}'"), e))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
    let header = rows
        .next()
        .map(|names| names.into_iter().map(|n| n.trim().to_string()).collect());
    Ok(RawTable::new(header, rows.collect()))
}

fn read_sqlite(bytes: &[u8], query: &str) -> Result<RawTable, DatasetError> {
    use rusqlite::types::ValueRef;

    // SQLite needs a real file; the temp file is removed on drop.
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;

    let conn = rusqlite::Connection::open_with_flags(
        file.path(),
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
    )?;
    let mut stmt = conn.prepare(query)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| {
                    Ok(match row.get_ref(i)? {
                        ValueRef::Null => String::new(),
                        ValueRef::Integer(v) => v.to_string(),
                        ValueRef::Real(v) => v.to_string(),
                        ValueRef::Text(t) | ValueRef::Blob(t) => {
                            String::from_utf8_lossy(t).into_owned()
                        }
                    })
                })
                .collect::<rusqlite::Result<Vec<String>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(RawTable::new(Some(columns), rows))
}
