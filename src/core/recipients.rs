use crate::config::ColumnMapping;
use crate::domain::model::RecipientRecord;
use crate::utils::error::{MailerError, Result};
use csv::{Reader, ReaderBuilder};
use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Recipient rows from a CSV file whose header has already been checked.
///
/// Rows are parsed lazily: a malformed row only shows up when iteration
/// reaches it.
pub struct RecipientSource {
    reader: Reader<Cursor<Vec<u8>>>,
    headers: Vec<String>,
}

impl RecipientSource {
    pub fn open(path: impl AsRef<Path>, columns: &ColumnMapping) -> Result<Self> {
        let path = path.as_ref();
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MailerError::CsvNotFound {
                    path: path.display().to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("Read {} bytes from {}", data.len(), path.display());
        Self::from_bytes(data, columns)
    }

    pub fn from_bytes(mut data: Vec<u8>, columns: &ColumnMapping) -> Result<Self> {
        if data.starts_with(UTF8_BOM) {
            data.drain(..UTF8_BOM.len());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(Cursor::new(data));

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        // 空檔案沒有表頭，不做欄位檢查
        if !headers.is_empty() {
            let missing: Vec<String> = columns
                .required()
                .into_iter()
                .filter(|column| !headers.iter().any(|header| header.as_str() == *column))
                .map(str::to_string)
                .collect();

            if !missing.is_empty() {
                return Err(MailerError::MissingColumnsError {
                    missing,
                    available: headers,
                });
            }
        }

        tracing::debug!("CSV columns: {:?}", headers);
        Ok(Self { reader, headers })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Remaining rows in file order.
    pub fn into_records(self) -> impl Iterator<Item = Result<RecipientRecord>> {
        let RecipientSource { reader, headers } = self;
        reader.into_records().map(move |row| {
            let row = row?;
            let fields = headers
                .iter()
                .zip(row.iter())
                .map(|(header, value)| (header.clone(), value.to_string()))
                .collect();
            Ok(RecipientRecord::new(fields))
        })
    }
}
