use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::record::TenderRecord;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvWriterConfig {
    #[serde(default = "default_csv_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_csv_terminator")]
    pub terminator: CsvTerminator,
    /// Prefix output files with a UTF-8 byte-order mark
    #[serde(default = "default_csv_bom")]
    pub bom: bool,
}

impl Default for CsvWriterConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            terminator: CsvTerminator::Any('\n'),
            bom: true,
        }
    }
}

fn default_csv_delimiter() -> char {
    CsvWriterConfig::default().delimiter
}

fn default_csv_terminator() -> CsvTerminator {
    CsvWriterConfig::default().terminator
}

fn default_csv_bom() -> bool {
    CsvWriterConfig::default().bom
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum CsvTerminator {
    CRLF,
    Any(char),
}

impl From<CsvTerminator> for csv::Terminator {
    fn from(source: CsvTerminator) -> Self {
        match source {
            CsvTerminator::CRLF => Self::CRLF,
            CsvTerminator::Any(c) => Self::Any(c as u8),
        }
    }
}

impl From<&CsvWriterConfig> for csv::WriterBuilder {
    fn from(c: &CsvWriterConfig) -> Self {
        let mut builder = csv::WriterBuilder::new();
        builder.delimiter(c.delimiter as u8);
        builder.terminator(c.terminator.into());
        builder.double_quote(true);
        builder
    }
}

pub enum CsvWriter {
    File(csv::Writer<fs_err::File>),
    Stdout(csv::Writer<io::Stdout>),
}

impl CsvWriter {
    /// Creates or truncates `path`, writing the byte-order mark if configured.
    pub fn create(path: &Path, config: &CsvWriterConfig) -> io::Result<Self> {
        let mut file = fs_err::File::create(path)?;
        if config.bom {
            file.write_all(UTF8_BOM)?;
        }
        Ok(Self::File(csv::WriterBuilder::from(config).from_writer(file)))
    }

    pub fn stdout(config: &CsvWriterConfig) -> Self {
        Self::Stdout(csv::WriterBuilder::from(config).from_writer(io::stdout()))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::File(wtr) => wtr.flush(),
            Self::Stdout(wtr) => wtr.flush(),
        }
    }

    pub fn write_record<I, T>(&mut self, record: I) -> csv::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        match self {
            Self::File(wtr) => wtr.write_record(record),
            Self::Stdout(wtr) => wtr.write_record(record),
        }
    }

    /// Header line then one row per record, absent values as empty cells.
    pub fn write_table(&mut self, records: &[TenderRecord]) -> csv::Result<()> {
        self.write_record(&TenderRecord::headers())?;
        for record in records {
            self.write_record(&record.to_string_record())?;
        }
        self.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    Written(usize),
    /// Nothing to write, any previous file is left untouched
    Skipped,
    Failed,
}

/// Writes all records to `path`. Failures are logged, never returned.
pub fn export(records: &[TenderRecord], path: &Path, config: &CsvWriterConfig) -> ExportStatus {
    if records.is_empty() {
        log::error!("No data was scraped from any source, {} not created", path.display());
        return ExportStatus::Skipped;
    }

    log::info!("Scraped {} tenders, writing {}", records.len(), path.display());
    let written = CsvWriter::create(path, config)
        .map_err(csv::Error::from)
        .and_then(|mut wtr| wtr.write_table(records));

    match written {
        Ok(()) => {
            log::info!("Saved all data to {}", path.display());
            ExportStatus::Written(records.len())
        }
        Err(e) => {
            log::error!("Failed to save CSV {}: {e}", path.display());
            ExportStatus::Failed
        }
    }
}
