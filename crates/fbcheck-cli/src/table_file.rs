use crate::error::LoadError;
use fbcheck_core::format::PixelFormat;
use fbcheck_core::sink::{CapturedFrame, FrameSink, SessionInfo};
use fbcheck_core::table::ChecksumRecord;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// Reference table stored as TOML `[[record]]` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TableFile {
    #[serde(default, rename = "record")]
    pub records: Vec<TableEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub name: String,
    pub checksums: Vec<u32>,
    /// Expected frame count; defaults to the number of checksums.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub format: PixelFormat,
}

impl TableEntry {
    pub fn into_record(self) -> ChecksumRecord {
        let count = self.count;
        let mut record = ChecksumRecord::owned(self.name, self.format, self.checksums);
        if let Some(count) = count {
            record.count = count;
        }
        record
    }
}

impl TableFile {
    pub fn parse(path: &Path, text: &str) -> Result<Self, LoadError> {
        toml::from_str(text).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        Self::parse(path, &text)
    }

    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        let text = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LoadError::io(parent, e))?;
        }
        std::fs::write(path, text).map_err(|e| LoadError::io(path, e))
    }

    pub fn into_records(self) -> Vec<ChecksumRecord> {
        self.records
            .into_iter()
            .map(TableEntry::into_record)
            .collect()
    }
}

/// Sink collecting one [`TableEntry`] per recorded session.
#[derive(Debug, Default)]
pub struct TomlRecorder {
    table: TableFile,
    current: Option<TableEntry>,
}

impl TomlRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &TableFile {
        &self.table
    }

    pub fn into_table(self) -> TableFile {
        self.table
    }
}

impl FrameSink for TomlRecorder {
    fn session_started(&mut self, session: &SessionInfo<'_>) -> io::Result<()> {
        self.current = Some(TableEntry {
            name: session.name.to_owned(),
            checksums: Vec::new(),
            count: None,
            format: *session.format,
        });
        Ok(())
    }

    fn frame(&mut self, capture: &CapturedFrame<'_>) -> io::Result<()> {
        if let Some(entry) = self.current.as_mut() {
            entry.checksums.push(capture.checksum);
        }
        Ok(())
    }

    fn session_ended(&mut self, session: &SessionInfo<'_>, _captured: usize) -> io::Result<()> {
        if let Some(entry) = self.current.take() {
            debug!(
                "recorded {} checksums for {}",
                entry.checksums.len(),
                session.label
            );
            self.table.records.push(entry);
        }
        Ok(())
    }
}
