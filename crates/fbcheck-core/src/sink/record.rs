use super::{CapturedFrame, FrameSink, SessionInfo};
use crate::format::{ChannelField, ModeKind, PixelFormat};
use log::debug;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Emits one `ChecksumRecord::new(..)` entry per session, ready to be pasted
/// into a `static` reference table.
///
/// Checksums are buffered and the entry is written when the session ends, so
/// an abandoned session leaves no partial entry behind.
pub struct RecordAppender<W: Write> {
    out: W,
    pending: Vec<u32>,
}

impl RecordAppender<BufWriter<File>> {
    /// Creates (truncating) `path` as the record output.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> RecordAppender<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            pending: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn field_literal(field: ChannelField) -> String {
    format!("ChannelField::new({}, {})", field.pos, field.size)
}

/// `PixelFormat { .. }` literal with every field spelled out.
pub(crate) fn format_literal(format: &PixelFormat) -> String {
    let kind = match format.kind {
        ModeKind::Indexed => "ModeKind::Indexed",
        ModeKind::Direct => "ModeKind::Direct",
    };
    format!(
        "PixelFormat {{ width: {}, height: {}, kind: {kind}, number_of_colors: {}, bpp: {}, \
         bytes_per_pixel: {}, red: {}, green: {}, blue: {}, reserved: {} }}",
        format.width,
        format.height,
        format.number_of_colors,
        format.bpp,
        format.bytes_per_pixel,
        field_literal(format.red),
        field_literal(format.green),
        field_literal(format.blue),
        field_literal(format.reserved),
    )
}

/// Full table entry for `name`/`format` with `checksums`.
pub(crate) fn record_entry(session: &SessionInfo<'_>, checksums: &[u32]) -> String {
    let values: Vec<String> = checksums.iter().map(|crc| format!("0x{crc:08x}")).collect();
    format!(
        "    // {}\n    ChecksumRecord::new(\n        {:?},\n        {},\n        &[{}],\n    ),\n",
        session.label,
        session.name,
        format_literal(session.format),
        values.join(", "),
    )
}

impl<W: Write> FrameSink for RecordAppender<W> {
    fn session_started(&mut self, _session: &SessionInfo<'_>) -> io::Result<()> {
        self.pending.clear();
        Ok(())
    }

    fn frame(&mut self, capture: &CapturedFrame<'_>) -> io::Result<()> {
        self.pending.push(capture.checksum);
        Ok(())
    }

    fn session_ended(&mut self, session: &SessionInfo<'_>, _captured: usize) -> io::Result<()> {
        let entry = record_entry(session, &self.pending);
        self.out.write_all(entry.as_bytes())?;
        self.out.flush()?;
        debug!(
            "recorded {} checksums for {}",
            self.pending.len(),
            session.label
        );
        self.pending.clear();
        Ok(())
    }
}
