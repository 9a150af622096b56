use crate::error::LoadError;
use fbcheck_core::format::PixelFormat;
use fbcheck_core::frame::{MAX_PALETTE_COLORS, OwnedFrame, PaletteColor};
use fbcheck_core::normalize::ByteOrder;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// List of recorded sessions to check, one `[[session]]` table each.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "session")]
    pub sessions: Vec<SessionSpec>,
    #[serde(skip)]
    base: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSpec {
    pub name: String,
    pub format: PixelFormat,
    /// Bytes per scanline; defaults to `width * bytes_per_pixel`.
    #[serde(default)]
    pub pitch: Option<usize>,
    /// Order the dumps were written in, if not the configured one.
    #[serde(default)]
    pub byte_order: Option<ByteOrder>,
    /// Raw RGB triples, one per palette entry.
    #[serde(default)]
    pub palette: Option<PathBuf>,
    #[serde(default)]
    pub frames: Vec<PathBuf>,
}

impl Manifest {
    pub fn parse(path: &Path, text: &str) -> Result<Self, LoadError> {
        let mut manifest: Manifest = toml::from_str(text).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        manifest.base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        Self::parse(path, &text)
    }

    /// Resolves `path` against the manifest's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }

    pub fn load_palette(&self, session: &SessionSpec) -> Result<Vec<PaletteColor>, LoadError> {
        let Some(file) = session.palette.as_deref() else {
            return Ok(Vec::new());
        };
        let path = self.resolve(file);
        let bytes = std::fs::read(&path).map_err(|e| LoadError::io(&path, e))?;
        Ok(parse_palette(&bytes))
    }

    /// Reads frame `index` of `session`. Short or oversized dumps are loaded
    /// as-is; the verifier reports layout problems.
    pub fn load_frame(
        &self,
        session: &SessionSpec,
        index: usize,
        palette: &[PaletteColor],
    ) -> Result<OwnedFrame, LoadError> {
        let path = self.resolve(&session.frames[index]);
        let pixels = std::fs::read(&path).map_err(|e| LoadError::io(&path, e))?;
        let pitch = session.pitch.unwrap_or_else(|| session.format.row_bytes());
        let mut frame = OwnedFrame::from_bytes(session.format, pitch, pixels);
        frame.palette = palette.to_vec();
        Ok(frame)
    }
}

fn parse_palette(bytes: &[u8]) -> Vec<PaletteColor> {
    bytes
        .chunks_exact(3)
        .take(MAX_PALETTE_COLORS)
        .map(|c| PaletteColor::new(c[0], c[1], c[2]))
        .collect()
}
