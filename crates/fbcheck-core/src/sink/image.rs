use super::{CapturedFrame, FrameSink};
use crate::format::PixelFormat;
use crate::frame::{Frame, MAX_PALETTE_COLORS, PaletteColor};
use crate::normalize::{ByteOrder, ChecksumScheme, Normalizer};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const FILE_HEADER_LEN: u32 = 14;
// BITMAPCOREHEADER: size, u16 width, u16 height, planes, bit count
const CORE_HEADER_LEN: u32 = 12;
const PALETTE_BYTES: u32 = MAX_PALETTE_COLORS as u32 * 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DumpFormat {
    #[default]
    Bmp,
    Png,
}

impl DumpFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DumpFormat::Bmp => "bmp",
            DumpFormat::Png => "png",
        }
    }
}

/// Writes every frame it receives to `<dir>/<label>_<index>.<ext>`.
///
/// Repeated runs overwrite earlier dumps of the same frame.
#[derive(Debug, Clone)]
pub struct ImageDumper {
    dir: PathBuf,
    format: DumpFormat,
}

impl ImageDumper {
    pub fn new(dir: impl Into<PathBuf>, format: DumpFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, label: &str, index: usize) -> PathBuf {
        self.dir.join(format!("{label}_{index}.{}", self.format.extension()))
    }
}

impl FrameSink for ImageDumper {
    fn frame(&mut self, capture: &CapturedFrame<'_>) -> io::Result<()> {
        let format = capture.session.format;
        let bytes = match self.format {
            DumpFormat::Bmp => encode_bmp(format, &capture.frame, capture.byte_order)?,
            DumpFormat::Png => encode_png(format, &capture.frame, capture.byte_order)?,
        };
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(capture.session.label, capture.index);
        fs::write(&path, bytes)?;
        debug!("wrote frame dump {}", path.display());
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg.into())
}

/// Palette padded or truncated to exactly 256 entries.
fn full_palette(
    format: &PixelFormat,
    palette: &[PaletteColor],
) -> [PaletteColor; MAX_PALETTE_COLORS] {
    let mut out = [PaletteColor::default(); MAX_PALETTE_COLORS];
    let len = palette
        .len()
        .min(format.number_of_colors as usize)
        .min(MAX_PALETTE_COLORS);
    out[..len].copy_from_slice(&palette[..len]);
    out
}

/// Top-down 8-bit rows (one-byte formats) or B,G,R rows (everything else).
fn decoded_rows<'f>(
    format: &'f PixelFormat,
    frame: &'f Frame<'f>,
    order: ByteOrder,
) -> io::Result<impl Iterator<Item = Vec<u8>> + 'f> {
    let normalizer = Normalizer::new(*format, order, ChecksumScheme::Channels)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    frame
        .check_layout(format)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok((0..format.height as usize).map(move |y| {
        let mut row = Vec::with_capacity(format.width as usize * 3);
        normalizer.normalize_pixels(frame.row(y), &mut row);
        row
    }))
}

/// Serializes a frame as an uncompressed bottom-up BMP.
///
/// One-byte formats become 8-bit images with a 256-entry palette; all other
/// formats are expanded to 24-bit.
pub fn encode_bmp(
    format: &PixelFormat,
    frame: &Frame<'_>,
    order: ByteOrder,
) -> io::Result<Vec<u8>> {
    let width = u16::try_from(format.width).map_err(|_| invalid("bitmap width exceeds 65535"))?;
    let height =
        u16::try_from(format.height).map_err(|_| invalid("bitmap height exceeds 65535"))?;
    let paletted = format.bytes_per_pixel == 1;
    let bits: u16 = if paletted { 8 } else { 24 };
    let stride = (width as u32 * (bits as u32 / 8) + 3) & !3;
    let data_offset = FILE_HEADER_LEN + CORE_HEADER_LEN + if paletted { PALETTE_BYTES } else { 0 };
    let file_size = data_offset + stride * height as u32;

    let mut out = Vec::with_capacity(file_size as usize);
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&file_size.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&data_offset.to_le_bytes());
    out.extend_from_slice(&CORE_HEADER_LEN.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());

    if paletted {
        for color in full_palette(format, frame.palette) {
            out.extend_from_slice(&[color.b, color.g, color.r]);
        }
    }

    let rows: Vec<Vec<u8>> = decoded_rows(format, frame, order)?.collect();
    for row in rows.iter().rev() {
        out.extend_from_slice(row);
        out.resize(out.len() + (stride as usize - row.len()), 0);
    }
    Ok(out)
}

/// Serializes a frame as an 8-bit indexed or RGB PNG.
pub fn encode_png(
    format: &PixelFormat,
    frame: &Frame<'_>,
    order: ByteOrder,
) -> io::Result<Vec<u8>> {
    let paletted = format.bytes_per_pixel == 1;
    let mut data = Vec::with_capacity(format.width as usize * format.height as usize * 3);
    for row in decoded_rows(format, frame, order)? {
        if paletted {
            data.extend_from_slice(&row);
        } else {
            for bgr in row.chunks_exact(3) {
                data.extend_from_slice(&[bgr[2], bgr[1], bgr[0]]);
            }
        }
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, format.width, format.height);
        encoder.set_depth(png::BitDepth::Eight);
        if paletted {
            encoder.set_color(png::ColorType::Indexed);
            let palette: Vec<u8> = full_palette(format, frame.palette)
                .iter()
                .flat_map(|c| [c.r, c.g, c.b])
                .collect();
            encoder.set_palette(palette);
        } else {
            encoder.set_color(png::ColorType::Rgb);
        }
        let mut writer = encoder.write_header().map_err(io::Error::other)?;
        writer.write_image_data(&data).map_err(io::Error::other)?;
        writer.finish().map_err(io::Error::other)?;
    }
    Ok(out)
}
