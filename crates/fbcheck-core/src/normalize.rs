use crate::crc32c::Crc32c;
use crate::format::{ChannelField, FormatError, PixelFormat};
use crate::frame::{Frame, FrameError};
use serde::{Deserialize, Serialize};

/// Order in which multi-byte pixel values are laid out in framebuffer memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the host this crate was compiled for.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    /// Assembles one 1 to 4 byte pixel value.
    ///
    /// Panics on any other width; [`Normalizer`] only reads validated formats.
    #[inline]
    pub fn read_pixel(self, bytes: &[u8]) -> u32 {
        match (bytes.len(), self) {
            (1, _) => bytes[0] as u32,
            (2, ByteOrder::Little) => u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
            (2, ByteOrder::Big) => u16::from_be_bytes([bytes[0], bytes[1]]) as u32,
            (3, ByteOrder::Little) => {
                bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16
            }
            (3, ByteOrder::Big) => {
                (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32
            }
            (4, ByteOrder::Little) => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            (4, ByteOrder::Big) => u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            (len, _) => unreachable!("pixel width {len} rejected by format validation"),
        }
    }

    /// Inverse of [`ByteOrder::read_pixel`] for `out.len()` bytes.
    #[inline]
    pub fn write_pixel(self, value: u32, out: &mut [u8]) {
        let len = out.len();
        match self {
            ByteOrder::Little => out.copy_from_slice(&value.to_le_bytes()[..len]),
            ByteOrder::Big => out.copy_from_slice(&value.to_be_bytes()[4 - len..]),
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::native()
    }
}

/// Canonical byte image a pixel is reduced to before checksumming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ChecksumScheme {
    /// Blue, green, red expanded to 8 bits each. Reserved bits are ignored.
    #[default]
    Channels,
    /// The pixel value as it would sit in little-endian memory, reserved bits
    /// included. Reproduces tables captured by checksumming raw scanlines on a
    /// little-endian host.
    LittleEndianBytes,
}

/// Extracts a channel and scales it to 8 bits.
///
/// Fields narrower than 8 bits are shifted up, wider fields keep their top
/// 8 bits, absent fields read as 0.
#[inline]
pub fn expand_channel(value: u32, field: ChannelField) -> u8 {
    if field.size == 0 {
        return 0;
    }
    let mask = if field.size >= 32 {
        u32::MAX
    } else {
        (1u32 << field.size) - 1
    };
    let bits = value.checked_shr(field.pos).unwrap_or(0) & mask;
    if field.size <= 8 {
        (bits << (8 - field.size)) as u8
    } else {
        (bits >> (field.size - 8)) as u8
    }
}

/// Converts scanlines of one pixel format into the canonical checksum stream.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    format: PixelFormat,
    order: ByteOrder,
    scheme: ChecksumScheme,
}

impl Normalizer {
    /// Fails if `format` does not pass [`PixelFormat::validate`].
    pub fn new(
        format: PixelFormat,
        order: ByteOrder,
        scheme: ChecksumScheme,
    ) -> Result<Self, FormatError> {
        format.validate()?;
        Ok(Self {
            format,
            order,
            scheme,
        })
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    /// Decodes one pixel into `[blue, green, red]`.
    #[inline]
    pub fn bgr(&self, pixel: &[u8]) -> [u8; 3] {
        let value = self.order.read_pixel(pixel);
        [
            expand_channel(value, self.format.blue),
            expand_channel(value, self.format.green),
            expand_channel(value, self.format.red),
        ]
    }

    /// Appends the canonical bytes for the visible pixels of `row` to `out`.
    ///
    /// `row` must hold at least `width * bytes_per_pixel` bytes; anything past
    /// that is padding and is left to the caller.
    pub fn normalize_pixels(&self, row: &[u8], out: &mut Vec<u8>) {
        let bytes_per_pixel = self.format.bytes_per_pixel as usize;
        let pixels = &row[..self.format.row_bytes()];

        if bytes_per_pixel == 1 {
            out.extend_from_slice(pixels);
            return;
        }

        match self.scheme {
            ChecksumScheme::Channels => {
                for pixel in pixels.chunks_exact(bytes_per_pixel) {
                    out.extend_from_slice(&self.bgr(pixel));
                }
            }
            ChecksumScheme::LittleEndianBytes => {
                for pixel in pixels.chunks_exact(bytes_per_pixel) {
                    let value = self.order.read_pixel(pixel);
                    out.extend_from_slice(&value.to_le_bytes()[..bytes_per_pixel]);
                }
            }
        }
    }

    /// Feeds a whole frame into `crc`: canonical pixels, then each row's
    /// padding bytes verbatim.
    ///
    /// `scratch` is reused between rows to avoid per-row allocation.
    pub fn accumulate(
        &self,
        frame: &Frame<'_>,
        crc: &mut Crc32c,
        scratch: &mut Vec<u8>,
    ) -> Result<(), FrameError> {
        frame.check_layout(&self.format)?;
        let row_bytes = self.format.row_bytes();
        for y in 0..self.format.height as usize {
            let row = frame.row(y);
            scratch.clear();
            self.normalize_pixels(row, scratch);
            crc.update(scratch);
            crc.update(&row[row_bytes..]);
        }
        Ok(())
    }

    pub fn checksum(&self, frame: &Frame<'_>) -> Result<u32, FrameError> {
        let mut crc = Crc32c::new();
        let mut scratch = Vec::with_capacity(self.format.width as usize * 4);
        self.accumulate(frame, &mut crc, &mut scratch)?;
        Ok(crc.value())
    }
}
