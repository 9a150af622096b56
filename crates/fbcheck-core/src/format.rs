use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
/// Whether pixel values are palette indices or packed color channels.
pub enum ModeKind {
    Indexed,
    #[default]
    Direct,
}

/// Bit field of one color channel inside a packed pixel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChannelField {
    /// Position of the least significant bit of the field.
    pub pos: u32,
    /// Width of the field in bits. Zero means the channel is absent.
    pub size: u32,
}

impl ChannelField {
    pub const NONE: Self = Self::new(0, 0);

    pub const fn new(pos: u32, size: u32) -> Self {
        Self { pos, size }
    }

    /// One past the most significant bit covered by the field.
    pub const fn end(self) -> u32 {
        self.pos.saturating_add(self.size)
    }
}

/// Structural description of a framebuffer as reported by the frame source.
///
/// Two formats are interchangeable only if every field is equal; equivalent
/// layouts spelled differently (e.g. a different `bpp` for the same channel
/// fields) are distinct reference table keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelFormat {
    pub width: u32,
    pub height: u32,
    pub kind: ModeKind,
    #[serde(default)]
    pub number_of_colors: u32,
    pub bpp: u32,
    pub bytes_per_pixel: u32,
    #[serde(default)]
    pub red: ChannelField,
    #[serde(default)]
    pub green: ChannelField,
    #[serde(default)]
    pub blue: ChannelField,
    #[serde(default)]
    pub reserved: ChannelField,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unsupported bytes per pixel: {0}")]
    BytesPerPixel(u32),

    #[error("indexed formats use one byte per pixel, got {0}")]
    IndexedWidth(u32),

    #[error("{channel} field {pos}+{size} exceeds {bits}-bit pixel")]
    FieldOutOfRange {
        channel: &'static str,
        pos: u32,
        size: u32,
        bits: u32,
    },

    #[error("channel fields cover {covered} bits of a {bits}-bit pixel")]
    Coverage { covered: u32, bits: u32 },
}

impl PixelFormat {
    /// 8-bit palette indexed format.
    pub const fn indexed(width: u32, height: u32, number_of_colors: u32) -> Self {
        Self {
            width,
            height,
            kind: ModeKind::Indexed,
            number_of_colors,
            bpp: 8,
            bytes_per_pixel: 1,
            red: ChannelField::NONE,
            green: ChannelField::NONE,
            blue: ChannelField::NONE,
            reserved: ChannelField::NONE,
        }
    }

    /// Direct color format; `bpp` is the sum of all channel widths.
    pub const fn direct(
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
        red: ChannelField,
        green: ChannelField,
        blue: ChannelField,
        reserved: ChannelField,
    ) -> Self {
        Self {
            width,
            height,
            kind: ModeKind::Direct,
            number_of_colors: 256,
            bpp: red.size + green.size + blue.size + reserved.size,
            bytes_per_pixel,
            red,
            green,
            blue,
            reserved,
        }
    }

    /// 32-bit pixel value `0xXXRRGGBB`.
    pub const fn rgba8888(width: u32, height: u32) -> Self {
        Self::direct(
            width,
            height,
            4,
            ChannelField::new(16, 8),
            ChannelField::new(8, 8),
            ChannelField::new(0, 8),
            ChannelField::new(24, 8),
        )
    }

    /// 32-bit pixel value `0xXXBBGGRR`.
    pub const fn bgra8888(width: u32, height: u32) -> Self {
        Self::direct(
            width,
            height,
            4,
            ChannelField::new(0, 8),
            ChannelField::new(8, 8),
            ChannelField::new(16, 8),
            ChannelField::new(24, 8),
        )
    }

    /// 24-bit pixel value `0xRRGGBB`.
    pub const fn rgb888(width: u32, height: u32) -> Self {
        Self::direct(
            width,
            height,
            3,
            ChannelField::new(16, 8),
            ChannelField::new(8, 8),
            ChannelField::new(0, 8),
            ChannelField::NONE,
        )
    }

    /// 24-bit pixel value `0xBBGGRR`.
    pub const fn bgr888(width: u32, height: u32) -> Self {
        Self::direct(
            width,
            height,
            3,
            ChannelField::new(0, 8),
            ChannelField::new(8, 8),
            ChannelField::new(16, 8),
            ChannelField::NONE,
        )
    }

    pub const fn rgb565(width: u32, height: u32) -> Self {
        Self::direct(
            width,
            height,
            2,
            ChannelField::new(11, 5),
            ChannelField::new(5, 6),
            ChannelField::new(0, 5),
            ChannelField::NONE,
        )
    }

    pub const fn rgb555(width: u32, height: u32) -> Self {
        Self::direct(
            width,
            height,
            2,
            ChannelField::new(10, 5),
            ChannelField::new(5, 5),
            ChannelField::new(0, 5),
            ChannelField::new(15, 1),
        )
    }

    pub const fn is_indexed(&self) -> bool {
        matches!(self.kind, ModeKind::Indexed)
    }

    /// Bytes occupied by the visible pixels of one scanline.
    pub const fn row_bytes(&self) -> usize {
        self.width as usize * self.bytes_per_pixel as usize
    }

    pub fn validate(&self) -> Result<(), FormatError> {
        if !(1..=4).contains(&self.bytes_per_pixel) {
            return Err(FormatError::BytesPerPixel(self.bytes_per_pixel));
        }
        if self.is_indexed() {
            if self.bytes_per_pixel != 1 {
                return Err(FormatError::IndexedWidth(self.bytes_per_pixel));
            }
            return Ok(());
        }

        let bits = self.bytes_per_pixel * 8;
        let mut covered = 0u32;
        for (channel, field) in self.channels() {
            if field.size > 0 && field.end() > bits {
                return Err(FormatError::FieldOutOfRange {
                    channel,
                    pos: field.pos,
                    size: field.size,
                    bits,
                });
            }
            covered += field.size;
        }
        if covered > bits {
            return Err(FormatError::Coverage { covered, bits });
        }
        Ok(())
    }

    fn channels(&self) -> [(&'static str, ChannelField); 4] {
        [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("reserved", self.reserved),
        ]
    }

    /// Short mode tag: `i256`, `rgba8888`, `bgra8880`, ...
    ///
    /// Formats with red at bit 0 list the channels blue first.
    pub fn mode_tag(&self) -> String {
        if self.is_indexed() {
            return format!("i{}", self.number_of_colors);
        }
        if self.red.pos == 0 {
            format!(
                "bgra{}{}{}{}",
                self.blue.size, self.green.size, self.red.size, self.reserved.size
            )
        } else {
            format!(
                "rgba{}{}{}{}",
                self.red.size, self.green.size, self.blue.size, self.reserved.size
            )
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.mode_tag())
    }
}
