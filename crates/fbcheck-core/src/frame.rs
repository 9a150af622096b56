use crate::format::PixelFormat;
use thiserror::Error;

/// Largest palette the diagnostic writers emit.
pub const MAX_PALETTE_COLORS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaletteColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PaletteColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("pitch {pitch} is smaller than a {row_bytes}-byte scanline")]
    PitchTooSmall { pitch: usize, row_bytes: usize },

    #[error("framebuffer holds {actual} bytes, {required} required")]
    Truncated { required: usize, actual: usize },
}

/// One rendered frame as handed over by the frame source.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub pixels: &'a [u8],
    /// Byte stride between the starts of consecutive scanlines.
    pub pitch: usize,
    pub palette: &'a [PaletteColor],
}

impl<'a> Frame<'a> {
    pub fn new(pixels: &'a [u8], pitch: usize) -> Self {
        Self {
            pixels,
            pitch,
            palette: &[],
        }
    }

    pub fn with_palette(mut self, palette: &'a [PaletteColor]) -> Self {
        self.palette = palette;
        self
    }

    /// Checks that `pitch * height` bytes with `pitch` covering a scanline are
    /// present for `format`.
    pub fn check_layout(&self, format: &PixelFormat) -> Result<(), FrameError> {
        let row_bytes = format.row_bytes();
        if self.pitch < row_bytes {
            return Err(FrameError::PitchTooSmall {
                pitch: self.pitch,
                row_bytes,
            });
        }
        let required = self.pitch.saturating_mul(format.height as usize);
        if self.pixels.len() < required {
            return Err(FrameError::Truncated {
                required,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }

    /// Scanline `y` including its padding bytes.
    ///
    /// Callers must have validated the layout with [`Frame::check_layout`].
    pub fn row(&self, y: usize) -> &'a [u8] {
        let pixels = self.pixels;
        let start = y * self.pitch;
        &pixels[start..start + self.pitch]
    }
}

/// Collaborator that owns the framebuffer and knows its current mode.
pub trait FrameSource {
    fn pixel_format(&self) -> PixelFormat;

    fn pitch(&self) -> usize;

    /// Contents of the most recently completed frame.
    fn framebuffer(&self) -> &[u8];

    /// Up to `number_of_colors` palette entries for indexed formats.
    fn palette(&self) -> &[PaletteColor] {
        &[]
    }

    fn frame(&self) -> Frame<'_> {
        Frame::new(self.framebuffer(), self.pitch()).with_palette(self.palette())
    }
}

/// Framebuffer held in memory, e.g. a dump loaded from disk or an image
/// painted by a test.
#[derive(Debug, Clone)]
pub struct OwnedFrame {
    pub format: PixelFormat,
    pub pitch: usize,
    pub pixels: Vec<u8>,
    pub palette: Vec<PaletteColor>,
}

impl OwnedFrame {
    /// Zero-filled frame with the tightest pitch for `format`.
    pub fn new(format: PixelFormat) -> Self {
        Self::with_pitch(format, format.row_bytes())
    }

    pub fn with_pitch(format: PixelFormat, pitch: usize) -> Self {
        Self {
            format,
            pitch,
            pixels: vec![0; pitch * format.height as usize],
            palette: Vec::new(),
        }
    }

    pub fn from_bytes(format: PixelFormat, pitch: usize, pixels: Vec<u8>) -> Self {
        Self {
            format,
            pitch,
            pixels,
            palette: Vec::new(),
        }
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.pitch;
        &mut self.pixels[start..start + self.pitch]
    }

    pub fn as_frame(&self) -> Frame<'_> {
        Frame::new(&self.pixels, self.pitch).with_palette(&self.palette)
    }
}

impl FrameSource for OwnedFrame {
    fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    fn pitch(&self) -> usize {
        self.pitch
    }

    fn framebuffer(&self) -> &[u8] {
        &self.pixels
    }

    fn palette(&self) -> &[PaletteColor] {
        &self.palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_requires_full_pitch_times_height() {
        let format = PixelFormat::rgb888(2, 2);
        let bytes = [0u8; 15];
        assert_eq!(
            Frame::new(&bytes, 8).check_layout(&format),
            Err(FrameError::Truncated {
                required: 16,
                actual: 15
            })
        );
        assert_eq!(Frame::new(&bytes, 7).check_layout(&format), Ok(()));
    }

    #[test]
    fn pitch_must_cover_visible_pixels() {
        let format = PixelFormat::rgba8888(3, 1);
        let bytes = [0u8; 16];
        assert_eq!(
            Frame::new(&bytes, 11).check_layout(&format),
            Err(FrameError::PitchTooSmall {
                pitch: 11,
                row_bytes: 12
            })
        );
    }

    #[test]
    fn owned_frame_rows_include_padding() {
        let mut frame = OwnedFrame::with_pitch(PixelFormat::indexed(3, 2, 256), 4);
        frame.row_mut(1).copy_from_slice(&[1, 2, 3, 0xEE]);
        assert_eq!(frame.as_frame().row(1), &[1, 2, 3, 0xEE]);
        assert_eq!(frame.as_frame().row(0), &[0, 0, 0, 0]);
    }
}
