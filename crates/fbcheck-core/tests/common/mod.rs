use fbcheck_core::format::{ChannelField, PixelFormat};
use fbcheck_core::frame::OwnedFrame;
use fbcheck_core::normalize::ByteOrder;

/// Packs an 8-bit channel value into `field`, dropping the low bits that do
/// not fit.
#[allow(dead_code)]
pub fn pack_channel(value: u8, field: ChannelField) -> u32 {
    if field.size == 0 {
        return 0;
    }
    ((value as u32) >> (8 - field.size)) << field.pos
}

/// Paints `rgb` pixels (row-major, `format.width` per row) into a framebuffer
/// laid out in `order`.
///
/// Indexed formats take the red component as the palette index. Reserved bits
/// are filled with `reserved` and row padding with `pad`.
#[allow(dead_code)]
pub fn paint(
    format: PixelFormat,
    pitch: usize,
    order: ByteOrder,
    rgb: &[[u8; 3]],
    reserved: u32,
    pad: u8,
) -> OwnedFrame {
    assert_eq!(rgb.len(), (format.width * format.height) as usize);
    let bpp = format.bytes_per_pixel as usize;
    let mut frame = OwnedFrame::with_pitch(format, pitch);
    frame.pixels.fill(pad);
    for (i, &[r, g, b]) in rgb.iter().enumerate() {
        let x = i % format.width as usize;
        let y = i / format.width as usize;
        let value = if format.is_indexed() {
            r as u32
        } else {
            let reserved_mask = if format.reserved.size == 0 {
                0
            } else {
                ((1u32 << format.reserved.size) - 1) << format.reserved.pos
            };
            pack_channel(r, format.red)
                | pack_channel(g, format.green)
                | pack_channel(b, format.blue)
                | (reserved << format.reserved.pos) & reserved_mask
        };
        let row = frame.row_mut(y);
        order.write_pixel(value, &mut row[x * bpp..(x + 1) * bpp]);
    }
    frame
}

/// Small deterministic test image.
#[allow(dead_code)]
pub fn gradient(width: u32, height: u32) -> Vec<[u8; 3]> {
    (0..width * height)
        .map(|i| {
            let x = i % width;
            let y = i / width;
            [
                (x * 37 + y * 11) as u8,
                (x * 5 + y * 71) as u8,
                (x * 113 ^ y * 29) as u8,
            ]
        })
        .collect()
}

#[allow(dead_code)]
pub fn all_layouts(width: u32, height: u32) -> Vec<PixelFormat> {
    vec![
        PixelFormat::indexed(width, height, 256),
        PixelFormat::rgb555(width, height),
        PixelFormat::rgb565(width, height),
        PixelFormat::rgb888(width, height),
        PixelFormat::bgr888(width, height),
        PixelFormat::rgba8888(width, height),
        PixelFormat::bgra8888(width, height),
    ]
}
