//! Checksums must not depend on the host the frame was rendered on.

mod common;

use common::{all_layouts, gradient, pack_channel, paint};
use fbcheck_core::crc32c;
use fbcheck_core::format::{ChannelField, PixelFormat};
use fbcheck_core::frame::Frame;
use fbcheck_core::normalize::{ByteOrder, ChecksumScheme, Normalizer, expand_channel};

fn sum(frame: &fbcheck_core::OwnedFrame, order: ByteOrder, scheme: ChecksumScheme) -> u32 {
    Normalizer::new(frame.format, order, scheme)
        .expect("valid format")
        .checksum(&frame.as_frame())
        .expect("valid frame")
}

#[test]
fn little_and_big_endian_hosts_agree() {
    let image = gradient(5, 3);
    for format in all_layouts(5, 3) {
        let pitch = format.row_bytes() + 3;
        let le = paint(format, pitch, ByteOrder::Little, &image, 0x5A, 0xCC);
        let be = paint(format, pitch, ByteOrder::Big, &image, 0x5A, 0xCC);
        for scheme in [ChecksumScheme::Channels, ChecksumScheme::LittleEndianBytes] {
            assert_eq!(
                sum(&le, ByteOrder::Little, scheme),
                sum(&be, ByteOrder::Big, scheme),
                "{format} {scheme:?}"
            );
        }
    }
}

#[test]
fn little_endian_bytes_scheme_matches_raw_scanlines() {
    let image = gradient(4, 4);
    for format in all_layouts(4, 4) {
        let pitch = format.row_bytes() + 2;
        let le = paint(format, pitch, ByteOrder::Little, &image, 0x33, 0x99);
        assert_eq!(
            sum(&le, ByteOrder::Little, ChecksumScheme::LittleEndianBytes),
            crc32c::checksum(&le.pixels),
            "{format}"
        );
    }
}

#[test]
fn indexed_checksum_is_raw_bytes_in_either_scheme() {
    let format = PixelFormat::indexed(3, 2, 16);
    let pixels = [1u8, 2, 3, 0xEE, 4, 5, 6, 0xEE];
    let frame = Frame::new(&pixels, 4);
    for order in [ByteOrder::Little, ByteOrder::Big] {
        for scheme in [ChecksumScheme::Channels, ChecksumScheme::LittleEndianBytes] {
            let normalizer = Normalizer::new(format, order, scheme).unwrap();
            assert_eq!(normalizer.checksum(&frame), Ok(crc32c::checksum(&pixels)));
        }
    }
}

#[test]
fn row_padding_is_checksummed() {
    let image = gradient(3, 2);
    let format = PixelFormat::rgb565(3, 2);
    let a = paint(format, 8, ByteOrder::Little, &image, 0, 0x00);
    let b = paint(format, 8, ByteOrder::Little, &image, 0, 0x01);
    assert_ne!(
        sum(&a, ByteOrder::Little, ChecksumScheme::Channels),
        sum(&b, ByteOrder::Little, ChecksumScheme::Channels)
    );
}

#[test]
fn reserved_bits_only_count_in_little_endian_bytes_scheme() {
    let image = gradient(4, 2);
    let format = PixelFormat::rgba8888(4, 2);
    let a = paint(format, 16, ByteOrder::Little, &image, 0x00, 0);
    let b = paint(format, 16, ByteOrder::Little, &image, 0xFF, 0);
    assert_eq!(
        sum(&a, ByteOrder::Little, ChecksumScheme::Channels),
        sum(&b, ByteOrder::Little, ChecksumScheme::Channels)
    );
    assert_ne!(
        sum(&a, ByteOrder::Little, ChecksumScheme::LittleEndianBytes),
        sum(&b, ByteOrder::Little, ChecksumScheme::LittleEndianBytes)
    );
}

#[test]
fn channel_round_trip_for_every_width_and_position() {
    for bytes_per_pixel in 1..=4u32 {
        let bits = bytes_per_pixel * 8;
        for size in 1..=8u32.min(bits) {
            for pos in 0..=bits - size {
                let field = ChannelField::new(pos, size);
                let keep = 0xFFu8 << (8 - size);
                for value in [0x00u8, 0x5A, 0x80, 0xA5, 0xFF] {
                    let packed = pack_channel(value, field);
                    assert_eq!(
                        expand_channel(packed, field),
                        value & keep,
                        "pos {pos} size {size} value {value:#x}"
                    );
                }
            }
        }
    }
}

#[test]
fn scenario_a_checksum() {
    // 2x1, red then green, red in the lowest byte of each pixel
    let format = PixelFormat::bgr888(2, 1);
    let pixels = [0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00];
    let normalizer = Normalizer::new(format, ByteOrder::Little, ChecksumScheme::Channels).unwrap();
    let checksum = normalizer.checksum(&Frame::new(&pixels, 6)).unwrap();
    assert_eq!(checksum, crc32c::checksum(&[0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00]));
    assert_eq!(checksum, 0xDCCA_B04B);

    let raw =
        Normalizer::new(format, ByteOrder::Little, ChecksumScheme::LittleEndianBytes).unwrap();
    assert_eq!(raw.checksum(&Frame::new(&pixels, 6)), Ok(0x4572_7635));
}

#[test]
fn scenario_b_reserved_garbage_matches_scenario_a() {
    // same image as 32-bit pixels, value 0xXXBBGGRR with garbage in XX
    let format = PixelFormat::bgra8888(2, 1);
    let pixels = [0xFF, 0x00, 0x00, 0x9C, 0x00, 0xFF, 0x00, 0x31];
    let normalizer = Normalizer::new(format, ByteOrder::Little, ChecksumScheme::Channels).unwrap();
    assert_eq!(normalizer.checksum(&Frame::new(&pixels, 8)), Ok(0xDCCA_B04B));
}
