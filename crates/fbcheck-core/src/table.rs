use crate::format::PixelFormat;
use std::borrow::Cow;

/// Expected checksums for one test rendered in one pixel format.
///
/// Records are usually compiled into a `static` table:
///
/// ```
/// use fbcheck_core::{ChecksumRecord, PixelFormat};
///
/// static TABLE: &[ChecksumRecord] = &[ChecksumRecord::new(
///     "gfxterm_menu",
///     PixelFormat::rgba8888(640, 480),
///     &[0x1234_5678, 0x9ABC_DEF0],
/// )];
/// assert_eq!(TABLE[0].count, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumRecord {
    pub name: Cow<'static, str>,
    pub format: PixelFormat,
    pub checksums: Cow<'static, [u32]>,
    /// Number of frames the test is expected to produce.
    pub count: usize,
}

impl ChecksumRecord {
    pub const fn new(name: &'static str, format: PixelFormat, checksums: &'static [u32]) -> Self {
        Self {
            name: Cow::Borrowed(name),
            format,
            checksums: Cow::Borrowed(checksums),
            count: checksums.len(),
        }
    }

    /// Record built at runtime, e.g. from a table file.
    pub fn owned(name: String, format: PixelFormat, checksums: Vec<u32>) -> Self {
        let count = checksums.len();
        Self {
            name: Cow::Owned(name),
            format,
            checksums: Cow::Owned(checksums),
            count,
        }
    }

    pub fn matches(&self, name: &str, format: &PixelFormat) -> bool {
        self.name == name && self.format == *format
    }

    /// Checksum expected for frame `index`, if the record covers it.
    pub fn expected(&self, index: usize) -> Option<u32> {
        if index >= self.count {
            return None;
        }
        self.checksums.get(index).copied()
    }
}

/// Finds the first record whose name and every format field equal the
/// captured ones.
pub fn lookup<'t>(
    table: &'t [ChecksumRecord],
    name: &str,
    format: &PixelFormat,
) -> Option<&'t ChecksumRecord> {
    table.iter().find(|record| record.matches(name, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ChannelField;

    static TABLE: &[ChecksumRecord] = &[
        ChecksumRecord::new("videotest", PixelFormat::rgb565(640, 480), &[1, 2]),
        ChecksumRecord::new("videotest", PixelFormat::rgba8888(640, 480), &[3]),
        ChecksumRecord::new("videotest", PixelFormat::rgba8888(640, 480), &[4]),
    ];

    #[test]
    fn lookup_requires_name_and_format() {
        let format = PixelFormat::rgb565(640, 480);
        assert_eq!(lookup(TABLE, "videotest", &format).map(|r| r.count), Some(2));
        assert!(lookup(TABLE, "gfxmenu", &format).is_none());
        assert!(lookup(TABLE, "videotest", &PixelFormat::rgb565(800, 600)).is_none());
    }

    #[test]
    fn single_field_change_breaks_match() {
        let base = PixelFormat::rgb565(640, 480);
        let mut variants = Vec::new();
        for tweak in 0..10 {
            let mut f = base;
            match tweak {
                0 => f.red = ChannelField::new(11, 4),
                1 => f.green.pos = 4,
                2 => f.blue.size = 4,
                3 => f.reserved = ChannelField::new(15, 1),
                4 => f.bpp = 15,
                5 => f.number_of_colors = 0,
                6 => f.width = 641,
                7 => f.height = 479,
                8 => f.kind = crate::format::ModeKind::Indexed,
                _ => f.bytes_per_pixel = 3,
            }
            variants.push(f);
        }
        for f in variants {
            assert!(lookup(TABLE, "videotest", &f).is_none(), "{f:?}");
        }
    }

    #[test]
    fn first_duplicate_wins() {
        let record = lookup(TABLE, "videotest", &PixelFormat::rgba8888(640, 480));
        assert_eq!(record.and_then(|r| r.expected(0)), Some(3));
    }

    #[test]
    fn expected_is_bounded_by_count() {
        let mut record =
            ChecksumRecord::owned("t".into(), PixelFormat::rgb888(1, 1), vec![9, 8, 7]);
        assert_eq!(record.expected(2), Some(7));
        record.count = 2;
        assert_eq!(record.expected(2), None);
        record.count = 5;
        assert_eq!(record.expected(3), None);
    }
}
