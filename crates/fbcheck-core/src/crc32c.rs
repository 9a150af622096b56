/// Running CRC32C (Castagnoli) over a stream of byte runs.
///
/// Feeding `a` then `b` yields the same value as feeding `a ++ b`, so callers
/// can present a frame in whatever chunks are convenient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crc32c {
    crc: u32,
}

impl Crc32c {
    /// Starts a checksum from seed 0.
    pub const fn new() -> Self {
        Self::resume(0)
    }

    /// Continues a checksum previously returned by [`Crc32c::value`].
    pub const fn resume(crc: u32) -> Self {
        Self { crc }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.crc = ::crc32c::crc32c_append(self.crc, bytes);
    }

    pub const fn value(&self) -> u32 {
        self.crc
    }
}

impl Default for Crc32c {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot CRC32C of `bytes` from seed 0.
pub fn checksum(bytes: &[u8]) -> u32 {
    ::crc32c::crc32c(bytes)
}
