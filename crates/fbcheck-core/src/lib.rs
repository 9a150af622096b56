//! Deterministic framebuffer checksum verification.
//!
//! This crate contains the host-agnostic engine: pixel normalization, the
//! CRC32C accumulator, reference table lookup and the per-test session state
//! machine. Front ends (the `fbcheck` CLI, test harnesses) feed frames into a
//! [`session::Verifier`] and collect the resulting [`session::CheckError`]s.

/// CRC32C accumulator used for every frame checksum.
pub mod crc32c;

/// Pixel-format descriptors and validation.
pub mod format;

/// Borrowed and owned framebuffers, palettes and the frame source contract.
pub mod frame;

/// Scanline normalization into a byte-order independent stream.
pub mod normalize;

/// Session controller that checks captured frames against a reference table.
pub mod session;

/// Diagnostic image dumps and reference table recording.
pub mod sink;

/// Reference table records and exact-match lookup.
pub mod table;

pub use format::{ChannelField, ModeKind, PixelFormat};
pub use frame::{Frame, FrameSource, OwnedFrame, PaletteColor};
pub use normalize::{ByteOrder, ChecksumScheme};
pub use session::{CheckError, RunMode, Verifier, VerifierOptions};
pub use table::ChecksumRecord;
