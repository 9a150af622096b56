//! Destinations for frames that failed verification or are being recorded.
//!
//! A [`Verifier`](crate::session::Verifier) is generic over one
//! [`FrameSink`]. Use [`NullSink`] to discard, [`ImageDumper`] to write
//! images, [`RecordAppender`] to emit reference table entries, or a tuple of
//! two sinks to do both.

use crate::format::PixelFormat;
use crate::frame::Frame;
use crate::normalize::ByteOrder;
use std::io;

mod image;
mod record;

pub use image::{DumpFormat, ImageDumper, encode_bmp, encode_png};
pub use record::RecordAppender;

/// Identity of the session a sink event belongs to.
#[derive(Debug, Clone, Copy)]
pub struct SessionInfo<'a> {
    pub name: &'a str,
    /// `<name>_<width>x<height>x<modetag>`
    pub label: &'a str,
    pub format: &'a PixelFormat,
}

/// A frame handed to a sink together with its computed checksum.
#[derive(Debug, Clone, Copy)]
pub struct CapturedFrame<'a> {
    pub session: SessionInfo<'a>,
    pub index: usize,
    pub checksum: u32,
    /// Checksum the reference table expected at `index`, if any.
    pub expected: Option<u32>,
    pub frame: Frame<'a>,
    /// Read order the frame's multi-byte pixels were decoded with.
    pub byte_order: ByteOrder,
}

pub trait FrameSink {
    fn session_started(&mut self, _session: &SessionInfo<'_>) -> io::Result<()> {
        Ok(())
    }

    fn frame(&mut self, capture: &CapturedFrame<'_>) -> io::Result<()>;

    fn session_ended(&mut self, _session: &SessionInfo<'_>, _captured: usize) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn frame(&mut self, _capture: &CapturedFrame<'_>) -> io::Result<()> {
        Ok(())
    }
}

/// Both sinks see every event; the second still runs if the first fails.
impl<A: FrameSink, B: FrameSink> FrameSink for (A, B) {
    fn session_started(&mut self, session: &SessionInfo<'_>) -> io::Result<()> {
        let first = self.0.session_started(session);
        let second = self.1.session_started(session);
        first.and(second)
    }

    fn frame(&mut self, capture: &CapturedFrame<'_>) -> io::Result<()> {
        let first = self.0.frame(capture);
        let second = self.1.frame(capture);
        first.and(second)
    }

    fn session_ended(&mut self, session: &SessionInfo<'_>, captured: usize) -> io::Result<()> {
        let first = self.0.session_ended(session, captured);
        let second = self.1.session_ended(session, captured);
        first.and(second)
    }
}

/// `None` behaves like [`NullSink`].
impl<S: FrameSink> FrameSink for Option<S> {
    fn session_started(&mut self, session: &SessionInfo<'_>) -> io::Result<()> {
        match self {
            Some(sink) => sink.session_started(session),
            None => Ok(()),
        }
    }

    fn frame(&mut self, capture: &CapturedFrame<'_>) -> io::Result<()> {
        match self {
            Some(sink) => sink.frame(capture),
            None => Ok(()),
        }
    }

    fn session_ended(&mut self, session: &SessionInfo<'_>, captured: usize) -> io::Result<()> {
        match self {
            Some(sink) => sink.session_ended(session, captured),
            None => Ok(()),
        }
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn session_started(&mut self, session: &SessionInfo<'_>) -> io::Result<()> {
        (**self).session_started(session)
    }

    fn frame(&mut self, capture: &CapturedFrame<'_>) -> io::Result<()> {
        (**self).frame(capture)
    }

    fn session_ended(&mut self, session: &SessionInfo<'_>, captured: usize) -> io::Result<()> {
        (**self).session_ended(session, captured)
    }
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn session_started(&mut self, session: &SessionInfo<'_>) -> io::Result<()> {
        (**self).session_started(session)
    }

    fn frame(&mut self, capture: &CapturedFrame<'_>) -> io::Result<()> {
        (**self).frame(capture)
    }

    fn session_ended(&mut self, session: &SessionInfo<'_>, captured: usize) -> io::Result<()> {
        (**self).session_ended(session, captured)
    }
}
