use crate::crc32c::Crc32c;
use crate::format::{FormatError, PixelFormat};
use crate::frame::{Frame, FrameError, FrameSource};
use crate::normalize::{ByteOrder, ChecksumScheme, Normalizer};
use crate::sink::{CapturedFrame, FrameSink, NullSink, SessionInfo};
use crate::table::{self, ChecksumRecord};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Compare every frame against the reference table.
    #[default]
    Verify,
    /// Capture new baselines: every frame goes to the sink and no check fails.
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerifierOptions {
    pub mode: RunMode,
    pub byte_order: ByteOrder,
    pub scheme: ChecksumScheme,
}

/// Misuse of the session state machine or malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionViolation {
    #[error("session {active} is still active")]
    AlreadyActive { active: String },

    #[error("no session is active")]
    NotActive,

    #[error("invalid pixel format: {0}")]
    InvalidFormat(#[from] FormatError),

    #[error("invalid framebuffer: {0}")]
    Frame(#[from] FrameError),
}

/// Test assertion failures reported by a [`Verifier`].
///
/// None of these stop the session: the caller may keep feeding frames and
/// collect every failure before ending it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("Unexpected checksum {label}:{index}: {checksum:#x}")]
    UnexpectedChecksum {
        label: String,
        index: usize,
        checksum: u32,
    },

    #[error("Checksum {label}:{index} failed: {computed:#x} vs {expected:#x}")]
    ChecksumMismatch {
        label: String,
        index: usize,
        computed: u32,
        expected: u32,
    },

    #[error("Not enough checksums {label}: {captured} vs {expected}")]
    InsufficientChecksums {
        label: String,
        captured: usize,
        expected: usize,
    },

    #[error(transparent)]
    Precondition(#[from] PreconditionViolation),
}

/// Result of a frame that did not fail verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Matched { index: usize, checksum: u32 },
    /// Record mode; `expected` is what the table held for this frame, if anything.
    Recorded {
        index: usize,
        checksum: u32,
        expected: Option<u32>,
    },
}

impl FrameOutcome {
    pub fn checksum(&self) -> u32 {
        match *self {
            FrameOutcome::Matched { checksum, .. } | FrameOutcome::Recorded { checksum, .. } => {
                checksum
            }
        }
    }
}

/// Totals of a session that ended cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub label: String,
    pub captured: usize,
    pub expected: usize,
}

/// State of the test currently under verification.
#[derive(Debug, Clone)]
pub struct Session<'t> {
    name: String,
    label: String,
    format: PixelFormat,
    record: Option<&'t ChecksumRecord>,
    counter: usize,
}

impl<'t> Session<'t> {
    fn new(name: &str, format: PixelFormat, record: Option<&'t ChecksumRecord>) -> Self {
        Self {
            name: name.to_owned(),
            label: format!("{name}_{format}"),
            format,
            record,
            counter: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<name>_<width>x<height>x<modetag>`, used in messages and dump names.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    pub fn record(&self) -> Option<&'t ChecksumRecord> {
        self.record
    }

    /// Frames checksummed so far.
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Frames the matched record expects; 0 when nothing matched.
    pub fn expected_count(&self) -> usize {
        self.record.map_or(0, |r| r.count)
    }

    fn info(&self) -> SessionInfo<'_> {
        SessionInfo {
            name: &self.name,
            label: &self.label,
            format: &self.format,
        }
    }
}

/// Checks per-frame checksums of one test at a time against a reference
/// table.
///
/// ```
/// use fbcheck_core::{ChecksumRecord, Frame, PixelFormat, Verifier};
///
/// static TABLE: &[ChecksumRecord] =
///     &[ChecksumRecord::new("solid", PixelFormat::bgr888(2, 1), &[0xdcca_b04b])];
///
/// let mut verifier = Verifier::new(TABLE);
/// verifier.start("solid", PixelFormat::bgr888(2, 1)).unwrap();
/// let pixels = [0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00];
/// verifier.on_frame(&Frame::new(&pixels, 6)).unwrap();
/// verifier.end().unwrap();
/// ```
pub struct Verifier<'t, S: FrameSink = NullSink> {
    table: &'t [ChecksumRecord],
    options: VerifierOptions,
    sink: S,
    session: Option<Session<'t>>,
    scratch: Vec<u8>,
}

impl<'t> Verifier<'t, NullSink> {
    pub fn new(table: &'t [ChecksumRecord]) -> Self {
        Self::with_sink(table, VerifierOptions::default(), NullSink)
    }
}

impl<'t, S: FrameSink> Verifier<'t, S> {
    pub fn with_sink(table: &'t [ChecksumRecord], options: VerifierOptions, sink: S) -> Self {
        Self {
            table,
            options,
            sink,
            session: None,
            scratch: Vec::new(),
        }
    }

    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }

    pub fn session(&self) -> Option<&Session<'t>> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Opens a session for test `name` rendered in `format` and latches the
    /// matching reference record, if any.
    pub fn start(&mut self, name: &str, format: PixelFormat) -> Result<(), CheckError> {
        if let Some(active) = &self.session {
            return Err(PreconditionViolation::AlreadyActive {
                active: active.label.clone(),
            }
            .into());
        }
        format.validate().map_err(PreconditionViolation::from)?;

        let record = table::lookup(self.table, name, &format);
        let session = Session::new(name, format, record);
        match record {
            Some(r) => debug!("{}: expecting {} checksums", session.label, r.count),
            None => debug!("{}: no reference checksums", session.label),
        }

        if let Err(e) = self.sink.session_started(&session.info()) {
            warn!("{}: sink failed to start session: {e}", session.label);
        }
        self.session = Some(session);
        Ok(())
    }

    /// Starts a session using the source's current pixel format.
    pub fn start_with(&mut self, name: &str, source: &impl FrameSource) -> Result<(), CheckError> {
        self.start(name, source.pixel_format())
    }

    /// Checks the source's current frame.
    pub fn capture(&mut self, source: &impl FrameSource) -> Result<FrameOutcome, CheckError> {
        self.on_frame(&source.frame())
    }

    /// Checksums one rendered frame and compares it with the next expected
    /// value.
    ///
    /// Every frame that gets checksummed advances the counter, failed ones
    /// included, so later frames keep being compared at their own index.
    pub fn on_frame(&mut self, frame: &Frame<'_>) -> Result<FrameOutcome, CheckError> {
        let Some(session) = self.session.as_mut() else {
            return Err(PreconditionViolation::NotActive.into());
        };

        let normalizer =
            Normalizer::new(session.format, self.options.byte_order, self.options.scheme)
                .map_err(PreconditionViolation::from)?;
        let mut crc = Crc32c::new();
        normalizer
            .accumulate(frame, &mut crc, &mut self.scratch)
            .map_err(PreconditionViolation::from)?;
        let checksum = crc.value();

        let index = session.counter;
        session.counter += 1;
        let expected = session.record.and_then(|r| r.expected(index));

        let result = match (self.options.mode, expected) {
            (RunMode::Record, _) => Ok(FrameOutcome::Recorded {
                index,
                checksum,
                expected,
            }),
            (RunMode::Verify, Some(want)) if want == checksum => {
                return Ok(FrameOutcome::Matched { index, checksum });
            }
            (RunMode::Verify, Some(want)) => Err(CheckError::ChecksumMismatch {
                label: session.label.clone(),
                index,
                computed: checksum,
                expected: want,
            }),
            (RunMode::Verify, None) => Err(CheckError::UnexpectedChecksum {
                label: session.label.clone(),
                index,
                checksum,
            }),
        };

        if let Err(e) = &result {
            warn!("{e}");
        }

        let capture = CapturedFrame {
            session: session.info(),
            index,
            checksum,
            expected,
            frame: *frame,
            byte_order: self.options.byte_order,
        };
        if let Err(e) = self.sink.frame(&capture) {
            warn!("{}:{index}: sink failed: {e}", session.label);
        }

        result
    }

    /// Closes the session and checks that exactly the expected number of
    /// frames was captured.
    pub fn end(&mut self) -> Result<SessionSummary, CheckError> {
        let Some(session) = self.session.take() else {
            return Err(PreconditionViolation::NotActive.into());
        };

        if let Err(e) = self.sink.session_ended(&session.info(), session.counter) {
            warn!("{}: sink failed to end session: {e}", session.label);
        }

        let summary = SessionSummary {
            captured: session.counter,
            expected: session.expected_count(),
            label: session.label,
        };

        if self.options.mode == RunMode::Verify && summary.captured != summary.expected {
            let err = CheckError::InsufficientChecksums {
                label: summary.label,
                captured: summary.captured,
                expected: summary.expected,
            };
            warn!("{err}");
            return Err(err);
        }

        info!(
            "{}: {} of {} frames checked",
            summary.label, summary.captured, summary.expected
        );
        Ok(summary)
    }
}
