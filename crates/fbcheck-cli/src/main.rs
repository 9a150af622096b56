mod config;
mod error;
mod manifest;
mod table_file;

use clap::{Parser, Subcommand, ValueEnum};
use error::LoadError;
use fbcheck_core::normalize::{ByteOrder, ChecksumScheme};
use fbcheck_core::session::{CheckError, FrameOutcome, RunMode, Verifier, VerifierOptions};
use fbcheck_core::sink::{DumpFormat, FrameSink, ImageDumper, NullSink, RecordAppender};
use fbcheck_core::table::ChecksumRecord;
use log::info;
use manifest::{Manifest, SessionSpec};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use table_file::{TableFile, TomlRecorder};

#[derive(Parser)]
#[command(name = "fbcheck", version, about = "Framebuffer checksum verifier")]
struct Args {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Checksum scheme, overriding the config file
    #[arg(long, global = true, value_enum)]
    scheme: Option<SchemeArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the checksum of every frame in a manifest
    Sum { manifest: PathBuf },

    /// Check every frame in a manifest against a reference table
    Verify {
        manifest: PathBuf,

        /// Reference table (TOML)
        #[arg(long)]
        table: Option<PathBuf>,

        /// Write images of failed frames here
        #[arg(long)]
        dump_dir: Option<PathBuf>,

        #[arg(long, value_enum)]
        dump_format: Option<DumpFormatArg>,
    },

    /// Capture new reference checksums
    Record {
        manifest: PathBuf,

        /// Output file for the recorded entries
        #[arg(long)]
        out: PathBuf,

        #[arg(long, value_enum, default_value_t = RecordStyle::Toml)]
        style: RecordStyle,

        /// Also write an image of every recorded frame
        #[arg(long)]
        dump_dir: Option<PathBuf>,

        #[arg(long, value_enum)]
        dump_format: Option<DumpFormatArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemeArg {
    Channels,
    LittleEndianBytes,
}

impl From<SchemeArg> for ChecksumScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Channels => ChecksumScheme::Channels,
            SchemeArg::LittleEndianBytes => ChecksumScheme::LittleEndianBytes,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DumpFormatArg {
    Bmp,
    Png,
}

impl From<DumpFormatArg> for DumpFormat {
    fn from(arg: DumpFormatArg) -> Self {
        match arg {
            DumpFormatArg::Bmp => DumpFormat::Bmp,
            DumpFormatArg::Png => DumpFormat::Png,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RecordStyle {
    /// `ChecksumRecord::new(..)` entries to paste into a Rust table
    Rust,
    /// `[[record]]` entries loadable with `verify --table`
    Toml,
}

/// Settings shared by every session of one run.
struct RunSettings {
    mode: RunMode,
    scheme: ChecksumScheme,
    byte_order: Option<ByteOrder>,
}

impl RunSettings {
    fn options_for(&self, session: &SessionSpec) -> VerifierOptions {
        VerifierOptions {
            mode: self.mode,
            byte_order: session
                .byte_order
                .or(self.byte_order)
                .unwrap_or_else(ByteOrder::native),
            scheme: self.scheme,
        }
    }
}

#[derive(Default)]
struct RunReport {
    outcomes: Vec<(String, FrameOutcome)>,
    failures: Vec<CheckError>,
}

fn run_session<S: FrameSink>(
    manifest: &Manifest,
    session: &SessionSpec,
    table: &[ChecksumRecord],
    options: VerifierOptions,
    sink: S,
    report: &mut RunReport,
) -> Result<(), LoadError> {
    let palette = manifest.load_palette(session)?;
    let mut verifier = Verifier::with_sink(table, options, sink);
    if let Err(e) = verifier.start(&session.name, session.format) {
        report.failures.push(e);
        return Ok(());
    }
    let label = verifier
        .session()
        .map(|s| s.label().to_owned())
        .unwrap_or_default();

    for index in 0..session.frames.len() {
        let frame = manifest.load_frame(session, index, &palette)?;
        match verifier.capture(&frame) {
            Ok(outcome) => report.outcomes.push((label.clone(), outcome)),
            Err(e) => report.failures.push(e),
        }
    }

    if let Err(e) = verifier.end() {
        report.failures.push(e);
    }
    Ok(())
}

fn run_manifest<S: FrameSink>(
    manifest: &Manifest,
    table: &[ChecksumRecord],
    settings: &RunSettings,
    mut sink: S,
) -> Result<(RunReport, S), LoadError> {
    let mut report = RunReport::default();
    for session in &manifest.sessions {
        let options = settings.options_for(session);
        run_session(manifest, session, table, options, &mut sink, &mut report)?;
    }
    Ok((report, sink))
}

fn load_table(path: Option<&Path>) -> Result<Vec<ChecksumRecord>, LoadError> {
    match path {
        Some(path) => Ok(TableFile::load(path)?.into_records()),
        None => Ok(Vec::new()),
    }
}

fn run(args: Args) -> Result<ExitCode, LoadError> {
    let config_path = args.config.unwrap_or_else(config::default_config_path);
    let cfg = config::load_from_file(&config_path);
    let scheme = args.scheme.map(ChecksumScheme::from).unwrap_or(cfg.scheme);

    match args.command {
        Command::Sum { manifest } => {
            let manifest = Manifest::load(&manifest)?;
            let settings = RunSettings {
                mode: RunMode::Record,
                scheme,
                byte_order: cfg.byte_order,
            };
            let (report, _) = run_manifest(&manifest, &[], &settings, NullSink)?;
            for (label, outcome) in &report.outcomes {
                let index = match outcome {
                    FrameOutcome::Matched { index, .. } | FrameOutcome::Recorded { index, .. } => {
                        index
                    }
                };
                println!("{label}:{index} {:#010x}", outcome.checksum());
            }
            for failure in &report.failures {
                eprintln!("{failure}");
            }
            Ok(exit_code(&report))
        }
        Command::Verify {
            manifest,
            table,
            dump_dir,
            dump_format,
        } => {
            let manifest = Manifest::load(&manifest)?;
            let table = load_table(table.as_deref().or(cfg.table.as_deref()))?;
            let dump_format = dump_format.map(DumpFormat::from).unwrap_or(cfg.dump_format);
            let dumper = dump_dir
                .or(cfg.dump_dir)
                .map(|dir| ImageDumper::new(dir, dump_format));
            let settings = RunSettings {
                mode: RunMode::Verify,
                scheme,
                byte_order: cfg.byte_order,
            };

            let (report, _) = run_manifest(&manifest, &table, &settings, dumper)?;
            for failure in &report.failures {
                eprintln!("{failure}");
            }
            info!(
                "{} frames matched, {} failures",
                report.outcomes.len(),
                report.failures.len()
            );
            Ok(exit_code(&report))
        }
        Command::Record {
            manifest,
            out,
            style,
            dump_dir,
            dump_format,
        } => {
            let manifest = Manifest::load(&manifest)?;
            let dump_format = dump_format.map(DumpFormat::from).unwrap_or(cfg.dump_format);
            let dumper = dump_dir.map(|dir| ImageDumper::new(dir, dump_format));
            let settings = RunSettings {
                mode: RunMode::Record,
                scheme,
                byte_order: cfg.byte_order,
            };

            let report = match style {
                RecordStyle::Rust => {
                    let appender =
                        RecordAppender::create(&out).map_err(|e| LoadError::io(&out, e))?;
                    let (report, (_, appender)) =
                        run_manifest(&manifest, &[], &settings, (dumper, appender))?;
                    appender
                        .into_inner()
                        .into_inner()
                        .map_err(|e| LoadError::io(&out, e.into_error()))?;
                    report
                }
                RecordStyle::Toml => {
                    let (report, (_, recorder)) =
                        run_manifest(&manifest, &[], &settings, (dumper, TomlRecorder::new()))?;
                    recorder.into_table().save(&out)?;
                    report
                }
            };
            for failure in &report.failures {
                eprintln!("{failure}");
            }
            info!(
                "recorded {} frames to {}",
                report.outcomes.len(),
                out.display()
            );
            Ok(exit_code(&report))
        }
    }
}

fn exit_code(report: &RunReport) -> ExitCode {
    if report.failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fbcheck: {e}");
            ExitCode::from(2)
        }
    }
}
