//! `ansipage` command: decode captures, re-encode pages, emit differential updates

use ansipage::{
    AnsiDecoder, AnsiEncoder, EncodeStatus, EncoderConfig, Page, PageError, PageSnapshot,
    UpdateList,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Differential ANSI page encoder and decoder")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Read inputs as page snapshots instead of ANSI captures
    #[arg(long, global = true)]
    pub from_snapshot: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode an ANSI capture and print the page text
    Decode {
        input: PathBuf,

        #[command(flatten)]
        geometry: Geometry,

        /// Save the decoded page as a snapshot
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Re-encode a whole page to stdout
    Encode {
        input: PathBuf,

        #[command(flatten)]
        geometry: Geometry,

        #[command(flatten)]
        encoding: Encoding,
    },

    /// Write the stream that turns the old page into the new one
    Diff {
        old: PathBuf,

        new: PathBuf,

        #[command(flatten)]
        geometry: Geometry,

        #[command(flatten)]
        encoding: Encoding,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct Geometry {
    /// Page rows (ignored for snapshots)
    #[arg(long, default_value = "24")]
    pub rows: u16,

    /// Page columns (ignored for snapshots)
    #[arg(long, default_value = "80")]
    pub cols: u16,
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct Encoding {
    /// Emit fade renditions
    #[arg(long)]
    pub fade: bool,

    /// Byte budget per encoder pass
    #[arg(long)]
    pub max_bytes: Option<usize>,
}

impl From<Encoding> for EncoderConfig {
    fn from(encoding: Encoding) -> Self {
        Self {
            fade_enabled: encoding.fade,
            max_bytes_per_pass: encoding.max_bytes,
        }
    }
}

/// Decode a whole stream, flushing the update list whenever it fills up
pub fn decode_stream(bytes: &[u8], rows: u16, cols: u16) -> Result<Page> {
    let mut page = Page::new(rows, cols)?;
    let mut decoder = AnsiDecoder::new();
    let mut updates = UpdateList::new();
    let mut offset = 0;

    loop {
        match decoder.decode(&mut page, &bytes[offset..], &mut updates) {
            Ok(()) => return Ok(page),
            Err(PageError::DecodeIncomplete { consumed, total }) if consumed > 0 => {
                debug!("Update list full after {} of {} bytes, continuing", consumed, total);
                offset += consumed;
                updates.clear();
            }
            Err(e) => return Err(e).context("Failed to decode stream"),
        }
    }
}

/// Run encoder passes until every range in `updates` is sent
pub fn encode_all(page: &mut Page, updates: &UpdateList, config: EncoderConfig) -> Result<Vec<u8>> {
    let encoder = AnsiEncoder::new(config);
    let mut out = Vec::new();
    let mut passes = 0usize;

    loop {
        passes += 1;
        match encoder.encode(page, updates, &mut out)? {
            EncodeStatus::Done => break,
            EncodeStatus::NotDone => {
                // Every pass sends at least one range
                if passes > updates.len() {
                    anyhow::bail!("Encoder made no progress after {} passes", passes);
                }
            }
        }
    }

    debug!("Encoded {} ranges into {} bytes in {} passes", updates.len(), out.len(), passes);
    Ok(out)
}

fn load_page(path: &Path, geometry: Geometry, from_snapshot: bool) -> Result<Page> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if from_snapshot {
        let snapshot = PageSnapshot::from_bytes(&bytes)
            .with_context(|| format!("Invalid snapshot {}", path.display()))?;
        return Page::from_snapshot(&snapshot)
            .with_context(|| format!("Inconsistent snapshot {}", path.display()));
    }

    decode_stream(&bytes, geometry.rows, geometry.cols)
        .with_context(|| format!("Failed to decode {}", path.display()))
}

/// Execute a parsed command, writing its output to `out`
pub fn execute<W: Write>(args: &Args, out: &mut W) -> Result<()> {
    match &args.command {
        Command::Decode {
            input,
            geometry,
            snapshot,
        } => {
            let page = load_page(input, *geometry, args.from_snapshot)?;
            for row in 1..=page.rows() {
                writeln!(out, "{}", page.row_text(row).trim_end())?;
            }

            if let Some(path) = snapshot {
                let bytes = page.snapshot().to_bytes()?;
                std::fs::write(path, &bytes)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Saved {}x{} page to {}", page.rows(), page.cols(), path.display());
            }
        }

        Command::Encode {
            input,
            geometry,
            encoding,
        } => {
            let mut page = load_page(input, *geometry, args.from_snapshot)?;
            page.last_mod = 0;
            let updates = UpdateList::whole_page(&page)?;
            let stream = encode_all(&mut page, &updates, (*encoding).into())?;
            out.write_all(&stream)?;
        }

        Command::Diff {
            old,
            new,
            geometry,
            encoding,
        } => {
            let before = load_page(old, *geometry, args.from_snapshot)?;
            let mut after = load_page(new, *geometry, args.from_snapshot)?;
            after.last_mod = 0;

            let updates = UpdateList::diff(&before, &after).context("Pages cannot be compared")?;
            info!("{} rows changed", updates.len());
            if updates.is_empty() {
                return Ok(());
            }

            let stream = encode_all(&mut after, &updates, (*encoding).into())?;
            out.write_all(&stream)?;
        }
    }

    out.flush()?;
    Ok(())
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log_level {
        LogLevel::Trace => tracing::Level::TRACE,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Error => tracing::Level::ERROR,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&args, &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decode_defaults() {
        let args = Args::try_parse_from(["ansipage", "decode", "capture.ans"]).unwrap();
        assert!(!args.from_snapshot);
        match args.command {
            Command::Decode {
                input,
                geometry,
                snapshot,
            } => {
                assert_eq!(input, PathBuf::from("capture.ans"));
                assert_eq!((geometry.rows, geometry.cols), (24, 80));
                assert!(snapshot.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "ansipage",
            "encode",
            "page.snap",
            "--fade",
            "--max-bytes",
            "512",
            "--from-snapshot",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert!(args.from_snapshot);
        assert!(matches!(args.log_level, LogLevel::Debug));
        match args.command {
            Command::Encode { encoding, .. } => {
                let config = EncoderConfig::from(encoding);
                assert!(config.fade_enabled);
                assert_eq!(config.max_bytes_per_pass, Some(512));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_diff_requires_two_inputs() {
        assert!(Args::try_parse_from(["ansipage", "diff", "old.ans"]).is_err());
        assert!(Args::try_parse_from(["ansipage", "diff", "old.ans", "new.ans"]).is_ok());
    }

    #[test]
    fn test_decode_stream_past_full_update_list() {
        let input: Vec<u8> = (0..300)
            .flat_map(|i| format!("\x1b[{};{}Hx", i % 24 + 1, i % 80 + 1).into_bytes())
            .collect();

        let page = decode_stream(&input, 24, 80).unwrap();
        assert_eq!(page.cell(12, 12).map(|c| c.ch), Some(b'x'));
    }

    #[test]
    fn test_decode_stream_rejects_bad_geometry() {
        assert!(decode_stream(b"hello", 0, 80).is_err());
        assert!(decode_stream(b"\x1b[1;65535Hx", 1, u16::MAX).is_err());
    }
}
