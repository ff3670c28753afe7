//! `json-mirror`: replay a recorded event stream into a tree.
//!
//! Provides the logic behind the binary entry point: argument parsing,
//! config loading, record replay and event formatting.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use thiserror::Error;

use crate::error::TreeError;
use crate::events::TreeEvent;
use crate::options::TreeOptions;
use crate::stream::SseRecordReader;
use crate::tree::Tree;

pub const USAGE: &str = "Usage: json-mirror [--changes] [--snapshot] [--config <file.toml>] < events";

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}\n{usage}", usage = USAGE)]
    Usage(String),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ── Arguments ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub publish_changes: bool,
    pub snapshot: bool,
    pub config: Option<PathBuf>,
}

/// Parses arguments, program name excluded.
pub fn parse_args<I, S>(args: I) -> Result<CliArgs, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_ref() {
            "--changes" => parsed.publish_changes = true,
            "--snapshot" => parsed.snapshot = true,
            "--config" => {
                let file = args
                    .next()
                    .ok_or_else(|| CliError::Usage("--config needs a file".into()))?;
                parsed.config = Some(PathBuf::from(file.as_ref()));
            }
            other => return Err(CliError::Usage(format!("unknown argument {other:?}"))),
        }
    }
    Ok(parsed)
}

/// Config file first, then command-line switches on top.
pub fn load_options(args: &CliArgs) -> Result<TreeOptions, CliError> {
    let mut options = match &args.config {
        Some(file) => TreeOptions::from_toml_str(&std::fs::read_to_string(file)?)?,
        None => TreeOptions::default(),
    };
    options.publish_changes |= args.publish_changes;
    Ok(options)
}

// ── Replay ────────────────────────────────────────────────────────────────

pub fn format_event(event: &TreeEvent) -> String {
    match event {
        TreeEvent::Added(ev) => match &ev.value {
            Some(value) => format!("added {} {value}", ev.path),
            None => format!("added {}", ev.path),
        },
        TreeEvent::Changed(ev) => {
            format!("changed {} {} (was {})", ev.path, ev.value, ev.old_value)
        }
        TreeEvent::Removed(ev) => format!("removed {}", ev.path),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub records: usize,
    pub skipped: usize,
    pub events: usize,
}

/// Applies every record of `input` to `tree`, writing one line per event.
///
/// Records that fail to decode are logged and skipped; `cancel` and
/// `auth_revoked` stop the replay.
pub fn replay<C, R, W>(tree: &Tree<C>, input: R, out: &mut W) -> Result<ReplaySummary, CliError>
where
    R: BufRead,
    W: Write,
{
    let mut summary = ReplaySummary::default();
    for record in SseRecordReader::new(input) {
        let record = record?;
        summary.records += 1;
        let event = match record.decode() {
            Ok(event) => event,
            Err(err) => {
                log::warn!("skipping {:?} record: {err}", record.event);
                summary.skipped += 1;
                continue;
            }
        };
        if event.is_terminal() {
            log::info!("stream ended by {event:?}");
            break;
        }
        for tree_event in tree.apply_stream_event(&event) {
            writeln!(out, "{}", format_event(&tree_event))?;
            summary.events += 1;
        }
    }
    Ok(summary)
}

pub fn run<R, W>(args: &CliArgs, input: R, out: &mut W) -> Result<ReplaySummary, CliError>
where
    R: BufRead,
    W: Write,
{
    let tree = Tree::with_options((), load_options(args)?);
    let summary = replay(&tree, input, out)?;
    if args.snapshot {
        let rendered = serde_json::to_string_pretty(&tree.snapshot()).map_err(TreeError::from)?;
        writeln!(out, "{rendered}")?;
    }
    Ok(summary)
}
