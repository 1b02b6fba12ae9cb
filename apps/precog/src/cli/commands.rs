//! # CLI Command Implementations

use crate::api;
use precog_core::{
    CollectorConfig, FrameLine, PrecogError, Session, SessionStats, encoding::inspect_line,
};
use std::collections::BTreeSet;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum size of a recorded frame file (1 GiB).
const MAX_REPLAY_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Invalid lines listed in text mode before the rest are only counted.
const MAX_REPORTED_ERRORS: usize = 10;

/// Resolve `path` to an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, PrecogError> {
    let canonical = path.canonicalize().map_err(|e| {
        PrecogError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(PrecogError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), PrecogError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| PrecogError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(PrecogError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

fn open_lines(path: &Path) -> Result<std::io::Lines<BufReader<std::fs::File>>, PrecogError> {
    let file = std::fs::File::open(path)
        .map_err(|e| PrecogError::Io(format!("Cannot open '{}': {}", path.display(), e)))?;
    Ok(BufReader::new(file).lines())
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP ingest server.
pub async fn cmd_serve(config: CollectorConfig, host: &str, port: u16) -> Result<(), PrecogError> {
    let session = Session::new(config)?;

    println!("Precog Ingest Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:    {}", host);
    println!("  Port:    {}", port);
    println!("  Session: {}", session.session_id());
    println!("  Output:  {}", session.sink_description());
    println!();
    println!("Endpoints:");
    println!("  POST /tick   - Process one host tick");
    println!("  POST /chat   - Attribute a chat line");
    println!("  POST /flush  - Write buffered lines now");
    println!("  GET  /status - Session counters");
    println!("  GET  /health - Health check");
    println!();
    println!("Press Ctrl+C to stop (buffered lines are flushed)");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, session).await
}

// =============================================================================
// REPLAY COMMAND
// =============================================================================

/// Drive a session from a recorded frame file, then flush what is left.
pub fn cmd_replay(
    config: CollectorConfig,
    file: &Path,
    json_mode: bool,
    verbose: bool,
) -> Result<(), PrecogError> {
    let path = validate_file_path(file)?;
    validate_file_size(&path, MAX_REPLAY_FILE_SIZE)?;

    tracing::info!(path = %path.display(), "Replaying frames");

    let mut session = Session::new(config)?;
    let mut frames = 0usize;

    for (index, line) in open_lines(&path)?.enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| PrecogError::Io(format!("Read line {}: {}", line_no, e)))?;
        if line.trim().is_empty() {
            continue;
        }

        let frame = FrameLine::parse(&line).map_err(|e| match e {
            PrecogError::InvalidFrame(reason) => {
                PrecogError::InvalidFrame(format!("line {}: {}", line_no, reason))
            }
            other => other,
        })?;
        frames += 1;

        match frame {
            FrameLine::Tick(tick) => {
                let report = session.on_tick(&tick);
                if verbose && (report.records > 0 || report.flush.is_some()) && !json_mode {
                    println!(
                        "tick {:>6}: {} records, {} buffered",
                        report.tick,
                        report.records,
                        session.buffered_lines().len()
                    );
                }
            }
            FrameLine::Chat(message) => {
                let outcome = session.on_chat(&message);
                tracing::debug!(line = line_no, ?outcome, "Chat replayed");
            }
        }
    }

    let remaining = session.flush()?;
    tracing::debug!(lines = remaining, "Final flush");

    let stats = session.stats();
    if json_mode {
        print_json(&serde_json::json!({
            "session_id": session.session_id(),
            "output": session.sink_description(),
            "frames": frames,
            "stats": stats,
        }));
        return Ok(());
    }

    print_replay_summary(&session, frames, stats);
    Ok(())
}

fn print_replay_summary(session: &Session, frames: usize, stats: &SessionStats) {
    println!("Precog Replay");
    println!("=============");
    println!("Session: {}", session.session_id());
    println!("Output:  {}", session.sink_description());
    println!();
    println!("Frames:           {}", frames);
    println!("Ticks processed:  {} / {}", stats.active_ticks, stats.ticks_seen);
    println!("Samples:          {}", stats.samples_captured);
    println!("Batches:          {}", stats.triggers_fired);
    println!("Records written:  {}", stats.lines_flushed);
    println!(
        "Chat:             {} recorded, {} untracked, {} ignored",
        stats.chat_recorded, stats.chat_untracked, stats.chat_ignored
    );
    if stats.capture_failures > 0 || stats.flush_failures > 0 {
        println!(
            "Failures:         {} captures, {} flushes",
            stats.capture_failures, stats.flush_failures
        );
    }
}

// =============================================================================
// VERIFY COMMAND
// =============================================================================

/// Check every line of an action sequence file.
pub fn cmd_verify(
    file: &Path,
    keep_going: bool,
    json_mode: bool,
    verbose: bool,
) -> Result<(), PrecogError> {
    let path = validate_file_path(file)?;

    let mut valid = 0usize;
    let mut with_chat = 0usize;
    let mut sessions = BTreeSet::new();
    let mut players = BTreeSet::new();
    let mut errors: Vec<PrecogError> = Vec::new();

    for (index, line) in open_lines(&path)?.enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| PrecogError::Io(format!("Read line {}: {}", line_no, e)))?;

        match inspect_line(line_no, &line) {
            Ok(summary) => {
                valid += 1;
                if summary.chat_count > 0 {
                    with_chat += 1;
                }
                if verbose && !json_mode {
                    println!(
                        "line {:>6}: {} {}ms/{} ticks, {} chat",
                        line_no,
                        summary.player_uuid,
                        summary.time_delta_ms,
                        summary.tick_delta,
                        summary.chat_count
                    );
                }
                sessions.insert(summary.session_id);
                players.insert(summary.player_uuid);
            }
            Err(e) if !keep_going => return Err(e),
            Err(e) => errors.push(e),
        }
    }

    if json_mode {
        print_json(&serde_json::json!({
            "file": path.to_string_lossy(),
            "valid": valid,
            "invalid": errors.len(),
            "with_chat": with_chat,
            "sessions": sessions,
            "players": players.len(),
            "errors": errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }));
    } else {
        println!("Precog Verify");
        println!("=============");
        println!("File:      {}", path.display());
        println!();
        println!("Valid:     {}", valid);
        println!("Invalid:   {}", errors.len());
        println!("With chat: {}", with_chat);
        println!("Sessions:  {}", sessions.len());
        println!("Players:   {}", players.len());
        for error in errors.iter().take(MAX_REPORTED_ERRORS) {
            println!("  {}", error);
        }
        if errors.len() > MAX_REPORTED_ERRORS {
            println!("  ... and {} more", errors.len() - MAX_REPORTED_ERRORS);
        }
    }

    match errors.into_iter().next() {
        Some(first) => Err(first),
        None => Ok(()),
    }
}

// =============================================================================
// CONFIG COMMAND
// =============================================================================

/// Show the effective configuration.
pub fn cmd_config(config: &CollectorConfig, json_mode: bool) -> Result<(), PrecogError> {
    if json_mode {
        let value = serde_json::to_value(config)
            .map_err(|e| PrecogError::Serialization(e.to_string()))?;
        print_json(&value);
        return Ok(());
    }

    println!("Precog Configuration");
    println!("====================");
    println!("Output:          {}", config.output_path().display());
    println!("Session prefix:  {}", config.session_prefix);
    println!("Tick interval:   {} ticks", config.tick_interval);
    println!("Sequence window: {} samples", config.sequence_window);
    println!("Chat window:     {} messages", config.chat_window);
    println!("Write trigger:   {} samples", config.write_trigger);
    println!("Chat context:    {} ms", config.chat_context_ms);
    println!("Flush threshold: {} lines", config.flush_threshold);

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
