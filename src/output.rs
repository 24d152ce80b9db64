//! Output of pipeline records for the command line.
//!
//! Boards are emitted as JSON on stdout so other tools can render them;
//! diagnostics go through `tracing` on stderr.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use tracing::debug;

use crate::advisory::ArrivalBoard;

/// Serializes any record as pretty-printed JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Writes `board` to `out`, as JSON or as Rust's debug pretty-print format.
pub fn write_board<W: Write>(out: &mut W, board: &ArrivalBoard, debug_format: bool) -> Result<()> {
    if debug_format {
        writeln!(out, "{board:#?}")?;
    } else {
        writeln!(out, "{}", to_json(board)?)?;
    }
    debug!(available = board.is_available(), "Board written");
    Ok(())
}
