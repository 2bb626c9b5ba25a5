use std::fs::File;
use std::io::{BufRead, Read, Seek, SeekFrom};
use std::path::Path;

use crate::types::{TranscriptEntry, UsageRecord};
use crate::{Result, TranscriptError};

/// Bytes read per step when scanning a transcript from its end.
const TAIL_CHUNK: usize = 64 * 1024;

/// Parse a single transcript line. `line_no` is 1-based and only used for
/// error reporting.
pub fn parse_line(line: impl AsRef<[u8]>, line_no: usize) -> Result<TranscriptEntry> {
    serde_json::from_slice(line.as_ref())
        .map_err(|source| TranscriptError::Parse { line_no, source })
}

/// Usage carried by one raw line, if it is a main-chain assistant turn.
/// Blank, malformed and non-UTF-8 lines yield `None`.
fn usage_in_line(line: &[u8], line_no: usize) -> Option<UsageRecord> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    let entry = match parse_line(line, line_no) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::debug!(error = %e, "skipping transcript line");
            return None;
        }
    };
    let assistant = entry.as_assistant()?;
    let usage = assistant.main_chain_usage()?;
    Some(UsageRecord {
        usage: *usage,
        model: assistant.message.model.clone(),
    })
}

/// Find the usage of the last main-chain assistant turn in the transcript at
/// `path`.
///
/// The file is append-only and grows for the whole session, so it is read
/// backwards from the end and the scan stops at the first usable turn.
/// Returns `Ok(None)` when the file holds no such turn. Lines that fail to
/// parse are skipped: the host appends while we read, so the final line may
/// be half-written.
pub fn last_usage(path: &Path) -> Result<Option<UsageRecord>> {
    let file = File::open(path)?;
    last_usage_from_end(file)
}

/// Backwards scan behind [`last_usage`], over any seekable source.
///
/// Line numbers are unknown when reading from the end; parse errors are
/// reported against line 0.
pub fn last_usage_from_end<R: Read + Seek>(mut src: R) -> Result<Option<UsageRecord>> {
    let mut pos = src.seek(SeekFrom::End(0))?;
    // Start of the earliest line seen so far, which may continue further back.
    let mut carry: Vec<u8> = Vec::new();
    let mut chunk = vec![0u8; TAIL_CHUNK];

    while pos > 0 {
        let n = usize::try_from(pos).map_or(TAIL_CHUNK, |p| p.min(TAIL_CHUNK));
        pos -= n as u64;
        src.seek(SeekFrom::Start(pos))?;
        src.read_exact(&mut chunk[..n])?;

        let mut buf = Vec::with_capacity(n + carry.len());
        buf.extend_from_slice(&chunk[..n]);
        buf.extend_from_slice(&carry);

        let complete_from = if pos == 0 {
            0
        } else {
            match buf.iter().position(|&b| b == b'\n') {
                Some(i) => i + 1,
                None => {
                    carry = buf;
                    continue;
                }
            }
        };

        for line in buf[complete_from..].rsplit(|&b| b == b'\n') {
            if let Some(record) = usage_in_line(line, 0) {
                return Ok(Some(record));
            }
        }
        buf.truncate(complete_from.saturating_sub(1));
        carry = buf;
    }

    Ok(None)
}

/// Forward scan over any buffered reader; returns the same record as
/// [`last_usage`].
pub fn last_usage_from<R: BufRead>(reader: R) -> Result<Option<UsageRecord>> {
    let mut last = None;

    for (idx, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        if let Some(record) = usage_in_line(&line, idx + 1) {
            last = Some(record);
        }
    }

    Ok(last)
}

// ─── Tests ────────────────────────────────────────────────────────────────
