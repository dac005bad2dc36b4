//! Tail reader for append-only JSONL files.
//!
//! Reads fixed-size blocks backwards from the end of the file so that the cost of a render
//! depends on how many lines are wanted, not on how large the transcript has grown.

use crate::Result;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Block size used when reading backwards.
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024;

/// Return the last `max_lines` lines of `path`, oldest first.
pub fn read_last_lines(path: &Path, max_lines: usize) -> Result<Vec<String>> {
    read_last_lines_with_block_size(path, max_lines, DEFAULT_BLOCK_SIZE)
}

/// Same as [`read_last_lines`] with an explicit block size.
///
/// A final segment without a terminating newline is returned as the last line, and a
/// trailing `\r` is stripped from every line.
pub fn read_last_lines_with_block_size(
    path: &Path,
    max_lines: usize,
    block_size: usize,
) -> Result<Vec<String>> {
    let mut file = File::open(path)?;
    if max_lines == 0 {
        return Ok(Vec::new());
    }

    let block_size = block_size.max(1);
    let len = file.metadata()?.len();
    let mut pos = len;

    // Collected newest first.
    let mut lines: Vec<Vec<u8>> = Vec::with_capacity(max_lines);
    // Bytes of a line whose start lies in an earlier block.
    let mut carry: Vec<u8> = Vec::new();
    let mut at_tail = true;
    let mut block = vec![0u8; block_size];

    while pos > 0 && lines.len() < max_lines {
        let read_len = pos.min(block_size as u64) as usize;
        pos -= read_len as u64;
        file.seek(SeekFrom::Start(pos))?;
        let chunk = &mut block[..read_len];
        file.read_exact(chunk)?;

        let mut end = read_len;
        while let Some(idx) = chunk[..end].iter().rposition(|&b| b == b'\n') {
            let mut line = chunk[idx + 1..end].to_vec();
            line.append(&mut carry);
            end = idx;

            // The newline ending the file does not open another line.
            if at_tail {
                at_tail = false;
                if line.is_empty() {
                    continue;
                }
            }

            lines.push(line);
            if lines.len() == max_lines {
                break;
            }
        }

        if lines.len() < max_lines {
            let mut prefix = chunk[..end].to_vec();
            prefix.append(&mut carry);
            carry = prefix;
        }
    }

    // First line of the file has no newline in front of it.
    if pos == 0 && len > 0 && lines.len() < max_lines {
        lines.push(carry);
    }

    Ok(lines.into_iter().rev().map(decode_line).collect())
}

fn decode_line(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
