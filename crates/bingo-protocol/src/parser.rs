//! Batch decoding of device reads.
//!
//! A single non-blocking read may return several lines, a trailing line
//! without its newline, or nothing at all. Lines are decoded in order; empty
//! lines are skipped and lines that fail to decode are dropped without
//! stopping the rest of the batch.

use tracing::{trace, warn};

use crate::message::{DeviceEvent, decode_line};

/// Non-empty, trimmed lines of `buffer`, in order.
pub fn lines(buffer: &str) -> impl Iterator<Item = &str> {
    buffer.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Decode every recognizable line of `buffer`.
pub fn decode_batch(buffer: &str) -> Vec<DeviceEvent> {
    lines(buffer)
        .filter_map(|line| match decode_line(line) {
            Ok(event) => {
                trace!("Decoded device line {:?} as {}", line, event);
                Some(event)
            }
            Err(e) => {
                warn!("Dropping device line: {}", e);
                None
            }
        })
        .collect()
}
