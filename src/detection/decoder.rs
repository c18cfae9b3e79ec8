// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Wire decoding for detection messages
//!
//! The detection computer emits one JSON object per line:
//!
//! ```text
//! {"detected":true,"confidence":87,"distance":42.5,"bearing":-11.2,"species":1,"timestamp":1718000000000}
//! ```
//!
//! A message is either decoded completely or rejected; the controller never sees
//! a partially populated event.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use super::{DetectionEvent, Species};

/// Reasons a detection message is discarded
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed detection message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("confidence {0} outside 0-100")]
    ConfidenceOutOfRange(i64),

    #[error("invalid distance {0}")]
    InvalidDistance(f64),

    #[error("invalid bearing {0}")]
    InvalidBearing(f64),
}

/// Longest unterminated line kept while waiting for its newline
pub const MAX_LINE_BYTES: usize = 1024;

/// Complete lines cut from a receive buffer
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FramedLines {
    /// Trimmed, non-empty lines, oldest first
    pub lines: Vec<String>,
    /// Unterminated bytes thrown away for exceeding [`MAX_LINE_BYTES`]
    pub discarded: usize,
}

/// Remove every newline-terminated line from `buffer`, leaving the partial
/// tail for the next read. Invalid UTF-8 is replaced rather than rejected so
/// the decoder reports it as malformed.
pub fn split_lines(buffer: &mut Vec<u8>) -> FramedLines {
    let mut framed = FramedLines::default();
    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        if !line.is_empty() {
            framed.lines.push(line);
        }
    }
    if buffer.len() > MAX_LINE_BYTES {
        framed.discarded = buffer.len();
        buffer.clear();
    }
    framed
}

#[derive(Debug, Deserialize)]
struct WireDetection {
    detected: bool,
    confidence: i64,
    distance: f64,
    bearing: f64,
    species: i64,
}

/// Decode one line into an event stamped with its arrival time
pub fn decode_line(line: &str, received_at: DateTime<Utc>) -> Result<DetectionEvent, DecodeError> {
    let wire: WireDetection = serde_json::from_str(line.trim())?;

    let confidence = u8::try_from(wire.confidence)
        .ok()
        .filter(|c| *c <= 100)
        .ok_or(DecodeError::ConfidenceOutOfRange(wire.confidence))?;

    if !wire.distance.is_finite() || wire.distance < 0.0 {
        return Err(DecodeError::InvalidDistance(wire.distance));
    }
    if !wire.bearing.is_finite() {
        return Err(DecodeError::InvalidBearing(wire.bearing));
    }

    Ok(DetectionEvent {
        detected: wire.detected,
        confidence,
        distance: wire.distance,
        bearing: wire.bearing,
        species: Species::from_code(wire.species),
        observed_at: received_at,
    })
}
