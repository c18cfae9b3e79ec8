//! Detection module - inbound bird detections and threat scoring

mod decoder;
mod scoring;
#[cfg(feature = "serial")]
mod serial;

pub use decoder::{decode_line, split_lines, DecodeError, FramedLines, MAX_LINE_BYTES};
pub use scoring::{score, score_breakdown, ThreatAssessment, ThreatLevel};
#[cfg(feature = "serial")]
pub use serial::SerialDetections;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Bird species reported by the detection computer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Unknown,
    Eagle,
    Hawk,
    Crow,
    Other,
}

impl Species {
    /// Map the wire species code (0=unknown, 1=eagle, 2=hawk, 3=crow, anything else=other)
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Species::Unknown,
            1 => Species::Eagle,
            2 => Species::Hawk,
            3 => Species::Crow,
            _ => Species::Other,
        }
    }
}

/// A single decoded detection. Superseded by the next one; no history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub detected: bool,
    /// 0-100
    pub confidence: u8,
    /// Meters
    pub distance: f64,
    /// Degrees
    pub bearing: f64,
    pub species: Species,
    pub observed_at: DateTime<Utc>,
}

impl DetectionEvent {
    /// An explicit "nothing in view" report
    pub fn clear(observed_at: DateTime<Utc>) -> Self {
        Self {
            detected: false,
            confidence: 0,
            distance: 0.0,
            bearing: 0.0,
            species: Species::Unknown,
            observed_at,
        }
    }

    pub fn sighting(
        confidence: u8,
        distance: f64,
        bearing: f64,
        species: Species,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            detected: true,
            confidence: confidence.min(100),
            distance,
            bearing,
            species,
            observed_at,
        }
    }
}

/// Source of newly arrived detection events.
///
/// `poll` must not block; it returns whatever arrived since the previous call,
/// oldest first.
pub trait DetectionSource {
    fn name(&self) -> &str;

    fn poll(&mut self) -> Vec<DetectionEvent>;
}

/// Detection events forwarded over a channel by a reader task
pub struct ChannelDetections {
    rx: mpsc::Receiver<DetectionEvent>,
    max_per_poll: usize,
}

impl ChannelDetections {
    pub fn new(rx: mpsc::Receiver<DetectionEvent>, max_per_poll: usize) -> Self {
        Self {
            rx,
            max_per_poll: max_per_poll.max(1),
        }
    }

    /// Spawn a task that decodes newline-delimited JSON from stdin.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_stdin(capacity: usize, max_per_poll: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(read_lines(BufReader::new(tokio::io::stdin()), tx));
        Self::new(rx, max_per_poll)
    }
}

impl DetectionSource for ChannelDetections {
    fn name(&self) -> &str {
        "channel"
    }

    fn poll(&mut self) -> Vec<DetectionEvent> {
        let mut events = Vec::new();
        while events.len() < self.max_per_poll {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(_) => break,
            }
        }
        events
    }
}

async fn read_lines<R>(reader: BufReader<R>, tx: mpsc::Sender<DetectionEvent>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match decode_line(&line, Utc::now()) {
                    Ok(event) => {
                        // Full channel means the loop is behind; this event is lost and
                        // the older queued ones are still delivered
                        if tx.try_send(event).is_err() {
                            debug!("Detection channel full, dropping newest event");
                        }
                    }
                    Err(e) => warn!("Dropping detection message: {}", e),
                }
            }
            Ok(None) => {
                info!("Detection input closed");
                break;
            }
            Err(e) => {
                warn!("Detection input error: {}", e);
                break;
            }
        }
    }
}
