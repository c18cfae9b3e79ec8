// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! UART link to the detection computer

use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use super::{decode_line, split_lines, DetectionEvent, DetectionSource, MAX_LINE_BYTES};

/// Reads newline-delimited JSON detections from a serial port.
///
/// Only bytes already waiting in the driver buffer are read, so `poll`
/// never waits on the wire.
pub struct SerialDetections {
    port_name: String,
    port: Box<dyn serialport::SerialPort>,
    buffer: Vec<u8>,
}

impl SerialDetections {
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(5))
            .open()
            .with_context(|| format!("opening detection link {}", port_name))?;
        info!("Detection link open on {} @ {} baud", port_name, baud_rate);

        Ok(Self {
            port_name: port_name.to_string(),
            port,
            buffer: Vec::with_capacity(MAX_LINE_BYTES),
        })
    }

    fn read_available(&mut self) -> Result<()> {
        let waiting = self.port.bytes_to_read()? as usize;
        if waiting == 0 {
            return Ok(());
        }
        let mut chunk = vec![0u8; waiting];
        let n = self.port.read(&mut chunk)?;
        self.buffer.extend_from_slice(&chunk[..n]);
        Ok(())
    }
}

impl DetectionSource for SerialDetections {
    fn name(&self) -> &str {
        &self.port_name
    }

    fn poll(&mut self) -> Vec<DetectionEvent> {
        if let Err(e) = self.read_available() {
            warn!("Detection link read error on {}: {}", self.port_name, e);
            return Vec::new();
        }

        let framed = split_lines(&mut self.buffer);
        if framed.discarded > 0 {
            warn!("Discarding {} unterminated bytes from {}", framed.discarded, self.port_name);
        }

        let received_at = Utc::now();
        framed
            .lines
            .into_iter()
            .filter_map(|line| match decode_line(&line, received_at) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Dropping detection message: {}", e);
                    None
                }
            })
            .collect()
    }
}
