// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Telemetry file export

use anyhow::{anyhow, Result};
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{ExportFormat, TelemetryRecord, TelemetrySink};

const CSV_HEADER: &str =
    "timestamp,uptime_ms,state,threat,battery,power,altitude,temperature,bird_detected,bird_confidence,bird_distance";

/// Writes telemetry records to rotating JSON-lines or CSV files
pub struct TelemetryExporter {
    path: PathBuf,
    format: ExportFormat,
    rotate_every: usize,
    writer: Option<BufWriter<File>>,
    current_file: Option<PathBuf>,
    records_in_file: usize,
    files_opened: usize,
    total_records: u64,
}

impl TelemetryExporter {
    pub fn new(path: &str, format: ExportFormat, rotate_every: usize) -> Result<Self> {
        let path = PathBuf::from(path);

        std::fs::create_dir_all(&path)?;

        Ok(Self {
            path,
            format,
            rotate_every: rotate_every.max(1),
            writer: None,
            current_file: None,
            records_in_file: 0,
            files_opened: 0,
            total_records: 0,
        })
    }

    /// Export a single record
    pub fn export_record(&mut self, record: &TelemetryRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.rotate_every {
            self.rotate()?;
        }

        let line = match self.format {
            ExportFormat::Json => serde_json::to_string(record)?,
            ExportFormat::Csv => to_csv_line(record),
        };

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| anyhow!("Export file not open"))?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;

        self.records_in_file += 1;
        self.total_records += 1;
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let filename = self.next_filename();
        let file = open_export_file(&filename)?;
        let mut writer = BufWriter::new(file);
        if self.format == ExportFormat::Csv {
            writeln!(writer, "{}", CSV_HEADER)?;
        }

        if self.files_opened > 0 {
            info!("Rotated telemetry export file to {:?}", filename);
        }
        self.writer = Some(writer);
        self.current_file = Some(filename);
        self.records_in_file = 0;
        self.files_opened += 1;
        Ok(())
    }

    fn next_filename(&self) -> PathBuf {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let ext = match self.format {
            ExportFormat::Json => "jsonl",
            ExportFormat::Csv => "csv",
        };
        self.path
            .join(format!("telemetry_{}_{:03}.{}", timestamp, self.files_opened, ext))
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl TelemetrySink for TelemetryExporter {
    fn name(&self) -> &str {
        "export"
    }

    fn publish(&mut self, record: &TelemetryRecord) -> Result<()> {
        self.export_record(record)
    }
}

fn open_export_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("Failed to open export file {:?}: {}", path, e))
}

fn to_csv_line(record: &TelemetryRecord) -> String {
    fn opt<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    format!(
        "{},{},{},{},{:.1},{:.2},{:.2},{:.2},{},{},{}",
        record.timestamp.to_rfc3339(),
        record.uptime_ms,
        record.state,
        record.threat,
        record.battery,
        record.power,
        record.altitude,
        record.temperature,
        opt(record.bird_detected),
        opt(record.bird_confidence),
        opt(record.bird_distance),
    )
}
