//! Delimiter-separated sample rows and the JSON session summary.

use crate::records::{BpmSample, ColorSample, SessionSummary};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("json failure: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes color rows in uptime order, one batch at a time.
pub struct ColorCsvWriter<W: Write> {
    writer: csv::Writer<W>,
    pending: Vec<ColorSample>,
    batch_len: usize,
}

impl<W: Write> ColorCsvWriter<W> {
    pub fn new(inner: W, batch_len: usize) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
            pending: Vec::with_capacity(batch_len.max(1)),
            batch_len: batch_len.max(1),
        }
    }

    /// Queues `sample`; writes the batch once it holds `batch_len` rows.
    pub fn push(&mut self, sample: ColorSample) -> Result<(), PersistError> {
        self.pending.push(sample);
        if self.pending.len() >= self.batch_len {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), PersistError> {
        let mut batch = std::mem::take(&mut self.pending);
        batch.sort_by(|a, b| a.uptime.total_cmp(&b.uptime));
        for sample in &batch {
            self.writer.serialize(sample)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(mut self) -> Result<W, PersistError> {
        self.flush()?;
        self.writer
            .into_inner()
            .map_err(|err| PersistError::Io(err.into_error()))
    }
}

pub struct BpmCsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BpmCsvWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
        }
    }

    pub fn write(&mut self, sample: &BpmSample) -> Result<(), PersistError> {
        self.writer.serialize(sample)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, PersistError> {
        self.writer
            .into_inner()
            .map_err(|err| PersistError::Io(err.into_error()))
    }
}

/// Reads color rows written by [`ColorCsvWriter`].
pub fn read_color_samples<R: Read>(reader: R) -> Result<Vec<ColorSample>, PersistError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut samples = Vec::new();
    for row in reader.deserialize() {
        samples.push(row?);
    }
    Ok(samples)
}

pub fn write_summary<W: Write>(writer: W, summary: &SessionSummary) -> Result<(), PersistError> {
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

/// Destinations for the two record streams of a session.
pub struct PersistenceSinks {
    pub colors: Box<dyn Write + Send>,
    pub bpm: Box<dyn Write + Send>,
}

impl PersistenceSinks {
    pub fn new(colors: Box<dyn Write + Send>, bpm: Box<dyn Write + Send>) -> Self {
        Self { colors, bpm }
    }

    /// Creates `<identifier>_colors.csv` and `<identifier>_bpm.csv` in `dir`.
    pub fn create_in(dir: &Path, identifier: &str) -> Result<Self, PersistError> {
        std::fs::create_dir_all(dir)?;
        let colors = File::create(dir.join(format!("{}_colors.csv", identifier)))?;
        let bpm = File::create(dir.join(format!("{}_bpm.csv", identifier)))?;
        Ok(Self::new(
            Box::new(BufWriter::new(colors)),
            Box::new(BufWriter::new(bpm)),
        ))
    }
}

#[derive(Debug, Clone)]
pub(crate) enum PersistRecord {
    Color(ColorSample),
    Bpm(BpmSample),
}

/// Runs the writers on the blocking pool until every sender is dropped.
/// Failures are logged and counted, never propagated.
pub(crate) fn spawn_persistence(
    sinks: PersistenceSinks,
    batch_len: usize,
    metrics: Arc<MetricsRecorder>,
    mut rx: mpsc::Receiver<PersistRecord>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let logger = LogManager::new("persist");
        let mut colors = ColorCsvWriter::new(sinks.colors, batch_len);
        let mut bpm = BpmCsvWriter::new(sinks.bpm);

        let report = |result: Result<(), PersistError>| {
            if let Err(err) = result {
                metrics.record_persistence_error();
                logger.warn(&format!("dropping rows: {}", err));
            }
        };

        while let Some(record) = rx.blocking_recv() {
            match record {
                PersistRecord::Color(sample) => report(colors.push(sample)),
                PersistRecord::Bpm(sample) => report(bpm.write(&sample)),
            }
        }
        report(colors.flush());
    })
}
