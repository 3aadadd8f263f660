use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{IOPS_PER_KIOPS, error::ReportError};

const FULL_SUMMARY: &str = r"(?P<total>[0-9]+\.[0-9]+) s in total, (?P<lock>[0-9]+\.[0-9]+) s holding lock, (?P<avgio>[0-9]+\.[0-9]+) s avg true io time, (?P<maxio>[0-9]+\.[0-9]+) s max true io time.*?(?P<iops>[0-9]+\.[0-9]+) iops$";
const REDUCED_SUMMARY: &str = r"(?P<total>[0-9]+\.[0-9]+) s in total, .*?(?P<iops>[0-9]+\.[0-9]+) iops$";

/// Which summary layout a record was parsed from. Only [`SummaryForm::Full`]
/// records carry real lock and true-io timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryForm {
    Full,
    Reduced,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub total_time: f64,
    pub lock_time: f64,
    pub avg_io_time: f64,
    pub max_io_time: f64,
    pub iops: f64,
    pub form: SummaryForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingRatios {
    pub lock: f64,
    pub avg_io: f64,
    pub max_io: f64,
}

impl MetricRecord {
    pub fn kiops(&self) -> f64 {
        self.iops / IOPS_PER_KIOPS
    }

    /// Lock, avg-io and max-io time as fractions of the total time, `None`
    /// when the total is zero.
    pub fn ratios(&self) -> Option<TimingRatios> {
        if self.total_time == 0.0 {
            return None;
        }
        Some(TimingRatios {
            lock: self.lock_time / self.total_time,
            avg_io: self.avg_io_time / self.total_time,
            max_io: self.max_io_time / self.total_time,
        })
    }
}

/// Parses the trailing summary line of a benchmark log.
#[derive(Debug, Clone)]
pub struct SummaryParser {
    full: Regex,
    reduced: Regex,
}

impl SummaryParser {
    pub fn new() -> Result<Self, ReportError> {
        Ok(Self {
            full: Regex::new(FULL_SUMMARY)?,
            reduced: Regex::new(REDUCED_SUMMARY)?,
        })
    }

    /// Tries the full layout first, then the reduced one that only has the
    /// total time and iops.
    pub fn parse(&self, line: &str) -> Result<MetricRecord, ReportError> {
        if let Some(cap) = self.full.captures(line) {
            return Ok(MetricRecord {
                total_time: figure(&cap, "total", line)?,
                lock_time: figure(&cap, "lock", line)?,
                avg_io_time: figure(&cap, "avgio", line)?,
                max_io_time: figure(&cap, "maxio", line)?,
                iops: figure(&cap, "iops", line)?,
                form: SummaryForm::Full,
            });
        }

        trace!("Falling back to reduced summary for {line:?}");
        let cap = self
            .reduced
            .captures(line)
            .ok_or_else(|| unparseable(line))?;
        Ok(MetricRecord {
            total_time: figure(&cap, "total", line)?,
            lock_time: 0.0,
            avg_io_time: 0.0,
            max_io_time: 0.0,
            iops: figure(&cap, "iops", line)?,
            form: SummaryForm::Reduced,
        })
    }
}

fn figure(cap: &Captures, name: &str, line: &str) -> Result<f64, ReportError> {
    cap.name(name)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or_else(|| unparseable(line))
}

fn unparseable(line: &str) -> ReportError {
    ReportError::UnparseableSummaryLine {
        line: line.to_owned(),
    }
}
