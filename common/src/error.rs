use std::{io, path::PathBuf};

use thiserror::Error;

use crate::matrix::MatrixPoint;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Missing log file {path:?}: {source}")]
    MissingLogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Log file {path:?} has no summary line")]
    EmptyLogFile { path: PathBuf },
    #[error("Unparseable summary line: {line:?}")]
    UnparseableSummaryLine { line: String },
    #[error("Total time is zero for {point}, timing ratios are undefined")]
    DegenerateRatio { point: MatrixPoint },
    #[error("Unknown {kind} {label:?}")]
    UnknownLabel { kind: &'static str, label: String },
    #[error("Summary pattern error: {0}")]
    Pattern(#[from] regex::Error),
}
