use std::{
    fs::read,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{error::ReportError, matrix::MatrixPoint};

pub const DEFAULT_LOG_SUFFIX: &str = "log";

/// Maps matrix points onto
/// `<base>/<workload>/<file mode>/<library>/<operation>/<trial>.<suffix>`.
#[derive(Debug, Clone)]
pub struct LogLocator {
    base: PathBuf,
    suffix: String,
}

impl LogLocator {
    pub fn new(base: impl Into<PathBuf>, suffix: &str) -> Self {
        Self {
            base: base.into(),
            suffix: suffix.to_owned(),
        }
    }

    pub fn path(&self, point: &MatrixPoint) -> PathBuf {
        self.base
            .join(point.workload.label())
            .join(point.file_mode.label())
            .join(point.library.label())
            .join(point.category.operation.label())
            .join(format!("{}.{}", point.category.trial, self.suffix))
    }

    /// The summary line the benchmark printed last for `point`.
    pub fn summary_line(&self, point: &MatrixPoint) -> Result<String, ReportError> {
        let path = self.path(point);
        debug!("Reading {}", path.display());
        last_line(&path)
    }
}

/// Last non-empty line of the file, without trailing whitespace. Invalid
/// UTF-8 is replaced, so only the summary line itself can fail parsing.
pub fn last_line(path: &Path) -> Result<String, ReportError> {
    let bytes = read(path).map_err(|source| ReportError::MissingLogFile {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8_lossy(&bytes)
        .lines()
        .rev()
        .map(str::trim_end)
        .find(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| ReportError::EmptyLogFile {
            path: path.to_path_buf(),
        })
}
