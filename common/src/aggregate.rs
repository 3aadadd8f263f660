use std::{collections::BTreeMap, fmt, str::FromStr};

use itertools::iproduct;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    error::ReportError,
    locate::LogLocator,
    matrix::{
        Category, FileMode, Library, MatrixPoint, Workload, categories, labelled_enum,
    },
    metric::{MetricRecord, SummaryParser, TimingRatios},
};

labelled_enum! {
    /// Derived timing ratio drawn as a line over the bars.
    RatioKind, "ratio" {
        Lock => "locked ratio",
        AvgIo => "avg io ratio",
        MaxIo => "max io ratio",
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSeries {
    pub lock: Vec<f64>,
    pub avg_io: Vec<f64>,
    pub max_io: Vec<f64>,
}

impl RatioSeries {
    pub fn push(&mut self, ratios: TimingRatios) {
        self.lock.push(ratios.lock);
        self.avg_io.push(ratios.avg_io);
        self.max_io.push(ratios.max_io);
    }

    pub fn get(&self, kind: RatioKind) -> &[f64] {
        match kind {
            RatioKind::Lock => &self.lock,
            RatioKind::AvgIo => &self.avg_io,
            RatioKind::MaxIo => &self.max_io,
        }
    }
}

/// Everything one chart panel shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSeries {
    pub workload: Workload,
    pub file_mode: FileMode,
    pub categories: Vec<Category>,
    /// kiops per library, one value per category
    pub throughput: BTreeMap<Library, Vec<f64>>,
    /// Taken from the reference library only
    pub ratios: RatioSeries,
}

impl PanelSeries {
    pub fn new(workload: Workload, file_mode: FileMode) -> Self {
        Self {
            workload,
            file_mode,
            categories: Vec::new(),
            throughput: Library::ALL.iter().map(|x| (*x, Vec::new())).collect(),
            ratios: RatioSeries::default(),
        }
    }

    pub fn title(&self) -> String {
        format!("{} - {} File", self.workload, self.file_mode)
    }

    pub fn throughput(&self, library: Library) -> &[f64] {
        self.throughput
            .get(&library)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn mean_kiops(&self, library: Library) -> Option<f64> {
        let values = self.throughput(library);
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// All panels of a run, workload-major and file-mode-minor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelGrid {
    pub reference: Library,
    pub panels: Vec<PanelSeries>,
}

impl PanelGrid {
    pub fn panels(&self) -> &[PanelSeries] {
        &self.panels
    }

    pub fn get(&self, workload: Workload, file_mode: FileMode) -> Option<&PanelSeries> {
        self.panels
            .iter()
            .find(|x| x.workload == workload && x.file_mode == file_mode)
    }
}

/// Walks the whole benchmark matrix and collects the panel series.
#[derive(Debug, Clone)]
pub struct Aggregator {
    locator: LogLocator,
    parser: SummaryParser,
    reference: Library,
}

impl Aggregator {
    /// `reference` is the library whose records feed the ratio series.
    pub fn new(locator: LogLocator, reference: Library) -> Result<Self, ReportError> {
        Ok(Self {
            locator,
            parser: SummaryParser::new()?,
            reference,
        })
    }

    pub fn reference(&self) -> Library {
        self.reference
    }

    pub fn run(&self) -> Result<PanelGrid, ReportError> {
        let panels = iproduct!(
            Workload::ALL.iter().copied(),
            FileMode::ALL.iter().copied()
        )
        .map(|(workload, file_mode)| self.panel(workload, file_mode))
        .collect::<Result<Vec<_>, _>>()?;

        Ok(PanelGrid {
            reference: self.reference,
            panels,
        })
    }

    pub fn panel(
        &self,
        workload: Workload,
        file_mode: FileMode,
    ) -> Result<PanelSeries, ReportError> {
        let mut panel = PanelSeries::new(workload, file_mode);
        for category in categories() {
            for &library in Library::ALL {
                let point = MatrixPoint::new(workload, file_mode, library, category);
                let record = self.record(&point)?;
                panel
                    .throughput
                    .entry(library)
                    .or_default()
                    .push(record.kiops());

                if library == self.reference {
                    let ratios = record
                        .ratios()
                        .ok_or(ReportError::DegenerateRatio { point })?;
                    panel.ratios.push(ratios);
                }
            }
            panel.categories.push(category);
        }

        info!("Aggregated {}", panel.title());
        for &library in Library::ALL {
            if let Some(mean) = panel.mean_kiops(library) {
                info!("  {library}: {mean:.3} kiops mean");
            }
        }
        Ok(panel)
    }

    pub fn record(&self, point: &MatrixPoint) -> Result<MetricRecord, ReportError> {
        let line = self.locator.summary_line(point)?;
        let record = self.parser.parse(&line).inspect_err(|_| {
            error!("Bad summary in {}", self.locator.path(point).display());
        })?;
        debug!("{point}: {record:?}");
        Ok(record)
    }
}
