use std::path::Path;

use common::{
    aggregate::{PanelGrid, PanelSeries, RatioKind},
    config::Settings,
    matrix::{FileMode, Library, Workload},
    plot::Plot,
};
use eyre::{ContextCompat, Result, bail};
use plotters::{coord::Shift, prelude::*};
use tracing::debug;

const CAPTION_FONT_SIZE: u32 = 40;
const AXIS_LABEL_FONT_SIZE: u32 = 28;
const TICK_LABEL_FONT_SIZE: u32 = 22;
const LEGEND_FONT_SIZE: u32 = 22;
const MARKER_SIZE: u32 = 8;

/// Every (workload, file mode) panel on one image: workloads as rows, file
/// modes as columns. Bars are kiops per library on the left axis, the ratio
/// lines use a fixed [0, 1] right axis.
#[derive(Debug, Clone)]
pub struct GridPlot {
    pub image_size: (u32, u32),
    pub bar_width: f64,
}

impl GridPlot {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            image_size: settings.image_size,
            bar_width: settings.bar_width,
        }
    }
}

pub fn library_color(library: Library) -> RGBColor {
    match library {
        Library::Posix => RED,
        Library::Fstream => GREEN,
        Library::PosixAio => BLUE,
    }
}

pub fn ratio_color(kind: RatioKind) -> RGBColor {
    match kind {
        RatioKind::Lock => BLACK,
        RatioKind::AvgIo => MAGENTA,
        RatioKind::MaxIo => CYAN,
    }
}

/// Left and right edge of the bar for `library` at category `idx`. The group
/// of bars is centered on `idx`.
pub fn bar_span(idx: usize, library: Library, bar_width: f64) -> (f64, f64) {
    let group = Library::ALL.len() as f64 * bar_width;
    let left = idx as f64 - group / 2.0 + library.index() as f64 * bar_width;
    (left, left + bar_width)
}

/// Tick formatter: only whole category positions get a label.
pub fn category_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if idx < 0.0 || (x - idx).abs() > 0.25 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

pub fn kiops_upper_bound(panel: &PanelSeries) -> f64 {
    let max = panel
        .throughput
        .values()
        .flatten()
        .copied()
        .fold(0.0, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}

/// Index of the panel in a row-major split of the image.
pub fn grid_slot(workload: Workload, file_mode: FileMode) -> usize {
    workload.index() * FileMode::ALL.len() + file_mode.index()
}

impl Plot for GridPlot {
    fn name(&self) -> &'static str {
        "panel-grid"
    }

    fn plot(&self, grid: &PanelGrid, output: &Path) -> Result<()> {
        if grid.panels().is_empty() {
            bail!("No panels to plot");
        }

        let root = BitMapBackend::new(output, self.image_size).into_drawing_area();
        root.fill(&WHITE)?;
        let areas = root.split_evenly((Workload::ALL.len(), FileMode::ALL.len()));

        for panel in grid.panels() {
            let area = areas
                .get(grid_slot(panel.workload, panel.file_mode))
                .context(format!("No grid slot for {}", panel.title()))?;
            self.draw_panel(area, panel)?;
        }

        root.present()?;
        debug!("Wrote {}", output.display());
        Ok(())
    }
}

impl GridPlot {
    fn draw_panel<DB>(&self, area: &DrawingArea<DB, Shift>, panel: &PanelSeries) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let title = panel.title();
        println!("{title}");

        let labels = panel
            .categories
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        let x_range = -0.5..(labels.len() as f64 - 0.5);

        let mut chart = ChartBuilder::on(area)
            .caption(&title, ("sans-serif", CAPTION_FONT_SIZE))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .right_y_label_area_size(90)
            .build_cartesian_2d(x_range.clone(), 0.0..kiops_upper_bound(panel))?
            .set_secondary_coord(x_range, 0.0..1.0);

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len())
            .x_label_formatter(&|x| category_label(&labels, *x))
            .y_desc("kiops")
            .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
            .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
            .draw()?;
        chart
            .configure_secondary_axes()
            .y_desc("ratio")
            .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
            .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
            .draw()?;

        for &library in Library::ALL {
            let color = library_color(library);
            chart
                .draw_series(panel.throughput(library).iter().enumerate().map(
                    |(idx, kiops)| {
                        let (left, right) = bar_span(idx, library, self.bar_width);
                        Rectangle::new([(left, 0.0), (right, *kiops)], color.filled())
                    },
                ))?
                .label(library.label())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled()));
        }

        for &kind in RatioKind::ALL {
            let color = ratio_color(kind);
            let points = panel
                .ratios
                .get(kind)
                .iter()
                .enumerate()
                .map(|(idx, ratio)| (idx as f64, *ratio))
                .collect::<Vec<_>>();

            chart
                .draw_secondary_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
                .label(kind.label())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });

            let style = color.stroke_width(2);
            match kind {
                RatioKind::Lock => {
                    chart.draw_secondary_series(
                        points.iter().map(|p| Cross::new(*p, MARKER_SIZE, style)),
                    )?;
                }
                RatioKind::AvgIo => {
                    chart.draw_secondary_series(
                        points.iter().map(|p| Circle::new(*p, MARKER_SIZE, style)),
                    )?;
                }
                RatioKind::MaxIo => {
                    chart.draw_secondary_series(
                        points
                            .iter()
                            .map(|p| TriangleMarker::new(*p, MARKER_SIZE, style)),
                    )?;
                }
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", LEGEND_FONT_SIZE))
            .draw()?;

        Ok(())
    }
}
