use core::fmt::Debug;
use std::path::Path;

use eyre::{Context, Result};
use tracing::debug;

use crate::aggregate::PanelGrid;

pub trait Plot: Debug {
    /// Name of the plot, for identification
    fn name(&self) -> &'static str;
    /// Draws the grid
    ///
    /// Arguments:
    /// * `grid` - Aggregated series, one entry per panel
    /// * `output` - Image file to write, ie. <benchmark folder>/res.png
    fn plot(&self, grid: &PanelGrid, output: &Path) -> Result<()>;
}

pub fn plot(plots: &[Box<dyn Plot>], grid: &PanelGrid, output: &Path) -> Result<()> {
    if plots.is_empty() {
        debug!("No plots");
        return Ok(());
    }

    for plot in plots {
        debug!("Running plot {}", plot.name());
        plot.plot(grid, output)
            .context(format!("Plot {} into {}", plot.name(), output.display()))?;
    }
    Ok(())
}
