use std::{fs::read_to_string, path::Path};

use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::{locate::DEFAULT_LOG_SUFFIX, matrix::Library};

pub const DEFAULT_OUTPUT: &str = "res.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Library whose timing breakdown is turned into ratio lines
    pub reference_library: Library,
    pub log_suffix: String,
    /// Image file name, relative to the benchmark folder
    pub output: String,
    /// Width and height in pixels
    pub image_size: (u32, u32),
    /// Bar width in category units
    pub bar_width: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reference_library: Library::PosixAio,
            log_suffix: DEFAULT_LOG_SUFFIX.to_owned(),
            output: DEFAULT_OUTPUT.to_owned(),
            image_size: (5000, 5000),
            bar_width: 0.2,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path).context(format!("Reading {}", path.display()))?;
        let settings: Settings =
            serde_yml::from_str(&contents).context(format!("Parsing {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Command line values win over the settings file.
    pub fn with_overrides(mut self, reference: Option<Library>, output: Option<String>) -> Self {
        if let Some(reference) = reference {
            self.reference_library = reference;
        }
        if let Some(output) = output {
            self.output = output;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let group = self.bar_width * Library::ALL.len() as f64;
        if !(self.bar_width > 0.0 && group <= 1.0) {
            bail!(
                "bar_width {} does not fit {} bars per category",
                self.bar_width,
                Library::ALL.len()
            );
        }
        if self.image_size.0 == 0 || self.image_size.1 == 0 {
            bail!("image_size must be non-zero, got {:?}", self.image_size);
        }
        if self.output.is_empty() {
            bail!("output file name is empty");
        }
        Ok(())
    }
}
