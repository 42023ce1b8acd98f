//! Run settings.
//!
//! Every field has a default, so a run needs no configuration at all. An
//! optional TOML file and `CALCULATE_SALES_*` environment variables can
//! override file names, the record layout and the report mode:
//!
//! ```toml
//! layout = "branch_only"
//! report_mode = "truncate"
//! branch_file = "stores.lst"
//! ```

use crate::aggregation::RecordLayout;
use crate::definitions::DefinitionSource;
use crate::locator::RECORD_EXTENSION;
use crate::report::ReportMode;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for environment overrides (`CALCULATE_SALES_REPORT_MODE=truncate`)
pub const ENV_PREFIX: &str = "CALCULATE_SALES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub branch_file: String,
    pub commodity_file: String,
    pub branch_report: String,
    pub commodity_report: String,
    /// Without the leading dot
    pub record_extension: String,
    pub layout: RecordLayout,
    pub report_mode: ReportMode,
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            branch_file: "branch.lst".to_string(),
            commodity_file: "commodity.lst".to_string(),
            branch_report: "branch.out".to_string(),
            commodity_report: "commodity.out".to_string(),
            record_extension: RECORD_EXTENSION.to_string(),
            layout: RecordLayout::default(),
            report_mode: ReportMode::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, then `path` (if given, it must exist), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        settings.try_deserialize()
    }

    pub fn branch_source(&self) -> DefinitionSource {
        DefinitionSource::branch().with_file_name(&self.branch_file)
    }

    pub fn commodity_source(&self) -> DefinitionSource {
        DefinitionSource::commodity().with_file_name(&self.commodity_file)
    }
}
