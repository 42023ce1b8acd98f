// 🔁 Pipeline - one batch run over a directory
//
//   branch.lst + commodity.lst → locate *.rcd → aggregate → branch.out + commodity.out
//
// Stages run strictly in that order and the first error ends the run. Report
// files already written by an earlier stage are left in place.

use crate::aggregation::AggregationEngine;
use crate::definitions::CodeBook;
use crate::error::SalesError;
use crate::locator::locate_record_files;
use crate::report::write_report;
use crate::settings::Settings;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub directory: PathBuf,
    pub record_files: usize,
    pub branch_rows: usize,
    /// `None` for the branch-only layout
    pub commodity_rows: Option<usize>,
    pub total_amount: u64,
    pub completed_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        let commodities = match self.commodity_rows {
            Some(rows) => format!(", {} commodities", rows),
            None => String::new(),
        };

        format!(
            "{}: {} record files, {} branches{}, total {}",
            self.directory.display(),
            self.record_files,
            self.branch_rows,
            commodities,
            self.total_amount
        )
    }
}

/// Load both definition tables, aggregate every record file in `dir` and
/// write the summary reports.
pub fn run(dir: &Path, settings: &Settings) -> Result<RunSummary, SalesError> {
    let layout = settings.layout;

    info!(directory = %dir.display(), ?layout, "loading definitions");
    let mut branches = CodeBook::load(dir, &settings.branch_source())?;
    let mut commodities = if layout.has_commodity() {
        Some(CodeBook::load(dir, &settings.commodity_source())?)
    } else {
        None
    };

    let files = locate_record_files(dir, &settings.record_extension)?;
    info!(count = files.len(), "aggregating record files");

    let engine = AggregationEngine::new(layout);
    let aggregated = engine.aggregate(&files, &mut branches, commodities.as_mut())?;

    let branch_rows = write_report(
        dir,
        &settings.branch_report,
        &branches,
        settings.report_mode,
    )?;

    let commodity_rows = match &commodities {
        Some(book) => Some(write_report(
            dir,
            &settings.commodity_report,
            book,
            settings.report_mode,
        )?),
        None => None,
    };

    let summary = RunSummary {
        directory: dir.to_path_buf(),
        record_files: aggregated.files_processed,
        branch_rows,
        commodity_rows,
        total_amount: aggregated.total_amount,
        completed_at: Utc::now(),
    };

    info!("{}", summary.summary());
    Ok(summary)
}
