// ⚖️ Aggregation Engine - fold sales records into running totals
//
// Per record file, in sequence order:
//   arity → branch code → commodity code → amount format → overflow → commit
//
// The check order decides which error a malformed file produces, so it is
// part of the contract. A record that fails any check commits nothing.

use crate::definitions::CodeBook;
use crate::error::SalesError;
use crate::locator::RecordFile;
use crate::schema::is_amount;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{debug, warn};

/// Running totals must stay strictly below ten digits' worth.
pub const OVERFLOW_THRESHOLD: u64 = 10_000_000_000;

// ============================================================================
// RECORD LAYOUT
// ============================================================================

/// Which lines a record file carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordLayout {
    /// `branch` / `amount`
    BranchOnly,

    /// `branch` / `commodity` / `amount`
    #[default]
    BranchAndCommodity,
}

impl RecordLayout {
    /// Number of lines a well-formed record file has
    pub fn arity(&self) -> usize {
        match self {
            RecordLayout::BranchOnly => 2,
            RecordLayout::BranchAndCommodity => 3,
        }
    }

    pub fn has_commodity(&self) -> bool {
        matches!(self, RecordLayout::BranchAndCommodity)
    }
}

// ============================================================================
// SALES RECORD
// ============================================================================

/// One parsed record file. Consumed right away by `fold`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesRecord {
    pub branch_code: String,
    pub commodity_code: Option<String>,
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSummary {
    pub files_processed: usize,
    pub total_amount: u64,
}

// ============================================================================
// AGGREGATION ENGINE
// ============================================================================

pub struct AggregationEngine {
    pub layout: RecordLayout,

    /// Exclusive ceiling for any running total (default: 10,000,000,000)
    pub threshold: u64,
}

impl AggregationEngine {
    pub fn new(layout: RecordLayout) -> Self {
        AggregationEngine {
            layout,
            threshold: OVERFLOW_THRESHOLD,
        }
    }

    pub fn with_threshold(layout: RecordLayout, threshold: u64) -> Self {
        AggregationEngine { layout, threshold }
    }

    /// Validate and fold every file into `branches` (and `commodities` when
    /// the layout carries a commodity line). Stops at the first bad record;
    /// totals from earlier files stay committed.
    pub fn aggregate(
        &self,
        files: &[RecordFile],
        branches: &mut CodeBook,
        mut commodities: Option<&mut CodeBook>,
    ) -> Result<AggregationSummary, SalesError> {
        let mut summary = AggregationSummary::default();

        for file in files {
            let contents = fs::read_to_string(&file.path)?;

            let record =
                self.parse_record(&file.file_name, &contents, branches, commodities.as_deref())?;
            self.fold(&record, branches, commodities.as_deref_mut())?;

            debug!(
                file = %file.file_name,
                branch = %record.branch_code,
                amount = record.amount,
                "record folded"
            );

            summary.files_processed += 1;
            summary.total_amount += record.amount;
        }

        Ok(summary)
    }

    /// Arity, code existence and amount format checks for one file's contents.
    pub fn parse_record(
        &self,
        file_name: &str,
        contents: &str,
        branches: &CodeBook,
        commodities: Option<&CodeBook>,
    ) -> Result<SalesRecord, SalesError> {
        let lines: Vec<&str> = contents.lines().collect();

        if lines.len() != self.layout.arity() {
            warn!(
                file = file_name,
                expected = self.layout.arity(),
                found = lines.len(),
                "record file has wrong line count"
            );
            return Err(SalesError::SalesFileMalformed {
                file: file_name.to_string(),
            });
        }

        let branch_code = lines[0];
        if !branches.contains(branch_code) {
            warn!(file = file_name, code = branch_code, "unknown branch code");
            return Err(SalesError::UnknownBranchCode {
                file: file_name.to_string(),
            });
        }

        let commodity_code = if self.layout.has_commodity() {
            let code = lines[1];
            let known = commodities.is_some_and(|book| book.contains(code));
            if !known {
                warn!(file = file_name, code, "unknown commodity code");
                return Err(SalesError::UnknownCommodityCode {
                    file: file_name.to_string(),
                });
            }
            Some(code.to_string())
        } else {
            None
        };

        let raw_amount = lines[lines.len() - 1];
        if !is_amount(raw_amount) {
            warn!(file = file_name, amount = raw_amount, "amount is not a digit string");
            return Err(SalesError::InvalidAmount);
        }

        // All digits, so the only way parsing fails is a value past u64::MAX,
        // which is far past the threshold as well
        let amount: u64 = raw_amount.parse().map_err(|_| {
            warn!(file = file_name, "amount does not fit in 64 bits");
            SalesError::TotalsOverflow
        })?;

        Ok(SalesRecord {
            branch_code: branch_code.to_string(),
            commodity_code,
            amount,
        })
    }

    /// Add one record's amount to its branch and commodity totals.
    ///
    /// Both candidate totals are checked before either is written.
    pub fn fold(
        &self,
        record: &SalesRecord,
        branches: &mut CodeBook,
        commodities: Option<&mut CodeBook>,
    ) -> Result<(), SalesError> {
        let branch_total = self.add(branches, &record.branch_code, record.amount)?;

        let commodity_update = match (&record.commodity_code, commodities) {
            (Some(code), Some(book)) => {
                let total = self.add(book, code, record.amount)?;
                Some((book, code, total))
            }
            _ => None,
        };

        branches.totals.set(&record.branch_code, branch_total);
        if let Some((book, code, total)) = commodity_update {
            book.totals.set(code, total);
        }

        Ok(())
    }

    /// Candidate total for `code`, or `TotalsOverflow` if it would reach the
    /// threshold
    fn add(&self, book: &CodeBook, code: &str, amount: u64) -> Result<u64, SalesError> {
        let current = book.total(code).unwrap_or(0);

        match current.checked_add(amount) {
            Some(total) if total < self.threshold => Ok(total),
            _ => {
                warn!(code, current, amount, "total would exceed ten digits");
                Err(SalesError::TotalsOverflow)
            }
        }
    }
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new(RecordLayout::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::DefinitionSource;
    use crate::locator::{locate_record_files, RECORD_EXTENSION};
    use std::path::Path;
    use tempfile::tempdir;

    fn books(dir: &Path) -> (CodeBook, CodeBook) {
        fs::write(dir.join("branch.lst"), "001,TokyoBranch\n002,OsakaBranch\n").unwrap();
        fs::write(
            dir.join("commodity.lst"),
            "SFT00001,Software\nHWR00002,Hardware\n",
        )
        .unwrap();

        (
            CodeBook::load(dir, &DefinitionSource::branch()).unwrap(),
            CodeBook::load(dir, &DefinitionSource::commodity()).unwrap(),
        )
    }

    #[test]
    fn test_aggregate_three_field_records() {
        let temp = tempdir().unwrap();
        let (mut branches, mut commodities) = books(temp.path());
        fs::write(temp.path().join("00000001.rcd"), "001\nSFT00001\n1000\n").unwrap();
        fs::write(temp.path().join("00000002.rcd"), "002\nSFT00001\n2000\n").unwrap();
        fs::write(temp.path().join("00000003.rcd"), "001\nHWR00002\n500\n").unwrap();

        let files = locate_record_files(temp.path(), RECORD_EXTENSION).unwrap();
        let engine = AggregationEngine::default();
        let summary = engine
            .aggregate(&files, &mut branches, Some(&mut commodities))
            .unwrap();

        assert_eq!(summary.files_processed, 3);
        assert_eq!(summary.total_amount, 3500);
        assert_eq!(branches.total("001"), Some(1500));
        assert_eq!(branches.total("002"), Some(2000));
        assert_eq!(commodities.total("SFT00001"), Some(3000));
        assert_eq!(commodities.total("HWR00002"), Some(500));

        println!("✅ Aggregated {} files", summary.files_processed);
    }

    #[test]
    fn test_branch_only_layout() {
        let temp = tempdir().unwrap();
        let (mut branches, _) = books(temp.path());
        fs::write(temp.path().join("00000001.rcd"), "001\n1000\n").unwrap();
        fs::write(temp.path().join("00000002.rcd"), "002\n2000\n").unwrap();

        let files = locate_record_files(temp.path(), RECORD_EXTENSION).unwrap();
        let engine = AggregationEngine::new(RecordLayout::BranchOnly);
        engine.aggregate(&files, &mut branches, None).unwrap();

        assert_eq!(branches.total("001"), Some(1000));
        assert_eq!(branches.total("002"), Some(2000));
    }

    #[test]
    fn test_wrong_line_count() {
        let temp = tempdir().unwrap();
        let (branches, commodities) = books(temp.path());
        let engine = AggregationEngine::default();

        for contents in ["001\n1000\n", "001\nSFT00001\n1000\n\n", ""] {
            let err = engine
                .parse_record("00000001.rcd", contents, &branches, Some(&commodities))
                .unwrap_err();
            assert!(
                matches!(err, SalesError::SalesFileMalformed { ref file } if file == "00000001.rcd"),
                "contents {contents:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_check_order() {
        let temp = tempdir().unwrap();
        let (branches, commodities) = books(temp.path());
        let engine = AggregationEngine::default();
        let parse = |contents: &str| {
            engine
                .parse_record("00000001.rcd", contents, &branches, Some(&commodities))
                .unwrap_err()
                .kind()
        };

        // Unknown branch wins over unknown commodity and a bad amount
        assert_eq!(parse("999\nXXXXXXXX\nabc\n"), "UnknownBranchCode");
        // Unknown commodity wins over a bad amount
        assert_eq!(parse("001\nXXXXXXXX\nabc\n"), "UnknownCommodityCode");
        assert_eq!(parse("001\nSFT00001\nabc\n"), "InvalidAmount");
        assert_eq!(parse("001\nSFT00001\n-100\n"), "InvalidAmount");
        assert_eq!(parse("001\nSFT00001\n\n"), "InvalidAmount");
    }

    #[test]
    fn test_commodity_without_table_is_unknown() {
        let temp = tempdir().unwrap();
        let (branches, _) = books(temp.path());
        let engine = AggregationEngine::default();

        let err = engine
            .parse_record("00000001.rcd", "001\nSFT00001\n100\n", &branches, None)
            .unwrap_err();

        assert!(matches!(err, SalesError::UnknownCommodityCode { .. }));
    }

    #[test]
    fn test_overflow_boundary() {
        let temp = tempdir().unwrap();
        let (mut branches, mut commodities) = books(temp.path());
        let engine = AggregationEngine::default();

        let record = engine
            .parse_record(
                "00000001.rcd",
                "001\nSFT00001\n9999999999\n",
                &branches,
                Some(&commodities),
            )
            .unwrap();
        engine
            .fold(&record, &mut branches, Some(&mut commodities))
            .unwrap();
        assert_eq!(branches.total("001"), Some(9_999_999_999));

        // One more yen reaches exactly 10,000,000,000
        let record = engine
            .parse_record("00000002.rcd", "001\nHWR00002\n1\n", &branches, Some(&commodities))
            .unwrap();
        let err = engine
            .fold(&record, &mut branches, Some(&mut commodities))
            .unwrap_err();

        assert!(matches!(err, SalesError::TotalsOverflow));
        assert_eq!(branches.total("001"), Some(9_999_999_999));
        assert_eq!(commodities.total("HWR00002"), Some(0));
    }

    #[test]
    fn test_commodity_overflow_commits_nothing() {
        let temp = tempdir().unwrap();
        let (mut branches, mut commodities) = books(temp.path());
        let engine = AggregationEngine::default();

        let first = SalesRecord {
            branch_code: "001".to_string(),
            commodity_code: Some("SFT00001".to_string()),
            amount: 9_000_000_000,
        };
        engine
            .fold(&first, &mut branches, Some(&mut commodities))
            .unwrap();

        // Branch 002 has room, commodity SFT00001 doesn't
        let second = SalesRecord {
            branch_code: "002".to_string(),
            commodity_code: Some("SFT00001".to_string()),
            amount: 1_000_000_000,
        };
        let err = engine
            .fold(&second, &mut branches, Some(&mut commodities))
            .unwrap_err();

        assert!(matches!(err, SalesError::TotalsOverflow));
        assert_eq!(branches.total("002"), Some(0));
        assert_eq!(commodities.total("SFT00001"), Some(9_000_000_000));
    }

    #[test]
    fn test_huge_amount_is_overflow() {
        let temp = tempdir().unwrap();
        let (branches, commodities) = books(temp.path());
        let engine = AggregationEngine::default();

        let err = engine
            .parse_record(
                "00000001.rcd",
                "001\nSFT00001\n123456789012345678901234567890\n",
                &branches,
                Some(&commodities),
            )
            .unwrap_err();

        assert!(matches!(err, SalesError::TotalsOverflow));
    }

    #[test]
    fn test_failure_keeps_earlier_files() {
        let temp = tempdir().unwrap();
        let (mut branches, mut commodities) = books(temp.path());
        fs::write(temp.path().join("00000001.rcd"), "001\nSFT00001\n1000\n").unwrap();
        fs::write(temp.path().join("00000002.rcd"), "999\nSFT00001\n2000\n").unwrap();
        fs::write(temp.path().join("00000003.rcd"), "002\nSFT00001\n3000\n").unwrap();

        let files = locate_record_files(temp.path(), RECORD_EXTENSION).unwrap();
        let err = AggregationEngine::default()
            .aggregate(&files, &mut branches, Some(&mut commodities))
            .unwrap_err();

        assert_eq!(err.file(), Some("00000002.rcd"));
        assert_eq!(branches.total("001"), Some(1000));
        assert_eq!(branches.total("002"), Some(0));
        assert_eq!(commodities.total("SFT00001"), Some(1000));
    }

    #[test]
    fn test_custom_threshold() {
        let temp = tempdir().unwrap();
        let (mut branches, _) = books(temp.path());
        let engine = AggregationEngine::with_threshold(RecordLayout::BranchOnly, 1000);

        let record = engine
            .parse_record("00000001.rcd", "001\n999\n", &branches, None)
            .unwrap();
        engine.fold(&record, &mut branches, None).unwrap();

        let record = engine
            .parse_record("00000002.rcd", "001\n1\n", &branches, None)
            .unwrap();
        assert!(engine.fold(&record, &mut branches, None).is_err());
    }

    #[test]
    fn test_layout_arity() {
        assert_eq!(RecordLayout::BranchOnly.arity(), 2);
        assert_eq!(RecordLayout::BranchAndCommodity.arity(), 3);
        assert!(!RecordLayout::BranchOnly.has_commodity());
        assert_eq!(RecordLayout::default(), RecordLayout::BranchAndCommodity);
    }
}
