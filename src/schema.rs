// 📐 Shape Layer - Code and file-name formats
// Branch codes, commodity codes, amounts and record file names are all
// validated here, so the loaders only ever ask "does this match?"

use serde::{Deserialize, Serialize};

/// Digits in a record file's sequence number (`00000001.rcd`)
pub const SEQUENCE_WIDTH: usize = 8;

// ============================================================================
// CODE FORMAT
// ============================================================================

/// Full-match rule for one code namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeFormat {
    /// Exactly `n` ASCII digits
    Digits(usize),

    /// Exactly `n` ASCII letters or digits
    Alphanumeric(usize),
}

impl CodeFormat {
    /// Three-digit branch codes (`001`)
    pub const BRANCH: CodeFormat = CodeFormat::Digits(3);

    /// Eight-character commodity codes (`SFT00001`)
    pub const COMMODITY: CodeFormat = CodeFormat::Alphanumeric(8);

    pub fn matches(&self, code: &str) -> bool {
        match *self {
            CodeFormat::Digits(width) => {
                code.len() == width && code.bytes().all(|b| b.is_ascii_digit())
            }
            CodeFormat::Alphanumeric(width) => {
                code.len() == width && code.bytes().all(|b| b.is_ascii_alphanumeric())
            }
        }
    }
}

/// One or more ASCII digits, nothing else.
pub fn is_amount(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// RECORD FILE NAME
// ============================================================================

/// A file name of the form `NNNNNNNN.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFileName {
    pub sequence: u32,
}

impl RecordFileName {
    /// Returns `None` unless `name` is exactly eight ASCII digits, a dot and
    /// `extension`.
    pub fn parse(name: &str, extension: &str) -> Option<RecordFileName> {
        let (stem, ext) = name.split_once('.')?;

        if ext != extension || !CodeFormat::Digits(SEQUENCE_WIDTH).matches(stem) {
            return None;
        }

        // Eight digits always fit in a u32
        let sequence = stem.parse().ok()?;
        Some(RecordFileName { sequence })
    }
}

// ============================================================================
// TESTS
// ============================================================================
