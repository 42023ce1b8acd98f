// 📚 Definition Tables - code → name lookups + zeroed totals
//
// A definition file is one `code,name` pair per line. Loading it seeds two
// tables that share the same key set for the rest of the run:
//   DefinitionTable: code → display name (file order preserved)
//   TotalsTable:     code → running amount (starts at 0)

use crate::error::SalesError;
use crate::schema::CodeFormat;
use indexmap::IndexMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Target for the echo of accepted definition lines. The binary routes it to
/// stdout, next to the diagnostics.
pub const ECHO_TARGET: &str = "calculate_sales::echo";

// ============================================================================
// DEFINITION SOURCE
// ============================================================================

/// Where a lookup table comes from and how its codes are validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionSource {
    pub file_name: String,
    /// Used in diagnostics ("Branch definition file does not exist")
    pub label: String,
    pub format: CodeFormat,
}

impl DefinitionSource {
    pub fn new(file_name: &str, label: &str, format: CodeFormat) -> Self {
        DefinitionSource {
            file_name: file_name.to_string(),
            label: label.to_string(),
            format,
        }
    }

    pub fn branch() -> Self {
        Self::new("branch.lst", "Branch definition file", CodeFormat::BRANCH)
    }

    pub fn commodity() -> Self {
        Self::new(
            "commodity.lst",
            "Commodity definition file",
            CodeFormat::COMMODITY,
        )
    }

    /// Same table, different file name
    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.file_name = file_name.to_string();
        self
    }
}

// ============================================================================
// TABLES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionTable {
    names: IndexMap<String, String>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: &str, name: &str) {
        // IndexMap keeps the first-seen position when a key is overwritten
        self.names.insert(code.to_string(), name.to_string());
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.names.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(code, name)| (code.as_str(), name.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TotalsTable {
    totals: IndexMap<String, u64>,
}

impl TotalsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a code at zero
    pub fn seed(&mut self, code: &str) {
        self.totals.insert(code.to_string(), 0);
    }

    pub fn get(&self, code: &str) -> Option<u64> {
        self.totals.get(code).copied()
    }

    /// Overwrite an existing total. Unknown codes are ignored so the key set
    /// never grows after loading.
    pub(crate) fn set(&mut self, code: &str, total: u64) {
        if let Some(slot) = self.totals.get_mut(code) {
            *slot = total;
        }
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.totals.keys().map(String::as_str)
    }
}

// ============================================================================
// LOADER
// ============================================================================

/// Populate `names` and `totals` from `dir/source.file_name`.
///
/// # Returns
/// * `Ok(n)` - number of accepted lines
/// * `Err(DefinitionFileMissing)` - no such file
/// * `Err(DefinitionFileMalformed)` - a line isn't `code,name` or the code
///   doesn't match `source.format`
/// * `Err(Unknown)` - the file exists but can't be read
pub fn load_definitions(
    dir: &Path,
    source: &DefinitionSource,
    names: &mut DefinitionTable,
    totals: &mut TotalsTable,
) -> Result<usize, SalesError> {
    let path = dir.join(&source.file_name);

    if !path.exists() {
        warn!(path = %path.display(), "{} not found", source.label);
        return Err(SalesError::DefinitionFileMissing {
            label: source.label.clone(),
        });
    }

    let content = fs::read_to_string(&path)?;
    let mut accepted = 0;

    for (index, line) in content.lines().enumerate() {
        let Some((code, name)) = split_definition(line, source.format) else {
            warn!(
                path = %path.display(),
                line = index + 1,
                "rejected definition line: {line:?}"
            );
            return Err(SalesError::DefinitionFileMalformed {
                label: source.label.clone(),
                line: index + 1,
            });
        };

        names.insert(code, name);
        totals.seed(code);
        accepted += 1;

        info!(target: ECHO_TARGET, "{line}");
    }

    debug!(
        file = %source.file_name,
        accepted,
        distinct = names.len(),
        "definition table loaded"
    );

    Ok(accepted)
}

/// `code,name` with a well-formed code and a non-empty name. Trailing empty
/// fields are dropped first, so `001,TokyoBranch,,` is two fields but `001,`
/// is only one.
fn split_definition(line: &str, format: CodeFormat) -> Option<(&str, &str)> {
    let mut fields = line.trim_end_matches(',').split(',');
    let code = fields.next()?;
    let name = fields.next()?;

    if fields.next().is_some() || name.is_empty() || !format.matches(code) {
        return None;
    }

    Some((code, name))
}

// ============================================================================
// CODE BOOK
// ============================================================================

/// A DefinitionTable and its TotalsTable, always holding the same codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBook {
    pub(crate) names: DefinitionTable,
    pub(crate) totals: TotalsTable,
}

impl CodeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fresh book from `dir/source.file_name`
    pub fn load(dir: &Path, source: &DefinitionSource) -> Result<Self, SalesError> {
        let mut book = CodeBook::new();
        load_definitions(dir, source, &mut book.names, &mut book.totals)?;
        Ok(book)
    }

    pub fn names(&self) -> &DefinitionTable {
        &self.names
    }

    pub fn totals(&self) -> &TotalsTable {
        &self.totals
    }

    pub fn contains(&self, code: &str) -> bool {
        self.names.contains(code)
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.names.get(code)
    }

    pub fn total(&self, code: &str) -> Option<u64> {
        self.totals.get(code)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `(code, name, total)` in definition order
    pub fn rows(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.names.iter().map(move |(code, name)| {
            let total = self.totals.get(code).unwrap_or(0);
            (code, name, total)
        })
    }

    /// Sum of every total in the book
    pub fn grand_total(&self) -> u64 {
        self.rows().map(|(_, _, total)| total).sum()
    }
}

// ============================================================================
// TESTS
// ============================================================================
