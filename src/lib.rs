// Calculate Sales - Core Library
// Exposes the aggregation engine for the CLI and for tests

pub mod error;
pub mod schema;         // Code formats + record file names
pub mod definitions;    // Definition Table Loader
pub mod locator;        // Record File Locator
pub mod aggregation;    // Aggregator
pub mod report;         // Report Writer
pub mod settings;
pub mod pipeline;

// Re-export commonly used types
pub use error::SalesError;
pub use schema::{CodeFormat, RecordFileName};
pub use definitions::{
    CodeBook, DefinitionSource, DefinitionTable, TotalsTable,
    ECHO_TARGET, load_definitions,
};
pub use locator::{RecordFile, check_sequential, locate_record_files};
pub use aggregation::{
    AggregationEngine, AggregationSummary, RecordLayout, SalesRecord,
    OVERFLOW_THRESHOLD,
};
pub use report::{ReportMode, write_report};
pub use settings::Settings;
pub use pipeline::{RunSummary, run};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
