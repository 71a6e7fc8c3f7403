// ============================================================================
// Lookup Infrastructure - tabular sources and time-boxed caching
// ============================================================================
//
// Catalog and directory data live in external spreadsheets exported as CSV.
// Sources only fetch raw text; parsing and schema checks belong to the
// consumers. Cache expiry is time-based only.
//
// ============================================================================

mod cache;
mod source;

pub use cache::TtlCache;
pub use source::{FileSource, InlineSource, SourceError, TableSource};

/// Default freshness window for catalog and directory reads
pub const DEFAULT_LOOKUP_TTL_SECS: u64 = 300;
