pub mod evidence;
pub mod normalize;
pub mod rank;
pub mod statement;

pub use evidence::{extract_evidence, EvidenceKey, EvidenceRecord, EvidenceSet};
pub use normalize::normalize;
pub use rank::{compare_records, rank};
pub use statement::{resolve_statement_filter, StatementFilter, NEUTRAL_PROBE};
