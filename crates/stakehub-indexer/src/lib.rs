//! Event indexer for the StakeHub ledger
//!
//! Replays ledger events in block order into a relational mirror and drives
//! an in-process ledger from transaction scripts.

pub mod indexer;
pub mod ledger;
pub mod metrics;
pub mod script;

pub use indexer::EventIndexer;
pub use ledger::{LedgerReader, LocalLedger};
pub use metrics::IndexingMetrics;
pub use script::{execute_script, load_script, ScriptReport};
