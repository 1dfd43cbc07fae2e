//! Scanning pipeline: tree walking, method collection, snippet extraction
//! and dependency resolution.

pub mod deps;
pub mod extract;
pub mod methods;
pub mod session;
pub mod stats;
pub mod walker;

pub use extract::CandidateSnippet;
pub use methods::{MethodRecord, MethodRegistry};
pub use session::{ScanOutcome, ScanSession};
