//! Cnpjcheck - CNPJ alphanumeric migration impact scanner.
//!
//! Brazil's CNPJ registration numbers become alphanumeric in 2026, and
//! code that stores, validates, or masks them as plain numbers will
//! break. Cnpjcheck walks a polyglot source tree with per-language
//! regex heuristics, extracts the method bodies that touch CNPJ values,
//! and asks an AI backend to classify each one and estimate the
//! migration effort in developer and test hours.
//!
//! # Architecture
//!
//! Scanning is regex-driven end to end; there is no AST in the loop:
//!
//! - `lang`: language profiles and the pattern tables behind them
//! - `scan`: directory walking, method collection, snippet extraction
//! - `config`: backend selection from flags and environment
//! - `backend`: interchangeable AI providers (Anthropic, Mistral, Ollama)
//! - `analysis`: prompt assembly and response validation
//! - `findings`: per-method impact records
//! - `report`: output formatting (pretty, JSON)
//!
//! Files are scanned one at a time and snippets are analyzed one call
//! at a time, so two runs over the same tree produce findings in the
//! same order.

pub mod analysis;
pub mod backend;
pub mod cli;
pub mod config;
pub mod findings;
pub mod lang;
pub mod report;
pub mod scan;

pub use analysis::{analyze_snippet, ImpactAnalysis, SnippetOutcome};
pub use backend::{build_backend, AiBackend, BackendError};
pub use config::{BackendConfig, BackendKind, BackendOverrides, ConfigError};
pub use findings::Finding;
pub use lang::{resolve_language, Language};
pub use report::JsonReport;
pub use scan::stats::{collect_stats, ScanStats};
pub use scan::{CandidateSnippet, ScanOutcome, ScanSession};
