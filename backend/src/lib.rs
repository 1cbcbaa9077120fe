//! # Curate - curated layer for CRM/ERP extracts
//!
//! Curate reads raw CSV snapshots of a CRM and an ERP system, cleanses and
//! reconciles them, and fully replaces six curated tables on every run.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Raw CSVs   │────▶│   Parser    │────▶│  Transform  │────▶│   Store     │
//! │ (CRM + ERP) │     │  (auto-enc) │     │ (6 tables)  │     │ (swap-in)   │
//! └─────────────┘     └─────────────┘     └──────┬──────┘     └─────────────┘
//!                                                │
//!                                         ┌──────▼──────┐
//!                                         │ Events/Logs │
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use curate::{CsvDirStore, CsvSource, Orchestrator, TracingSink};
//!
//! fn main() {
//!     let mut orchestrator = Orchestrator::new(
//!         CsvSource::new("datasets"),
//!         CsvDirStore::new("curated"),
//!         TracingSink,
//!     );
//!     let report = orchestrator.run().unwrap();
//!     println!("Curated {} rows", report.rows_written());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`models`] - Tables, raw and curated records
//! - [`parser`] - Raw sources, CSV parsing with auto-detection
//! - [`transform`] - Normalizers, validators, table transformers, orchestrator
//! - [`store`] - Destination stores with atomic table replacement
//! - [`quality`] - Audit of curated tables
//! - [`logs`] - Run events and sinks
//! - [`config`] - Environment configuration

// Core modules
pub mod error;
pub mod models;

// Input
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod store;

// Quality audit
pub mod quality;

// Observability
pub mod logs;

// Configuration
pub mod config;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ErrorDescriptor, PipelineError, Severity, SourceError, StorageError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CategoryCurated, CategoryRaw, CuratedTable, CustomerCurated, CustomerRaw, DemographicCurated,
    DemographicRaw, LocationCurated, LocationRaw, ProductCurated, ProductRaw, SalesCurated,
    SalesRaw, Table,
};

// =============================================================================
// Re-exports - Sources and stores
// =============================================================================

pub use parser::{CsvSource, InMemorySource, RawSource};
pub use store::{CsvDirStore, CuratedStore, InMemoryStore};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    Orchestrator, RunContext, RunFailure, RunReport, RunState, TableReport,
};

// =============================================================================
// Re-exports - Observability and configuration
// =============================================================================

pub use config::Config;
pub use logs::{EventSink, FanoutSink, JsonLinesSink, MemorySink, Phase, RunEvent, TracingSink};
pub use quality::{audit, QualityIssue};
