//! Run orchestration over the six tables.
//!
//! A run reads every raw snapshot in [`Table::ALL`] order, curates it and
//! replaces the curated table in the store. The first failing table aborts
//! the run; tables already replaced stay replaced and nothing is retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use curate::logs::TracingSink;
//! use curate::parser::CsvSource;
//! use curate::store::CsvDirStore;
//! use curate::transform::Orchestrator;
//!
//! let mut orchestrator = Orchestrator::new(
//!     CsvSource::new("datasets"),
//!     CsvDirStore::new("curated"),
//!     TracingSink,
//! );
//! let report = orchestrator.run()?;
//! println!("Curated {} rows", report.rows_written());
//! ```

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ErrorDescriptor, PipelineError, PipelineResult};
use crate::logs::{EventSink, RunEvent};
use crate::models::Table;
use crate::parser::RawSource;
use crate::quality::{audit, QualityIssue};
use crate::store::CuratedStore;
use crate::transform::tables;

/// Lifecycle of an orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(Table),
    Completed,
    Failed,
}

/// Per-run values shared by every table of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    /// Processing time; dates after it are treated as invalid.
    pub now: NaiveDateTime,
    started: Instant,
}

impl RunContext {
    pub fn new() -> Self {
        Self::at(Local::now().naive_local())
    }

    /// Context with a fixed processing time.
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            now,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table: Table,
    pub rows_read: usize,
    pub rows_written: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<QualityIssue>,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub tables: Vec<TableReport>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn rows_written(&self) -> usize {
        self.tables.iter().map(|t| t.rows_written).sum()
    }

    pub fn findings(&self) -> usize {
        self.tables.iter().map(|t| t.findings.len()).sum()
    }
}

/// An aborted run.
#[derive(Debug, Error)]
#[error("run {run_id} aborted at {table}: {source}", table = .source.table())]
pub struct RunFailure {
    pub run_id: Uuid,
    /// Tables replaced before the failure.
    pub completed: Vec<TableReport>,
    pub duration_ms: u64,
    #[source]
    pub source: PipelineError,
}

impl RunFailure {
    pub fn descriptor(&self) -> ErrorDescriptor {
        self.source.descriptor()
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Runs the table transformers against a source, a store and an event sink.
pub struct Orchestrator<S, D, E> {
    source: S,
    store: D,
    sink: E,
    quality_checks: bool,
    state: RunState,
}

impl<S: RawSource, D: CuratedStore, E: EventSink> Orchestrator<S, D, E> {
    pub fn new(source: S, store: D, sink: E) -> Self {
        Self {
            source,
            store,
            sink,
            quality_checks: true,
            state: RunState::Idle,
        }
    }

    /// Enable or disable the quality audit of curated tables.
    pub fn with_quality_checks(mut self, enabled: bool) -> Self {
        self.quality_checks = enabled;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    pub fn into_store(self) -> D {
        self.store
    }

    /// Run every table with a fresh [`RunContext`].
    pub fn run(&mut self) -> Result<RunReport, RunFailure> {
        self.run_with(RunContext::new())
    }

    /// Run every table in order, stopping at the first failure.
    pub fn run_with(&mut self, ctx: RunContext) -> Result<RunReport, RunFailure> {
        self.sink.emit(&RunEvent::start(ctx.run_id, None));

        let mut reports = Vec::with_capacity(Table::ALL.len());
        for table in Table::ALL {
            self.state = RunState::Running(table);
            match self.run_table(table, &ctx) {
                Ok(report) => reports.push(report),
                Err(source) => {
                    self.state = RunState::Failed;
                    self.sink.emit(&RunEvent::error(
                        ctx.run_id,
                        None,
                        ctx.elapsed(),
                        source.to_string(),
                    ));
                    return Err(RunFailure {
                        run_id: ctx.run_id,
                        completed: reports,
                        duration_ms: millis(ctx.elapsed()),
                        source,
                    });
                }
            }
        }

        self.state = RunState::Completed;
        let report = RunReport {
            run_id: ctx.run_id,
            tables: reports,
            duration_ms: millis(ctx.elapsed()),
        };
        self.sink.emit(
            &RunEvent::end(ctx.run_id, None, ctx.elapsed()).with_rows(report.rows_written()),
        );
        Ok(report)
    }

    fn run_table(&mut self, table: Table, ctx: &RunContext) -> PipelineResult<TableReport> {
        let started = Instant::now();
        self.sink.emit(&RunEvent::start(ctx.run_id, Some(table)));

        match self.replace_table(table, ctx) {
            Ok(mut report) => {
                report.duration_ms = millis(started.elapsed());
                self.sink.emit(
                    &RunEvent::end(ctx.run_id, Some(table), started.elapsed())
                        .with_rows(report.rows_written),
                );
                Ok(report)
            }
            Err(e) => {
                self.sink.emit(&RunEvent::error(
                    ctx.run_id,
                    Some(table),
                    started.elapsed(),
                    e.to_string(),
                ));
                Err(e)
            }
        }
    }

    fn replace_table(&mut self, table: Table, ctx: &RunContext) -> PipelineResult<TableReport> {
        self.store
            .truncate(table)
            .map_err(|source| PipelineError::Storage { table, source })?;

        let curated = tables::curate(table, &self.source, ctx.now)
            .map_err(|source| PipelineError::Source { table, source })?;
        debug!(
            table = %table,
            rows_read = curated.rows_read,
            rows_curated = curated.records.len(),
            "curated table"
        );

        let findings = if self.quality_checks {
            let findings = audit(&curated.records);
            if !findings.is_empty() {
                warn!(table = %table, findings = findings.len(), "quality audit reported findings");
                for issue in findings.iter().take(3) {
                    debug!(table = %table, row = issue.row, check = issue.check, "{}", issue.message);
                }
            }
            findings
        } else {
            Vec::new()
        };

        let rows_written = curated.records.len();
        self.store
            .bulk_write(table, curated.records)
            .map_err(|source| PipelineError::Storage { table, source })?;

        Ok(TableReport {
            table,
            rows_read: curated.rows_read,
            rows_written,
            duration_ms: 0,
            findings,
        })
    }
}
