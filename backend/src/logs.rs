//! Structured run events and the sinks that receive them.
//!
//! The orchestrator emits one event per table phase plus a start and an
//! end (or error) event for the whole run. Sinks only observe: nothing they
//! do can change the outcome of a run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::Table;

/// Lifecycle step an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Start,
    End,
    Error,
}

/// A single observation of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunEvent {
    pub run_id: Uuid,
    /// `None` for events about the whole run.
    pub table: Option<Table>,
    pub phase: Phase,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunEvent {
    fn new(run_id: Uuid, table: Option<Table>, phase: Phase) -> Self {
        Self {
            run_id,
            table,
            phase,
            timestamp: Utc::now(),
            duration_ms: None,
            rows: None,
            message: None,
        }
    }

    pub fn start(run_id: Uuid, table: Option<Table>) -> Self {
        Self::new(run_id, table, Phase::Start)
    }

    pub fn end(run_id: Uuid, table: Option<Table>, duration: Duration) -> Self {
        Self::new(run_id, table, Phase::End).with_duration(duration)
    }

    pub fn error(run_id: Uuid, table: Option<Table>, duration: Duration, message: impl Into<String>) -> Self {
        Self::new(run_id, table, Phase::Error)
            .with_duration(duration)
            .with_message(message)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = Some(duration.as_millis() as u64);
        self
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn scope(&self) -> &'static str {
        self.table.map(Table::name).unwrap_or("run")
    }
}

/// Observer of run events.
pub trait EventSink {
    fn emit(&self, event: &RunEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &RunEvent) {
        let scope = event.scope();
        match event.phase {
            Phase::Start => info!(run_id = %event.run_id, "{} started", scope),
            Phase::End => info!(
                run_id = %event.run_id,
                duration_ms = event.duration_ms.unwrap_or_default(),
                rows = event.rows.unwrap_or_default(),
                "{} finished",
                scope
            ),
            Phase::Error => error!(
                run_id = %event.run_id,
                duration_ms = event.duration_ms.unwrap_or_default(),
                "{} failed: {}",
                scope,
                event.message.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Appends one JSON document per event to a file.
#[derive(Debug)]
pub struct JsonLinesSink {
    file: Mutex<File>,
}

impl JsonLinesSink {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EventSink for JsonLinesSink {
    fn emit(&self, event: &RunEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("cannot serialize run event: {}", e);
                return;
            }
        };
        if let Ok(mut file) = self.file.lock() {
            if let Err(e) = writeln!(file, "{}", line) {
                warn!("cannot append run event: {}", e);
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<RunEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &RunEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Sends every event to several sinks in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &RunEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn emit(&self, event: &RunEvent) {
        (**self).emit(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: &RunEvent) {
        (**self).emit(event);
    }
}
