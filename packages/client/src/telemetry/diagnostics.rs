//! Diagnostic channel for user-facing alerts

use std::fmt;
use std::sync::Mutex;

/// Receives user-facing error lines, such as certificate verification diagnostics.
pub trait DiagnosticSink: Send + Sync + fmt::Debug {
    fn alert_error(&self, message: &str);
}

/// Forwards alerts to `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn alert_error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Keeps alerts in memory so a front end can print them after the fact.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All alerts received so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticSink for MemorySink {
    fn alert_error(&self, message: &str) {
        tracing::debug!("diagnostic: {}", message);
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}
