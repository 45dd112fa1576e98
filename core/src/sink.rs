//! Diagnostic message sinks.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;

/// Receives human-readable diagnostics. Fire-and-forget.
pub trait MessageSink: Send + Sync {
    fn record(&self, message: &str);
}

/// Keeps every message in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Mutex<Vec<String>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageSink for MessageLog {
    fn record(&self, message: &str) {
        self.lock().push(message.to_string());
    }
}

/// Forwards messages to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn record(&self, message: &str) {
        info!(target: "hero_core::messages", "{message}");
    }
}
