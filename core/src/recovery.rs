//! Uniform failure recovery for the hero service.
//!
//! Every lenient operation resolves through `Recovery::resolve`: a failure
//! becomes the caller-supplied default plus exactly one diagnostic message
//! of the form `<operation> failed: <detail>`.

use std::sync::Arc;

use tracing::warn;

use crate::error::HeroError;
use crate::sink::MessageSink;

#[derive(Clone)]
pub struct Recovery {
    sink: Arc<dyn MessageSink>,
}

impl std::fmt::Debug for Recovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recovery").finish_non_exhaustive()
    }
}

impl Recovery {
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self { sink }
    }

    pub fn resolve<T>(&self, operation: &str, result: Result<T, HeroError>, default: T) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                warn!(operation, error = %err, "operation failed, using default");
                self.sink.record(&format!("{operation} failed: {err}"));
                default
            }
        }
    }
}
