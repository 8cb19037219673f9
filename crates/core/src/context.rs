use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationContext {
    pub invocation_id: String,
    pub timeout_ms: u64,
}

impl InvocationContext {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            invocation_id: uuid::Uuid::new_v4().to_string(),
            timeout_ms,
        }
    }
}

/// Caller-supplied cancellation signal.
///
/// Checked between plan steps; a set flag aborts the invocation before the
/// next step dispatches.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
