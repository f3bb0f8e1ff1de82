use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// One line of the apply-run trace: what happened on a single page pass.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub page: usize,

    pub url: Option<String>,

    pub descriptors: usize,
    pub mapped: usize,
    pub filled: usize,
    pub failed: usize,

    pub decision: Option<String>,
    pub control: Option<String>,
}

impl TraceEvent {
    pub fn now(page: usize) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            page,
            url: None,
            descriptors: 0,
            mapped: 0,
            filled: 0,
            failed: 0,
            decision: None,
            control: None,
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_counts(
        mut self,
        descriptors: usize,
        mapped: usize,
        filled: usize,
        failed: usize,
    ) -> Self {
        self.descriptors = descriptors;
        self.mapped = mapped;
        self.filled = filled;
        self.failed = failed;
        self
    }

    pub fn with_decision(mut self, decision: impl ToString) -> Self {
        self.decision = Some(decision.to_string());
        self
    }

    pub fn with_control(mut self, control: impl ToString) -> Self {
        self.control = Some(control.to_string());
        self
    }
}
