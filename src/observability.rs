//! Correlation and trace context for transfer submissions

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation ID for tracking one transfer across log lines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Create a new correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Trace context shared by the transfers of one run
///
/// A sequence gets one `trace_id`; every transfer in it gets its own
/// correlation ID and its position in the sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceContext {
    /// Identifier shared by every step of the operation
    pub trace_id: String,

    /// Identifier for this particular transfer
    pub correlation_id: CorrelationId,

    /// Operation name
    pub operation: String,

    /// Zero-based position and total, when part of a sequence
    pub step: Option<(usize, usize)>,
}

impl TraceContext {
    /// Create a new trace context for an operation
    pub fn new(operation: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            correlation_id: CorrelationId::new(),
            operation: operation.to_string(),
            step: None,
        }
    }

    /// Context for step `index` of `total` within this trace
    pub fn child_step(&self, operation: &str, index: usize, total: usize) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            correlation_id: CorrelationId::new(),
            operation: operation.to_string(),
            step: Some((index, total)),
        }
    }

    /// Human-readable "n/total" position, or "-" outside a sequence
    pub fn step_label(&self) -> String {
        match self.step {
            Some((index, total)) => format!("{}/{}", index + 1, total),
            None => "-".to_string(),
        }
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new("transfer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_step_shares_trace_id() {
        let root = TraceContext::new("transfer_sequence");
        let first = root.child_step("transfer", 0, 3);
        let second = root.child_step("transfer", 1, 3);

        assert_eq!(first.trace_id, root.trace_id);
        assert_eq!(second.trace_id, root.trace_id);
        assert_ne!(first.correlation_id, second.correlation_id);
        assert_eq!(first.step_label(), "1/3");
        assert_eq!(second.step_label(), "2/3");
        assert_eq!(root.step_label(), "-");
    }

    #[test]
    fn test_correlation_id_display() {
        let id = CorrelationId::from("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(id.as_str(), "abc");
    }
}
