//! Conversion state machine.

use std::fmt;

use tracing::{debug, warn};

use crate::error::DdsError;

/// Progress of one import or export.
///
/// ```text
/// Idle ──► HeaderParsed ──► LayoutPlanned ──► PixelsMaterialized ──► Done
///   │           │                 │                    │
///   └───────────┴─────────────────┴────────────────────┴──► Failed(reason)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionState {
    Idle,
    HeaderParsed,
    LayoutPlanned,
    PixelsMaterialized,
    Done,
    Failed(String),
}

impl ConversionState {
    pub fn name(&self) -> &'static str {
        match self {
            ConversionState::Idle => "idle",
            ConversionState::HeaderParsed => "header_parsed",
            ConversionState::LayoutPlanned => "layout_planned",
            ConversionState::PixelsMaterialized => "pixels_materialized",
            ConversionState::Done => "done",
            ConversionState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversionState::Done | ConversionState::Failed(_))
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: &ConversionState) -> bool {
        use ConversionState::*;
        match (self, next) {
            (Done | Failed(_), _) => false,
            (_, Failed(_)) => true,
            (Idle, HeaderParsed)
            | (HeaderParsed, LayoutPlanned)
            | (LayoutPlanned, PixelsMaterialized)
            | (PixelsMaterialized, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ConversionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionState::Failed(reason) => write!(f, "failed: {}", reason),
            other => f.write_str(other.name()),
        }
    }
}

/// Tracks and traces the state of a single operation.
#[derive(Debug)]
pub(crate) struct Conversion {
    operation: &'static str,
    state: ConversionState,
}

impl Conversion {
    pub(crate) fn new(operation: &'static str) -> Self {
        Self {
            operation,
            state: ConversionState::Idle,
        }
    }

    pub(crate) fn state(&self) -> &ConversionState {
        &self.state
    }

    pub(crate) fn advance(&mut self, next: ConversionState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(
            operation = self.operation,
            from = self.state.name(),
            to = next.name(),
            "conversion state"
        );
        self.state = next;
    }

    /// Moves to `Failed` and hands the error back for propagation.
    pub(crate) fn fail(&mut self, error: DdsError) -> DdsError {
        warn!(
            operation = self.operation,
            from = self.state.name(),
            error = %error,
            "conversion failed"
        );
        self.state = ConversionState::Failed(error.to_string());
        error
    }

    /// Runs one step, advancing to `next` on success and to `Failed` on error.
    pub(crate) fn step<T>(
        &mut self,
        next: ConversionState,
        work: impl FnOnce() -> crate::error::Result<T>,
    ) -> crate::error::Result<T> {
        match work() {
            Ok(value) => {
                self.advance(next);
                Ok(value)
            }
            Err(error) => Err(self.fail(error)),
        }
    }
}
