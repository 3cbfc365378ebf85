//! Run Context
//!
//! Per-run logging capability. Each agent run owns its own [`RunLogger`]
//! instead of toggling process-wide logger state, so concurrent runs stay
//! distinguishable and a verbose run never changes another run's output.

use uuid::Uuid;

/// Logger scoped to a single agent run
///
/// Carries a short run id and the verbose flag. Verbose runs emit at info so
/// a default subscriber shows them; quiet runs emit at debug. All output goes
/// through `tracing`, so the subscriber keeps final control.
#[derive(Clone, Debug)]
pub struct RunLogger {
    run_id: String,
    verbose: bool,
}

impl RunLogger {
    pub fn new(verbose: bool) -> Self {
        let mut run_id = Uuid::new_v4().simple().to_string();
        run_id.truncate(8);
        Self { run_id, verbose }
    }

    /// Short identifier attached to every event of this run
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn turn_started(&self, turn: usize, max_turns: usize) {
        if self.verbose {
            tracing::info!(run = %self.run_id, turn, max_turns, "starting turn");
        } else {
            tracing::debug!(run = %self.run_id, turn, max_turns, "starting turn");
        }
    }

    pub fn assistant_received(&self, tool_calls: usize) {
        if self.verbose {
            tracing::info!(run = %self.run_id, tool_calls, "assistant message received");
        } else {
            tracing::debug!(run = %self.run_id, tool_calls, "assistant message received");
        }
    }

    pub fn tool_dispatched(&self, name: &str, call_id: &str) {
        if self.verbose {
            tracing::info!(run = %self.run_id, tool = %name, call_id = %call_id, "dispatching tool");
        } else {
            tracing::debug!(run = %self.run_id, tool = %name, call_id = %call_id, "dispatching tool");
        }
    }

    /// Recoverable per-call failures always warn, regardless of verbosity
    pub fn tool_failed(&self, name: &str, error: &str) {
        tracing::warn!(run = %self.run_id, tool = %name, error = %error, "tool call failed");
    }

    pub fn calls_dropped(&self, dropped: usize, cap: usize) {
        tracing::warn!(run = %self.run_id, dropped, cap, "tool calls over per-turn cap dropped");
    }

    /// Free-form note, used by tool handlers through [`ToolContext`]
    pub fn note(&self, message: &str) {
        if self.verbose {
            tracing::info!(run = %self.run_id, "{message}");
        } else {
            tracing::debug!(run = %self.run_id, "{message}");
        }
    }
}

/// Context handed to tool handlers at invocation time
///
/// Logging-only: handlers get no access to the transcript, the registry, or
/// other tools.
#[derive(Clone, Debug)]
pub struct ToolContext {
    logger: RunLogger,
}

impl ToolContext {
    pub fn new(logger: RunLogger) -> Self {
        Self { logger }
    }

    /// Id of the run this invocation belongs to
    pub fn run_id(&self) -> &str {
        self.logger.run_id()
    }

    /// Log a note attributed to this run
    pub fn note(&self, message: &str) {
        self.logger.note(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_short_and_distinct() {
        let a = RunLogger::new(false);
        let b = RunLogger::new(true);
        assert_eq!(a.run_id().len(), 8);
        assert_ne!(a.run_id(), b.run_id());
    }
}
