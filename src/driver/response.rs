//! Result of one executed command.

use std::time::Duration;

use crate::dialect::Dialect;

/// Everything the engine knows about one command round trip.
///
/// Built by the executor once the completion pattern matched: carries
/// both the sanitized and the raw output, the prompt that closed the
/// exchange, and the verdict from the dialect's failure markers.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command as it was sent.
    pub command: String,

    /// Sanitized output: echo and trailing prompt removed.
    pub result: String,

    /// Output as it came off the channel, before sanitization.
    pub raw_result: String,

    /// Prompt that terminated the read.
    pub prompt: String,

    /// Wall-clock time from write to pattern match.
    pub elapsed: Duration,

    /// Set when the sanitized output hit one of the dialect's failure
    /// markers.
    pub failure_message: Option<String>,
}

impl Response {
    /// Assemble a response, judging success against the dialect's
    /// failure markers.
    pub(crate) fn evaluate(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
        dialect: &Dialect,
    ) -> Self {
        let result = result.into();
        let failure_message = dialect.detect_failure(&result);
        Self {
            command: command.into(),
            result,
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message,
        }
    }

    /// Whether the output cleared every failure marker.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::vendors;

    #[test]
    fn evaluate_flags_dialect_failure_markers() {
        let dialect = vendors::ericsson_ipos::dialect();
        let response = Response::evaluate(
            "show bogus",
            "% Invalid input at '^'",
            "show bogus\n% Invalid input at '^'\nRouter#",
            "Router#",
            Duration::from_millis(5),
            &dialect,
        );
        assert!(!response.is_success());
        assert!(response.failure_message.unwrap().contains("% Invalid input"));
    }

    #[test]
    fn evaluate_passes_clean_output() {
        let dialect = vendors::generic::dialect();
        let response = Response::evaluate(
            "show clock",
            "12:00:00 UTC",
            "show clock\n12:00:00 UTC\nRouter#",
            "Router#",
            Duration::from_millis(5),
            &dialect,
        );
        assert!(response.is_success());
        assert_eq!(response.to_string(), "12:00:00 UTC");
    }
}
