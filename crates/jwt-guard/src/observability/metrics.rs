//! Metrics definitions for jwt-guard.
//!
//! All metrics follow Prometheus naming conventions:
//! - `jwt_guard_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `mode`: 2 values (required, optional)
//! - `outcome`: bounded by `AuthFailure::kind()` plus `authenticated`
//! - `status`: 2 values (success, error)

use metrics::{counter, histogram};
use std::time::Duration;

/// Middleware mode label for `require_authentication`.
pub const MODE_REQUIRED: &str = "required";

/// Middleware mode label for `optional_authentication`.
pub const MODE_OPTIONAL: &str = "optional";

/// Outcome label for a successful authentication.
pub const OUTCOME_AUTHENTICATED: &str = "authenticated";

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record the outcome of one middleware authentication attempt.
///
/// Metric: `jwt_guard_auth_attempts_total`
/// Labels: `mode`, `outcome`
pub fn record_auth_attempt(mode: &'static str, outcome: &'static str) {
    counter!("jwt_guard_auth_attempts_total",
        "mode" => mode,
        "outcome" => outcome
    )
    .increment(1);
}

// ============================================================================
// Key Retrieval Metrics
// ============================================================================

/// Record a verification key retrieval.
///
/// Metrics: `jwt_guard_key_retrievals_total`,
/// `jwt_guard_key_retrieval_duration_seconds`
/// Labels: `status`
///
/// Cache hits are not recorded; only calls to the retriever are.
pub fn record_key_retrieval(status: &'static str, duration: Duration) {
    histogram!("jwt_guard_key_retrieval_duration_seconds",
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("jwt_guard_key_retrievals_total",
        "status" => status
    )
    .increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use metrics_util::MetricKind;

    fn counter_value(
        snapshot: &[(
            metrics_util::CompositeKey,
            Option<metrics::Unit>,
            Option<metrics::SharedString>,
            DebugValue,
        )],
        name: &str,
        label: (&str, &str),
    ) -> Option<u64> {
        snapshot.iter().find_map(|(key, _, _, value)| {
            let matches = key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label.0 && l.value() == label.1);
            match (matches, value) {
                (true, DebugValue::Counter(n)) => Some(*n),
                _ => None,
            }
        })
    }

    #[test]
    fn test_record_auth_attempt() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_auth_attempt(MODE_REQUIRED, OUTCOME_AUTHENTICATED);
            record_auth_attempt(MODE_REQUIRED, OUTCOME_AUTHENTICATED);
            record_auth_attempt(MODE_OPTIONAL, "no_token");
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(
            counter_value(
                &snapshot,
                "jwt_guard_auth_attempts_total",
                ("outcome", OUTCOME_AUTHENTICATED)
            ),
            Some(2)
        );
        assert_eq!(
            counter_value(
                &snapshot,
                "jwt_guard_auth_attempts_total",
                ("outcome", "no_token")
            ),
            Some(1)
        );
    }

    #[test]
    fn test_record_key_retrieval() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_key_retrieval("success", Duration::from_millis(40));
            record_key_retrieval("error", Duration::from_millis(5));
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(
            counter_value(&snapshot, "jwt_guard_key_retrievals_total", ("status", "success")),
            Some(1)
        );
        assert_eq!(
            counter_value(&snapshot, "jwt_guard_key_retrievals_total", ("status", "error")),
            Some(1)
        );

        let histograms = snapshot
            .iter()
            .filter(|(key, _, _, _)| {
                key.kind() == MetricKind::Histogram
                    && key.key().name() == "jwt_guard_key_retrieval_duration_seconds"
            })
            .count();
        assert_eq!(histograms, 2);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_auth_attempt(MODE_OPTIONAL, OUTCOME_AUTHENTICATED);
        record_key_retrieval("success", Duration::from_millis(1));
    }
}
