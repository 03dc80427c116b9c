//! Bounded poll loop with jittered spacing between attempts.

use std::time::Duration;

use {
    async_trait::async_trait,
    rand::Rng,
    tracing::{info, warn},
};

use crate::{error::MonitorError, types::RunOutcome};

/// Poll loop parameters.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub max_attempts: usize,
    pub delay_min: Duration,
    pub delay_max: Duration,
}

impl From<&citawatch_config::PollConfig> for PollConfig {
    fn from(config: &citawatch_config::PollConfig) -> Self {
        Self {
            max_attempts: config.max_attempts as usize,
            delay_min: Duration::from_secs(config.delay_min_secs),
            delay_max: Duration::from_secs(config.delay_max_secs),
        }
    }
}

/// What one attempt told the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct Disposition {
    /// The run should stop; the attempt already dispatched its effects.
    pub terminal: bool,
}

/// One self-contained poll attempt. Seam for tests.
#[async_trait]
pub trait AttemptRunner: Send + Sync {
    async fn attempt(&self, index: usize) -> Result<Disposition, MonitorError>;
}

/// Runs attempts until one is terminal or the budget is spent.
pub struct PollScheduler {
    config: PollConfig,
}

impl PollScheduler {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Errors are absorbed at the attempt boundary: a failed attempt is
    /// logged and the next one still runs.
    pub async fn run_with(&self, runner: &dyn AttemptRunner) -> RunOutcome {
        let mut classified_any = false;

        for index in 0..self.config.max_attempts {
            info!(
                attempt = index + 1,
                of = self.config.max_attempts,
                "starting attempt"
            );

            match runner.attempt(index).await {
                Ok(disposition) => {
                    classified_any = true;
                    if disposition.terminal {
                        return RunOutcome::FoundAndHandled;
                    }
                },
                Err(e) => {
                    warn!(attempt = index + 1, error = %e, "attempt failed");
                },
            }

            if index + 1 < self.config.max_attempts {
                let delay = jittered_delay(self.config.delay_min, self.config.delay_max);
                info!(delay_secs = delay.as_secs(), "waiting before next attempt");
                tokio::time::sleep(delay).await;
            }
        }

        RunOutcome::ExhaustedAttempts { classified_any }
    }
}

/// Uniform delay in `[min, max]`. Jitter keeps the polling cadence from
/// looking mechanical to the booking host.
fn jittered_delay(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let span = (max - min).as_millis() as u64;
    let extra = rand::rng().random_range(0..=span);
    min + Duration::from_millis(extra)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn fast_config(max_attempts: usize) -> PollConfig {
        PollConfig {
            max_attempts,
            delay_min: Duration::from_millis(0),
            delay_max: Duration::from_millis(0),
        }
    }

    /// Replays a fixed script of attempt results.
    struct ScriptedRunner {
        script: Vec<Result<Disposition, ()>>,
        calls: AtomicUsize,
    }

    impl ScriptedRunner {
        fn new(script: Vec<Result<Disposition, ()>>) -> Self {
            Self {
                script,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AttemptRunner for ScriptedRunner {
        async fn attempt(&self, index: usize) -> Result<Disposition, MonitorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script[index] {
                Ok(disposition) => Ok(disposition),
                Err(()) => Err(MonitorError::Other(anyhow::anyhow!("scripted failure"))),
            }
        }
    }

    fn non_terminal() -> Result<Disposition, ()> {
        Ok(Disposition { terminal: false })
    }

    fn terminal() -> Result<Disposition, ()> {
        Ok(Disposition { terminal: true })
    }

    #[tokio::test]
    async fn stops_early_on_terminal_attempt() {
        let runner = ScriptedRunner::new(vec![non_terminal(), terminal(), non_terminal()]);
        let scheduler = PollScheduler::new(fast_config(3));

        let outcome = scheduler.run_with(&runner).await;

        assert_eq!(outcome, RunOutcome::FoundAndHandled);
        assert_eq!(runner.calls(), 2);
    }

    #[tokio::test]
    async fn exhausts_all_attempts_without_terminal() {
        let runner = ScriptedRunner::new(vec![non_terminal(), non_terminal(), non_terminal()]);
        let scheduler = PollScheduler::new(fast_config(3));

        let outcome = scheduler.run_with(&runner).await;

        assert_eq!(
            outcome,
            RunOutcome::ExhaustedAttempts {
                classified_any: true
            }
        );
        assert_eq!(runner.calls(), 3);
    }

    #[tokio::test]
    async fn attempt_errors_do_not_stop_the_run() {
        let runner = ScriptedRunner::new(vec![Err(()), terminal()]);
        let scheduler = PollScheduler::new(fast_config(2));

        let outcome = scheduler.run_with(&runner).await;

        assert_eq!(outcome, RunOutcome::FoundAndHandled);
        assert_eq!(runner.calls(), 2);
    }

    #[tokio::test]
    async fn all_errors_report_nothing_classified() {
        let runner = ScriptedRunner::new(vec![Err(()), Err(())]);
        let scheduler = PollScheduler::new(fast_config(2));

        let outcome = scheduler.run_with(&runner).await;

        assert_eq!(
            outcome,
            RunOutcome::ExhaustedAttempts {
                classified_any: false
            }
        );
    }

    #[tokio::test]
    async fn single_attempt_runs_once() {
        let runner = ScriptedRunner::new(vec![non_terminal()]);
        let scheduler = PollScheduler::new(fast_config(1));

        let outcome = scheduler.run_with(&runner).await;

        assert_eq!(
            outcome,
            RunOutcome::ExhaustedAttempts {
                classified_any: true
            }
        );
        assert_eq!(runner.calls(), 1);
    }

    #[test]
    fn jittered_delay_stays_in_bounds() {
        let min = Duration::from_secs(20);
        let max = Duration::from_secs(40);
        for _ in 0..100 {
            let delay = jittered_delay(min, max);
            assert!(delay >= min && delay <= max);
        }
    }

    #[test]
    fn jittered_delay_degenerate_range() {
        let d = Duration::from_secs(5);
        assert_eq!(jittered_delay(d, d), d);
        assert_eq!(jittered_delay(d, Duration::from_secs(1)), d);
    }
}
