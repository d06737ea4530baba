//! Time Budget Enforcement

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Rejected [`QuotaConfig`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuotaError {
    #[error("budget must be greater than zero")]
    ZeroBudget,

    #[error("tick period must be greater than zero")]
    ZeroTick,
}

/// A caller whose processing time is metered.
#[derive(Debug)]
pub struct User {
    id: u64,
    premium: bool,
    used_ns: AtomicU64,
}

impl User {
    /// Create a user with no usage charged yet
    pub fn new(id: u64, premium: bool) -> Self {
        Self {
            id,
            premium,
            used_ns: AtomicU64::new(0),
        }
    }

    /// Get the user id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Premium users are metered but never killed
    pub fn is_premium(&self) -> bool {
        self.premium
    }

    /// Total processing time charged so far
    pub fn time_used(&self) -> Duration {
        Duration::from_nanos(self.used_ns.load(Ordering::Relaxed))
    }

    /// Add `amount` to the user's usage, returns the new total. Saturates.
    fn charge(&self, amount: Duration) -> Duration {
        let ns = u64::try_from(amount.as_nanos()).unwrap_or(u64::MAX);
        let before = self
            .used_ns
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                Some(used.saturating_add(ns))
            })
            .unwrap_or_else(|used| used);
        Duration::from_nanos(before.saturating_add(ns))
    }
}

/// Budget settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaConfig {
    /// Processing time a non-premium user may accumulate
    pub budget: Duration,

    /// Metering granularity. Usage is charged one tick at a time.
    pub tick: Duration,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(10),
            tick: Duration::from_secs(1),
        }
    }
}

impl QuotaConfig {
    /// Set the per-user budget
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Set the metering tick
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Reject a zero budget or a zero tick
    pub fn validate(&self) -> Result<(), QuotaError> {
        if self.budget.is_zero() {
            return Err(QuotaError::ZeroBudget);
        }
        if self.tick.is_zero() {
            return Err(QuotaError::ZeroTick);
        }
        Ok(())
    }

    fn exhausted(&self, user: &User) -> bool {
        !user.premium && user.time_used() > self.budget
    }
}

/// How a metered request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The process finished within the user's budget
    Completed,
    /// The budget ran out first; the caller stopped waiting
    Killed,
    /// The process panicked
    Failed,
}

/// Run `process` on behalf of `user`, charging one tick of usage per tick
/// elapsed while it runs.
///
/// When a non-premium user's accumulated usage exceeds the budget the wait is
/// abandoned and [`RequestOutcome::Killed`] is returned. The process task is
/// detached at that point, not aborted. Users already over budget are
/// rejected without spawning the process. An invalid `config` is rejected
/// before anything runs.
pub async fn handle_request<F>(
    process: F,
    user: &User,
    config: &QuotaConfig,
) -> Result<RequestOutcome, QuotaError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    config.validate()?;

    if config.exhausted(user) {
        info!(user = user.id, used = ?user.time_used(), "No quota left, request rejected");
        return Ok(RequestOutcome::Killed);
    }

    let mut worker = tokio::spawn(process);
    let mut ticker = interval_at(Instant::now() + config.tick, config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            joined = &mut worker => {
                return Ok(match joined {
                    Ok(_) => {
                        debug!(user = user.id, used = ?user.time_used(), "Request completed");
                        RequestOutcome::Completed
                    }
                    Err(e) => {
                        warn!(user = user.id, error = %e, "Request process failed");
                        RequestOutcome::Failed
                    }
                });
            }
            _ = ticker.tick() => {
                let used = user.charge(config.tick);
                if config.exhausted(user) {
                    info!(user = user.id, used = ?used, "Quota exhausted, request killed");
                    return Ok(RequestOutcome::Killed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tokio::time::sleep;

    fn process(duration: Duration, done: Arc<AtomicBool>) -> impl Future<Output = ()> {
        async move {
            sleep(duration).await;
            done.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_request_is_free() {
        let user = User::new(0, false);
        let done = Arc::new(AtomicBool::new(false));

        let outcome = handle_request(
            process(Duration::from_millis(500), done.clone()),
            &user,
            &QuotaConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, RequestOutcome::Completed);
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(user.time_used(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_request_is_killed_but_not_aborted() {
        let user = User::new(0, false);
        let done = Arc::new(AtomicBool::new(false));
        let started = Instant::now();

        let outcome = handle_request(
            process(Duration::from_secs(30), done.clone()),
            &user,
            &QuotaConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, RequestOutcome::Killed);
        assert_eq!(user.time_used(), Duration::from_secs(11));
        assert_eq!(started.elapsed(), Duration::from_secs(11));
        assert!(!done.load(Ordering::SeqCst));

        // The process keeps running in the background
        sleep(Duration::from_secs(20)).await;
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_premium_is_never_killed() {
        let user = User::new(1, true);
        let done = Arc::new(AtomicBool::new(false));

        let outcome = handle_request(
            process(Duration::from_millis(20_500), done.clone()),
            &user,
            &QuotaConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, RequestOutcome::Completed);
        assert_eq!(user.time_used(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_accumulates_across_requests() {
        let user = User::new(0, false);
        let config = QuotaConfig::default();
        let short = Duration::from_millis(5_500);

        for _ in 0..2 {
            let done = Arc::new(AtomicBool::new(false));
            let outcome = handle_request(process(short, done), &user, &config)
                .await
                .unwrap();
            assert_eq!(outcome, RequestOutcome::Completed);
        }
        assert_eq!(user.time_used(), Duration::from_secs(10));

        let done = Arc::new(AtomicBool::new(false));
        let outcome = handle_request(process(short, done), &user, &config)
            .await
            .unwrap();
        assert_eq!(outcome, RequestOutcome::Killed);
        assert_eq!(user.time_used(), Duration::from_secs(11));

        // Over budget: rejected before the process ever runs
        let done = Arc::new(AtomicBool::new(false));
        let outcome = handle_request(process(short, done.clone()), &user, &config)
            .await
            .unwrap();
        assert_eq!(outcome, RequestOutcome::Killed);
        sleep(Duration::from_secs(10)).await;
        assert!(!done.load(Ordering::SeqCst));
        assert_eq!(user.time_used(), Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_process_fails() {
        let user = User::new(0, false);
        let outcome = handle_request(
            async { panic!("boom") },
            &user,
            &QuotaConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, RequestOutcome::Failed);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let user = User::new(0, false);
        let done = Arc::new(AtomicBool::new(false));

        let zero_tick = QuotaConfig::default().with_tick(Duration::ZERO);
        let err = handle_request(process(Duration::ZERO, done.clone()), &user, &zero_tick)
            .await
            .unwrap_err();
        assert_eq!(err, QuotaError::ZeroTick);

        let zero_budget = QuotaConfig::default().with_budget(Duration::ZERO);
        let err = handle_request(process(Duration::ZERO, done.clone()), &user, &zero_budget)
            .await
            .unwrap_err();
        assert_eq!(err, QuotaError::ZeroBudget);

        // Nothing was spawned
        tokio::task::yield_now().await;
        assert!(!done.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_millisecond_tick_is_charged() {
        let user = User::new(0, false);
        let config = QuotaConfig::default()
            .with_budget(Duration::from_millis(10))
            .with_tick(Duration::from_micros(500));
        let done = Arc::new(AtomicBool::new(false));

        let outcome = handle_request(process(Duration::from_secs(1), done), &user, &config)
            .await
            .unwrap();

        assert_eq!(outcome, RequestOutcome::Killed);
        assert!(user.time_used() > config.budget);
        // Charged in whole ticks, nothing lost to rounding
        assert_eq!(user.time_used().as_nanos() % 500_000, 0);
    }

    #[test]
    fn test_charge_saturates() {
        let user = User::new(0, true);
        user.charge(Duration::MAX);
        assert_eq!(user.charge(Duration::from_secs(1)), Duration::from_nanos(u64::MAX));
    }
}
