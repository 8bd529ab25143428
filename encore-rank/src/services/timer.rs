//! Periodic job runner for weekly work
//!
//! A job runs on its own tokio task, so it neither blocks nor is blocked
//! by request handling. A failed run is logged and retried at the next
//! fire instant; the loop never exits on its own.

use chrono::{DateTime, FixedOffset, Utc};
use encore_common::time::WeekWindow;
use encore_common::Result;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Fires at every week boundary (Monday 00:00 in `offset`)
#[derive(Debug, Clone, Copy)]
pub struct WeeklyTrigger {
    offset: FixedOffset,
}

impl WeeklyTrigger {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// First week boundary strictly after `now`
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        WeekWindow::containing(now, self.offset).end
    }
}

/// Time left until `fire`, zero if it has already passed
pub fn delay_until(now: DateTime<Utc>, fire: DateTime<Utc>) -> Duration {
    (fire - now).to_std().unwrap_or(Duration::ZERO)
}

/// Run `job` at every fire instant of `trigger` on its own task, using
/// the wall clock.
pub fn spawn_periodic<F, Fut, T>(name: &'static str, trigger: WeeklyTrigger, job: F) -> JoinHandle<()>
where
    F: Fn(DateTime<Utc>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(run_periodic(name, trigger, encore_common::time::now, job))
}

/// Loop behind [`spawn_periodic`]; never returns.
///
/// `clock` supplies "now". The job receives the instant it was scheduled
/// for, and a failed run is logged and left to the next fire.
pub async fn run_periodic<C, F, Fut, T>(name: &'static str, trigger: WeeklyTrigger, clock: C, job: F)
where
    C: Fn() -> DateTime<Utc> + Send + 'static,
    F: Fn(DateTime<Utc>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let mut fire = trigger.next_fire_after(clock());
    loop {
        info!("{}: next run at {}", name, fire);
        tokio::time::sleep(delay_until(clock(), fire)).await;

        if let Err(e) = job(fire).await {
            error!("{} failed, retrying at next trigger: {}", name, e);
        }

        fire = trigger.next_fire_after(clock().max(fire));
    }
}
