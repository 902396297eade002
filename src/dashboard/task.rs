use std::{
    ops::ControlFlow,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError, Sender},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, error, info};

use crate::PitwallError;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Fixed-rate timer deadlines. Fires that come due while a tick is still running are dropped
/// instead of queued, so a slow tick never causes a burst of catch-up ticks.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    interval: Duration,
    next: Instant,
}

impl TickSchedule {
    /// First fire is due immediately at `start`.
    pub fn new(start: Instant, interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            next: start,
        }
    }

    pub fn next_deadline(&self) -> Instant {
        self.next
    }

    /// Marks the current fire as handled at `now` and returns how many fires were skipped
    /// because they came due before `now`.
    pub fn complete(&mut self, now: Instant) -> u64 {
        self.next += self.interval;
        let mut skipped = 0;
        while self.next < now {
            self.next += self.interval;
            skipped += 1;
        }
        skipped
    }
}

/// Handle used to cancel a task from another thread, e.g. a Ctrl-C handler.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    wake: Sender<()>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // the task may already be gone, nothing to wake then
        let _ = self.wake.send(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A job that runs on its own thread every `interval`, owning its state.
///
/// The continuation flag is checked at the top of every iteration and again after each wait, and
/// `stop()` joins the thread: once it returns the job will never run again.
pub struct PollingTask<S: Send + 'static> {
    token: CancelToken,
    handle: Option<JoinHandle<S>>,
}

impl<S: Send + 'static> PollingTask<S> {
    pub fn spawn<F>(
        name: &str,
        interval: Duration,
        mut state: S,
        mut job: F,
    ) -> Result<Self, PitwallError>
    where
        F: FnMut(&mut S) -> ControlFlow<()> + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (wake_tx, wake_rx) = mpsc::channel::<()>();
        let token = CancelToken {
            cancelled: Arc::clone(&cancelled),
            wake: wake_tx,
        };

        let task_name = name.to_string();
        let handle = thread::Builder::new()
            .name(task_name.clone())
            .spawn(move || {
                let mut schedule = TickSchedule::new(Instant::now(), interval);
                let mut skipped_total = 0;
                loop {
                    if cancelled.load(Ordering::SeqCst) {
                        break;
                    }
                    let wait = schedule
                        .next_deadline()
                        .saturating_duration_since(Instant::now());
                    match wake_rx.recv_timeout(wait) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }
                    if cancelled.load(Ordering::SeqCst) {
                        break;
                    }
                    if job(&mut state).is_break() {
                        info!("{} finished on its own", task_name);
                        break;
                    }
                    let skipped = schedule.complete(Instant::now());
                    if skipped > 0 {
                        skipped_total += skipped;
                        debug!(
                            "{} overran its interval, dropped {} timer fires ({} total)",
                            task_name, skipped, skipped_total
                        );
                    }
                }
                state
            })
            .map_err(|e| PitwallError::TaskSpawnError { source: e })?;

        Ok(Self {
            token,
            handle: Some(handle),
        })
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancels the task and waits for the running iteration, if any, to finish. Returns the
    /// task's state, or `None` if the job panicked.
    pub fn stop(mut self) -> Option<S> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<S> {
        self.token.cancel();
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(state) => Some(state),
            Err(_) => {
                error!("Polling task panicked");
                None
            }
        }
    }
}

impl<S: Send + 'static> Drop for PollingTask<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_schedule_fires_immediately_then_every_interval() {
        let start = Instant::now();
        let mut schedule = TickSchedule::new(start, Duration::from_millis(100));
        assert_eq!(schedule.next_deadline(), start);

        assert_eq!(schedule.complete(start + Duration::from_millis(5)), 0);
        assert_eq!(
            schedule.next_deadline(),
            start + Duration::from_millis(100)
        );
    }

    #[test]
    fn test_schedule_drops_fires_during_overrun() {
        let start = Instant::now();
        let mut schedule = TickSchedule::new(start, Duration::from_millis(100));

        // tick started at 0 and ran until 350: fires at 100, 200 and 300 are dropped
        assert_eq!(schedule.complete(start + Duration::from_millis(350)), 3);
        assert_eq!(
            schedule.next_deadline(),
            start + Duration::from_millis(400)
        );
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let start = Instant::now();
        let mut schedule = TickSchedule::new(start, Duration::ZERO);
        schedule.complete(start);
        assert!(schedule.next_deadline() > start);
    }

    #[test]
    fn test_stop_prevents_further_runs() {
        let runs = Arc::new(AtomicUsize::new(0));
        let task_runs = Arc::clone(&runs);
        let task = PollingTask::spawn("test-task", Duration::from_millis(10), 0u32, move |n| {
            *n += 1;
            task_runs.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        })
        .unwrap();

        while runs.load(Ordering::SeqCst) < 2 {
            thread::sleep(Duration::from_millis(5));
        }
        let state = task.stop().unwrap();
        let after_stop = runs.load(Ordering::SeqCst);
        assert_eq!(state as usize, after_stop);

        thread::sleep(Duration::from_millis(50));
        assert_eq!(runs.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_job_can_end_the_task() {
        let task = PollingTask::spawn("test-task", Duration::from_millis(1), 0u32, |n| {
            *n += 1;
            if *n == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();

        while !task.is_finished() {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(task.stop(), Some(3));
    }

    #[test]
    fn test_cancel_token_wakes_a_long_wait() {
        let task = PollingTask::spawn("test-task", Duration::from_secs(3600), 0u32, |n| {
            *n += 1;
            ControlFlow::Continue(())
        })
        .unwrap();
        let token = task.cancel_token();

        let started = Instant::now();
        token.cancel();
        assert!(token.is_cancelled());
        let runs = task.stop().unwrap();
        assert!(runs <= 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
