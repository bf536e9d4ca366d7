use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{debug, warn};

pub type TickCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// One scheduled run. `live` is cleared under its lock before the task is
/// aborted, and the task only counts while holding that lock.
struct Run {
    task: JoinHandle<()>,
    live: Arc<Mutex<bool>>,
}

/// Counts elapsed ticks on a background tokio task.
pub struct Stopwatch {
    period: Duration,
    time: Arc<AtomicU64>,
    on_tick: Arc<Mutex<Option<TickCallback>>>,
    run: Option<Run>,
}

impl Stopwatch {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            time: Arc::new(AtomicU64::new(0)),
            on_tick: Arc::new(Mutex::new(None)),
            run: None,
        }
    }

    /// Sets the callback invoked with the new elapsed time on every tick.
    pub fn set_on_tick<F>(&self, callback: F)
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        if let Ok(mut on_tick) = self.on_tick.lock() {
            *on_tick = Some(Arc::new(callback));
        }
    }

    pub fn time(&self) -> u64 {
        self.time.load(Ordering::SeqCst)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|run| !run.task.is_finished())
    }

    /// Restarts from zero. Needs a Tokio runtime; without one the stopwatch
    /// stays stopped.
    pub fn start(&mut self) {
        self.stop();
        self.time.store(0, Ordering::SeqCst);

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("No Tokio runtime, stopwatch not scheduled: {}", e);
                return;
            }
        };

        let period = self.period;
        let elapsed = Arc::clone(&self.time);
        let on_tick = Arc::clone(&self.on_tick);
        let live = Arc::new(Mutex::new(true));
        let still_live = Arc::clone(&live);

        let task = handle.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let now = {
                    let Ok(live) = still_live.lock() else {
                        break;
                    };
                    if !*live {
                        break;
                    }
                    elapsed.fetch_add(1, Ordering::SeqCst) + 1
                };
                let callback = on_tick.lock().ok().and_then(|guard| guard.clone());
                if let Some(callback) = callback {
                    callback(now);
                }
            }
        });
        self.run = Some(Run { task, live });
        debug!("Stopwatch started with period {:?}", period);
    }

    /// Stops counting. The time read after this returns is final, even if
    /// the aborted task is still winding down on another worker.
    pub fn stop(&mut self) {
        if let Some(run) = self.run.take() {
            if let Ok(mut live) = run.live.lock() {
                *live = false;
            }
            run.task.abort();
            debug!("Stopwatch stopped at {}", self.time());
        }
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn counts_ticks_and_reports_them() {
        let mut stopwatch = Stopwatch::new(Duration::from_secs(1));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        stopwatch.set_on_tick(move |time| sink.lock().unwrap().push(time));

        stopwatch.start();
        assert!(stopwatch.is_running());
        time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(stopwatch.time(), 3);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_time() {
        let mut stopwatch = Stopwatch::new(Duration::from_secs(1));
        stopwatch.start();
        time::sleep(Duration::from_millis(2500)).await;
        stopwatch.stop();
        assert!(!stopwatch.is_running());

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(stopwatch.time(), 2);

        stopwatch.stop();
        assert_eq!(stopwatch.time(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_to_zero() {
        let mut stopwatch = Stopwatch::new(Duration::from_secs(1));
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        stopwatch.set_on_tick(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        stopwatch.start();
        time::sleep(Duration::from_millis(4500)).await;
        stopwatch.start();
        assert_eq!(stopwatch.time(), 0);

        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(stopwatch.time(), 1);
        assert_eq!(ticks.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn time_is_final_once_stop_returns() {
        let mut stopwatch = Stopwatch::new(Duration::from_millis(1));
        assert_eq!(stopwatch.period(), Duration::from_millis(1));

        for _ in 0..20 {
            stopwatch.start();
            time::sleep(Duration::from_millis(5)).await;
            stopwatch.stop();
            let stopped_at = stopwatch.time();

            time::sleep(Duration::from_millis(5)).await;
            assert_eq!(stopwatch.time(), stopped_at);
        }
    }

    #[test]
    fn start_without_runtime_stays_stopped() {
        let mut stopwatch = Stopwatch::new(Duration::from_secs(1));
        stopwatch.start();
        assert!(!stopwatch.is_running());
        assert_eq!(stopwatch.time(), 0);
        stopwatch.stop();
    }
}
