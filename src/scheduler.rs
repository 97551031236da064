use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub trait Scheduler {
    fn schedule(&mut self, interval_ms: u64);

    fn cancel(&mut self);
}

#[derive(Clone, Debug, Default)]
struct ManualTimer {
    interval_ms: Option<u64>,
    schedules: u32,
    cancels: u32,
}

#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualTimer>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualTimer> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn interval_ms(&self) -> Option<u64> {
        self.lock().interval_ms
    }

    pub fn schedule_count(&self) -> u32 {
        self.lock().schedules
    }

    pub fn cancel_count(&self) -> u32 {
        self.lock().cancels
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, interval_ms: u64) {
        let mut timer = self.lock();
        timer.interval_ms = Some(interval_ms);
        timer.schedules += 1;
    }

    fn cancel(&mut self) {
        let mut timer = self.lock();
        timer.interval_ms = None;
        timer.cancels += 1;
    }
}

#[derive(Debug)]
pub struct IntervalScheduler {
    tx: watch::Sender<Option<u64>>,
}

#[derive(Debug)]
pub struct IntervalTimer {
    rx: watch::Receiver<Option<u64>>,
}

impl IntervalScheduler {
    pub fn new() -> (Self, IntervalTimer) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, IntervalTimer { rx })
    }
}

impl Scheduler for IntervalScheduler {
    fn schedule(&mut self, interval_ms: u64) {
        let _ = self.tx.send(Some(interval_ms.max(1)));
    }

    fn cancel(&mut self) {
        let _ = self.tx.send(None);
    }
}

impl IntervalTimer {
    /// Calls `on_fire` once per interval until the [`IntervalScheduler`] is
    /// dropped. A new interval takes effect after the in-flight `on_fire`
    /// completes and starts counting from that moment, so a restart neither
    /// skips nor repeats the tick that requested it.
    pub async fn run<F, Fut>(mut self, mut on_fire: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        loop {
            let requested = *self.rx.borrow_and_update();
            let Some(interval_ms) = requested else {
                if self.rx.changed().await.is_err() {
                    return;
                }
                continue;
            };

            let period = Duration::from_millis(interval_ms);
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    changed = self.rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        break;
                    }
                    _ = ticker.tick() => {
                        on_fire().await;
                    }
                }
            }
        }
    }
}
