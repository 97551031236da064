use std::sync::{Arc, Mutex, MutexGuard};

use crate::types::{EngineMode, GameEvent, PerSide, Snapshot};

pub trait GameObserver {
    fn on_snapshot(&mut self, _snapshot: &Snapshot) {}

    fn on_ui_update(&mut self, _snapshot: &Snapshot, _best: &PerSide<i32>) {}

    fn on_event(&mut self, _event: &GameEvent) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl GameObserver for NullObserver {}

#[derive(Clone, Debug, Default)]
pub struct Recording {
    pub snapshots: Vec<Snapshot>,
    pub ui_updates: Vec<(EngineMode, PerSide<i32>)>,
    pub events: Vec<GameEvent>,
}

#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn last_snapshot(&self) -> Option<Snapshot> {
        self.lock().snapshots.last().cloned()
    }

    pub fn snapshot_count(&self) -> usize {
        self.lock().snapshots.len()
    }

    pub fn ui_updates(&self) -> Vec<(EngineMode, PerSide<i32>)> {
        self.lock().ui_updates.clone()
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.lock().events.clone()
    }

    pub fn take_events(&self) -> Vec<GameEvent> {
        std::mem::take(&mut self.lock().events)
    }
}

impl GameObserver for RecordingObserver {
    fn on_snapshot(&mut self, snapshot: &Snapshot) {
        self.lock().snapshots.push(snapshot.clone());
    }

    fn on_ui_update(&mut self, snapshot: &Snapshot, best: &PerSide<i32>) {
        self.lock().ui_updates.push((snapshot.mode, *best));
    }

    fn on_event(&mut self, event: &GameEvent) {
        self.lock().events.push(*event);
    }
}
