#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use posty_core::clock::ManualClock;
use posty_core::config::EconomyConfig;
use posty_economy::{BadgeSink, Economy, SinkError};
use posty_store::{DurableStore, MemoryStore, StoreError};

/// Sink that records every mirrored count.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<u32>>,
    fail: AtomicBool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: AtomicBool::new(true),
        }
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BadgeSink for RecordingSink {
    async fn set_application_badge(&self, count: u32) -> Result<(), SinkError> {
        self.calls.lock().unwrap().push(count);
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::Platform("badge permission denied".into()));
        }
        Ok(())
    }
}

/// Memory store whose writes can be switched off.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn break_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.remove(key).await
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.keys().await
    }
}

/// 10:00 UTC on a fixed day.
pub fn morning_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap(),
    ))
}

pub struct TestEconomy {
    pub economy: Economy,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingSink>,
}

/// Economy over a fresh memory store with default configuration.
pub fn economy() -> TestEconomy {
    economy_with(EconomyConfig::default())
}

pub fn economy_with(config: EconomyConfig) -> TestEconomy {
    let store = Arc::new(MemoryStore::new());
    let clock = morning_clock();
    let sink = Arc::new(RecordingSink::default());
    let economy = Economy::new(store.clone(), sink.clone(), clock.clone(), config);
    TestEconomy {
        economy,
        store,
        clock,
        sink,
    }
}
