//! In-memory store backend
//!
//! Backs tests and single-process deployments where the engine runs in
//! the same process as the orchestrator. Not reachable from a second
//! process; production setups use the SQLite backend instead.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{resolve_range, CoordinationStore};
use crate::error::{Error, Result};

struct ValueEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl ValueEntry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

#[derive(Default)]
struct Inner {
    values: HashMap<String, ValueEntry>,
    lists: HashMap<String, VecDeque<String>>,
}

/// Process-local [`CoordinationStore`] over a mutex-guarded map
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Store("store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut inner = self.lock()?;
        // Lazy expiry: drop the entry the first time it reads as stale.
        if inner.values.get(key).is_some_and(ValueEntry::expired) {
            inner.values.remove(key);
        }
        Ok(inner.values.get(key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut inner = self.lock()?;
        inner.values.insert(
            key.to_string(),
            ValueEntry {
                value: value.to_string(),
                expires_at: ttl.map(|t| Instant::now() + t),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut inner = self.lock()?;
        let had_value = inner.values.remove(key).is_some();
        let had_list = inner.lists.remove(key).is_some();
        Ok(had_value || had_list)
    }

    async fn push_back(&self, key: &str, value: &str) -> Result<u64> {
        let mut inner = self.lock()?;
        let list = inner.lists.entry(key.to_string()).or_default();
        list.push_back(value.to_string());
        Ok(list.len() as u64)
    }

    async fn push_front(&self, key: &str, value: &str) -> Result<u64> {
        let mut inner = self.lock()?;
        let list = inner.lists.entry(key.to_string()).or_default();
        list.push_front(value.to_string());
        Ok(list.len() as u64)
    }

    async fn pop_front(&self, key: &str) -> Result<Option<String>> {
        let mut inner = self.lock()?;
        let popped = inner.lists.get_mut(key).and_then(VecDeque::pop_front);
        if inner.lists.get(key).is_some_and(VecDeque::is_empty) {
            inner.lists.remove(key);
        }
        Ok(popped)
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let inner = self.lock()?;
        let Some(list) = inner.lists.get(key) else {
            return Ok(Vec::new());
        };
        let Some((start, stop)) = resolve_range(start, stop, list.len()) else {
            return Ok(Vec::new());
        };
        Ok(list
            .iter()
            .skip(start)
            .take(stop - start + 1)
            .cloned()
            .collect())
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        let inner = self.lock()?;
        Ok(inner.lists.get(key).map_or(0, VecDeque::len) as u64)
    }

    async fn list_trim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        let mut inner = self.lock()?;
        let Some(list) = inner.lists.get_mut(key) else {
            return Ok(());
        };
        match resolve_range(start, stop, list.len()) {
            Some((start, stop)) => {
                let kept: VecDeque<String> = list
                    .iter()
                    .skip(start)
                    .take(stop - start + 1)
                    .cloned()
                    .collect();
                *list = kept;
            }
            None => {
                inner.lists.remove(key);
            }
        }
        Ok(())
    }

    async fn list_remove_at(&self, key: &str, index: u64) -> Result<bool> {
        let mut inner = self.lock()?;
        let Some(list) = inner.lists.get_mut(key) else {
            return Ok(false);
        };
        Ok(list.remove(index as usize).is_some())
    }
}
