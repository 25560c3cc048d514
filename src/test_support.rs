//! In-memory remote gateway used by unit and integration tests.

use crate::application::ports::remote_gateway::RemoteGateway;
use crate::domain::value_objects::EntityKind;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A remote-database stand-in: per-table record maps plus switches for
/// simulating unreachable hosts, failing writes, and per-table read faults.
#[derive(Default)]
pub struct InMemoryGateway {
    tables: Mutex<HashMap<EntityKind, BTreeMap<String, Value>>>,
    unreachable: AtomicBool,
    writes_failing: AtomicBool,
    failing_selects: Mutex<HashSet<EntityKind>>,
    delay: Mutex<Option<Duration>>,
    insert_calls: AtomicU32,
    update_calls: AtomicU32,
    delete_calls: AtomicU32,
    select_calls: AtomicU32,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: EntityKind, records: Vec<Value>) {
        let mut tables = self.tables.lock().unwrap();
        let entries = tables.entry(table).or_default();
        for record in records {
            if let Some(id) = record.get("id").and_then(Value::as_str) {
                entries.insert(id.to_string(), record);
            }
        }
    }

    pub fn table(&self, table: EntityKind) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn record(&self, table: EntityKind, id: &str) -> Option<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .and_then(|entries| entries.get(id).cloned())
    }

    /// Fail every call, as if the host were offline.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Fail insert/update/delete while leaving reads working.
    pub fn set_writes_failing(&self, failing: bool) {
        self.writes_failing.store(failing, Ordering::SeqCst);
    }

    /// Fail `select_all` for one table only.
    pub fn fail_select_for(&self, table: EntityKind) {
        self.failing_selects.lock().unwrap().insert(table);
    }

    pub fn clear_select_failures(&self) {
        self.failing_selects.lock().unwrap().clear();
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn insert_count(&self) -> u32 {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> u32 {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> u32 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn select_count(&self) -> u32 {
        self.select_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_reachable(&self) -> Result<(), AppError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AppError::Network("remote host unreachable".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), AppError> {
        self.check_reachable()?;
        if self.writes_failing.load(Ordering::SeqCst) {
            return Err(AppError::Network("remote write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteGateway for InMemoryGateway {
    async fn insert(&self, table: EntityKind, record: Value) -> Result<(), AppError> {
        self.simulate_latency().await;
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;

        let id = record
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::InvalidInput("record is missing an id".to_string()))?
            .to_string();
        self.tables
            .lock()
            .unwrap()
            .entry(table)
            .or_default()
            .insert(id, record);
        Ok(())
    }

    async fn update(&self, table: EntityKind, id: &str, fields: Value) -> Result<(), AppError> {
        self.simulate_latency().await;
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;

        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables.entry(table).or_default().get_mut(id) {
            if let (Value::Object(target), Value::Object(patch)) = (existing, fields) {
                for (key, value) in patch {
                    target.insert(key, value);
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: EntityKind, id: &str) -> Result<(), AppError> {
        self.simulate_latency().await;
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;

        self.tables
            .lock()
            .unwrap()
            .entry(table)
            .or_default()
            .remove(id);
        Ok(())
    }

    async fn select_all(&self, table: EntityKind) -> Result<Vec<Value>, AppError> {
        self.simulate_latency().await;
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        if self.failing_selects.lock().unwrap().contains(&table) {
            return Err(AppError::Network(format!("select_all failed for {table}")));
        }
        Ok(self.table(table))
    }
}
