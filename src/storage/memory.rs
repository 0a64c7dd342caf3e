//! In-Memory `TableStore` für Copier und Migrator Tests
//! Items werden über das `id` Attribut identifiziert, Scans liefern Pages in
//! Einfügereihenfolge mit dem Key des letzten Items als Cursor.
//! Tabellen müssen vorher mit `with_table` angelegt werden.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use std::sync::Mutex;

use super::dynamodb::TableStore;
use super::error::StorageError;
use super::models::{BatchWriteOutcome, Item, ScanPage, ScanRequest};

pub fn item(id: usize) -> Item {
    HashMap::from([
        ("id".to_string(), AttributeValue::S(format!("{:05}", id))),
        ("n".to_string(), AttributeValue::N(id.to_string())),
        (
            "tags".to_string(),
            AttributeValue::Ss(vec!["copied".to_string(), format!("t{}", id % 3)]),
        ),
    ])
}

fn key_of(item: &Item) -> String {
    item.get("id")
        .and_then(|v| v.as_s().ok())
        .cloned()
        .unwrap_or_default()
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Item>>,
    scan_calls: Vec<ScanRequest>,
    write_calls: Vec<(String, usize)>,
    write_failures: HashMap<usize, StorageError>,
    scan_failures: HashMap<String, StorageError>,
    unprocessed: HashMap<usize, usize>,
}

pub struct MemoryStore {
    page_size: usize,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_table(self, name: &str, items: Vec<Item>) -> Self {
        self.state
            .lock()
            .unwrap()
            .tables
            .insert(name.to_string(), items);
        self
    }

    /// Der n-te BatchWrite Call (0-basiert) schlägt fehl
    pub fn fail_write_call(self, call: usize, err: StorageError) -> Self {
        self.state.lock().unwrap().write_failures.insert(call, err);
        self
    }

    /// Jeder Scan gegen `table` schlägt fehl
    pub fn fail_scan(self, table: &str, err: StorageError) -> Self {
        self.state
            .lock()
            .unwrap()
            .scan_failures
            .insert(table.to_string(), err);
        self
    }

    /// Der n-te BatchWrite Call lässt die letzten `count` Items unverarbeitet
    pub fn leave_unprocessed(self, call: usize, count: usize) -> Self {
        self.state.lock().unwrap().unprocessed.insert(call, count);
        self
    }

    pub fn table(&self, name: &str) -> Vec<Item> {
        let mut items = self
            .state
            .lock()
            .unwrap()
            .tables
            .get(name)
            .cloned()
            .unwrap_or_default();
        items.sort_by_key(key_of);
        items
    }

    pub fn scan_calls(&self) -> Vec<ScanRequest> {
        self.state.lock().unwrap().scan_calls.clone()
    }

    pub fn write_calls(&self) -> Vec<(String, usize)> {
        self.state.lock().unwrap().write_calls.clone()
    }
}

fn clone_error(err: &StorageError) -> StorageError {
    match err {
        StorageError::Transport(m) => StorageError::Transport(m.clone()),
        StorageError::Service { code, message, .. } => StorageError::service(code, message),
        StorageError::Configuration(m) => StorageError::Configuration(m.clone()),
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn scan_page(&self, request: ScanRequest) -> Result<ScanPage, StorageError> {
        let mut state = self.state.lock().unwrap();
        state.scan_calls.push(request.clone());

        if let Some(err) = state.scan_failures.get(&request.table_name) {
            return Err(clone_error(err));
        }

        let items = state.tables.get(&request.table_name).ok_or_else(|| {
            StorageError::service("ResourceNotFoundException", "Requested resource not found")
        })?;

        let start = match &request.exclusive_start_key {
            Some(key) => {
                let key = key_of(key);
                items
                    .iter()
                    .position(|i| key_of(i) == key)
                    .map(|p| p + 1)
                    .unwrap_or(items.len())
            }
            None => 0,
        };

        let limit = request
            .limit
            .map(|l| l.max(1) as usize)
            .unwrap_or(self.page_size)
            .min(self.page_size);
        let end = (start + limit).min(items.len());
        let page: Vec<Item> = items[start..end].to_vec();

        let last_evaluated_key = if end < items.len() {
            page.last().map(|last| {
                HashMap::from([("id".to_string(), AttributeValue::S(key_of(last)))])
            })
        } else {
            None
        };

        Ok(ScanPage {
            items: page,
            last_evaluated_key,
        })
    }

    async fn batch_write(
        &self,
        table_name: &str,
        items: Vec<Item>,
    ) -> Result<BatchWriteOutcome, StorageError> {
        let mut state = self.state.lock().unwrap();
        let call = state.write_calls.len();
        state.write_calls.push((table_name.to_string(), items.len()));

        if items.len() > super::models::MAX_BATCH_SIZE {
            return Err(StorageError::service(
                "ValidationException",
                "Too many items requested for the BatchWriteItem call",
            ));
        }
        if let Some(err) = state.write_failures.remove(&call) {
            return Err(err);
        }

        let keep = items.len() - state.unprocessed.remove(&call).unwrap_or(0).min(items.len());
        let mut items = items;
        let unprocessed = items.split_off(keep);

        let Some(table) = state.tables.get_mut(table_name) else {
            return Err(StorageError::service(
                "ResourceNotFoundException",
                "Requested resource not found",
            ));
        };
        for item in items {
            let key = key_of(&item);
            match table.iter_mut().find(|existing| key_of(existing) == key) {
                Some(existing) => *existing = item,
                None => table.push(item),
            }
        }

        Ok(BatchWriteOutcome { unprocessed })
    }
}
