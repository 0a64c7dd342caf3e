use aws_sdk_dynamodb::types::AttributeValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Maximale Anzahl Items pro BatchWriteItem Call (DynamoDB Limit)
pub const MAX_BATCH_SIZE: usize = 25;

/// Natives DynamoDB Item, wird beim Kopieren nie interpretiert
pub type Item = HashMap<String, AttributeValue>;

/// Eine Scan-Anfrage gegen eine Quelltabelle
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub table_name: String,
    /// LastEvaluatedKey der vorherigen Seite
    pub exclusive_start_key: Option<Item>,
    pub limit: Option<i32>,
    pub consistent_read: bool,
}

/// Eine Seite eines Scans
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<Item>,
    /// None heißt: Scan ist vollständig
    pub last_evaluated_key: Option<Item>,
}

/// Ergebnis eines BatchWriteItem Calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWriteOutcome {
    /// Items, die DynamoDB nicht verarbeitet hat
    pub unprocessed: Vec<Item>,
}

/// Quell- → Zieltabelle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMapping {
    pub source: String,
    pub destination: String,
}

impl TableMapping {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for TableMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// Zerlegt einen fortlaufenden Item-Strom in Batches fester Größe.
///
/// Reihenfolge bleibt über Seitengrenzen hinweg erhalten; nur der letzte
/// Batch (aus `finish`) darf kleiner sein.
#[derive(Debug)]
pub struct Batcher {
    batch_size: usize,
    pending: Vec<Item>,
}

impl Batcher {
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        Self {
            batch_size,
            pending: Vec::with_capacity(batch_size),
        }
    }

    /// Fügt Items hinzu und gibt alle vollen Batches zurück
    pub fn push(&mut self, items: Vec<Item>) -> Vec<Vec<Item>> {
        self.pending.extend(items);

        let mut full = Vec::new();
        while self.pending.len() >= self.batch_size {
            full.push(self.pending.drain(..self.batch_size).collect());
        }
        full
    }

    /// Rest-Batch nach Ende des Scans
    pub fn finish(self) -> Option<Vec<Item>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending)
        }
    }
}

/// Statistik einer einzelnen Tabellenmigration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableReport {
    pub source: String,
    pub destination: String,
    pub pages_scanned: u64,
    pub items_scanned: u64,
    pub items_written: u64,
    pub batches_written: u64,
    pub elapsed_ms: u64,
    pub dry_run: bool,
}
