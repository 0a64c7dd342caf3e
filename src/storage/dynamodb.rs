use crate::storage::error::StorageError;
use crate::storage::models::{BatchWriteOutcome, Item, ScanPage, ScanRequest};
use crate::utils::config::AwsSettings;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::types::{PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;

/// Schnittstelle zum Storage-Service (Scan + BatchWrite)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Lese eine Seite eines Full-Table-Scans
    async fn scan_page(&self, request: ScanRequest) -> Result<ScanPage, StorageError>;

    /// Schreibe bis zu 25 Items als PutRequests
    async fn batch_write(
        &self,
        table_name: &str,
        items: Vec<Item>,
    ) -> Result<BatchWriteOutcome, StorageError>;
}

/// DynamoDB Storage Layer
pub struct DynamoDBStore {
    client: Client,
}

impl DynamoDBStore {
    /// Erstelle neue DynamoDB Store Instanz
    pub async fn new(settings: &AwsSettings) -> Result<Self, StorageError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;
        if config.region().is_none() {
            return Err(StorageError::Configuration(
                "no AWS region configured (set aws.region or AWS_REGION)".to_string(),
            ));
        }

        tracing::debug!(
            region = ?config.region(),
            profile = ?settings.profile,
            endpoint = ?settings.endpoint_url,
            "DynamoDB client configured"
        );

        Ok(Self::from_client(Client::new(&config)))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TableStore for DynamoDBStore {
    async fn scan_page(&self, request: ScanRequest) -> Result<ScanPage, StorageError> {
        let response = self
            .client
            .scan()
            .table_name(&request.table_name)
            .set_exclusive_start_key(request.exclusive_start_key)
            .set_limit(request.limit)
            .consistent_read(request.consistent_read)
            .send()
            .await
            .map_err(StorageError::from_sdk)?;

        Ok(ScanPage {
            items: response.items.unwrap_or_default(),
            last_evaluated_key: response.last_evaluated_key.filter(|key| !key.is_empty()),
        })
    }

    async fn batch_write(
        &self,
        table_name: &str,
        items: Vec<Item>,
    ) -> Result<BatchWriteOutcome, StorageError> {
        let mut requests = Vec::with_capacity(items.len());
        for item in items {
            let put = PutRequest::builder()
                .set_item(Some(item))
                .build()
                .map_err(|e| StorageError::Configuration(e.to_string()))?;
            requests.push(WriteRequest::builder().put_request(put).build());
        }

        let response = self
            .client
            .batch_write_item()
            .request_items(table_name, requests)
            .send()
            .await
            .map_err(StorageError::from_sdk)?;

        Ok(BatchWriteOutcome {
            unprocessed: unprocessed_puts(response.unprocessed_items, table_name),
        })
    }
}

/// Extrahiere die unverarbeiteten PutRequest Items einer Tabelle
fn unprocessed_puts(
    unprocessed: Option<std::collections::HashMap<String, Vec<WriteRequest>>>,
    table_name: &str,
) -> Vec<Item> {
    unprocessed
        .and_then(|mut tables| tables.remove(table_name))
        .unwrap_or_default()
        .into_iter()
        .filter_map(|request| request.put_request.map(|put| put.item))
        .collect()
}
