//! # Code Resource Handler
//!
//! Turns code resource requests into store reads and shapes the results.
//! Stateless per request; the only shared piece is the injected store handle.

use std::sync::Arc;

use futures_util::stream::TryStreamExt;
use serde_json::{json, Value};

use crate::store::StoreHandler;

use super::errors::RestResult;
use super::model::{CodeListResponse, CodeRecord, Market};
use super::translation::{project, CODE_FIELD};

/// Default database holding reference data
pub const DEFAULT_DATABASE: &str = "stocklab";

/// Default collection holding security codes
pub const DEFAULT_CODE_COLLECTION: &str = "code_info";

/// Read-only access to security code records
#[derive(Debug, Clone)]
pub struct CodeService {
    store: Arc<StoreHandler>,
    database: String,
    collection: String,
}

impl CodeService {
    /// Service over the default `stocklab.code_info` collection
    pub fn new(store: Arc<StoreHandler>) -> Self {
        Self::with_collection(store, DEFAULT_DATABASE, DEFAULT_CODE_COLLECTION)
    }

    /// Service over a specific collection
    pub fn with_collection(
        store: Arc<StoreHandler>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// One record by short code, or `None`
    pub async fn get_code(&self, code: &str) -> RestResult<Option<CodeRecord>> {
        let filter: Value = json!({ CODE_FIELD: code });
        let raw = self
            .store
            .find_one(&self.database, &self.collection, Some(&filter))
            .await?;

        Ok(raw.map(|doc| CodeRecord::from_projected(&project(&doc))))
    }

    /// Every record in `market`
    pub async fn list_codes(&self, market: Market) -> RestResult<CodeListResponse> {
        let filter = market.filter();
        let stream = self
            .store
            .find_many(&self.database, &self.collection, Some(&filter))
            .await?;

        let code_list: Vec<CodeRecord> = stream
            .map_ok(|doc| CodeRecord::from_projected(&project(&doc)))
            .try_collect()
            .await?;

        Ok(CodeListResponse::new(code_list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest_api::errors::RestError;
    use crate::store::{MemoryBackend, StoreError};

    async fn seeded() -> CodeService {
        let store = Arc::new(StoreHandler::new(Arc::new(MemoryBackend::new())));
        store
            .insert_many(
                DEFAULT_DATABASE,
                DEFAULT_CODE_COLLECTION,
                &json!([
                    {"단축코드": "005930", "종목명": "삼성전자", "시장구분": "1", "주문수량단위": 1},
                    {"단축코드": "000660", "종목명": "SK하이닉스", "시장구분": "1", "주문수량단위": 1},
                    {"단축코드": "035720", "종목명": "카카오", "시장구분": "2", "주문수량단위": 1},
                ]),
            )
            .await
            .unwrap();
        CodeService::new(store)
    }

    #[tokio::test]
    async fn test_get_code() {
        let service = seeded().await;
        let record = service.get_code("035720").await.unwrap().unwrap();
        assert_eq!(record.name.as_deref(), Some("카카오"));
        assert_eq!(record.uri, "/codes/035720");
    }

    #[tokio::test]
    async fn test_get_missing_code_is_none() {
        let service = seeded().await;
        assert!(service.get_code("999999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_market() {
        let service = seeded().await;
        assert_eq!(service.list_codes(Market::All).await.unwrap().count, 3);
        assert_eq!(service.list_codes(Market::Kospi).await.unwrap().count, 2);
        let kosdaq = service.list_codes(Market::Kosdaq).await.unwrap();
        assert_eq!(kosdaq.count, 1);
        assert_eq!(kosdaq.code_list[0].code.as_deref(), Some("035720"));
    }

    #[tokio::test]
    async fn test_blank_collection_name_surfaces_as_store_error() {
        let store = Arc::new(StoreHandler::in_memory());
        let service = CodeService::with_collection(store, DEFAULT_DATABASE, "");
        let err = service.get_code("005930").await.unwrap_err();
        assert!(matches!(err, RestError::Store(StoreError::InvalidArgument(_))));
    }
}
