use crate::domain::value_objects::EntityKind;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Logical operations against the hosted database. The concrete transport
/// (HTTP client, retries, timeouts) lives with the embedding application.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn insert(&self, table: EntityKind, record: Value) -> Result<(), AppError>;

    async fn update(&self, table: EntityKind, id: &str, fields: Value) -> Result<(), AppError>;

    async fn delete(&self, table: EntityKind, id: &str) -> Result<(), AppError>;

    async fn select_all(&self, table: EntityKind) -> Result<Vec<Value>, AppError>;
}
