//! Persistence boundary consumed by the publish menu.
//!
//! This module is split into:
//! - the [`PersistenceService`] trait the controller talks to;
//! - `memory`: an in-process backend used by the demo binary and tests.
//!
//! The controller never merges local and remote edits: whatever a call
//! returns replaces its local copy.

use crate::error::ServiceError;
use crate::model::{ContentItem, NotificationJob, SaveOptions};
use async_trait::async_trait;

pub mod memory;

pub use memory::MemoryPersistence;

#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Validate one property of the item.
    async fn validate_field(&self, item: &ContentItem, field: &str) -> Result<(), ServiceError>;

    /// Validate every property of the item.
    async fn validate(&self, item: &ContentItem) -> Result<(), ServiceError>;

    async fn save(&self, item: &ContentItem, options: SaveOptions)
        -> Result<ContentItem, ServiceError>;

    async fn reload(&self, item: &ContentItem) -> Result<ContentItem, ServiceError>;

    /// Ask the service to deliver a failed or stuck notification again.
    async fn retry_delivery(&self, job: &NotificationJob) -> Result<NotificationJob, ServiceError>;

    async fn reload_job(&self, job: &NotificationJob) -> Result<NotificationJob, ServiceError>;
}
