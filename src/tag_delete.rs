//! Confirmation modal for deleting a tag.
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub slug: String,
    pub name: String,
}

#[async_trait]
pub trait TagDeleter: Send + Sync {
    async fn delete(&self, tag: &Tag) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// A delete from an earlier confirm was still running.
    Dropped,
}

pub struct DeleteTagModal {
    tag: Tag,
    deleter: Arc<dyn TagDeleter>,
    running: AtomicBool,
    open: AtomicBool,
}

impl DeleteTagModal {
    pub fn new(tag: Tag, deleter: Arc<dyn TagDeleter>) -> Self {
        Self {
            tag,
            deleter,
            running: AtomicBool::new(false),
            open: AtomicBool::new(true),
        }
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Delete the tag, then close the modal whether or not the delete worked.
    pub async fn confirm(&self) -> Result<DeleteOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(DeleteOutcome::Dropped);
        }

        let res = self.deleter.delete(&self.tag).await;
        self.open.store(false, Ordering::Release);
        self.running.store(false, Ordering::Release);

        match res {
            Ok(()) => {
                info!(slug = %self.tag.slug, "tag deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                warn!(?err, slug = %self.tag.slug, "tag delete failed");
                Err(err)
            }
        }
    }
}
