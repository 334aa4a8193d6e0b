//! In-memory persistence backend.
//!
//! Delivery progress is scripted: each reload of an item or job consumes the
//! next queued [`DeliveryStep`] and applies it to the job. With an empty
//! script the job keeps its current status.

use crate::config::{Config, ConfigError};
use crate::error::ServiceError;
use crate::model::{
    ContentItem, FieldError, NotificationJob, PostStatus, SaveOptions, PUBLISHED_AT_FIELD,
};
use crate::persistence::PersistenceService;
use crate::schedule::{from_site_time, to_site_time};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use chrono_tz::Tz;
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStep {
    Pending,
    Submitted,
    Failed(String),
}

impl DeliveryStep {
    fn apply(&self, job: &mut NotificationJob) {
        match self {
            DeliveryStep::Pending => job.mark_pending(),
            DeliveryStep::Submitted => job.mark_submitted(),
            DeliveryStep::Failed(detail) => job.mark_failed(detail.clone()),
        }
    }
}

/// Parses `pending`, `submitted`, `failed` or `failed:<detail>`.
impl FromStr for DeliveryStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(DeliveryStep::Pending),
            "submitted" => Ok(DeliveryStep::Submitted),
            "failed" => Ok(DeliveryStep::Failed("delivery failed".into())),
            other => match other.strip_prefix("failed:") {
                Some(detail) => Ok(DeliveryStep::Failed(detail.to_string())),
                None => Err(format!("unknown delivery step '{}'", other)),
            },
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<Uuid, ContentItem>,
    deliveries: VecDeque<DeliveryStep>,
    save_failures: VecDeque<ServiceError>,
    validation_failures: VecDeque<ServiceError>,
    save_calls: usize,
    reload_calls: usize,
    job_reload_calls: usize,
    retry_calls: usize,
}

impl Inner {
    fn next_step(&mut self, job: &mut NotificationJob) {
        if let Some(step) = self.deliveries.pop_front() {
            step.apply(job);
        }
    }

    fn item_with_job(&mut self, job_id: Uuid) -> Option<&mut ContentItem> {
        self.items.values_mut().find(|item| {
            item.notification
                .as_ref()
                .map(|job| job.id == job_id)
                .unwrap_or(false)
        })
    }
}

#[derive(Debug)]
pub struct MemoryPersistence {
    inner: Mutex<Inner>,
    timezone: Tz,
    min_schedule_lead: Duration,
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self::new(chrono_tz::UTC, Duration::zero())
    }
}

impl MemoryPersistence {
    pub fn new(timezone: Tz, min_schedule_lead: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            timezone,
            min_schedule_lead,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        let lead = i64::try_from(cfg.site.min_schedule_lead_secs)
            .map_err(|_| ConfigError::Invalid("site.min_schedule_lead_secs is too large"))?;
        Ok(Self::new(cfg.site_timezone()?, Duration::seconds(lead)))
    }

    pub async fn insert(&self, item: ContentItem) {
        self.inner.lock().await.items.insert(item.id, item);
    }

    pub async fn get(&self, id: Uuid) -> Option<ContentItem> {
        self.inner.lock().await.items.get(&id).cloned()
    }

    /// Queue delivery statuses handed out by subsequent reloads.
    pub async fn script_deliveries(&self, steps: impl IntoIterator<Item = DeliveryStep>) {
        self.inner.lock().await.deliveries.extend(steps);
    }

    pub async fn fail_next_save(&self, err: ServiceError) {
        self.inner.lock().await.save_failures.push_back(err);
    }

    pub async fn fail_next_validation(&self, err: ServiceError) {
        self.inner.lock().await.validation_failures.push_back(err);
    }

    pub async fn save_calls(&self) -> usize {
        self.inner.lock().await.save_calls
    }

    pub async fn reload_calls(&self) -> usize {
        self.inner.lock().await.reload_calls
    }

    pub async fn job_reload_calls(&self) -> usize {
        self.inner.lock().await.job_reload_calls
    }

    pub async fn retry_calls(&self) -> usize {
        self.inner.lock().await.retry_calls
    }

    fn check_schedule(&self, item: &ContentItem) -> Result<(), ServiceError> {
        if item.status_scratch != Some(PostStatus::Scheduled) {
            return Ok(());
        }
        let reported = |message: &str| ServiceError::Reported {
            errors: vec![FieldError::new(PUBLISHED_AT_FIELD, message)],
        };
        let local = item
            .published_at_blog_tz
            .ok_or_else(|| reported("Must have a publish date"))?;
        let at = from_site_time(local, &self.timezone)
            .ok_or_else(|| reported("Must be a valid date"))?;
        if at < Utc::now() + self.min_schedule_lead {
            return Err(reported("Must be in the future"));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceService for MemoryPersistence {
    async fn validate_field(&self, item: &ContentItem, field: &str) -> Result<(), ServiceError> {
        if let Some(err) = self.inner.lock().await.validation_failures.pop_front() {
            return Err(err);
        }
        if field == PUBLISHED_AT_FIELD {
            self.check_schedule(item)?;
        }
        Ok(())
    }

    async fn validate(&self, item: &ContentItem) -> Result<(), ServiceError> {
        self.check_schedule(item)
    }

    async fn save(
        &self,
        item: &ContentItem,
        options: SaveOptions,
    ) -> Result<ContentItem, ServiceError> {
        let mut inner = self.inner.lock().await;
        inner.save_calls += 1;
        if let Some(err) = inner.save_failures.pop_front() {
            return Err(err);
        }
        self.check_schedule(item)?;

        let previous = item.status;
        let mut saved = item.clone();
        if let Some(status) = saved.status_scratch.take() {
            saved.status = status;
        }
        match saved.status {
            PostStatus::Scheduled => {
                saved.published_at_utc = saved
                    .published_at_blog_tz
                    .and_then(|local| from_site_time(local, &self.timezone));
            }
            PostStatus::Published if previous != PostStatus::Published => {
                saved.published_at_utc = Some(Utc::now());
            }
            _ => {}
        }
        saved.published_at_blog_tz = saved
            .published_at_utc
            .map(|utc| to_site_time(utc, &self.timezone));

        if saved.status == PostStatus::Published
            && previous == PostStatus::Draft
            && options.notify_on_publish
            && saved.notification.is_none()
        {
            saved.notification = Some(NotificationJob::pending());
        }
        saved.errors.clear();

        debug!(id=%saved.id, status=%saved.status, "saved item");
        inner.items.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn reload(&self, item: &ContentItem) -> Result<ContentItem, ServiceError> {
        let mut inner = self.inner.lock().await;
        inner.reload_calls += 1;
        let mut stored = inner
            .items
            .get(&item.id)
            .cloned()
            .ok_or_else(|| ServiceError::Request(format!("item {} not found", item.id)))?;
        if let Some(job) = stored.notification.as_mut() {
            inner.next_step(job);
        }
        inner.items.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn retry_delivery(&self, job: &NotificationJob) -> Result<NotificationJob, ServiceError> {
        let mut inner = self.inner.lock().await;
        inner.retry_calls += 1;
        let item = inner
            .item_with_job(job.id)
            .ok_or_else(|| ServiceError::Request(format!("job {} not found", job.id)))?;
        let stored = item
            .notification
            .as_mut()
            .ok_or_else(|| ServiceError::Request(format!("job {} not found", job.id)))?;
        stored.mark_pending();
        Ok(stored.clone())
    }

    async fn reload_job(&self, job: &NotificationJob) -> Result<NotificationJob, ServiceError> {
        let mut inner = self.inner.lock().await;
        inner.job_reload_calls += 1;
        let mut stored = inner
            .item_with_job(job.id)
            .and_then(|item| item.notification.clone())
            .ok_or_else(|| ServiceError::Request(format!("job {} not found", job.id)))?;
        inner.next_step(&mut stored);
        if let Some(item) = inner.item_with_job(job.id) {
            item.notification = Some(stored.clone());
        }
        Ok(stored)
    }
}
