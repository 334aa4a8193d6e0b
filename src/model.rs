use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Property name of the schedule-time field, as validated by the service.
pub const PUBLISHED_AT_FIELD: &str = "publishedAtBlog";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "scheduled" => Ok(PostStatus::Scheduled),
            "published" => Ok(PostStatus::Published),
            other => Err(format!("unknown post status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Submitted,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Submitted => "submitted",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "submitted" => Ok(DeliveryStatus::Submitted),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(format!("unknown delivery status '{}'", other)),
        }
    }
}

/// The action the user picked in the menu for the next save.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SaveIntent {
    Draft,
    Schedule,
    Publish,
}

impl SaveIntent {
    /// Status staged on the item while this intent is selected.
    pub fn scratch_status(&self) -> PostStatus {
        match self {
            SaveIntent::Draft => PostStatus::Draft,
            SaveIntent::Schedule => PostStatus::Scheduled,
            SaveIntent::Publish => PostStatus::Published,
        }
    }
}

impl FromStr for SaveIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(SaveIntent::Draft),
            "schedule" => Ok(SaveIntent::Schedule),
            "publish" => Ok(SaveIntent::Publish),
            other => Err(format!("unknown save intent '{}'", other)),
        }
    }
}

/// A problem attached to one property of an item, shown next to that field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub property: String,
    pub message: String,
}

impl FieldError {
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.message)
    }
}

/// Outbound send created by the service when a publish-with-email save succeeds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationJob {
    pub id: Uuid,
    pub delivery_status: DeliveryStatus,
    pub error_detail: Option<String>,
}

impl NotificationJob {
    pub fn pending() -> Self {
        Self {
            id: Uuid::new_v4(),
            delivery_status: DeliveryStatus::Pending,
            error_detail: None,
        }
    }

    pub fn mark_submitted(&mut self) {
        self.delivery_status = DeliveryStatus::Submitted;
        self.error_detail = None;
    }

    pub fn mark_pending(&mut self) {
        self.delivery_status = DeliveryStatus::Pending;
        self.error_detail = None;
    }

    pub fn mark_failed(&mut self, detail: impl Into<String>) {
        self.delivery_status = DeliveryStatus::Failed;
        self.error_detail = Some(detail.into());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentItem {
    pub id: Uuid,
    pub title: String,
    pub status: PostStatus,
    /// Staged status for an uncommitted menu selection.
    pub status_scratch: Option<PostStatus>,
    pub published_at_utc: Option<DateTime<Utc>>,
    /// Schedule time as wall-clock time in the site timezone; this is the
    /// value the date picker edits.
    pub published_at_blog_tz: Option<NaiveDateTime>,
    pub notification: Option<NotificationJob>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

impl ContentItem {
    pub fn draft(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            status: PostStatus::Draft,
            status_scratch: None,
            published_at_utc: None,
            published_at_blog_tz: None,
            notification: None,
            errors: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = status;
        self
    }

    /// A scheduled item whose publish time has already passed.
    pub fn past_scheduled_time(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Scheduled
            && self.published_at_utc.map(|at| at < now).unwrap_or(false)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Options forwarded to the service on save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    pub notify_on_publish: bool,
}
