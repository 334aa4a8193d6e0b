use crate::error::{ServiceError, WorkflowError};
use crate::model::{ContentItem, DeliveryStatus, NotificationJob};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// How a delivery wait ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Nothing to deliver: the subject has no notification job.
    NotRequested,
    Submitted,
    /// The poll budget ran out; the returned subject carries the last status seen.
    TimedOut,
    /// A reload was rejected with errors already reported on the item; the
    /// returned subject carries the last status seen.
    Unconfirmed,
}

/// Anything that exposes a notification's delivery progress.
pub(crate) trait Deliverable {
    fn delivery(&self) -> Option<(DeliveryStatus, Option<&str>)>;
}

impl Deliverable for NotificationJob {
    fn delivery(&self) -> Option<(DeliveryStatus, Option<&str>)> {
        Some((self.delivery_status, self.error_detail.as_deref()))
    }
}

impl Deliverable for ContentItem {
    fn delivery(&self) -> Option<(DeliveryStatus, Option<&str>)> {
        self.notification.as_ref().and_then(Deliverable::delivery)
    }
}

/// Wait `interval`, reload, check; repeat while less than `bound` has
/// elapsed since the first wait began, reload time included. Returns early if
/// the subject has no job or is already submitted.
pub(crate) async fn until_delivered<T, F, Fut>(
    mut subject: T,
    interval: Duration,
    bound: Duration,
    teardown: &mut watch::Receiver<bool>,
    mut reload: F,
) -> Result<(T, Delivery), WorkflowError>
where
    T: Deliverable + Clone,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    match subject.delivery() {
        None => return Ok((subject, Delivery::NotRequested)),
        Some((DeliveryStatus::Submitted, _)) => return Ok((subject, Delivery::Submitted)),
        Some(_) => {}
    }

    let start = Instant::now();
    while start.elapsed() < bound {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = teardown.wait_for(|torn_down| *torn_down) => {
                return Err(WorkflowError::Cancelled);
            }
        }

        subject = match reload(subject.clone()).await {
            Ok(fresh) => fresh,
            Err(ServiceError::Reported { errors }) => {
                debug!(count = errors.len(), "reload rejected; errors reported on item");
                return Ok((subject, Delivery::Unconfirmed));
            }
            Err(err) => return Err(err.into()),
        };
        match subject.delivery() {
            None => return Ok((subject, Delivery::NotRequested)),
            Some((DeliveryStatus::Submitted, _)) => return Ok((subject, Delivery::Submitted)),
            Some((DeliveryStatus::Failed, detail)) => {
                let detail = detail.unwrap_or("unknown delivery error").to_string();
                return Err(WorkflowError::DeliveryFailed(detail));
            }
            Some((DeliveryStatus::Pending, _)) => {
                debug!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "delivery still pending"
                );
            }
        }
    }

    Ok((subject, Delivery::TimedOut))
}
