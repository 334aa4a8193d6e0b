//! Publish menu controller: the save / schedule / send workflow for one item.
//!
//! A [`PublishMenu`] holds the editing session for a single [`ContentItem`].
//! The host UI binds its accessors into the menu, calls the setters as the
//! user interacts, and drives the async actions (`save`, `confirm_email_send`,
//! `retry_email_send`). At most one save runs at a time per menu; a second
//! request while one is running returns [`SaveOutcome::Busy`].

use crate::config::PollSettings;
use crate::error::{ServiceError, WorkflowError};
use crate::labels::{action_family, success_label, trigger_label, WorkflowState};
use crate::model::{
    ContentItem, NotificationJob, PostStatus, SaveIntent, SaveOptions, PUBLISHED_AT_FIELD,
};
use crate::persistence::PersistenceService;
use crate::text::{resolve_label, TextResolver};
use chrono::{NaiveDateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

mod poll;

pub use poll::Delivery;

/// Where a save was triggered from. Saves from the menu close it when the
/// email confirmation modal takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOrigin {
    Menu,
    Direct,
}

/// Where the gesture that asked the menu to close landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTarget {
    Outside,
    Datepicker,
    ConfirmationModal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotSavedReason {
    /// The typed schedule date could not be parsed.
    InvalidScheduleDate,
    /// Validation failed; the errors are on the item's fields.
    ValidationReported,
    /// The service rejected the save; the errors are on the item's fields.
    SaveReported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(ContentItem),
    NotSaved(NotSavedReason),
    /// The email confirmation modal was opened instead of saving.
    AwaitingConfirmation,
    /// Another save is still running.
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Completed { item: ContentItem, delivery: Delivery },
    /// The confirmed save didn't go through; the confirmation modal shows its
    /// own error state.
    AbortedByValidation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    NoJob,
    /// The service refused the retry; the errors are on the item's fields.
    NotRetried,
    Polled { job: NotificationJob, delivery: Delivery },
}

/// Host callbacks fired on menu open and close.
pub trait MenuHooks: Send + Sync {
    fn on_open(&self) {}
    fn on_close(&self) {}
}

struct NoHooks;

impl MenuHooks for NoHooks {}

struct MenuState {
    item: ContentItem,
    display_state: PostStatus,
    pending_display_state: Option<PostStatus>,
    intent: Option<SaveIntent>,
    send_email_when_published: bool,
    send_email_confirmed: bool,
    typed_date_error: Option<String>,
    running_text: Option<String>,
    previous_state: Option<WorkflowState>,
    cached_published_at: Option<NaiveDateTime>,
    show_email_confirmation_modal: bool,
    skip_close_cleanup: bool,
    is_closing: bool,
}

fn derive_state(item: &ContentItem) -> WorkflowState {
    WorkflowState::derive(item.status, item.past_scheduled_time(Utc::now()))
}

pub struct PublishMenu {
    persistence: Arc<dyn PersistenceService>,
    text: Arc<dyn TextResolver>,
    hooks: Arc<dyn MenuHooks>,
    settings: PollSettings,
    state: Mutex<MenuState>,
    saving: AtomicBool,
    teardown: watch::Sender<bool>,
}

/// Marks a save as in flight; dropping it ends the flight. Display state
/// deferred meanwhile is applied only if the save went through, otherwise it
/// is discarded.
struct SaveFlight<'a> {
    menu: &'a PublishMenu,
    succeeded: bool,
}

impl Drop for SaveFlight<'_> {
    fn drop(&mut self) {
        let mut st = self.menu.state();
        self.menu.saving.store(false, Ordering::Release);
        let pending = st.pending_display_state.take();
        match pending {
            Some(status) if self.succeeded => st.display_state = status,
            Some(status) => debug!(%status, "save failed; dropping deferred display state"),
            None => {}
        }
    }
}

impl PublishMenu {
    pub fn new(
        item: ContentItem,
        persistence: Arc<dyn PersistenceService>,
        text: Arc<dyn TextResolver>,
        settings: PollSettings,
    ) -> Self {
        let (teardown, _) = watch::channel(false);
        let state = MenuState {
            display_state: item.status,
            cached_published_at: item.published_at_blog_tz,
            item,
            pending_display_state: None,
            intent: None,
            send_email_when_published: false,
            send_email_confirmed: false,
            typed_date_error: None,
            running_text: None,
            previous_state: None,
            show_email_confirmation_modal: false,
            skip_close_cleanup: false,
            is_closing: false,
        };
        Self {
            persistence,
            text,
            hooks: Arc::new(NoHooks),
            settings,
            state: Mutex::new(state),
            saving: AtomicBool::new(false),
            teardown,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn MenuHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    fn state(&self) -> MutexGuard<'_, MenuState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_save(&self) -> Option<SaveFlight<'_>> {
        let _st = self.state();
        self.saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SaveFlight {
                menu: self,
                succeeded: false,
            })
    }

    pub fn item(&self) -> ContentItem {
        self.state().item.clone()
    }

    pub fn post_state(&self) -> WorkflowState {
        derive_state(&self.state().item)
    }

    pub fn display_state(&self) -> PostStatus {
        self.state().display_state
    }

    pub fn save_intent(&self) -> Option<SaveIntent> {
        self.state().intent
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    pub fn is_closing(&self) -> bool {
        self.state().is_closing
    }

    pub fn show_email_confirmation_modal(&self) -> bool {
        self.state().show_email_confirmation_modal
    }

    pub fn send_email_when_published(&self) -> bool {
        self.state().send_email_when_published
    }

    pub fn previous_state(&self) -> Option<WorkflowState> {
        self.state().previous_state
    }

    pub fn trigger_text(&self) -> String {
        let label = trigger_label(self.post_state());
        resolve_label(self.text.as_ref(), label)
    }

    pub fn button_text(&self) -> String {
        let label = {
            let st = self.state();
            action_family(derive_state(&st.item), st.intent).button
        };
        resolve_label(self.text.as_ref(), label)
    }

    /// Wording shown while the last save was running, captured when it started.
    pub fn running_text(&self) -> Option<String> {
        self.state().running_text.clone()
    }

    pub fn success_text(&self) -> String {
        let label = {
            let st = self.state();
            success_label(st.previous_state, derive_state(&st.item))
        };
        resolve_label(self.text.as_ref(), label)
    }

    /// Select the action for the next save and stage it on the item.
    pub fn set_save_type(&self, intent: SaveIntent) {
        let mut st = self.state();
        st.intent = Some(intent);
        st.item.status_scratch = Some(intent.scratch_status());
    }

    pub fn set_send_email_when_published(&self, send: bool) {
        self.state().send_email_when_published = send;
    }

    pub fn set_typed_date_error(&self, error: Option<String>) {
        self.state().typed_date_error = error;
    }

    /// Edit the schedule time (site-timezone wall clock). Unsaved edits are
    /// discarded when the menu closes.
    pub fn set_scheduled_time(&self, at: Option<NaiveDateTime>) {
        self.state().item.published_at_blog_tz = at;
    }

    /// Report the item's status as seen by the host. Applied at once when idle;
    /// while a save is running it waits for that save to finish so the menu
    /// doesn't swap underneath it.
    pub fn post_status_changed(&self, status: PostStatus) {
        let mut st = self.state();
        self.schedule_display_state(&mut st, status);
    }

    fn schedule_display_state(&self, st: &mut MenuState, status: PostStatus) {
        if self.saving.load(Ordering::Acquire) {
            st.pending_display_state = Some(status);
        } else {
            st.display_state = status;
            st.pending_display_state = None;
        }
    }

    pub fn open(&self) {
        {
            let mut guard = self.state();
            let st = &mut *guard;
            st.cached_published_at = st.item.published_at_blog_tz;
            st.is_closing = false;
            st.item.errors.clear();
        }
        self.hooks.on_open();
    }

    /// Returns `false` when the gesture hit the date picker or the
    /// confirmation modal; the menu stays open in that case.
    pub async fn close(&self, target: Option<CloseTarget>) -> bool {
        if matches!(
            target,
            Some(CloseTarget::Datepicker) | Some(CloseTarget::ConfirmationModal)
        ) {
            debug!(?target, "ignoring close gesture inside menu overlay");
            return false;
        }

        let skip_cleanup = std::mem::replace(&mut self.state().skip_close_cleanup, false);
        if !skip_cleanup {
            self.cleanup().await;
        }

        self.hooks.on_close();
        self.state().is_closing = true;
        true
    }

    pub async fn open_email_confirmation_modal(&self, origin: SaveOrigin) {
        if origin == SaveOrigin::Menu {
            self.state().skip_close_cleanup = true;
            self.close(None).await;
        }
        self.state().show_email_confirmation_modal = true;
    }

    pub async fn close_email_confirmation_modal(&self) {
        self.state().show_email_confirmation_modal = false;
        self.cleanup().await;
    }

    /// Tear the menu down: any delivery wait in progress returns
    /// [`WorkflowError::Cancelled`], and so does any later one.
    pub fn teardown(&self) {
        self.teardown.send_replace(true);
        info!("publish menu torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        *self.teardown.borrow()
    }

    /// Attach payload-less errors to the item; anything else goes to the caller.
    fn absorb_reported(&self, err: ServiceError) -> Result<(), WorkflowError> {
        match err {
            ServiceError::Reported { errors } => {
                debug!(count = errors.len(), "errors already reported on item fields");
                self.state().item.errors = errors;
                Ok(())
            }
            other => Err(other.into()),
        }
    }

    /// Like [`absorb_reported`](Self::absorb_reported), but hands the error
    /// back so a poll loop can end on it.
    fn note_reported(&self, err: ServiceError) -> ServiceError {
        if let ServiceError::Reported { errors } = &err {
            self.state().item.errors = errors.clone();
        }
        err
    }

    #[instrument(skip_all, fields(origin = ?origin))]
    pub async fn save(&self, origin: SaveOrigin) -> Result<SaveOutcome, WorkflowError> {
        let Some(mut flight) = self.begin_save() else {
            debug!("save already in flight");
            return Ok(SaveOutcome::Busy);
        };

        let (item, notify, confirmed, date_error) = {
            let st = self.state();
            (
                st.item.clone(),
                st.send_email_when_published,
                st.send_email_confirmed,
                st.typed_date_error.is_some(),
            )
        };

        if date_error {
            return Ok(SaveOutcome::NotSaved(NotSavedReason::InvalidScheduleDate));
        }

        // before the confirmation gate so the modal never opens over a bad date
        if let Err(err) = self
            .persistence
            .validate_field(&item, PUBLISHED_AT_FIELD)
            .await
        {
            self.absorb_reported(err)?;
            return Ok(SaveOutcome::NotSaved(NotSavedReason::ValidationReported));
        }

        if item.status == PostStatus::Draft
            && item.notification.is_none()
            && notify
            && !confirmed
        {
            info!(id=%item.id, "email send needs confirmation");
            self.open_email_confirmation_modal(origin).await;
            return Ok(SaveOutcome::AwaitingConfirmation);
        }

        let prepared = {
            let mut st = self.state();
            st.send_email_confirmed = false;
            let state = derive_state(&st.item);
            let running = action_family(state, st.intent).running;
            st.running_text = Some(resolve_label(self.text.as_ref(), running));
            st.previous_state = Some(state);
            if let Some(intent) = st.intent {
                st.item.status_scratch = Some(intent.scratch_status());
            }
            st.item.clone()
        };

        info!(id=%prepared.id, scratch=?prepared.status_scratch, notify, "saving item");
        let options = SaveOptions {
            notify_on_publish: notify,
        };
        match self.persistence.save(&prepared, options).await {
            Ok(saved) => {
                let mut st = self.state();
                st.send_email_when_published = false;
                st.cached_published_at = saved.published_at_blog_tz;
                st.item = saved.clone();
                self.schedule_display_state(&mut st, saved.status);
                flight.succeeded = true;
                info!(id=%saved.id, status=%saved.status, "item saved");
                Ok(SaveOutcome::Saved(saved))
            }
            Err(err) => {
                warn!(%err, "save failed");
                self.absorb_reported(err)?;
                Ok(SaveOutcome::NotSaved(NotSavedReason::SaveReported))
            }
        }
    }

    /// The user confirmed the email send: save, then wait for the service to
    /// hand the email off.
    #[instrument(skip_all)]
    pub async fn confirm_email_send(&self) -> Result<ConfirmOutcome, WorkflowError> {
        self.state().send_email_confirmed = true;

        let item = match self.save(SaveOrigin::Direct).await? {
            SaveOutcome::Saved(item) if !item.has_errors() => item,
            other => {
                debug!(?other, "confirmed save did not go through");
                self.state().send_email_confirmed = false;
                return Ok(ConfirmOutcome::AbortedByValidation);
            }
        };

        let mut teardown = self.teardown.subscribe();
        let (item, delivery) = poll::until_delivered(
            item,
            self.settings.interval,
            self.settings.max_wait,
            &mut teardown,
            move |item: ContentItem| async move {
                let fresh = self
                    .persistence
                    .reload(&item)
                    .await
                    .map_err(|err| self.note_reported(err))?;
                self.state().item = fresh.clone();
                Ok::<_, ServiceError>(fresh)
            },
        )
        .await?;

        info!(id=%item.id, ?delivery, "email confirmation finished");
        Ok(ConfirmOutcome::Completed { item, delivery })
    }

    /// Ask the service to deliver the item's email again and wait briefly for it.
    ///
    /// The wait is bounded by `retry_bound`, which by default equals the poll
    /// interval and so allows exactly one reload.
    #[instrument(skip_all)]
    pub async fn retry_email_send(&self) -> Result<RetryOutcome, WorkflowError> {
        let Some(job) = self.state().item.notification.clone() else {
            return Ok(RetryOutcome::NoJob);
        };

        let job = match self.persistence.retry_delivery(&job).await {
            Ok(job) => job,
            Err(err) => {
                warn!(%err, "email retry refused");
                self.absorb_reported(err)?;
                return Ok(RetryOutcome::NotRetried);
            }
        };
        self.state().item.notification = Some(job.clone());

        let mut teardown = self.teardown.subscribe();
        let (job, delivery) = poll::until_delivered(
            job,
            self.settings.interval,
            self.settings.retry_bound,
            &mut teardown,
            move |job: NotificationJob| async move {
                let fresh = self
                    .persistence
                    .reload_job(&job)
                    .await
                    .map_err(|err| self.note_reported(err))?;
                self.state().item.notification = Some(fresh.clone());
                Ok::<_, ServiceError>(fresh)
            },
        )
        .await?;

        info!(job=%job.id, ?delivery, "email retry finished");
        Ok(RetryOutcome::Polled { job, delivery })
    }

    /// Drop unsaved menu edits: email flag, modal, schedule date and staged
    /// status; then re-validate so field errors match the restored item.
    async fn cleanup(&self) {
        let item = {
            let mut guard = self.state();
            let st = &mut *guard;
            st.show_email_confirmation_modal = false;
            st.send_email_when_published = false;
            st.item.published_at_blog_tz = st.cached_published_at;
            st.item.status_scratch = None;
            st.item.clone()
        };

        let errors = match self.persistence.validate(&item).await {
            Ok(()) => Vec::new(),
            Err(ServiceError::Reported { errors }) => errors,
            Err(err) => {
                warn!(%err, "validation after cleanup failed");
                return;
            }
        };
        self.state().item.errors = errors;
        debug!(id=%item.id, "publish menu cleaned up");
    }
}
