//! Menu state derivation and the label tables bound into the publish menu.
//!
//! Everything here is a pure function of its inputs; the controller calls
//! these whenever the item, the selected intent or the previous state change.
use crate::model::{PostStatus, SaveIntent};
use serde::{Deserialize, Serialize};

/// Publish lifecycle phase shown by the menu.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    Draft,
    Scheduled,
    Published,
}

impl WorkflowState {
    /// `forced_published` is set when a scheduled item's time has already
    /// passed; it takes precedence over the stored status.
    pub fn derive(status: PostStatus, forced_published: bool) -> Self {
        if forced_published || status == PostStatus::Published {
            WorkflowState::Published
        } else if status == PostStatus::Scheduled {
            WorkflowState::Scheduled
        } else {
            WorkflowState::Draft
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Draft => "draft",
            WorkflowState::Scheduled => "scheduled",
            WorkflowState::Published => "published",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    TriggerPublish,
    TriggerUpdate,
    TriggerScheduled,
    Publish,
    Publishing,
    Published,
    Schedule,
    Scheduling,
    Scheduled,
    Update,
    Updating,
    Updated,
    Unpublish,
    Unpublishing,
    Unpublished,
    Reschedule,
    Rescheduling,
    Rescheduled,
    Unschedule,
    Unscheduling,
    Unscheduled,
}

impl Label {
    pub const ALL: [Label; 21] = [
        Label::TriggerPublish,
        Label::TriggerUpdate,
        Label::TriggerScheduled,
        Label::Publish,
        Label::Publishing,
        Label::Published,
        Label::Schedule,
        Label::Scheduling,
        Label::Scheduled,
        Label::Update,
        Label::Updating,
        Label::Updated,
        Label::Unpublish,
        Label::Unpublishing,
        Label::Unpublished,
        Label::Reschedule,
        Label::Rescheduling,
        Label::Rescheduled,
        Label::Unschedule,
        Label::Unscheduling,
        Label::Unscheduled,
    ];

    /// Symbolic key passed to the text resolver.
    pub fn key(&self) -> &'static str {
        match self {
            Label::TriggerPublish => "trigger.Publish",
            Label::TriggerUpdate => "trigger.Update",
            Label::TriggerScheduled => "trigger.Scheduled",
            Label::Publish => "taskButton.Publish",
            Label::Publishing => "taskButton.Publishing",
            Label::Published => "taskButton.Published",
            Label::Schedule => "taskButton.Schedule",
            Label::Scheduling => "taskButton.Scheduling",
            Label::Scheduled => "taskButton.Scheduled",
            Label::Update => "taskButton.Update",
            Label::Updating => "taskButton.Updating",
            Label::Updated => "taskButton.Updated",
            Label::Unpublish => "taskButton.Unpublish",
            Label::Unpublishing => "taskButton.Unpublishing",
            Label::Unpublished => "taskButton.Unpublished",
            Label::Reschedule => "taskButton.Reschedule",
            Label::Rescheduling => "taskButton.Rescheduling",
            Label::Rescheduled => "taskButton.Rescheduled",
            Label::Unschedule => "taskButton.Unschedule",
            Label::Unscheduling => "taskButton.Unscheduling",
            Label::Unscheduled => "taskButton.Unscheduled",
        }
    }

    /// Label resolved instead when the resolver doesn't know [`Label::key`].
    /// Every label falls back into the Publish family of its own kind.
    pub fn fallback(&self) -> Label {
        match self {
            Label::TriggerPublish | Label::TriggerUpdate | Label::TriggerScheduled => {
                Label::TriggerPublish
            }
            Label::Publish
            | Label::Schedule
            | Label::Update
            | Label::Unpublish
            | Label::Reschedule
            | Label::Unschedule => ActionFamily::DEFAULT.button,
            Label::Publishing
            | Label::Scheduling
            | Label::Updating
            | Label::Unpublishing
            | Label::Rescheduling
            | Label::Unscheduling => ActionFamily::DEFAULT.running,
            Label::Published
            | Label::Scheduled
            | Label::Updated
            | Label::Unpublished
            | Label::Rescheduled
            | Label::Unscheduled => ActionFamily::DEFAULT.done,
        }
    }
}

/// Button, in-flight and completed wording for one menu action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionFamily {
    pub button: Label,
    pub running: Label,
    pub done: Label,
}

impl ActionFamily {
    /// Used for any combination the table doesn't cover.
    pub const DEFAULT: ActionFamily = ActionFamily {
        button: Label::Publish,
        running: Label::Publishing,
        done: Label::Published,
    };

    const SCHEDULE: ActionFamily = ActionFamily {
        button: Label::Schedule,
        running: Label::Scheduling,
        done: Label::Scheduled,
    };
    const UPDATE: ActionFamily = ActionFamily {
        button: Label::Update,
        running: Label::Updating,
        done: Label::Updated,
    };
    const UNPUBLISH: ActionFamily = ActionFamily {
        button: Label::Unpublish,
        running: Label::Unpublishing,
        done: Label::Unpublished,
    };
    const RESCHEDULE: ActionFamily = ActionFamily {
        button: Label::Reschedule,
        running: Label::Rescheduling,
        done: Label::Rescheduled,
    };
    const UNSCHEDULE: ActionFamily = ActionFamily {
        button: Label::Unschedule,
        running: Label::Unscheduling,
        done: Label::Unscheduled,
    };
}

pub fn trigger_label(state: WorkflowState) -> Label {
    match state {
        WorkflowState::Published => Label::TriggerUpdate,
        WorkflowState::Scheduled => Label::TriggerScheduled,
        WorkflowState::Draft => Label::TriggerPublish,
    }
}

/// `intent` is `None` until the user picks an action; that counts as "not
/// the matching action" for every state.
pub fn action_family(state: WorkflowState, intent: Option<SaveIntent>) -> ActionFamily {
    match (state, intent) {
        (WorkflowState::Draft, Some(SaveIntent::Publish)) => ActionFamily::DEFAULT,
        (WorkflowState::Draft, _) => ActionFamily::SCHEDULE,
        (WorkflowState::Published, Some(SaveIntent::Publish)) => ActionFamily::UPDATE,
        (WorkflowState::Published, _) => ActionFamily::UNPUBLISH,
        (WorkflowState::Scheduled, Some(SaveIntent::Schedule)) => ActionFamily::RESCHEDULE,
        (WorkflowState::Scheduled, _) => ActionFamily::UNSCHEDULE,
    }
}

/// Wording after a save, from the state before it and the state now.
pub fn success_label(previous: Option<WorkflowState>, current: WorkflowState) -> Label {
    match previous {
        Some(WorkflowState::Draft) if current == WorkflowState::Published => Label::Published,
        Some(WorkflowState::Draft) => Label::Scheduled,
        Some(WorkflowState::Published) if current == WorkflowState::Draft => Label::Unpublished,
        Some(WorkflowState::Published) => Label::Updated,
        Some(WorkflowState::Scheduled) if current == WorkflowState::Draft => Label::Unscheduled,
        Some(WorkflowState::Scheduled) => Label::Rescheduled,
        None => ActionFamily::DEFAULT.done,
    }
}
