//! Access rules and leave guard for the staff profile page.
use crate::text::{resolve_or_fallback, TextResolver, STAFF_USER_TITLE_KEY};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Owner,
    Administrator,
    Editor,
    Author,
    Contributor,
}

impl StaffRole {
    pub fn is_author_or_contributor(&self) -> bool {
        matches!(self, StaffRole::Author | StaffRole::Contributor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffUser {
    pub id: String,
    pub slug: String,
    pub role: StaffRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// Send the viewer to their own profile (by slug).
    OwnProfile(String),
    StaffList,
}

/// Where to send `viewer` instead of `profile`, if they may not view it.
pub fn profile_redirect(viewer: &StaffUser, profile: &StaffUser) -> Option<Redirect> {
    let own_profile = viewer.id == profile.id;
    if viewer.role.is_author_or_contributor() && !own_profile {
        Some(Redirect::OwnProfile(viewer.slug.clone()))
    } else if viewer.role == StaffRole::Editor
        && !own_profile
        && !profile.role.is_author_or_contributor()
    {
        Some(Redirect::StaffList)
    } else {
        None
    }
}

pub fn route_params(profile: &StaffUser) -> String {
    profile.slug.clone()
}

pub fn page_title(text: &dyn TextResolver) -> String {
    resolve_or_fallback(text, STAFF_USER_TITLE_KEY, STAFF_USER_TITLE_KEY)
}

/// Profile form state relevant when navigating away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileEdit {
    pub model_dirty: bool,
    pub form_dirty: bool,
    pub password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    Proceed,
    /// Abort the transition and ask about unsaved changes.
    ConfirmUnsaved,
}

pub fn leave_profile(edit: &mut ProfileEdit) -> LeaveDecision {
    edit.password.clear();
    edit.new_password.clear();
    edit.confirm_password.clear();

    if edit.model_dirty || edit.form_dirty {
        LeaveDecision::ConfirmUnsaved
    } else {
        LeaveDecision::Proceed
    }
}
