//! Publish workflow for a single content item: menu state and labels, saving
//! with an email confirmation gate, and delivery polling after a send.

pub mod config;
pub mod error;
pub mod labels;
pub mod model;
pub mod persistence;
pub mod schedule;
pub mod staff_route;
pub mod tag_delete;
pub mod text;
pub mod workflow;

pub use error::{ServiceError, WorkflowError};
pub use workflow::PublishMenu;
