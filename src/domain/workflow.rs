//! Editorial workflow rules: which actor may move an article between which
//! lifecycle states, and the bookkeeping each transition demands.
//!
//! The rules here are pure; services apply the resulting status and side
//! effects against the store. `published` is terminal for this subsystem:
//! republishing and unpublishing are handled elsewhere, if at all.

use thiserror::Error;

use crate::domain::types::{ActorRole, ArticleStatus};

/// A workflow step requested by an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    /// Writer keeps (or returns) the article in the editable draft state.
    Save,
    /// Writer hands the article to the review queue.
    Submit,
    /// Editor accepts a pending article.
    Approve,
    /// Editor returns a pending article with feedback.
    Reject,
    /// Derived result of a successful publish run, never a direct edit.
    MarkPublished,
}

impl WorkflowAction {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowAction::Save => "save",
            WorkflowAction::Submit => "submit",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
            WorkflowAction::MarkPublished => "mark_published",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("action `{action}` is not allowed for a {role} on a {from} article")]
    Transition {
        from: &'static str,
        role: &'static str,
        action: &'static str,
    },
    #[error("rejection requires a non-empty feedback note")]
    MissingFeedback,
}

/// Resolve the target status for `action` requested by a `role` on an
/// article currently in `from`.
pub fn transition(
    from: ArticleStatus,
    role: ActorRole,
    action: WorkflowAction,
) -> Result<ArticleStatus, WorkflowError> {
    use ArticleStatus::*;

    let target = match (role, action, from) {
        (ActorRole::Writer | ActorRole::Editor, WorkflowAction::Save, Draft | Rejected) => Draft,
        (ActorRole::Writer | ActorRole::Editor, WorkflowAction::Submit, Draft | Rejected) => {
            PendingReview
        }
        (ActorRole::Editor, WorkflowAction::Approve, PendingReview) => Approved,
        (ActorRole::Editor, WorkflowAction::Reject, PendingReview) => Rejected,
        (ActorRole::Editor, WorkflowAction::MarkPublished, Approved) => Published,
        _ => {
            return Err(WorkflowError::Transition {
                from: from.as_str(),
                role: role.as_str(),
                action: action.as_str(),
            });
        }
    };

    Ok(target)
}

/// Validate the feedback note accompanying a rejection.
pub fn require_feedback(note: &str) -> Result<(), WorkflowError> {
    if note.trim().is_empty() {
        return Err(WorkflowError::MissingFeedback);
    }
    Ok(())
}
