use uuid::Uuid;

use crate::application::repos::DraftFields;
use crate::domain::entities::EditorOverrides;
use crate::domain::types::Actor;

#[derive(Debug, Clone)]
pub struct CreateDraftCommand {
    pub actor: Actor,
    pub fields: DraftFields,
}

#[derive(Debug, Clone)]
pub struct UpdateDraftCommand {
    pub actor: Actor,
    pub article_id: Uuid,
    pub fields: DraftFields,
}

/// Outcome of an editor's review of a pending article.
#[derive(Debug, Clone)]
pub enum ReviewDecision {
    /// Accept, optionally pinning metadata that outranks the writer's
    /// fields at publish time.
    Approve { overrides: EditorOverrides },
    /// Return to the writer; the note is mandatory.
    Reject { note: String },
}
